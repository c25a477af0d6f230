use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PointerError {
    #[error("not initialized: run 'skypointer init'")]
    NotInitialized,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("not calibrated: run 'skypointer calibrate'")]
    Uncalibrated,

    /// The operator asked to stop while waiting for input. Never raised
    /// mid-move.
    #[error("interrupted")]
    Interrupted,

    #[error("hardware write failed: {0}")]
    Hardware(String),

    #[error("failed to persist {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: Box<PointerError>,
    },

    #[error("invalid tracking input: {0}")]
    InvalidFix(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, PointerError>;
