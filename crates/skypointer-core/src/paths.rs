use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const POINTER_DIR: &str = ".skypointer";
pub const CONFIG_FILE: &str = ".skypointer/config.yaml";
pub const POSITION_FILE: &str = ".skypointer/position.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn pointer_dir(root: &Path) -> PathBuf {
    root.join(POINTER_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn position_path(root: &Path) -> PathBuf {
    root.join(POSITION_FILE)
}
