use crate::error::{PointerError, Result};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// `north` value meaning "never calibrated".
pub const UNCALIBRATED: i32 = -1;

// ---------------------------------------------------------------------------
// SavedPosition
// ---------------------------------------------------------------------------

/// What survives a restart: the ring cell facing north and the motor's
/// absolute position. The accumulated sub-step error is deliberately not
/// part of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub north: i32,
    pub position: u32,
}

impl SavedPosition {
    pub fn uncalibrated() -> Self {
        Self {
            north: UNCALIBRATED,
            position: 0,
        }
    }

    pub fn calibrated(north: usize, position: u32) -> Self {
        Self {
            north: north as i32,
            position,
        }
    }

    pub fn is_calibrated(&self) -> bool {
        self.north >= 0
    }

    pub fn north_cell(&self) -> Option<usize> {
        usize::try_from(self.north).ok()
    }

    fn fits(&self, ring_size: u32, revolution: u32) -> bool {
        match self.north_cell() {
            Some(cell) => cell < ring_size as usize && self.position < revolution,
            None => self.north == UNCALIBRATED,
        }
    }
}

impl Default for SavedPosition {
    fn default() -> Self {
        Self::uncalibrated()
    }
}

// ---------------------------------------------------------------------------
// PositionStore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct PositionStore {
    path: PathBuf,
}

impl PositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_root(root: &Path) -> Self {
        Self::new(paths::position_path(root))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the saved state. Never fails: a missing, unreadable, malformed or
    /// out-of-range record comes back as uncalibrated so the device
    /// recalibrates instead of refusing to start.
    pub fn load(&self, ring_size: u32, revolution: u32) -> SavedPosition {
        if !self.path.exists() {
            tracing::info!(path = %self.path.display(), "no saved position, calibration required");
            return SavedPosition::uncalibrated();
        }
        let saved = std::fs::read_to_string(&self.path)
            .map_err(PointerError::from)
            .and_then(|data| serde_yaml::from_str::<SavedPosition>(&data).map_err(Into::into));
        match saved {
            Ok(saved) if saved.fits(ring_size, revolution) => saved,
            Ok(saved) => {
                tracing::warn!(
                    path = %self.path.display(),
                    north = saved.north,
                    position = saved.position,
                    "saved position out of range, recalibrating"
                );
                SavedPosition::uncalibrated()
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "saved position unreadable, recalibrating");
                SavedPosition::uncalibrated()
            }
        }
    }

    pub fn save(&self, saved: &SavedPosition) -> Result<()> {
        let write = || -> Result<()> {
            let data = serde_yaml::to_string(saved)?;
            crate::io::atomic_write(&self.path, data.as_bytes())
        };
        write().map_err(|e| PointerError::Persistence {
            path: self.path.clone(),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_uncalibrated() {
        let dir = TempDir::new().unwrap();
        let store = PositionStore::for_root(dir.path());
        let saved = store.load(24, 2038);
        assert_eq!(saved, SavedPosition::uncalibrated());
        assert!(!saved.is_calibrated());
        assert_eq!(saved.north_cell(), None);
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let store = PositionStore::for_root(dir.path());
        store.save(&SavedPosition::calibrated(7, 1019)).unwrap();
        let saved = store.load(24, 2038);
        assert_eq!(saved.north_cell(), Some(7));
        assert_eq!(saved.position, 1019);
        let text = std::fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("north: 7"));
        assert!(text.contains("position: 1019"));
    }

    #[test]
    fn garbage_is_uncalibrated() {
        let dir = TempDir::new().unwrap();
        let store = PositionStore::for_root(dir.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "north = 3\nposition = ??\n").unwrap();
        assert_eq!(store.load(24, 2038), SavedPosition::uncalibrated());
    }

    #[test]
    fn missing_key_is_uncalibrated() {
        let dir = TempDir::new().unwrap();
        let store = PositionStore::for_root(dir.path());
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "north: 3\n").unwrap();
        assert!(!store.load(24, 2038).is_calibrated());
    }

    #[test]
    fn out_of_range_values_are_uncalibrated() {
        let dir = TempDir::new().unwrap();
        let store = PositionStore::for_root(dir.path());
        store.save(&SavedPosition::calibrated(30, 10)).unwrap();
        assert!(!store.load(24, 2038).is_calibrated());
        store.save(&SavedPosition::calibrated(3, 2038)).unwrap();
        assert!(!store.load(24, 2038).is_calibrated());
        store
            .save(&SavedPosition {
                north: -7,
                position: 0,
            })
            .unwrap();
        assert!(!store.load(24, 2038).is_calibrated());
    }

    #[test]
    fn unwritable_location_is_persistence_error() {
        let dir = TempDir::new().unwrap();
        // a regular file where the state directory should be
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let store = PositionStore::new(blocker.join("position.yaml"));
        let err = store.save(&SavedPosition::calibrated(0, 0)).unwrap_err();
        assert!(matches!(err, PointerError::Persistence { .. }));
    }
}
