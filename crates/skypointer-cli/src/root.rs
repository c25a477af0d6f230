use skypointer_core::paths::POINTER_DIR;
use std::path::{Path, PathBuf};

/// Resolve the skypointer root directory.
///
/// Priority:
/// 1. `--root` flag / `SKYPOINTER_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.skypointer/`
/// 3. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_marked(&cwd).unwrap_or(cwd)
}

fn find_marked(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(POINTER_DIR).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn finds_marker_above_start() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(POINTER_DIR)).unwrap();
        let subdir = dir.path().join("src/deep");
        std::fs::create_dir_all(&subdir).unwrap();
        assert_eq!(find_marked(&subdir).as_deref(), Some(dir.path()));
    }

    #[test]
    fn no_marker_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let subdir = dir.path().join("a/b");
        std::fs::create_dir_all(&subdir).unwrap();
        // an ancestor of the temp dir could carry a marker; only check below it
        let found = find_marked(&subdir);
        assert!(found.map_or(true, |p| !p.starts_with(dir.path())));
    }
}
