//! Guard that deletes a job's intermediate files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;

/// Files a job may leave behind.
///
/// Paths are registered before the invocation that creates them. Every
/// registered path still present is removed by [`cleanup`](Self::cleanup)
/// or, at the latest, when the guard is dropped, including during a panic.
#[derive(Debug, Default)]
pub struct TempArtifacts {
    paths: Mutex<Vec<PathBuf>>,
}

impl TempArtifacts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track `path` for deletion.
    pub fn register(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let mut paths = self.paths.lock();
        if !paths.contains(&path) {
            paths.push(path);
        }
    }

    /// Stop tracking `path` so it survives cleanup.
    pub fn release(&self, path: &Path) -> bool {
        let mut paths = self.paths.lock();
        let before = paths.len();
        paths.retain(|p| p != path);
        paths.len() != before
    }

    /// Currently tracked paths.
    pub fn tracked(&self) -> Vec<PathBuf> {
        self.paths.lock().clone()
    }

    /// Delete every tracked file that exists. Returns how many were removed.
    pub fn cleanup(&self) -> usize {
        let paths: Vec<PathBuf> = std::mem::take(&mut *self.paths.lock());
        let mut removed = 0;
        for path in paths {
            match fs::remove_file(&path) {
                Ok(()) => {
                    tracing::debug!("Removed temp file {}", path.display());
                    removed += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => tracing::warn!("Could not remove {}: {}", path.display(), e),
            }
        }
        removed
    }
}

impl Drop for TempArtifacts {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn cleanup_removes_existing_and_ignores_missing() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        let b = dir.path().join("b.txt");
        fs::write(&a, b"x").unwrap();

        let guard = TempArtifacts::new();
        guard.register(&a);
        guard.register(&b);
        guard.register(&a);
        assert_eq!(guard.tracked().len(), 2);

        assert_eq!(guard.cleanup(), 1);
        assert!(!a.exists());
        assert!(guard.tracked().is_empty());
    }

    #[test]
    fn drop_cleans_up() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        fs::write(&a, b"x").unwrap();
        {
            let guard = TempArtifacts::new();
            guard.register(&a);
        }
        assert!(!a.exists());
    }

    #[test]
    fn released_paths_survive() {
        let dir = tempdir().unwrap();
        let keep = dir.path().join("out.mp4");
        fs::write(&keep, b"x").unwrap();

        let guard = TempArtifacts::new();
        guard.register(&keep);
        assert!(guard.release(&keep));
        drop(guard);
        assert!(keep.exists());
    }

    #[test]
    fn cleanup_runs_during_panic() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.mp4");
        fs::write(&a, b"x").unwrap();

        let path = a.clone();
        let result = std::panic::catch_unwind(move || {
            let guard = TempArtifacts::new();
            guard.register(&path);
            panic!("boom");
        });
        assert!(result.is_err());
        assert!(!a.exists());
    }
}
