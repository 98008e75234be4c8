//! The active server root.
//!
//! A single process-wide cell holding the directory currently exposed to
//! clients. Requests take one [`ServerRoot`] snapshot at entry and use it for
//! the rest of the request; a root change swaps the whole value, so readers
//! never see a partially updated root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{info, warn};

use crate::error::ServeError;

/// An absolute, canonical directory path that was an existing directory when
/// it was installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRoot(Arc<PathBuf>);

impl ServerRoot {
    /// Validate `path` and build a root from its canonical form.
    pub fn open(path: &Path) -> Result<Self, ServeError> {
        let canonical = path.canonicalize().map_err(|err| {
            warn!("Rejected root {:?}: {}", path, err);
            ServeError::InvalidRoot(path.display().to_string())
        })?;

        if !canonical.is_dir() {
            warn!("Rejected root {:?}: not a directory", canonical);
            return Err(ServeError::InvalidRoot(path.display().to_string()));
        }

        Ok(Self(Arc::new(canonical)))
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ServerRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Shared cell holding the current [`ServerRoot`].
#[derive(Debug)]
pub struct RootState {
    current: RwLock<ServerRoot>,
}

impl RootState {
    pub fn new(initial: ServerRoot) -> Self {
        Self {
            current: RwLock::new(initial),
        }
    }

    /// Snapshot of the current root.
    pub fn get(&self) -> ServerRoot {
        // The cell only ever holds a complete value, so a poisoned lock is still usable.
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Replace the root with `candidate`.
    ///
    /// Relative candidates are joined onto the current root. On failure the
    /// previous root stays active.
    pub fn set(&self, candidate: &str) -> Result<ServerRoot, ServeError> {
        if candidate.trim().is_empty() {
            return Err(ServeError::MissingRoot);
        }
        if candidate.contains('\0') {
            return Err(ServeError::InvalidRoot(candidate.replace('\0', "")));
        }

        let requested = Path::new(candidate);
        let absolute = if requested.is_absolute() {
            requested.to_path_buf()
        } else {
            self.get().as_path().join(requested)
        };

        let root = ServerRoot::open(&absolute)?;

        let mut current = self
            .current
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        info!("Server root changed: {} -> {}", current, root);
        *current = root.clone();

        Ok(root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn state_for(dir: &TempDir) -> RootState {
        RootState::new(ServerRoot::open(dir.path()).unwrap())
    }

    #[test]
    fn test_open_canonicalizes() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::create_dir(temp_dir.path().join("sub")).unwrap();

        let root = ServerRoot::open(&temp_dir.path().join("sub/../sub/.")).unwrap();
        assert_eq!(
            root.as_path(),
            temp_dir.path().join("sub").canonicalize().unwrap()
        );
    }

    #[test]
    fn test_open_rejects_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("a.txt");
        std::fs::write(&file, "a").unwrap();

        assert!(matches!(
            ServerRoot::open(&file),
            Err(ServeError::InvalidRoot(_))
        ));
    }

    #[test]
    fn test_set_to_existing_directory() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let state = state_for(&first);

        let installed = state.set(&second.path().display().to_string()).unwrap();
        assert_eq!(installed.as_path(), second.path().canonicalize().unwrap());
        assert_eq!(state.get(), installed);
    }

    #[test]
    fn test_set_missing_keeps_previous_root() {
        let first = TempDir::new().unwrap();
        let state = state_for(&first);
        let before = state.get();

        let missing = first.path().join("does-not-exist");
        let result = state.set(&missing.display().to_string());

        assert!(matches!(result, Err(ServeError::InvalidRoot(_))));
        assert_eq!(state.get(), before);
    }

    #[test]
    fn test_set_empty_is_missing_root() {
        let first = TempDir::new().unwrap();
        let state = state_for(&first);

        assert!(matches!(state.set(""), Err(ServeError::MissingRoot)));
        assert!(matches!(state.set("   "), Err(ServeError::MissingRoot)));
    }

    #[test]
    fn test_set_keeps_surrounding_whitespace() {
        let first = TempDir::new().unwrap();
        std::fs::create_dir(first.path().join(" padded ")).unwrap();
        let state = state_for(&first);

        let installed = state.set(" padded ").unwrap();
        assert_eq!(
            installed.as_path(),
            first.path().join(" padded ").canonicalize().unwrap()
        );

        let absolute = first.path().join(" padded ").display().to_string();
        assert_eq!(state.set(&absolute).unwrap(), installed);
    }

    #[test]
    fn test_set_relative_joins_current_root() {
        let first = TempDir::new().unwrap();
        std::fs::create_dir(first.path().join("nested")).unwrap();
        let state = state_for(&first);

        let installed = state.set("nested").unwrap();
        assert_eq!(
            installed.as_path(),
            first.path().join("nested").canonicalize().unwrap()
        );

        // Relative climbs are allowed here; the new root is validated, not confined.
        let back = state.set("..").unwrap();
        assert_eq!(back.as_path(), first.path().canonicalize().unwrap());
    }

    #[test]
    fn test_concurrent_readers_see_whole_roots() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let state = Arc::new(state_for(&first));
        let valid = [
            first.path().canonicalize().unwrap(),
            second.path().canonicalize().unwrap(),
        ];
        let targets = [
            first.path().display().to_string(),
            second.path().display().to_string(),
        ];

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let state = Arc::clone(&state);
                let valid = &valid;
                scope.spawn(move || {
                    for _ in 0..200 {
                        let snapshot = state.get();
                        assert!(valid.iter().any(|v| v == snapshot.as_path()));
                    }
                });
            }

            for i in 0..50 {
                state.set(&targets[i % 2]).unwrap();
            }
        });
    }

    #[test]
    fn test_snapshot_survives_change() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let state = state_for(&first);

        let snapshot = state.get();
        state.set(&second.path().display().to_string()).unwrap();

        assert_eq!(snapshot.as_path(), first.path().canonicalize().unwrap());
        assert_ne!(snapshot, state.get());
    }
}
