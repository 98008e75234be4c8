//! Request path resolution.
//!
//! Maps an untrusted, percent-encoded request path onto a filesystem path that
//! is provably inside the server root. [`ResolvedPath`] can only be built here,
//! so every component that touches the filesystem goes through this check.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::ServeError;
use crate::root::ServerRoot;

/// A canonical filesystem path confined to the root it was resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    path: PathBuf,
    relative: String,
}

impl ResolvedPath {
    pub fn as_path(&self) -> &Path {
        &self.path
    }

    /// Path relative to the root, `/`-separated, empty for the root itself.
    pub fn relative(&self) -> &str {
        &self.relative
    }

    pub fn is_root(&self) -> bool {
        self.relative.is_empty()
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// Resolve a raw (still percent-encoded) request path against `root`.
pub fn resolve(root: &ServerRoot, raw: &str) -> Result<ResolvedPath, ServeError> {
    let decoded = decode(raw)?;
    let segments = normalize(&decoded)?;

    let mut candidate = root.as_path().to_path_buf();
    candidate.extend(&segments);

    debug!("Resolving {:?} -> {:?}", raw, candidate);
    confine(root, candidate, &decoded)
}

/// Resolve the destination of a new entry named `name` directly under `root`.
///
/// Unlike [`resolve`], a missing entry is fine. An existing entry (including a
/// symlink) must still canonicalize inside the root.
pub fn resolve_new_entry(root: &ServerRoot, name: &str) -> Result<ResolvedPath, ServeError> {
    let segments = normalize(name)?;
    let [name] = segments.as_slice() else {
        return Err(ServeError::MalformedPath(name.to_string()));
    };

    let candidate = root.as_path().join(name);
    match std::fs::symlink_metadata(&candidate) {
        Ok(_) => confine(root, candidate, name),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(ResolvedPath {
            path: candidate,
            relative: (*name).to_string(),
        }),
        Err(err) => Err(ServeError::Io(err)),
    }
}

/// Percent-decode a request path.
pub fn decode(raw: &str) -> Result<String, ServeError> {
    let decoded = urlencoding::decode(raw)
        .map_err(|_| ServeError::MalformedPath(raw.to_string()))?
        .into_owned();

    if decoded.contains('\0') {
        warn!("Path contains null byte: {:?}", raw);
        return Err(ServeError::MalformedPath(raw.to_string()));
    }

    Ok(decoded)
}

/// Lexically normalize a decoded relative path into plain name segments.
///
/// Empty and `.` segments are dropped and `..` removes the previous segment.
/// A `..` with nothing left to remove would climb above the root and is
/// rejected before anything is joined.
pub fn normalize(relative: &str) -> Result<Vec<&str>, ServeError> {
    let mut segments = Vec::new();

    for segment in relative.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                if segments.pop().is_none() {
                    warn!("Path traversal attempt: {:?} climbs above root", relative);
                    return Err(ServeError::AccessDenied);
                }
            }
            name => {
                // Anything the host would not read as one plain name (drive
                // prefixes, alternate separators) is refused.
                let mut components = Path::new(name).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(_)), None) => segments.push(name),
                    _ => return Err(ServeError::MalformedPath(relative.to_string())),
                }
            }
        }
    }

    Ok(segments)
}

/// Canonicalize `candidate` and prove it lies under `root`.
fn confine(
    root: &ServerRoot,
    candidate: PathBuf,
    requested: &str,
) -> Result<ResolvedPath, ServeError> {
    let root_path = root.as_path();

    match candidate.canonicalize() {
        Ok(canonical) => {
            // strip_prefix compares whole components, so /srv/public never
            // matches /srv/public-secret.
            let Ok(relative) = canonical.strip_prefix(root_path) else {
                warn!(
                    "Symlink escape attempt: {:?} resolved to {:?} which is outside {:?}",
                    candidate, canonical, root_path
                );
                return Err(ServeError::AccessDenied);
            };
            let relative = relative_string(relative);
            Ok(ResolvedPath {
                path: canonical,
                relative,
            })
        }
        Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
            Err(classify_missing(root_path, &candidate, requested))
        }
        Err(err) if err.kind() == ErrorKind::PermissionDenied => {
            warn!("Permission denied resolving {:?}", candidate);
            Err(ServeError::AccessDenied)
        }
        // Symlink loops (ELOOP) land here too: the entry is visible but its
        // target can never be verified.
        Err(err) => match classify_missing(root_path, &candidate, requested) {
            ServeError::NotFound(_) => Err(ServeError::Io(err)),
            denied => Err(denied),
        },
    }
}

/// Decide how to report a candidate that could not be canonicalized.
///
/// The deepest existing ancestor decides: if it lies inside the root the entry
/// is simply missing, otherwise a symlink led outside (or dangles) and the
/// request is denied whether or not the outside target exists.
fn classify_missing(root_path: &Path, candidate: &Path, requested: &str) -> ServeError {
    let existing = candidate
        .ancestors()
        .find(|ancestor| std::fs::symlink_metadata(ancestor).is_ok());

    let Some(ancestor) = existing else {
        return ServeError::NotFound(requested.to_string());
    };

    // The root itself (or something above it) is the deepest thing left.
    if root_path.starts_with(ancestor) {
        return ServeError::NotFound(requested.to_string());
    }

    match ancestor.canonicalize() {
        Ok(canonical) if canonical.starts_with(root_path) => {
            ServeError::NotFound(requested.to_string())
        }
        _ => {
            warn!(
                "Unverifiable or escaping path: {:?} (via {:?})",
                candidate, ancestor
            );
            ServeError::AccessDenied
        }
    }
}

/// Join the normal components of `relative` with `/`.
fn relative_string(relative: &Path) -> String {
    let mut parts = Vec::new();
    for component in relative.components() {
        if let Component::Normal(part) = component {
            parts.push(part.to_string_lossy().to_string());
        }
    }
    parts.join("/")
}
