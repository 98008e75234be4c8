//! Directory listings.

use std::io::ErrorKind;

use serde::Serialize;
use tracing::debug;

use crate::config::Config;
use crate::error::ServeError;
use crate::resolve::ResolvedPath;
use crate::root::ServerRoot;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
}

/// One direct child of a listed directory
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    /// Path relative to the root, `/`-separated
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl ListingEntry {
    pub fn is_dir(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Listing {
    /// Listed directory, relative to the root
    pub path: String,
    /// Parent directory relative to the root; `None` at the root
    pub parent: Option<String>,
    pub entries: Vec<ListingEntry>,
}

/// List the direct children of `dir`, sorted byte-wise by name.
///
/// Symlinks are classified by what they point at. Names that are not valid
/// UTF-8 are skipped since they cannot be linked to.
pub fn list_directory(
    root: &ServerRoot,
    dir: &ResolvedPath,
    config: &Config,
) -> Result<Listing, ServeError> {
    let entries = std::fs::read_dir(dir.as_path()).map_err(|err| match err.kind() {
        ErrorKind::NotFound => ServeError::NotFound(dir.relative().to_string()),
        _ => ServeError::Io(err),
    })?;

    let mut listed = Vec::new();
    for entry in entries {
        let entry = entry.map_err(ServeError::Io)?;

        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                debug!("Skipping non UTF-8 entry {:?} in {:?}", raw, dir.as_path());
                continue;
            }
        };

        if !config.is_listed(&name) {
            continue;
        }

        let entry_type = if entry.path().is_dir() {
            EntryType::Directory
        } else {
            EntryType::File
        };

        listed.push(ListingEntry {
            path: child_path(dir.relative(), &name),
            name,
            entry_type,
        });
    }

    listed.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));

    Ok(Listing {
        path: dir.relative().to_string(),
        parent: parent_of(root, dir),
        entries: listed,
    })
}

fn child_path(parent: &str, name: &str) -> String {
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", parent, name)
    }
}

/// Root-relative parent of `dir`, or `None` at the root or if the parent
/// would not lie under `root`.
fn parent_of(root: &ServerRoot, dir: &ResolvedPath) -> Option<String> {
    if dir.is_root() {
        return None;
    }

    let parent = dir.as_path().parent()?;
    if !parent.starts_with(root.as_path()) {
        return None;
    }

    Some(
        dir.relative()
            .rsplit_once('/')
            .map(|(parent, _)| parent.to_string())
            .unwrap_or_default(),
    )
}
