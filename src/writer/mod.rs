use crate::error::{BridgeError, BridgeResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// An in-memory project: named byte blobs plus directories that must exist
/// even when empty. Paths are relative to the output root.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ProjectTree {
    files: BTreeMap<PathBuf, Vec<u8>>,
    dirs: BTreeSet<PathBuf>,
}

impl ProjectTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a file
    pub fn add_file(&mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), contents.into());
    }

    /// Register a directory that is created even if no file lands in it
    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        self.dirs.insert(path.into());
    }

    pub fn file(&self, path: impl AsRef<Path>) -> Option<&[u8]> {
        self.files.get(path.as_ref()).map(Vec::as_slice)
    }

    /// File contents as UTF-8 text
    pub fn file_text(&self, path: impl AsRef<Path>) -> Option<&str> {
        self.file(path).and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    pub fn files(&self) -> impl Iterator<Item = (&Path, &[u8])> {
        self.files.iter().map(|(p, c)| (p.as_path(), c.as_slice()))
    }

    pub fn dirs(&self) -> impl Iterator<Item = &Path> {
        self.dirs.iter().map(PathBuf::as_path)
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }
}

/// Write a project tree below `root`, creating directories as needed.
///
/// Existing files are overwritten. The first failure aborts the write and
/// leaves whatever was already written in place.
pub fn write_project_tree(root: &Path, tree: &ProjectTree) -> BridgeResult<()> {
    create_dir(root)?;

    for dir in tree.dirs() {
        create_dir(&root.join(dir))?;
    }

    for (relative, contents) in tree.files() {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            create_dir(parent)?;
        }
        fs::write(&path, contents).map_err(|source| BridgeError::Write {
            path: path.clone(),
            source,
        })?;
        debug!("Wrote {}", path.display());
    }

    Ok(())
}

fn create_dir(path: &Path) -> BridgeResult<()> {
    fs::create_dir_all(path).map_err(|source| BridgeError::Write {
        path: path.to_path_buf(),
        source,
    })
}
