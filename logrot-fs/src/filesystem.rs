//! Filesystem abstraction for logrot.
//!
//! Rotation and deletion only ever list, stat, rename, unlink and resolve
//! paths. Those primitives live behind [`Filesystem`] so the engines can run
//! against the real disk or an in-memory mock.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors from filesystem operations.
#[derive(Debug, Error)]
pub enum FsError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("path error: {0}")]
    Path(String),
}

impl FsError {
    /// Whether the error means the path does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, FsError::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// Kind of a directory entry. Symlinks are reported as themselves, never followed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    Symlink,
}

/// Metadata of a single entry, as returned by `lstat`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub kind: EntryKind,
    /// Size in bytes.
    pub len: u64,
    /// Last modification time.
    pub modified: DateTime<Utc>,
}

impl EntryMetadata {
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Dir
    }

    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    pub fn is_symlink(&self) -> bool {
        self.kind == EntryKind::Symlink
    }
}

/// Trait for filesystem operations.
/// Abstracted for testing with mock implementations.
pub trait Filesystem: Send + Sync {
    /// Stat a path without following symlinks.
    /// Returns `Ok(None)` if nothing exists at `path`.
    fn metadata(&self, path: &Path) -> Result<Option<EntryMetadata>, FsError>;

    /// List the entries of a directory, one level deep, sorted by path.
    /// `.` and `..` are never included.
    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError>;

    /// Rename `from` to `to`, replacing `to` if it is a file.
    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError>;

    /// Remove a file or symlink.
    fn remove_file(&self, path: &Path) -> Result<(), FsError>;

    /// Remove an empty directory.
    fn remove_dir(&self, path: &Path) -> Result<(), FsError>;

    /// Resolve a path to its absolute, symlink-free form.
    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool {
        matches!(self.metadata(path), Ok(Some(_)))
    }
}

/// Real filesystem implementation.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFilesystem;

impl Filesystem for RealFilesystem {
    fn metadata(&self, path: &Path) -> Result<Option<EntryMetadata>, FsError> {
        let meta = match fs::symlink_metadata(path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let file_type = meta.file_type();
        let kind = if file_type.is_symlink() {
            EntryKind::Symlink
        } else if file_type.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };

        Ok(Some(EntryMetadata {
            kind,
            len: meta.len(),
            modified: DateTime::<Utc>::from(meta.modified()?),
        }))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            paths.push(entry?.path());
        }
        paths.sort();
        Ok(paths)
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        fs::rename(from, to)?;
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path)?;
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_dir(path)?;
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        Ok(fs::canonicalize(path)?)
    }
}

#[derive(Debug, Clone)]
struct MockEntry {
    kind: EntryKind,
    len: u64,
    modified: DateTime<Utc>,
}

/// Mock filesystem for testing.
/// Cloning creates a new handle to the same underlying data.
///
/// Paths are stored exactly as given; parent directories are created
/// implicitly. Canonicalization is lexical and rooted at `/`.
#[derive(Debug, Clone, Default)]
pub struct MockFilesystem {
    entries: Arc<RwLock<BTreeMap<PathBuf, MockEntry>>>,
}

impl MockFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file of `len` bytes modified at the Unix epoch.
    pub fn add_file(&self, path: impl Into<PathBuf>, len: u64) {
        self.add_file_modified(path, len, DateTime::<Utc>::default());
    }

    /// Add a file of `len` bytes with the given modification time.
    pub fn add_file_modified(&self, path: impl Into<PathBuf>, len: u64, modified: DateTime<Utc>) {
        self.insert(path.into(), EntryKind::File, len, modified);
    }

    /// Add an empty directory.
    pub fn add_dir(&self, path: impl Into<PathBuf>) {
        self.insert(path.into(), EntryKind::Dir, 0, DateTime::<Utc>::default());
    }

    /// Add a directory with the given modification time.
    pub fn add_dir_modified(&self, path: impl Into<PathBuf>, modified: DateTime<Utc>) {
        self.insert(path.into(), EntryKind::Dir, 0, modified);
    }

    /// Add a symlink entry. The mock never resolves its target.
    pub fn add_symlink(&self, path: impl Into<PathBuf>) {
        self.insert(path.into(), EntryKind::Symlink, 0, DateTime::<Utc>::default());
    }

    /// Change the modification time of an existing entry.
    pub fn set_modified(&self, path: &Path, modified: DateTime<Utc>) {
        if let Some(entry) = self.entries.write().unwrap().get_mut(path) {
            entry.modified = modified;
        }
    }

    /// All paths currently present, directories included.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.entries.read().unwrap().keys().cloned().collect()
    }

    /// Size of the file at `path`, if present.
    pub fn len_of(&self, path: &Path) -> Option<u64> {
        self.entries.read().unwrap().get(path).map(|e| e.len)
    }

    fn insert(&self, path: PathBuf, kind: EntryKind, len: u64, modified: DateTime<Utc>) {
        let mut entries = self.entries.write().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            entries.entry(ancestor.to_path_buf()).or_insert(MockEntry {
                kind: EntryKind::Dir,
                len: 0,
                modified: DateTime::<Utc>::default(),
            });
        }
        entries.insert(path, MockEntry { kind, len, modified });
    }
}

fn not_found(path: &Path) -> FsError {
    FsError::Io(io::Error::new(
        io::ErrorKind::NotFound,
        format!("not found: {}", path.display()),
    ))
}

/// Resolve `.` and `..` lexically and root the result at `/`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
        }
    }
    out
}

impl Filesystem for MockFilesystem {
    fn metadata(&self, path: &Path) -> Result<Option<EntryMetadata>, FsError> {
        Ok(self
            .entries
            .read()
            .unwrap()
            .get(path)
            .map(|e| EntryMetadata {
                kind: e.kind,
                len: e.len,
                modified: e.modified,
            }))
    }

    fn list_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, FsError> {
        let entries = self.entries.read().unwrap();
        match entries.get(dir) {
            Some(entry) if entry.kind == EntryKind::Dir => {}
            Some(_) => return Err(FsError::Path(format!("not a directory: {}", dir.display()))),
            None => return Err(not_found(dir)),
        }

        // BTreeMap keys are already sorted
        Ok(entries
            .keys()
            .filter(|p| p.parent() == Some(dir))
            .cloned()
            .collect())
    }

    fn rename(&self, from: &Path, to: &Path) -> Result<(), FsError> {
        let mut entries = self.entries.write().unwrap();
        let entry = entries.remove(from).ok_or_else(|| not_found(from))?;

        // Carry a directory's descendants along with it
        let children: Vec<PathBuf> = entries
            .keys()
            .filter(|p| p.starts_with(from))
            .cloned()
            .collect();
        for child in children {
            if let (Some(moved), Ok(rest)) = (entries.remove(&child), child.strip_prefix(from)) {
                entries.insert(to.join(rest), moved);
            }
        }

        entries.insert(to.to_path_buf(), entry);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<(), FsError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get(path) {
            Some(entry) if entry.kind == EntryKind::Dir => Err(FsError::Path(format!(
                "is a directory: {}",
                path.display()
            ))),
            Some(_) => {
                entries.remove(path);
                Ok(())
            }
            None => Err(not_found(path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<(), FsError> {
        let mut entries = self.entries.write().unwrap();
        match entries.get(path) {
            Some(entry) if entry.kind == EntryKind::Dir => {}
            Some(_) => {
                return Err(FsError::Path(format!("not a directory: {}", path.display())))
            }
            None => return Err(not_found(path)),
        }
        if entries.keys().any(|p| p.parent() == Some(path)) {
            return Err(FsError::Path(format!(
                "directory not empty: {}",
                path.display()
            )));
        }
        entries.remove(path);
        Ok(())
    }

    fn canonicalize(&self, path: &Path) -> Result<PathBuf, FsError> {
        if !self.entries.read().unwrap().contains_key(path) {
            return Err(not_found(path));
        }
        Ok(normalize(path))
    }
}
