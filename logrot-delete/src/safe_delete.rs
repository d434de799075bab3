//! Deletion of matched entries with guarded recursive directory removal.
//!
//! Files and symlinks are unlinked directly. A directory is only removed
//! recursively when its canonical path is at or below one of the registered
//! safe roots. The whole batch is planned, safety checks included, before
//! the first entry is touched, so a violation leaves the filesystem as it was.

use std::path::{Path, PathBuf};

use logrot_fs::Filesystem;

use crate::error::DeleteError;
use crate::pattern::MatchedEntry;

/// One planned removal, in execution order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Removal {
    File(PathBuf),
    Dir(PathBuf),
}

impl Removal {
    pub fn path(&self) -> &Path {
        match self {
            Removal::File(path) | Removal::Dir(path) => path,
        }
    }

    fn into_path(self) -> PathBuf {
        match self {
            Removal::File(path) | Removal::Dir(path) => path,
        }
    }
}

/// Deletes matched entries, enforcing the safe-root rule for directories.
#[derive(Debug, Clone, Default)]
pub struct SafeDeleter {
    roots: Vec<PathBuf>,
}

impl SafeDeleter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow recursive deletion at or below `root`, which must be absolute.
    pub fn add_root(&mut self, root: impl Into<PathBuf>) -> Result<(), DeleteError> {
        let root = root.into();
        if !root.is_absolute() {
            return Err(DeleteError::RelativeSafeRoot(root));
        }
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
        Ok(())
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Verify that `dir` may be deleted recursively, returning its canonical path.
    ///
    /// Roots that no longer exist are ignored.
    pub fn check_recursive<F: Filesystem>(&self, fs: &F, dir: &Path) -> Result<PathBuf, DeleteError> {
        let canonical = fs.canonicalize(dir)?;
        for root in &self.roots {
            let canonical_root = match fs.canonicalize(root) {
                Ok(path) => path,
                Err(e) if e.is_not_found() => continue,
                Err(e) => return Err(e.into()),
            };
            if canonical.starts_with(&canonical_root) {
                return Ok(canonical);
            }
        }
        Err(DeleteError::SafetyViolation { path: canonical })
    }

    /// Plan the removal of `entries` without touching the filesystem.
    ///
    /// Directory contents are listed depth-first, children before their
    /// parent. Symlinks are never followed.
    pub fn plan<F: Filesystem>(
        &self,
        fs: &F,
        entries: &[MatchedEntry],
    ) -> Result<Vec<Removal>, DeleteError> {
        let mut removals = Vec::new();
        for entry in entries {
            if entry.is_dir() {
                let canonical = self.check_recursive(fs, &entry.path)?;
                collect_tree(fs, &canonical, &mut removals)?;
            } else {
                removals.push(Removal::File(entry.path.clone()));
            }
        }
        Ok(removals)
    }

    /// Delete `entries`, returning every removed path.
    ///
    /// In dry-run mode the plan is computed, safety checks included, and
    /// returned without executing it.
    pub fn delete<F: Filesystem>(
        &self,
        fs: &F,
        entries: &[MatchedEntry],
        dry_run: bool,
    ) -> Result<Vec<PathBuf>, DeleteError> {
        let removals = self.plan(fs, entries)?;
        if !dry_run {
            for removal in &removals {
                match removal {
                    Removal::File(path) => fs.remove_file(path)?,
                    Removal::Dir(path) => fs.remove_dir(path)?,
                }
            }
        }
        Ok(removals.into_iter().map(Removal::into_path).collect())
    }
}

/// Append the removals for `dir` and everything under it.
fn collect_tree<F: Filesystem>(
    fs: &F,
    dir: &Path,
    removals: &mut Vec<Removal>,
) -> Result<(), DeleteError> {
    for child in fs.list_dir(dir)? {
        match fs.metadata(&child)? {
            Some(meta) if meta.is_dir() => collect_tree(fs, &child, removals)?,
            Some(_) => removals.push(Removal::File(child)),
            None => {}
        }
    }
    removals.push(Removal::Dir(dir.to_path_buf()));
    Ok(())
}
