//! Numbered log file rotation.
//!
//! A base file `app.log` rotates into a chain `app.log.1`, `app.log.2`, ...
//! where `.1` is always the most recently rotated file. Retention is bounded
//! by an optional keep count.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use logrot_fs::{Filesystem, FsError, RealFilesystem};
use thiserror::Error;

use crate::size::{parse_size, SizeError};
use crate::trigger::TriggerPolicy;

/// Errors from a rotation run.
#[derive(Debug, Error)]
pub enum RotateError {
    #[error("no filename to rotate")]
    MissingFilename,

    #[error("invalid size threshold: {0}")]
    InvalidSize(#[from] SizeError),

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
}

/// Path of the `index`-th rotated sibling of `base`, e.g. `app.log.3`.
pub fn numbered_path(base: &Path, index: usize) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(format!(".{}", index));
    PathBuf::from(name)
}

/// Count the contiguous numbered siblings of `base`, probing `.1`, `.2`, ...
/// until the first index that does not exist.
pub fn count_numbered<F: Filesystem>(fs: &F, base: &Path) -> Result<usize, FsError> {
    let mut count = 0;
    while fs.metadata(&numbered_path(base, count + 1))?.is_some() {
        count += 1;
    }
    Ok(count)
}

/// Shift the rotation chain of `base` by one.
///
/// Numbered files at or beyond `keep` are removed, every remaining numbered
/// file moves from `N` to `N + 1` (highest first, so nothing is overwritten),
/// and the base file becomes `.1`. With `keep == Some(0)` the base file is
/// removed instead.
///
/// Returns the source path of every file removed or renamed. A missing base
/// file makes this a no-op. In dry-run mode nothing is touched but the same
/// paths are returned.
pub fn rotate_chain<F: Filesystem>(
    fs: &F,
    base: &Path,
    keep: Option<usize>,
    dry_run: bool,
) -> Result<Vec<PathBuf>, FsError> {
    if fs.metadata(base)?.is_none() {
        return Ok(Vec::new());
    }

    let count = count_numbered(fs, base)?;
    let mut affected = Vec::with_capacity(count + 1);

    let mut highest = count;
    if let Some(keep) = keep {
        for index in (keep.max(1)..=count).rev() {
            let path = numbered_path(base, index);
            if !dry_run {
                fs.remove_file(&path)?;
            }
            affected.push(path);
        }
        highest = count.min(keep.saturating_sub(1));
    }

    for index in (1..=highest).rev() {
        let from = numbered_path(base, index);
        if !dry_run {
            fs.rename(&from, &numbered_path(base, index + 1))?;
        }
        affected.push(from);
    }

    if !dry_run {
        if keep == Some(0) {
            fs.remove_file(base)?;
        } else {
            fs.rename(base, &numbered_path(base, 1))?;
        }
    }
    affected.push(base.to_path_buf());

    Ok(affected)
}

/// A rotation job for one base file.
///
/// Built with chained setters and executed with [`Rotation::run`], which can
/// be called repeatedly.
#[derive(Debug, Clone)]
pub struct Rotation<F: Filesystem = RealFilesystem> {
    fs: F,
    dir: PathBuf,
    filename: String,
    keep: Option<usize>,
    trigger: TriggerPolicy,
    dry_run: bool,
}

impl Rotation<RealFilesystem> {
    /// Rotate `filename` relative to the current directory on the real filesystem.
    pub fn new(filename: impl Into<String>) -> Self {
        Self::with_filesystem(RealFilesystem, filename)
    }
}

impl<F: Filesystem> Rotation<F> {
    /// Rotate `filename` on the given filesystem.
    pub fn with_filesystem(fs: F, filename: impl Into<String>) -> Self {
        Self {
            fs,
            dir: PathBuf::from("."),
            filename: filename.into(),
            keep: None,
            trigger: TriggerPolicy::Always,
            dry_run: false,
        }
    }

    /// Resolve the filename against `dir` instead of `.`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    /// Keep at most `count` numbered files.
    pub fn keep(mut self, count: usize) -> Self {
        self.keep = Some(count);
        self
    }

    /// Only rotate once the base file reaches `size`, e.g. `"25KB"`.
    pub fn size(self, size: &str) -> Result<Self, RotateError> {
        let bytes = parse_size(size)?;
        Ok(self.size_bytes(bytes))
    }

    /// Only rotate once the base file reaches `bytes`.
    pub fn size_bytes(mut self, bytes: u64) -> Self {
        self.trigger = TriggerPolicy::MinSize(bytes);
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Path of the base file.
    pub fn base_path(&self) -> PathBuf {
        self.dir.join(&self.filename)
    }

    pub fn keep_count(&self) -> Option<usize> {
        self.keep
    }

    pub fn trigger(&self) -> TriggerPolicy {
        self.trigger
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run the rotation, returning every path removed or renamed.
    pub fn run(&self) -> Result<Vec<PathBuf>, RotateError> {
        if self.filename.trim().is_empty() {
            return Err(RotateError::MissingFilename);
        }

        let base = self.base_path();
        if !self.trigger.should_rotate(&self.fs, &base)? {
            return Ok(Vec::new());
        }

        Ok(rotate_chain(&self.fs, &base, self.keep, self.dry_run)?)
    }
}
