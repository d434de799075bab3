//! Pattern-driven deletion jobs.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use logrot_clock::{Clock, SystemClock};
use logrot_fs::{Filesystem, RealFilesystem};

use crate::error::DeleteError;
use crate::interval::Threshold;
use crate::pattern::{MatchedEntry, PathMatcher};
use crate::predicate::{AgeBasis, EntryPredicate, OlderThan};
use crate::safe_delete::SafeDeleter;

/// A deletion job: a pattern, a base directory and the rules for what may go.
///
/// Unless fixed with [`Deletion::set_now`], "now" is read from the clock on
/// every evaluation.
#[derive(Debug, Clone)]
pub struct Deletion<F: Filesystem = RealFilesystem, C: Clock = SystemClock> {
    fs: F,
    clock: C,
    pattern: String,
    dir: PathBuf,
    dry_run: bool,
    now: Option<DateTime<Utc>>,
    deleter: SafeDeleter,
}

impl Deletion<RealFilesystem, SystemClock> {
    /// Delete entries matching `pattern` relative to the current directory.
    pub fn new(pattern: impl Into<String>) -> Self {
        Self::with_filesystem(RealFilesystem, SystemClock, pattern)
    }
}

impl<F: Filesystem, C: Clock> Deletion<F, C> {
    pub fn with_filesystem(fs: F, clock: C, pattern: impl Into<String>) -> Self {
        Self {
            fs,
            clock,
            pattern: pattern.into(),
            dir: PathBuf::from("."),
            dry_run: false,
            now: None,
            deleter: SafeDeleter::new(),
        }
    }

    /// Resolve the pattern against `dir` instead of `.`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = dir.into();
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn set_dry_run(&mut self, dry_run: bool) -> &mut Self {
        self.dry_run = dry_run;
        self
    }

    /// Fix the reference instant for all later evaluations.
    pub fn set_now(&mut self, now: DateTime<Utc>) -> &mut Self {
        self.now = Some(now);
        self
    }

    /// Permit recursive deletion of directories at or below `root`.
    pub fn add_safe_recursive_delete_root(
        &mut self,
        root: impl Into<PathBuf>,
    ) -> Result<&mut Self, DeleteError> {
        self.deleter.add_root(root)?;
        Ok(self)
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    pub fn safe_roots(&self) -> &[PathBuf] {
        self.deleter.roots()
    }

    /// The reference instant: the fixed one if set, otherwise the clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(|| self.clock.now())
    }

    pub fn matcher(&self) -> Result<PathMatcher, DeleteError> {
        Ok(PathMatcher::new(&self.pattern, &self.dir)?)
    }

    /// All entries currently matching the pattern.
    pub fn matches(&self) -> Result<Vec<MatchedEntry>, DeleteError> {
        let matcher = self.matcher()?;
        let entries = matcher.matches(&self.fs)?.collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }

    /// Delete entries whose filename time is older than `threshold`.
    ///
    /// Without a time token in the pattern the modification time is used.
    pub fn delete_by_filename_time(&self, threshold: &Threshold) -> Result<Vec<PathBuf>, DeleteError> {
        self.delete_older_than(AgeBasis::FilenameTime, threshold)
    }

    /// Delete entries last modified before `threshold`.
    pub fn delete_by_modified_time(&self, threshold: &Threshold) -> Result<Vec<PathBuf>, DeleteError> {
        self.delete_older_than(AgeBasis::ModifiedTime, threshold)
    }

    /// Delete entries selected by an arbitrary predicate.
    pub fn delete_by_callback<P>(&self, predicate: &P) -> Result<Vec<PathBuf>, DeleteError>
    where
        P: EntryPredicate + ?Sized,
    {
        let matcher = self.matcher()?;
        let mut selected = Vec::new();
        for entry in matcher.matches(&self.fs)? {
            let entry = entry?;
            if predicate.evaluate(&entry) {
                selected.push(entry);
            }
        }
        self.deleter.delete(&self.fs, &selected, self.dry_run)
    }

    fn delete_older_than(
        &self,
        basis: AgeBasis,
        threshold: &Threshold,
    ) -> Result<Vec<PathBuf>, DeleteError> {
        // Validate the pattern before doing date arithmetic
        self.matcher()?;
        let cutoff = threshold.cutoff(self.now())?;
        self.delete_by_callback(&OlderThan::new(basis, cutoff))
    }
}
