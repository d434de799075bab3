//! Error types for deletion.

use std::path::PathBuf;

use logrot_fs::FsError;
use thiserror::Error;

use crate::interval::IntervalError;
use crate::pattern::PatternError;

/// Errors that can occur during a deletion run.
#[derive(Debug, Error)]
pub enum DeleteError {
    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error("invalid time threshold: {0}")]
    Interval(#[from] IntervalError),

    #[error("safe recursive delete root must be an absolute path: {0}")]
    RelativeSafeRoot(PathBuf),

    #[error("refusing to recursively delete {path}: not under a safe recursive delete root")]
    SafetyViolation { path: PathBuf },

    #[error("filesystem error: {0}")]
    Filesystem(#[from] FsError),
}

impl DeleteError {
    /// Whether the error comes from invalid input rather than the filesystem.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DeleteError::Pattern(_) | DeleteError::Interval(_) | DeleteError::RelativeSafeRoot(_)
        )
    }

    pub fn is_safety_violation(&self) -> bool {
        matches!(self, DeleteError::SafetyViolation { .. })
    }
}
