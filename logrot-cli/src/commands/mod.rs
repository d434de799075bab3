//! Command orchestration for CLI subcommands.
//!
//! Provides execute functions for:
//! - `rotate` - Rotate a log file into numbered siblings
//! - `delete` - Delete stale entries matching a pattern

pub mod delete;
pub mod rotate;

pub use delete::execute_delete;
pub use rotate::execute_rotate;

use logrot_delete::DeleteError;
use logrot_rotate::RotateError;
use thiserror::Error;

use crate::cli::CliError;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("rotation failed: {0}")]
    Rotate(#[from] RotateError),

    #[error("deletion failed: {0}")]
    Delete(#[from] DeleteError),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

/// Prefix for an affected path, depending on whether the run was simulated.
pub(crate) fn action_label(dry_run: bool, done: &'static str, planned: &'static str) -> &'static str {
    if dry_run {
        planned
    } else {
        done
    }
}
