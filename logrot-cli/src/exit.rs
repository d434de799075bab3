//! Exit codes for the logrot CLI.

use logrot_rotate::RotateError;

use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Invalid arguments.
    pub const INVALID_ARGS: i32 = 1;
    /// IO error.
    pub const IO_ERROR: i32 = 2;
    /// Invalid rotation or deletion configuration.
    pub const CONFIG_ERROR: i32 = 3;
    /// Recursive deletion outside every safe root was refused.
    pub const SAFETY_VIOLATION: i32 = 4;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::Rotate(RotateError::Filesystem(_)) => codes::IO_ERROR,
        CommandError::Rotate(_) => codes::CONFIG_ERROR,
        CommandError::Delete(e) if e.is_safety_violation() => codes::SAFETY_VIOLATION,
        CommandError::Delete(e) if e.is_configuration() => codes::CONFIG_ERROR,
        CommandError::Delete(_) => codes::IO_ERROR,
    }
}
