//! logrot CLI.
//!
//! This crate provides the command-line interface for log rotation and
//! stale log deletion. It handles argument parsing, validation, command
//! execution and exit-code mapping.

pub mod cli;
pub mod commands;
pub mod exit;
pub mod logger;

pub use cli::{
    parse_from, AgeBasisArg, Cli, CliError, Command, DeleteArgs, RotateArgs, DEFAULT_AGE_BASIS,
    DEFAULT_DIR,
};
pub use commands::{execute_delete, execute_rotate, CommandError, CommandResult};
pub use logger::{Logger, MockLogger, NullLogger, StderrLogger, Verbosity};
