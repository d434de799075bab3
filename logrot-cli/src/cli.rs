//! CLI argument parsing for logrot.
//!
//! Provides the `rotate` and `delete` subcommands of the `logrot` binary.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use logrot_delete::{parse_instant, AgeBasis, PathMatcher, Threshold};
use logrot_rotate::parse_size;
use thiserror::Error;

/// Default directory files and patterns are resolved against.
pub const DEFAULT_DIR: &str = ".";

/// Default timestamp used to age matched entries.
pub const DEFAULT_AGE_BASIS: AgeBasisArg = AgeBasisArg::Filename;

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("file to rotate must not be empty")]
    EmptyFile,

    #[error("invalid size {0:?}: expected a number with an optional B/K/M/G/T unit")]
    InvalidSize(String),

    #[error("invalid pattern {0:?}: {1}")]
    InvalidPattern(String, String),

    #[error("invalid --older-than {0:?}: expected an interval such as \"1 month\" or a date")]
    InvalidThreshold(String),

    #[error("invalid --now {0:?}: expected an RFC 3339 timestamp or a date")]
    InvalidNow(String),

    #[error("--safe-root must be an absolute path, got {0}")]
    RelativeSafeRoot(PathBuf),
}

/// logrot - numbered log rotation and stale log cleanup.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "logrot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Rotate a log file into numbered siblings.
    Rotate(RotateArgs),
    /// Delete entries matching a pattern once they are old enough.
    Delete(DeleteArgs),
}

/// Which timestamp `delete` ages entries by.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBasisArg {
    /// Date embedded in the name, falling back to modification time.
    Filename,
    /// Filesystem modification time.
    Modified,
}

impl From<AgeBasisArg> for AgeBasis {
    fn from(arg: AgeBasisArg) -> Self {
        match arg {
            AgeBasisArg::Filename => AgeBasis::FilenameTime,
            AgeBasisArg::Modified => AgeBasis::ModifiedTime,
        }
    }
}

/// Arguments for the rotate command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct RotateArgs {
    /// Name of the log file to rotate.
    pub file: String,

    /// Directory containing the log file.
    #[arg(short, long, default_value = DEFAULT_DIR)]
    pub dir: PathBuf,

    /// Maximum number of numbered files to keep. Keeps all when omitted.
    #[arg(short, long)]
    pub keep: Option<usize>,

    /// Only rotate once the file reaches this size (e.g. 25KB, 10M).
    #[arg(short, long)]
    pub size: Option<String>,

    /// Report what would change without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl RotateArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        if self.file.trim().is_empty() {
            return Err(CliError::EmptyFile);
        }
        self.size_bytes()?;
        Ok(())
    }

    /// The size threshold in bytes, if one was given.
    pub fn size_bytes(&self) -> Result<Option<u64>, CliError> {
        self.size
            .as_deref()
            .map(|s| parse_size(s).map_err(|_| CliError::InvalidSize(s.to_string())))
            .transpose()
    }
}

/// Arguments for the delete command.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
pub struct DeleteArgs {
    /// Pattern to match, e.g. `payment.{Ymd}.log` or `archive/*.log`.
    pub pattern: String,

    /// Age threshold: an interval ("1 month", "7d", "P1W") or an absolute date.
    #[arg(long)]
    pub older_than: String,

    /// Timestamp used to age matched entries.
    #[arg(long, value_enum, default_value_t = DEFAULT_AGE_BASIS)]
    pub by: AgeBasisArg,

    /// Directory the pattern is resolved against.
    #[arg(short, long, default_value = DEFAULT_DIR)]
    pub dir: PathBuf,

    /// Reference time instead of the current time.
    #[arg(long)]
    pub now: Option<String>,

    /// Absolute directory under which recursive deletion is allowed. Repeatable.
    #[arg(long = "safe-root")]
    pub safe_roots: Vec<PathBuf>,

    /// Report what would be deleted without touching the filesystem.
    #[arg(long)]
    pub dry_run: bool,

    /// Increase output verbosity (-v, -vv).
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl DeleteArgs {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        PathMatcher::new(&self.pattern, &self.dir)
            .map_err(|e| CliError::InvalidPattern(self.pattern.clone(), e.to_string()))?;
        self.threshold()?;
        self.fixed_now()?;
        if let Some(root) = self.safe_roots.iter().find(|r| !r.is_absolute()) {
            return Err(CliError::RelativeSafeRoot(root.clone()));
        }
        Ok(())
    }

    pub fn threshold(&self) -> Result<Threshold, CliError> {
        self.older_than
            .parse()
            .map_err(|_| CliError::InvalidThreshold(self.older_than.clone()))
    }

    /// The fixed reference time, if `--now` was given.
    pub fn fixed_now(&self) -> Result<Option<DateTime<Utc>>, CliError> {
        self.now
            .as_deref()
            .map(|s| parse_instant(s).ok_or_else(|| CliError::InvalidNow(s.to_string())))
            .transpose()
    }
}

/// Parse CLI arguments from an iterator (for testing).
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}
