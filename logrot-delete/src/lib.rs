//! Pattern-based deletion of stale log files for logrot.
//!
//! This crate provides:
//! - Path patterns with an optional `{...}` date token embedded in the file name
//! - Natural-language and ISO-8601 age intervals, plus absolute cutoffs
//! - Age and callback predicates over matched entries
//! - Safe-root guarded recursive directory removal

pub mod deletion;
pub mod error;
pub mod interval;
pub mod pattern;
pub mod predicate;
pub mod safe_delete;

pub use deletion::Deletion;
pub use error::DeleteError;
pub use interval::{parse_instant, Interval, IntervalError, Threshold};
pub use pattern::{MatchedEntry, Matches, PathMatcher, PatternError};
pub use predicate::{AgeBasis, EntryPredicate, OlderThan};
pub use safe_delete::{Removal, SafeDeleter};
