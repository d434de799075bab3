//! Numbered log rotation for logrot.
//!
//! This crate provides:
//! - Rotation chain shifting (`app.log` -> `app.log.1` -> `app.log.2` ...)
//! - Keep-count retention
//! - Size-based rotation triggers with binary unit suffixes

pub mod rotation;
pub mod size;
pub mod trigger;

pub use rotation::{count_numbered, numbered_path, rotate_chain, RotateError, Rotation};
pub use size::{parse_size, SizeError};
pub use trigger::TriggerPolicy;
