//! Filesystem abstraction for logrot.
//!
//! This crate provides:
//! - Filesystem trait for the stat/list/rename/unlink primitives rotation and deletion use
//! - RealFilesystem backed by `std::fs`
//! - MockFilesystem, an in-memory implementation for tests

pub mod filesystem;

pub use filesystem::{
    EntryKind, EntryMetadata, Filesystem, FsError, MockFilesystem, RealFilesystem,
};
