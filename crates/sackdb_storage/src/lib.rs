//! # SackDB Storage
//!
//! Sack file handle for SackDB.
//!
//! This crate provides the lowest-level file access for SackDB. The sack file
//! is treated as an **opaque, append-only byte store** - this crate does not
//! interpret the records it holds.
//!
//! ## Design Principles
//!
//! - No held-open handles: every call opens, uses, and closes the file
//! - Appends report where they started and where they ended
//! - The file is never rewritten in place; [`SackFile::reset`] truncates it whole
//! - SackDB core owns all record format interpretation
//!
//! ## Example
//!
//! ```no_run
//! use sackdb_storage::SackFile;
//!
//! let sack = SackFile::new("cache.sack");
//! sack.ensure_exists().unwrap();
//!
//! let appender = sack.open_append().unwrap();
//! let start = appender.start();
//! let end = appender.write_all_and_flush(b"hello world").unwrap();
//! assert_eq!(end - start, 11);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;

pub use error::{StorageError, StorageResult};
pub use file::{SackAppender, SackFile};
