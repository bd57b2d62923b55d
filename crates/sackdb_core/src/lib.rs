//! # SackDB Core
//!
//! An append-only object store in a single "sack" file.
//!
//! This crate provides:
//! - The record codec for the sack file format
//! - An in-memory key index, rebuilt by scan or extended on write
//! - Optional AES-CBC encryption of payloads at rest
//! - The [`Store`], with blocking and non-blocking put/get
//!
//! ## Example
//!
//! ```no_run
//! use sackdb_core::{KeyMaterial, Store, StoreConfig};
//!
//! let config = StoreConfig::for_path("/tmp/store.sack")
//!     .encryption(true)
//!     .key_material(KeyMaterial::generate());
//! let store = Store::with_config(config);
//!
//! store.reload()?;
//! store.put("hello.txt", b"Hello")?;
//! assert_eq!(store.get("hello.txt")?, b"Hello");
//! # Ok::<(), sackdb_core::CoreError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod crypto;
mod error;
mod index;
pub mod record;
mod store;

pub use config::{StoreConfig, DEFAULT_SACK_NAME};
pub use crypto::KeyMaterial;
pub use error::{CoreError, CoreResult};
pub use index::SackIndex;
pub use record::{SackEntry, SackRecord};
pub use store::{Listing, Store};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
