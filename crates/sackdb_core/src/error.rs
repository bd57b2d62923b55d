//! Error types for SackDB core.

use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in SackDB core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sackdb_storage::StorageError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The key is not present in the index.
    #[error("key not found: {name}")]
    KeyNotFound {
        /// The key that was looked up.
        name: String,
    },

    /// A record header declares more bytes than remain in the sack file.
    #[error("truncated record at offset {offset}: needs {needed} bytes, {available} available")]
    TruncatedRecord {
        /// Offset where the record starts.
        offset: u64,
        /// Bytes the record requires from its start.
        needed: u64,
        /// Bytes remaining in the file from its start.
        available: u64,
    },

    /// A record is structurally invalid.
    #[error("invalid record at offset {offset}: {message}")]
    InvalidRecord {
        /// Offset where the record starts.
        offset: u64,
        /// Description of the problem.
        message: String,
    },

    /// A name or payload does not fit the record's 32-bit length fields.
    #[error("record too large: {field} is {len} bytes")]
    RecordTooLarge {
        /// Which field overflowed.
        field: &'static str,
        /// Actual length in bytes.
        len: usize,
    },

    /// Key or IV has the wrong size for the cipher.
    #[error("invalid key material: {message}")]
    InvalidKeyMaterial {
        /// Description of the problem.
        message: String,
    },

    /// Decryption failed.
    #[error("decryption failed: {message}")]
    DecryptionFailed {
        /// Description of the failure.
        message: String,
    },

    /// Configuration value could not be used.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the problem.
        message: String,
    },

    /// The store has not been configured.
    #[error("store is not configured")]
    NotConfigured,

    /// A background I/O task did not complete.
    #[error("background task failed: {message}")]
    TaskFailed {
        /// Description of the failure.
        message: String,
    },
}

impl CoreError {
    /// Creates a key not found error.
    pub fn key_not_found(name: impl Into<String>) -> Self {
        Self::KeyNotFound { name: name.into() }
    }

    /// Creates a truncated record error.
    pub fn truncated_record(offset: u64, needed: u64, available: u64) -> Self {
        Self::TruncatedRecord {
            offset,
            needed,
            available,
        }
    }

    /// Creates an invalid record error.
    pub fn invalid_record(offset: u64, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            offset,
            message: message.into(),
        }
    }

    /// Creates an invalid key material error.
    pub fn invalid_key_material(message: impl Into<String>) -> Self {
        Self::InvalidKeyMaterial {
            message: message.into(),
        }
    }

    /// Creates a decryption failed error.
    pub fn decryption_failed(message: impl Into<String>) -> Self {
        Self::DecryptionFailed {
            message: message.into(),
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Creates a task failed error.
    pub fn task_failed(message: impl Into<String>) -> Self {
        Self::TaskFailed {
            message: message.into(),
        }
    }

    /// Returns whether this is a lookup miss.
    ///
    /// A miss is reported rather than fatal; callers usually treat it as an
    /// absent value.
    #[must_use]
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound { .. })
    }

    /// Returns whether this is an I/O-level failure.
    #[must_use]
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Storage(_) | Self::Io(_))
    }
}
