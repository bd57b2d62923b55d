//! CLI command implementations.

pub mod action;
pub mod clear;
pub mod keygen;
pub mod list;
pub mod verify;

pub use action::ActionOptions;

use clap::Args;
use sackdb_core::{CoreError, Store, StoreConfig, DEFAULT_SACK_NAME};
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

/// Result type for CLI commands.
pub type CliResult<T> = Result<T, CliError>;

/// Errors reported by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    /// Store operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Reading or writing a user file failed.
    #[error("{}: {source}", path.display())]
    File {
        /// File that was accessed.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },

    /// Other I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON output failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Arguments do not make sense together.
    #[error("{0}")]
    Usage(String),

    /// The sack file failed verification.
    #[error("sack file is damaged: {0}")]
    Damaged(String),
}

/// Store location and encryption options shared by every command.
#[derive(Debug, Args)]
pub struct StoreArgs {
    /// Directory holding the sack file
    #[arg(global = true, long, default_value = ".")]
    pub sack_dir: PathBuf,

    /// Sack file name
    #[arg(global = true, long, default_value = DEFAULT_SACK_NAME)]
    pub sack_name: String,

    /// Encrypt payloads (requires --key and --iv)
    #[arg(global = true, long)]
    pub encrypt: bool,

    /// Encryption key, base64
    #[arg(global = true, long)]
    pub key: Option<String>,

    /// Encryption IV, base64
    #[arg(global = true, long)]
    pub iv: Option<String>,

    /// Run sack file I/O on a background worker
    #[arg(global = true, long)]
    pub non_blocking: bool,
}

/// Builds a configured store from the command-line options.
pub fn open_store(args: &StoreArgs) -> CliResult<Store> {
    let mut config = StoreConfig::new()
        .sack_dir(&args.sack_dir)
        .sack_name(&args.sack_name)
        .encryption(args.encrypt);

    match (&args.key, &args.iv) {
        (Some(key), Some(iv)) => config = config.base64_key_material(key, iv)?,
        (None, None) => {}
        _ => return Err(CliError::Usage("--key and --iv must be given together".into())),
    }

    if let Some(material) = config.cipher()? {
        material.validate()?;
    }

    debug!(
        path = %config.sack_path().display(),
        encryption = config.encryption,
        "opening store"
    );
    Ok(Store::with_config(config))
}
