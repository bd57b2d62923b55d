//! Verify command implementation.

use super::{CliError, CliResult};
use sackdb_core::{CoreError, Store};
use sackdb_storage::SackFile;

/// Verification result.
#[derive(Debug, PartialEq, Eq)]
pub struct VerifyResult {
    /// Number of complete records.
    pub records_checked: usize,
    /// Number of distinct keys.
    pub keys: usize,
    /// File size in bytes.
    pub file_len: u64,
    /// Offset of a partial trailing record, if any.
    pub truncated_at: Option<u64>,
}

impl VerifyResult {
    fn is_ok(&self) -> bool {
        self.truncated_at.is_none()
    }
}

/// Scans the sack file without creating it.
pub fn check(store: &Store) -> CliResult<VerifyResult> {
    let path = store.sack_path()?;
    if !SackFile::new(&path).exists() {
        return Err(CliError::Damaged(format!(
            "no sack file at {}",
            path.display()
        )));
    }

    let listing = match store.list() {
        Ok(listing) => listing,
        Err(CoreError::InvalidRecord { offset, message }) => {
            return Err(CliError::Damaged(format!(
                "invalid record at offset {offset}: {message}"
            )))
        }
        Err(e) => return Err(e.into()),
    };

    Ok(VerifyResult {
        records_checked: listing.len(),
        keys: store.len(),
        file_len: listing.file_len(),
        truncated_at: listing.truncated_at(),
    })
}

/// Runs the verify command.
pub fn run(store: &Store) -> CliResult<()> {
    let result = check(store)?;

    println!("Records checked: {}", result.records_checked);
    println!("Distinct keys:   {}", result.keys);
    println!("File size:       {} bytes", result.file_len);

    if result.is_ok() {
        println!("✓ Sack verification passed");
        return Ok(());
    }

    println!("✗ Sack verification failed");
    let offset = result.truncated_at.unwrap_or(result.file_len);
    Err(CliError::Damaged(format!(
        "partial record at offset {offset} ({} trailing bytes)",
        result.file_len.saturating_sub(offset)
    )))
}
