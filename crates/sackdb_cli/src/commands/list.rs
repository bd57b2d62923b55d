//! List command implementation.

use super::{CliError, CliResult};
use sackdb_core::Store;
use serde::Serialize;
use std::fmt::Write as _;

/// Result of scanning the sack file.
#[derive(Debug, Serialize)]
pub struct ListResult {
    /// Sack file path.
    pub path: String,
    /// File size in bytes.
    pub file_len: u64,
    /// Number of physical records, duplicates included.
    pub records: usize,
    /// Number of distinct keys.
    pub keys: usize,
    /// Offset where a partial trailing record starts, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at: Option<u64>,
    /// Records in file order.
    pub entries: Vec<ListEntry>,
}

/// One physical record.
#[derive(Debug, Serialize)]
pub struct ListEntry {
    /// Record name.
    pub name: String,
    /// Byte offset where the record starts.
    pub offset: u64,
    /// Stored payload length.
    pub length: u32,
}

/// Scans the sack file and rebuilds the store index.
pub fn collect(store: &Store) -> CliResult<ListResult> {
    let listing = store.list()?;
    let path = store.sack_path()?;

    Ok(ListResult {
        path: path.display().to_string(),
        file_len: listing.file_len(),
        records: listing.len(),
        keys: store.len(),
        truncated_at: listing.truncated_at(),
        entries: listing
            .iter()
            .map(|entry| ListEntry {
                name: entry.name.clone(),
                offset: entry.offset,
                length: entry.length,
            })
            .collect(),
    })
}

/// Runs the list command.
pub fn run(store: &Store, format: &str) -> CliResult<()> {
    let result = collect(store)?;

    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "text" => print!("{}", render_text(&result)),
        other => {
            return Err(CliError::Usage(format!(
                "unknown format '{other}' (expected text or json)"
            )))
        }
    }

    Ok(())
}

fn render_text(result: &ListResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Sack: {}", result.path);
    let _ = writeln!(
        out,
        "{} records, {} keys, {} bytes",
        result.records, result.keys, result.file_len
    );
    if !result.entries.is_empty() {
        let _ = writeln!(out);
        let _ = writeln!(out, "{:>12}  {:>10}  NAME", "OFFSET", "LENGTH");
        for entry in &result.entries {
            let _ = writeln!(out, "{:>12}  {:>10}  {}", entry.offset, entry.length, entry.name);
        }
    }
    if let Some(offset) = result.truncated_at {
        let _ = writeln!(out);
        let _ = writeln!(out, "partial record ignored at offset {offset}");
    }
    out
}
