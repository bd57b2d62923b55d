//! Keygen command implementation.

use super::CliResult;
use sackdb_core::KeyMaterial;

/// Generates fresh key material and returns it as base64 `(key, iv)`.
pub fn generate(key_size: usize) -> CliResult<(String, String)> {
    Ok(KeyMaterial::generate_with_key_size(key_size)?.to_base64())
}

/// Runs the keygen command.
pub fn run(key_size: usize) -> CliResult<()> {
    let (key, iv) = generate(key_size)?;
    println!("key: {key}");
    println!("iv:  {iv}");
    Ok(())
}
