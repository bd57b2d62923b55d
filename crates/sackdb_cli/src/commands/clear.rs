//! Clear command implementation.

use super::{CliError, CliResult};
use sackdb_core::Store;
use tracing::info;

/// Truncates the sack file. Refuses without explicit confirmation.
pub fn run(store: &Store, confirmed: bool) -> CliResult<()> {
    if !confirmed {
        return Err(CliError::Usage(
            "clear discards every record; pass --yes to confirm".into(),
        ));
    }

    store.clear()?;
    info!(path = %store.sack_path()?.display(), "sack cleared");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{open_store, tests::args};

    #[test]
    fn requires_confirmation() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&args(dir.path())).unwrap();
        store.put("keep", b"me").unwrap();

        assert!(matches!(run(&store, false), Err(CliError::Usage(_))));
        assert_eq!(store.get("keep").unwrap(), b"me");
    }

    #[test]
    fn confirmed_clear_empties_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&args(dir.path())).unwrap();
        store.put("gone", b"soon").unwrap();

        run(&store, true).unwrap();
        assert_eq!(std::fs::metadata(store.sack_path().unwrap()).unwrap().len(), 0);
        assert!(store.is_empty());
    }
}
