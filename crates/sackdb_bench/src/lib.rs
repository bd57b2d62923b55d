//! Benchmark utilities.

use rand::Rng;
use sackdb_core::{KeyMaterial, Store, StoreConfig};
use tempfile::TempDir;

/// Generate random payload data of the specified size.
pub fn random_data(size: usize) -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..size).map(|_| rng.gen()).collect()
}

/// Generate `count` distinct record names.
pub fn generate_names(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("object-{i:06}")).collect()
}

/// Open a store on a fresh temporary sack file.
///
/// The directory is removed when the returned guard drops.
pub fn temp_store(encrypted: bool) -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("temp dir: {e}"));
    let mut config = StoreConfig::for_path(dir.path().join("bench.sack"));
    if encrypted {
        config = config
            .encryption(true)
            .key_material(KeyMaterial::generate());
    }
    (dir, Store::with_config(config))
}

/// Fill a store with `count` records of `payload_size` bytes each.
pub fn populate(store: &Store, count: usize, payload_size: usize) -> Vec<String> {
    let names = generate_names(count);
    let data = random_data(payload_size);
    for name in &names {
        store
            .put(name, &data)
            .unwrap_or_else(|e| panic!("populate {name}: {e}"));
    }
    names
}
