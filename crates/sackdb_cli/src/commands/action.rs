//! Put/get driver.
//!
//! Moves a single file between the in/out directory and the sack file. The
//! file name doubles as the key. A put reads `<io_dir>/<filename>` and stores
//! it; a get writes the stored bytes back to the same path. When both are
//! requested the put runs first.

use super::{CliError, CliResult};
use sackdb_core::Store;
use std::path::{Path, PathBuf};
use tracing::info;

/// What one driver invocation should do.
#[derive(Debug, Clone)]
pub struct ActionOptions<'a> {
    io_dir: &'a Path,
    filename: &'a str,
    put: bool,
    get: bool,
    non_blocking: bool,
}

impl<'a> ActionOptions<'a> {
    /// Creates options with neither mode selected.
    pub fn new(io_dir: &'a Path, filename: &'a str, non_blocking: bool) -> Self {
        Self {
            io_dir,
            filename,
            put: false,
            get: false,
            non_blocking,
        }
    }

    /// Selects put mode.
    #[must_use]
    pub fn put(mut self) -> Self {
        self.put = true;
        self
    }

    /// Selects get mode.
    #[must_use]
    pub fn get(mut self) -> Self {
        self.get = true;
        self
    }

    fn file_path(&self) -> PathBuf {
        self.io_dir.join(self.filename)
    }
}

/// Runs the driver.
pub fn run(store: &Store, options: &ActionOptions<'_>) -> CliResult<()> {
    if !options.put && !options.get {
        return Err(CliError::Usage("nothing to do: pass --put and/or --get".into()));
    }

    store.ensure_exists()?;

    if options.non_blocking {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(run_non_blocking(store, options))
    } else {
        run_blocking(store, options)
    }
}

fn run_blocking(store: &Store, options: &ActionOptions<'_>) -> CliResult<()> {
    let path = options.file_path();

    if options.put {
        let data = std::fs::read(&path).map_err(|source| CliError::File {
            path: path.clone(),
            source,
        })?;
        store.put(options.filename, &data)?;
        info!(key = options.filename, bytes = data.len(), "stored file in sack");
    }

    if options.get {
        // The index only lives for this process.
        if !store.contains(options.filename) {
            store.reload()?;
        }
        let data = store.get(options.filename)?;
        std::fs::write(&path, &data).map_err(|source| CliError::File {
            path: path.clone(),
            source,
        })?;
        info!(key = options.filename, path = %path.display(), bytes = data.len(), "extracted file from sack");
    }

    Ok(())
}

async fn run_non_blocking(store: &Store, options: &ActionOptions<'_>) -> CliResult<()> {
    let path = options.file_path();

    if options.put {
        let data = tokio::fs::read(&path)
            .await
            .map_err(|source| CliError::File {
                path: path.clone(),
                source,
            })?;
        let len = data.len();
        store.put_async(options.filename, data).await?;
        info!(key = options.filename, bytes = len, "stored file in sack");
    }

    if options.get {
        if !store.contains(options.filename) {
            store.reload_async().await?;
        }
        let data = store.get_async(options.filename).await?;
        tokio::fs::write(&path, &data)
            .await
            .map_err(|source| CliError::File {
                path: path.clone(),
                source,
            })?;
        info!(key = options.filename, path = %path.display(), bytes = data.len(), "extracted file from sack");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{open_store, tests::args};
    use sackdb_core::CoreError;
    use std::fs;

    #[test]
    fn put_then_get_in_new_process() {
        let sack_dir = tempfile::tempdir().unwrap();
        let io_dir = tempfile::tempdir().unwrap();
        fs::write(io_dir.path().join("hello.txt"), b"Hello").unwrap();

        let store = open_store(&args(sack_dir.path())).unwrap();
        run(&store, &ActionOptions::new(io_dir.path(), "hello.txt", false).put()).unwrap();

        fs::remove_file(io_dir.path().join("hello.txt")).unwrap();

        let restarted = open_store(&args(sack_dir.path())).unwrap();
        run(&restarted, &ActionOptions::new(io_dir.path(), "hello.txt", false).get()).unwrap();
        assert_eq!(fs::read(io_dir.path().join("hello.txt")).unwrap(), b"Hello");
    }

    #[test]
    fn non_blocking_encrypted_roundtrip() {
        let sack_dir = tempfile::tempdir().unwrap();
        let io_dir = tempfile::tempdir().unwrap();
        fs::write(io_dir.path().join("data.bin"), [1u8, 2, 3, 4]).unwrap();

        let mut args = args(sack_dir.path());
        args.encrypt = true;
        args.key = Some("QUFBQUFBQUFBQUFBQUFBQQ==".into());
        args.iv = Some("AAAAAAAAAAAAAAAAAAAAAA==".into());
        args.non_blocking = true;

        let store = open_store(&args).unwrap();
        run(
            &store,
            &ActionOptions::new(io_dir.path(), "data.bin", true)
                .put()
                .get(),
        )
        .unwrap();

        assert_eq!(fs::read(io_dir.path().join("data.bin")).unwrap(), [1, 2, 3, 4]);
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn non_blocking_get_reloads_in_new_process() {
        let sack_dir = tempfile::tempdir().unwrap();
        let io_dir = tempfile::tempdir().unwrap();
        fs::write(io_dir.path().join("notes.txt"), b"kept").unwrap();

        let store = open_store(&args(sack_dir.path())).unwrap();
        run(&store, &ActionOptions::new(io_dir.path(), "notes.txt", false).put()).unwrap();
        fs::remove_file(io_dir.path().join("notes.txt")).unwrap();

        let restarted = open_store(&args(sack_dir.path())).unwrap();
        assert!(!restarted.contains("notes.txt"));
        run(&restarted, &ActionOptions::new(io_dir.path(), "notes.txt", true).get()).unwrap();
        assert_eq!(fs::read(io_dir.path().join("notes.txt")).unwrap(), b"kept");
        assert!(restarted.contains("notes.txt"));
    }

    #[test]
    fn get_unknown_key_fails() {
        let sack_dir = tempfile::tempdir().unwrap();
        let io_dir = tempfile::tempdir().unwrap();

        let store = open_store(&args(sack_dir.path())).unwrap();
        let result = run(&store, &ActionOptions::new(io_dir.path(), "nope", false).get());
        assert!(matches!(
            result,
            Err(CliError::Core(CoreError::KeyNotFound { .. }))
        ));
        assert!(!io_dir.path().join("nope").exists());
    }

    #[test]
    fn no_mode_is_usage_error() {
        let sack_dir = tempfile::tempdir().unwrap();
        let store = open_store(&args(sack_dir.path())).unwrap();

        let result = run(&store, &ActionOptions::new(sack_dir.path(), "x", false));
        assert!(matches!(result, Err(CliError::Usage(_))));
    }

    #[test]
    fn missing_input_file_names_path() {
        let sack_dir = tempfile::tempdir().unwrap();
        let store = open_store(&args(sack_dir.path())).unwrap();

        let result = run(&store, &ActionOptions::new(sack_dir.path(), "absent.txt", false).put());
        assert!(matches!(result, Err(CliError::File { .. })));
    }
}
