//! The sack store.

use crate::config::StoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::index::SackIndex;
use crate::record::{RecordIterator, SackEntry, SackRecord};
use parking_lot::{Mutex, RwLock};
use sackdb_storage::SackFile;
use std::io::BufReader;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;
use tracing::{debug, info, warn};

/// An append-only object store over a single sack file.
///
/// The store maps string keys to byte payloads. Every write appends a new
/// record; an earlier record for the same key stays in the file but is no
/// longer resolved. The key index lives in memory only and must be rebuilt
/// with [`reload`](Self::reload) or [`list`](Self::list) after a restart.
///
/// # Lifecycle
///
/// A store starts unconfigured; every file operation fails with
/// [`CoreError::NotConfigured`] until [`configure`](Self::configure) is
/// called. No file handle is held between calls.
///
/// # Recovery
///
/// A put that died mid-write leaves a partial record at the end of the file.
/// Scans stop cleanly in front of it. Before the next append the store cuts
/// the file back to the end of the last complete record, so new records
/// never land behind garbage.
///
/// # Thread Safety
///
/// `Store` is a cheap, cloneable handle; clones share one index and one
/// reader/writer lock. Within a process, appends and clears are exclusive and
/// reads are shared. Nothing guards against a second process writing the
/// same sack file; one writer at a time is a usage contract.
///
/// # Non-blocking forms
///
/// [`put_async`](Self::put_async) and [`get_async`](Self::get_async) run the
/// file I/O on tokio's blocking pool. Encryption and decryption stay on the
/// calling task. On-disk and index effects are the same as the blocking forms.
///
/// # Example
///
/// ```no_run
/// use sackdb_core::{Store, StoreConfig};
///
/// let store = Store::with_config(StoreConfig::for_path("/tmp/store.sack"));
/// store.put("hello.txt", b"Hello").unwrap();
/// assert_eq!(store.get("hello.txt").unwrap(), b"Hello");
/// ```
#[derive(Clone, Default)]
pub struct Store {
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    config: RwLock<Option<Arc<StoreConfig>>>,
    /// Exclusive for appends and clears, shared for reads and scans.
    file_lock: RwLock<()>,
    /// Always locked after `file_lock`.
    index: RwLock<SackIndex>,
    /// End of the last complete record, once a scan or append has seen it.
    /// Only touched while `file_lock` is held.
    valid_end: Mutex<Option<u64>>,
}

/// The result of a full scan: every physical record in file order.
///
/// Can be iterated any number of times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Listing {
    entries: Vec<SackEntry>,
    file_len: u64,
    truncated_at: Option<u64>,
}

impl Listing {
    /// Iterates over the entries in file order.
    pub fn iter(&self) -> std::slice::Iter<'_, SackEntry> {
        self.entries.iter()
    }

    /// Returns the entries in file order.
    #[must_use]
    pub fn entries(&self) -> &[SackEntry] {
        &self.entries
    }

    /// Returns the number of physical records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether the sack file holds no complete record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the sack file length at scan time.
    #[must_use]
    pub fn file_len(&self) -> u64 {
        self.file_len
    }

    /// Returns the offset of a trailing partial record, if any.
    #[must_use]
    pub fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }

    /// Returns the offset just past the last complete record.
    #[must_use]
    pub fn valid_len(&self) -> u64 {
        self.truncated_at.unwrap_or(self.file_len)
    }
}

impl IntoIterator for Listing {
    type Item = SackEntry;
    type IntoIter = std::vec::IntoIter<SackEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Listing {
    type Item = &'a SackEntry;
    type IntoIter = std::slice::Iter<'a, SackEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl Store {
    /// Creates an unconfigured store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store with the given configuration.
    #[must_use]
    pub fn with_config(config: StoreConfig) -> Self {
        let store = Self::new();
        store.configure(config);
        store
    }

    /// Replaces the configuration. Does not touch the file.
    ///
    /// Waits for in-flight file operations. If the sack path changes, the
    /// index is cleared so that it keeps describing the configured file only;
    /// operations that started against the old path then fail with
    /// [`CoreError::InvalidConfig`] instead of touching the new index.
    pub fn configure(&self, config: StoreConfig) {
        let _guard = self.shared.file_lock.write();
        let mut current = self.shared.config.write();
        let path_changed = current
            .as_ref()
            .map_or(true, |c| c.sack_path() != config.sack_path());

        *current = Some(Arc::new(config));
        if path_changed {
            self.shared.index.write().clear();
            *self.shared.valid_end.lock() = None;
        }
    }

    /// Returns whether [`configure`](Self::configure) has been called.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.shared.config.read().is_some()
    }

    /// Returns the current configuration.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotConfigured`] before the store is configured.
    pub fn config(&self) -> CoreResult<Arc<StoreConfig>> {
        self.shared
            .config
            .read()
            .as_ref()
            .map(Arc::clone)
            .ok_or(CoreError::NotConfigured)
    }

    /// Returns the configured sack file path.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotConfigured`] before the store is configured.
    pub fn sack_path(&self) -> CoreResult<PathBuf> {
        Ok(self.config()?.sack_path())
    }

    /// Creates an empty sack file if none exists. Idempotent.
    ///
    /// Returns `true` if the file was created by this call.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn ensure_exists(&self) -> CoreResult<bool> {
        let config = self.config()?;
        let created = SackFile::new(config.sack_path()).ensure_exists()?;
        if created {
            debug!(path = %config.sack_path().display(), "created empty sack file");
        }
        Ok(created)
    }

    /// Stores `plaintext` under `name`, appending a new record.
    ///
    /// Creates the sack file if absent, but not its directory. The first
    /// append of a store scans the file (rebuilding the index) to find the
    /// end of the last complete record; a partial tail is cut off first.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidKeyMaterial`] if encryption is on and the
    /// key or IV is unusable, [`CoreError::RecordTooLarge`] if the name or
    /// payload exceeds the format limits, [`CoreError::InvalidRecord`] if the
    /// file holds a malformed complete record, or an I/O error.
    pub fn put(&self, name: &str, plaintext: &[u8]) -> CoreResult<()> {
        let config = self.config()?;
        let payload = seal(&config, plaintext)?;
        self.shared.append(&config, name, &payload)
    }

    /// Non-blocking form of [`put`](Self::put).
    ///
    /// Encryption runs on the calling task; the append runs on the blocking
    /// pool.
    ///
    /// # Errors
    ///
    /// As [`put`](Self::put), plus [`CoreError::TaskFailed`] if the worker
    /// panics.
    pub async fn put_async(&self, name: impl Into<String>, plaintext: Vec<u8>) -> CoreResult<()> {
        let config = self.config()?;
        let payload = seal(&config, &plaintext)?;
        let shared = Arc::clone(&self.shared);
        let name = name.into();

        task::spawn_blocking(move || shared.append(&config, &name, &payload))
            .await
            .map_err(|e| CoreError::task_failed(e.to_string()))?
    }

    /// Returns the payload most recently stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::KeyNotFound`] if the index has no entry for
    /// `name` (the index is left untouched), [`CoreError::TruncatedRecord`]
    /// or [`CoreError::InvalidRecord`] if the record at the indexed offset is
    /// damaged or belongs to another key, [`CoreError::DecryptionFailed`] on
    /// bad padding, or an I/O error.
    pub fn get(&self, name: &str) -> CoreResult<Vec<u8>> {
        let config = self.config()?;
        let payload = self.shared.read(&config, name)?;
        open(&config, payload)
    }

    /// Non-blocking form of [`get`](Self::get).
    ///
    /// The read runs on the blocking pool; decryption runs on the calling
    /// task.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get), plus [`CoreError::TaskFailed`] if the worker
    /// panics.
    pub async fn get_async(&self, name: impl Into<String>) -> CoreResult<Vec<u8>> {
        let config = self.config()?;
        let shared = Arc::clone(&self.shared);
        let worker_config = Arc::clone(&config);
        let name = name.into();

        let payload = task::spawn_blocking(move || shared.read(&worker_config, &name))
            .await
            .map_err(|e| CoreError::task_failed(e.to_string()))??;
        open(&config, payload)
    }

    /// Scans the whole sack file and rebuilds the index from it.
    ///
    /// Returns every physical record in file order, superseded ones included.
    /// A missing sack file is created empty. A trailing partial record ends
    /// the scan without error and is reported by
    /// [`Listing::truncated_at`].
    ///
    /// The returned [`Listing`] holds every entry header (never payloads),
    /// because the index rebuild needs a full pass anyway. To stream records
    /// without collecting them, drive a
    /// [`RecordIterator`](crate::record::RecordIterator) over the file
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRecord`] if a complete record is
    /// malformed, or an I/O error. The index is not modified on error.
    pub fn list(&self) -> CoreResult<Listing> {
        let config = self.config()?;
        let sack = SackFile::new(config.sack_path());

        let _guard = self.shared.file_lock.read();
        self.shared.check_current(&config)?;
        if sack.ensure_exists()? {
            debug!(path = %sack.path().display(), "created empty sack file");
        }

        self.shared.scan(&sack)
    }

    /// Rebuilds the index from the sack file, discarding the listing.
    ///
    /// # Errors
    ///
    /// As [`list`](Self::list).
    pub fn reload(&self) -> CoreResult<()> {
        self.list().map(|_| ())
    }

    /// Non-blocking form of [`reload`](Self::reload).
    ///
    /// # Errors
    ///
    /// As [`reload`](Self::reload), plus [`CoreError::TaskFailed`] if the
    /// worker panics.
    pub async fn reload_async(&self) -> CoreResult<()> {
        let store = self.clone();
        task::spawn_blocking(move || store.reload())
            .await
            .map_err(|e| CoreError::task_failed(e.to_string()))?
    }

    /// Discards the index and truncates the sack file to empty.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be recreated.
    pub fn clear(&self) -> CoreResult<()> {
        let config = self.config()?;
        let sack = SackFile::new(config.sack_path());

        let _guard = self.shared.file_lock.write();
        self.shared.check_current(&config)?;
        sack.reset()?;
        self.shared.index.write().clear();
        *self.shared.valid_end.lock() = Some(0);

        info!(path = %sack.path().display(), "cleared sack file");
        Ok(())
    }

    /// Returns the indexed record offset for `name`.
    #[must_use]
    pub fn offset_of(&self, name: &str) -> Option<u64> {
        self.shared.index.read().lookup(name)
    }

    /// Returns whether `name` is indexed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.shared.index.read().contains(name)
    }

    /// Returns the number of distinct indexed keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared.index.read().len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shared.index.read().is_empty()
    }

    /// Returns the indexed key names, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.shared.index.read().names().map(String::from).collect();
        keys.sort_unstable();
        keys
    }
}

impl Shared {
    /// Fails if `config` no longer names the configured sack file.
    ///
    /// Must be called with `file_lock` held, which keeps `configure` out.
    fn check_current(&self, config: &StoreConfig) -> CoreResult<()> {
        let current = self.config.read();
        match current.as_ref() {
            Some(current) if current.sack_path() == config.sack_path() => Ok(()),
            _ => Err(CoreError::invalid_config(
                "store was reconfigured to another sack file",
            )),
        }
    }

    /// Scans the whole file, replacing the index and the known valid end.
    ///
    /// Must be called with `file_lock` held.
    fn scan(&self, sack: &SackFile) -> CoreResult<Listing> {
        let mut iter = RecordIterator::new(BufReader::new(sack.open_read()?))?;
        let entries: Vec<SackEntry> = iter.by_ref().collect::<CoreResult<_>>()?;
        let listing = Listing {
            entries,
            file_len: iter.stream_len(),
            truncated_at: iter.truncated_at(),
        };

        let index = SackIndex::rebuild_from_scan(&listing.entries);
        info!(
            path = %sack.path().display(),
            records = listing.len(),
            keys = index.len(),
            "scanned sack file"
        );
        *self.index.write() = index;
        *self.valid_end.lock() = Some(listing.valid_len());

        Ok(listing)
    }

    /// Makes sure the file ends with a complete record before an append.
    ///
    /// Rescans when the file length differs from the last known valid end,
    /// then drops whatever follows the last complete record.
    ///
    /// Must be called with `file_lock` held for writing.
    fn cut_partial_tail(&self, sack: &SackFile) -> CoreResult<()> {
        sack.ensure_exists()?;
        let len = sack.len()?;

        let known = *self.valid_end.lock();
        let valid_end = match known {
            Some(end) if end == len => return Ok(()),
            _ => self.scan(sack)?.valid_len(),
        };

        if len > valid_end {
            warn!(
                path = %sack.path().display(),
                valid_end,
                dropped = len - valid_end,
                "cutting partial record off sack tail before append"
            );
            sack.truncate_to(valid_end)?;
        }
        Ok(())
    }

    /// Appends one record and indexes it at its start offset.
    fn append(&self, config: &StoreConfig, name: &str, payload: &[u8]) -> CoreResult<()> {
        let sack = SackFile::new(config.sack_path());

        let _guard = self.file_lock.write();
        self.check_current(config)?;
        self.cut_partial_tail(&sack)?;

        let appender = sack.open_append()?;
        let offset = appender.start();
        let record = SackRecord::encode(name, payload, offset)?;
        let end = appender.write_all_and_flush(&record)?;

        *self.valid_end.lock() = Some(end);
        self.index.write().insert(name, offset);
        debug!(name, offset, end, len = payload.len(), "stored record");
        Ok(())
    }

    /// Reads the stored payload for `name`, validating the record it lands on.
    fn read(&self, config: &StoreConfig, name: &str) -> CoreResult<Vec<u8>> {
        let sack = SackFile::new(config.sack_path());

        let _guard = self.file_lock.read();
        self.check_current(config)?;
        let Some(offset) = self.index.read().lookup(name) else {
            debug!(name, "key not in index");
            return Err(CoreError::key_not_found(name));
        };

        let mut reader = BufReader::new(sack.open_read()?);
        let record = SackRecord::decode(&mut reader, offset)?;

        if record.name != name {
            return Err(CoreError::invalid_record(
                offset,
                format!("expected key {name:?}, found {:?}", record.name),
            ));
        }
        if record.stored_offset != offset {
            return Err(CoreError::invalid_record(
                offset,
                format!("stored offset {} does not match", record.stored_offset),
            ));
        }

        debug!(name, offset, len = record.payload_len(), "retrieved record");
        Ok(record.payload)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("config", &*self.shared.config.read())
            .field("keys", &self.len())
            .finish_non_exhaustive()
    }
}

fn seal(config: &StoreConfig, plaintext: &[u8]) -> CoreResult<Vec<u8>> {
    match config.cipher()? {
        Some(material) => material.encrypt(plaintext),
        None => Ok(plaintext.to_vec()),
    }
}

fn open(config: &StoreConfig, payload: Vec<u8>) -> CoreResult<Vec<u8>> {
    match config.cipher()? {
        Some(material) => material.decrypt(&payload),
        None => Ok(payload),
    }
}
