//! File-based sack storage.

use crate::error::{StorageError, StorageResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

/// Handle to a sack file on disk.
///
/// A `SackFile` is only a path. Every operation opens the file, uses it, and
/// closes it again before returning; no descriptor is held between calls.
///
/// # Thread Safety
///
/// The handle itself carries no state, but the file it names has no locking.
/// Concurrent appends from several threads or processes can interleave at the
/// byte level. Callers that share a sack file must serialize writers
/// themselves.
///
/// # Example
///
/// ```no_run
/// use sackdb_storage::SackFile;
///
/// let sack = SackFile::new("/tmp/store.sack");
/// let created = sack.ensure_exists().unwrap();
/// assert_eq!(sack.len().unwrap(), 0);
/// # let _ = created;
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SackFile {
    path: PathBuf,
}

impl SackFile {
    /// Creates a handle for the sack file at `path`. Does not touch the disk.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the path to the underlying file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the file currently exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Creates an empty sack file if none exists.
    ///
    /// Returns `true` if the file was created by this call. Parent directories
    /// are not created.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, for instance because
    /// the parent directory is missing or not writable.
    pub fn ensure_exists(&self) -> StorageResult<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.path)
        {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    /// Returns the current size of the file in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    pub fn len(&self) -> StorageResult<u64> {
        let metadata = fs::metadata(&self.path).map_err(|e| StorageError::on_open(e, &self.path))?;
        Ok(metadata.len())
    }

    /// Returns whether the file is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Opens the file for appending, creating it if absent.
    ///
    /// The returned appender has already captured the end-of-file position
    /// the next write will start at.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or positioned.
    pub fn open_append(&self) -> StorageResult<SackAppender> {
        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(&self.path)?;
        let start = file.seek(SeekFrom::End(0))?;
        Ok(SackAppender { file, start })
    }

    /// Opens the file for reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist.
    pub fn open_read(&self) -> StorageResult<File> {
        File::open(&self.path).map_err(|e| StorageError::on_open(e, &self.path))
    }

    /// Cuts the file back to `len` bytes.
    ///
    /// Only ever used to drop a partial record from the tail; `len` must not
    /// exceed the current size.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if the file does not exist, or an
    /// I/O error if it cannot be resized or synced.
    pub fn truncate_to(&self, len: u64) -> StorageResult<()> {
        let file = OpenOptions::new()
            .write(true)
            .open(&self.path)
            .map_err(|e| StorageError::on_open(e, &self.path))?;
        file.set_len(len)?;
        file.sync_all()?;
        Ok(())
    }

    /// Truncates the file to zero length, creating it if absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or synced.
    pub fn reset(&self) -> StorageResult<()> {
        let file = File::create(&self.path)?;
        file.sync_all()?;
        Ok(())
    }
}

/// An open append handle on a sack file.
///
/// Produced by [`SackFile::open_append`]. Consumed by the single write it
/// performs, so the file is closed as soon as the write completes.
#[derive(Debug)]
pub struct SackAppender {
    file: File,
    start: u64,
}

impl SackAppender {
    /// Returns the position the write will start at (the end of file at open).
    #[must_use]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Writes `data`, flushes, and returns the stream position after the write.
    ///
    /// # Errors
    ///
    /// Returns an error if the write or flush fails. A failed write may leave
    /// a partial tail in the file.
    pub fn write_all_and_flush(mut self, data: &[u8]) -> StorageResult<u64> {
        self.file.write_all(data)?;
        self.file.flush()?;
        let end = self.file.stream_position()?;
        Ok(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn ensure_exists_creates_once() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sack");
        let sack = SackFile::new(&path);

        assert!(!sack.exists());
        assert!(sack.ensure_exists().unwrap());
        assert!(sack.exists());
        assert!(!sack.ensure_exists().unwrap());
        assert_eq!(sack.len().unwrap(), 0);
    }

    #[test]
    fn ensure_exists_keeps_contents() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        sack.open_append()
            .unwrap()
            .write_all_and_flush(b"data")
            .unwrap();
        assert!(!sack.ensure_exists().unwrap());
        assert_eq!(sack.len().unwrap(), 4);
    }

    #[test]
    fn append_reports_start_and_end() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        let first = sack.open_append().unwrap();
        assert_eq!(first.start(), 0);
        assert_eq!(first.write_all_and_flush(b"hello").unwrap(), 5);

        let second = sack.open_append().unwrap();
        assert_eq!(second.start(), 5);
        assert_eq!(second.write_all_and_flush(b" world").unwrap(), 11);

        assert_eq!(fs::read(sack.path()).unwrap(), b"hello world");
    }

    #[test]
    fn append_creates_missing_file() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        let appender = sack.open_append().unwrap();
        assert_eq!(appender.start(), 0);
        assert!(sack.exists());
    }

    #[test]
    fn append_fails_without_parent_dir() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("missing").join("test.sack"));

        assert!(matches!(sack.open_append(), Err(StorageError::Io(_))));
    }

    #[test]
    fn read_missing_file_fails() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        assert!(matches!(
            sack.open_read(),
            Err(StorageError::NotFound { .. })
        ));
        assert!(matches!(sack.len(), Err(StorageError::NotFound { .. })));
    }

    #[test]
    fn reset_truncates() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        sack.open_append()
            .unwrap()
            .write_all_and_flush(b"persistent data")
            .unwrap();
        assert!(!sack.is_empty().unwrap());

        sack.reset().unwrap();
        assert!(sack.exists());
        assert!(sack.is_empty().unwrap());
    }

    #[test]
    fn truncate_to_drops_tail() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        sack.open_append()
            .unwrap()
            .write_all_and_flush(b"keep|torn")
            .unwrap();
        sack.truncate_to(4).unwrap();

        assert_eq!(fs::read(sack.path()).unwrap(), b"keep");
        assert_eq!(sack.open_append().unwrap().start(), 4);
    }

    #[test]
    fn truncate_missing_file_fails() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        assert!(matches!(
            sack.truncate_to(0),
            Err(StorageError::NotFound { .. })
        ));
        assert!(!sack.exists());
    }

    #[test]
    fn reset_creates_missing_file() {
        let dir = tempdir().unwrap();
        let sack = SackFile::new(dir.path().join("test.sack"));

        sack.reset().unwrap();
        assert!(sack.exists());
    }

    #[test]
    fn sack_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.sack");

        let sack = SackFile::new(&path);
        assert_eq!(sack.path(), path);
    }
}
