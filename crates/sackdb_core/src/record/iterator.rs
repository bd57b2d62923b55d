//! Streaming record scan.
//!
//! Walks a sack file from a start offset to its end, reading one header at a
//! time and seeking past payloads, so memory stays bounded by the longest key
//! name regardless of file size.

use super::{RecordHeader, SackEntry};
use crate::error::{CoreError, CoreResult};
use std::io::{Read, Seek, SeekFrom};
use tracing::warn;

/// A streaming iterator over the records of a sack file.
///
/// Yields one [`SackEntry`] per physical record in file order, including
/// records whose name was later written again.
///
/// # Error Handling
///
/// - A truncated record (a write that never completed) ends the iteration
///   cleanly; [`truncated_at`](Self::truncated_at) reports where
/// - An invalid record or an I/O error is yielded once, then iteration ends
///
/// # Example
///
/// ```
/// use sackdb_core::record::{RecordIterator, SackRecord};
/// use std::io::Cursor;
///
/// let bytes = SackRecord::encode("a", &[1, 2, 3], 0).unwrap();
/// let mut iter = RecordIterator::new(Cursor::new(bytes)).unwrap();
/// let entry = iter.next().unwrap().unwrap();
/// assert_eq!(entry.name, "a");
/// assert!(iter.next().is_none());
/// ```
pub struct RecordIterator<R> {
    reader: R,
    /// Total length of the stream.
    end: u64,
    /// Offset of the next record to read.
    position: u64,
    /// Offset of a trailing partial record, if one was found.
    truncated_at: Option<u64>,
    finished: bool,
}

impl<R: Read + Seek> RecordIterator<R> {
    /// Creates an iterator starting at the beginning of `reader`.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream length cannot be determined.
    pub fn new(reader: R) -> CoreResult<Self> {
        Self::starting_at(reader, 0)
    }

    /// Creates an iterator starting at `offset`.
    ///
    /// `offset` must be the start of a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the stream length cannot be determined.
    pub fn starting_at(mut reader: R, offset: u64) -> CoreResult<Self> {
        let end = reader.seek(SeekFrom::End(0))?;
        Ok(Self {
            reader,
            end,
            position: offset,
            truncated_at: None,
            finished: false,
        })
    }

    /// Returns the offset of a trailing partial record, if the scan hit one.
    #[must_use]
    pub fn truncated_at(&self) -> Option<u64> {
        self.truncated_at
    }

    /// Returns the offset just past the last complete record read so far.
    #[must_use]
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Returns the total length of the stream.
    #[must_use]
    pub fn stream_len(&self) -> u64 {
        self.end
    }

    fn read_next(&mut self) -> CoreResult<Option<SackEntry>> {
        if self.finished || self.position >= self.end {
            self.finished = true;
            return Ok(None);
        }

        let offset = self.position;
        let header = match RecordHeader::read_at(&mut self.reader, offset, self.end) {
            Ok(header) => header,
            Err(CoreError::TruncatedRecord {
                needed, available, ..
            }) => {
                warn!(
                    offset,
                    needed, available, "sack file ends with a partial record; ignoring tail"
                );
                self.truncated_at = Some(offset);
                self.finished = true;
                return Ok(None);
            }
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };

        if header.stored_offset != offset {
            warn!(
                name = %header.name,
                offset,
                stored_offset = header.stored_offset,
                "record stored offset does not match its position"
            );
        }

        self.position = offset + header.encoded_len();
        Ok(Some(SackEntry {
            name: header.name,
            offset,
            length: header.payload_len,
            stored_offset: header.stored_offset,
        }))
    }
}

impl<R: Read + Seek> Iterator for RecordIterator<R> {
    type Item = CoreResult<SackEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_next().transpose()
    }
}

impl<R> std::fmt::Debug for RecordIterator<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordIterator")
            .field("end", &self.end)
            .field("position", &self.position)
            .field("truncated_at", &self.truncated_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::SackRecord;
    use std::io::Cursor;

    fn build(records: &[(&str, &[u8])]) -> Vec<u8> {
        let mut file = Vec::new();
        for (name, payload) in records {
            let position = file.len() as u64;
            file.extend(SackRecord::encode(name, payload, position).unwrap());
        }
        file
    }

    #[test]
    fn empty_stream() {
        let mut iter = RecordIterator::new(Cursor::new(Vec::new())).unwrap();
        assert!(iter.next().is_none());
        assert_eq!(iter.truncated_at(), None);
    }

    #[test]
    fn yields_all_records_in_order() {
        let file = build(&[("one", &[1]), ("two", &[2, 2]), ("one", &[3, 3, 3])]);
        let len = file.len() as u64;

        let mut iter = RecordIterator::new(Cursor::new(file)).unwrap();
        let entries: Vec<SackEntry> = iter.by_ref().collect::<CoreResult<_>>().unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["one", "two", "one"]);
        assert_eq!(entries[0].offset, 0);
        assert_eq!(entries[1].offset, 20);
        assert_eq!(entries[2].length, 3);
        assert!(entries.iter().all(|e| e.offset == e.stored_offset));
        assert_eq!(iter.position(), len);
        assert_eq!(iter.truncated_at(), None);
    }

    #[test]
    fn stops_at_truncated_tail() {
        let mut file = build(&[("a", &[1]), ("b", &[2; 8])]);
        let complete = SackRecord::encode("a", &[1], 0).unwrap().len() as u64;
        file.truncate(file.len() - 4);

        let mut iter = RecordIterator::new(Cursor::new(file)).unwrap();
        let entries: Vec<SackEntry> = iter.by_ref().collect::<CoreResult<_>>().unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a");
        assert_eq!(iter.truncated_at(), Some(complete));
        assert_eq!(iter.position(), complete);
    }

    #[test]
    fn invalid_record_is_yielded_once() {
        let mut file = build(&[("a", &[1]), ("b", &[2])]);
        let second = SackRecord::encode("a", &[1], 0).unwrap().len();
        file[second..second + 4].copy_from_slice(&(-3i32).to_le_bytes());

        let mut iter = RecordIterator::new(Cursor::new(file)).unwrap();
        assert!(iter.next().unwrap().is_ok());
        assert!(matches!(
            iter.next(),
            Some(Err(CoreError::InvalidRecord { .. }))
        ));
        assert!(iter.next().is_none());
    }

    #[test]
    fn starting_at_second_record() {
        let file = build(&[("a", &[1]), ("b", &[2])]);
        let second = SackRecord::encode("a", &[1], 0).unwrap().len() as u64;

        let entries: Vec<SackEntry> = RecordIterator::starting_at(Cursor::new(file), second)
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "b");
    }

    #[test]
    fn tolerates_foreign_stored_offsets() {
        let mut file = SackRecord::encode("a", &[1], 0).unwrap();
        file.extend(SackRecord::encode("b", &[2], 999).unwrap());

        let entries: Vec<SackEntry> = RecordIterator::new(Cursor::new(file))
            .unwrap()
            .collect::<CoreResult<_>>()
            .unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].stored_offset, 999);
        assert_ne!(entries[1].offset, entries[1].stored_offset);
    }
}
