//! Sack file record format.
//!
//! A sack file is a bare concatenation of records. There is no file header,
//! trailer, magic number, version tag or checksum.
//!
//! ## Record Format
//!
//! ```text
//! | name_len (4) | name (N) | payload_len (4) | stored_offset (8) | payload (M) |
//! ```
//!
//! - All integers are little-endian and signed (`i32`, `i32`, `i64`)
//! - `name` is UTF-8, length-prefixed, not null-terminated
//! - `stored_offset` is the file position the record starts at
//! - `payload` is ciphertext when the store encrypts
//!
//! ## Recovery Policy
//!
//! - **Truncated record** (header declares more bytes than remain): a scan
//!   stops cleanly and keeps everything before it; a direct read fails with
//!   [`CoreError::TruncatedRecord`]
//! - **Invalid record** (negative length, non-UTF-8 name): always an error
//!
//! ## Invariants
//!
//! - Records are never modified after write
//! - The same name may appear in many records; the last one is current

mod iterator;

pub use iterator::RecordIterator;

use crate::error::{CoreError, CoreResult};
use std::io::{self, Read, Seek, SeekFrom};

/// Size of the `name_len` field.
pub const NAME_LEN_SIZE: usize = 4;
/// Size of the `payload_len` field.
pub const PAYLOAD_LEN_SIZE: usize = 4;
/// Size of the `stored_offset` field.
pub const STORED_OFFSET_SIZE: usize = 8;
/// Fixed header bytes, excluding the name.
pub const FIXED_HEADER_SIZE: usize = NAME_LEN_SIZE + PAYLOAD_LEN_SIZE + STORED_OFFSET_SIZE;

/// Returns the encoded size of a record with the given name and payload lengths.
#[must_use]
pub const fn encoded_len(name_len: usize, payload_len: usize) -> u64 {
    (FIXED_HEADER_SIZE + name_len + payload_len) as u64
}

/// A full record, header and payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SackRecord {
    /// Key name.
    pub name: String,
    /// Offset written into the record when it was stored.
    pub stored_offset: u64,
    /// Payload bytes as stored (ciphertext if the store encrypts).
    pub payload: Vec<u8>,
}

impl SackRecord {
    /// Encodes a record that will be written at `position`.
    ///
    /// `position` becomes the record's `stored_offset`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RecordTooLarge`] if the name or payload does not
    /// fit a signed 32-bit length.
    pub fn encode(name: &str, payload: &[u8], position: u64) -> CoreResult<Vec<u8>> {
        let name_len = i32::try_from(name.len()).map_err(|_| CoreError::RecordTooLarge {
            field: "name",
            len: name.len(),
        })?;
        let payload_len = i32::try_from(payload.len()).map_err(|_| CoreError::RecordTooLarge {
            field: "payload",
            len: payload.len(),
        })?;
        let stored_offset = i64::try_from(position)
            .map_err(|_| CoreError::invalid_record(position, "offset does not fit i64"))?;

        let mut buf = Vec::with_capacity(encoded_len(name.len(), payload.len()) as usize);
        buf.extend_from_slice(&name_len.to_le_bytes());
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&stored_offset.to_le_bytes());
        buf.extend_from_slice(payload);
        Ok(buf)
    }

    /// Decodes the record starting at `at_offset`.
    ///
    /// Seeks `reader` to `at_offset`, reads the header fields in order, then
    /// exactly `payload_len` payload bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::TruncatedRecord`] if fewer bytes remain than the
    /// header declares, [`CoreError::InvalidRecord`] for a malformed header,
    /// or an I/O error.
    pub fn decode<R: Read + Seek>(reader: &mut R, at_offset: u64) -> CoreResult<Self> {
        let end = reader.seek(SeekFrom::End(0))?;
        let header = RecordHeader::read_at(reader, at_offset, end)?;

        let mut payload = vec![0u8; header.payload_len as usize];
        reader
            .read_exact(&mut payload)
            .map_err(|e| eof_as_truncated(e, at_offset, header.encoded_len(), end))?;

        Ok(Self {
            name: header.name,
            stored_offset: header.stored_offset,
            payload,
        })
    }

    /// Returns the payload length.
    #[must_use]
    pub fn payload_len(&self) -> usize {
        self.payload.len()
    }

    /// Returns the encoded size of this record.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        encoded_len(self.name.len(), self.payload.len())
    }
}

/// A decoded record header, without the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    /// Key name.
    pub name: String,
    /// Payload length in bytes.
    pub payload_len: u32,
    /// Offset written into the record when it was stored.
    pub stored_offset: u64,
}

impl RecordHeader {
    /// Reads the header of the record at `offset` in a stream of length `end`.
    ///
    /// On success the reader is positioned at the first payload byte, and the
    /// whole payload is known to lie before `end`.
    ///
    /// # Errors
    ///
    /// Same as [`SackRecord::decode`].
    pub fn read_at<R: Read + Seek>(reader: &mut R, offset: u64, end: u64) -> CoreResult<Self> {
        let available = end.saturating_sub(offset);

        let mut needed = NAME_LEN_SIZE as u64;
        if available < needed {
            return Err(CoreError::truncated_record(offset, needed, available));
        }

        reader.seek(SeekFrom::Start(offset))?;
        let name_len = read_i32(reader).map_err(|e| eof_as_truncated(e, offset, needed, end))?;
        let name_len = u32::try_from(name_len).map_err(|_| {
            CoreError::invalid_record(offset, format!("negative name length {name_len}"))
        })?;

        needed += u64::from(name_len) + (PAYLOAD_LEN_SIZE + STORED_OFFSET_SIZE) as u64;
        if available < needed {
            return Err(CoreError::truncated_record(offset, needed, available));
        }

        let mut name = vec![0u8; name_len as usize];
        reader
            .read_exact(&mut name)
            .map_err(|e| eof_as_truncated(e, offset, needed, end))?;
        let name = String::from_utf8(name)
            .map_err(|_| CoreError::invalid_record(offset, "name is not valid UTF-8"))?;

        let payload_len = read_i32(reader).map_err(|e| eof_as_truncated(e, offset, needed, end))?;
        let payload_len = u32::try_from(payload_len).map_err(|_| {
            CoreError::invalid_record(offset, format!("negative payload length {payload_len}"))
        })?;

        let stored_offset =
            read_i64(reader).map_err(|e| eof_as_truncated(e, offset, needed, end))?;
        let stored_offset = u64::try_from(stored_offset).map_err(|_| {
            CoreError::invalid_record(offset, format!("negative stored offset {stored_offset}"))
        })?;

        needed += u64::from(payload_len);
        if available < needed {
            return Err(CoreError::truncated_record(offset, needed, available));
        }

        Ok(Self {
            name,
            payload_len,
            stored_offset,
        })
    }

    /// Returns the encoded size of the whole record, payload included.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        encoded_len(self.name.len(), self.payload_len as usize)
    }
}

/// One physical record as seen by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SackEntry {
    /// Key name.
    pub name: String,
    /// Offset of the record's first byte.
    pub offset: u64,
    /// Stored payload length in bytes (ciphertext length if encrypted).
    pub length: u32,
    /// Offset written into the record when it was stored.
    pub stored_offset: u64,
}

fn read_i32<R: Read>(reader: &mut R) -> io::Result<i32> {
    let mut buf = [0u8; 4];
    reader.read_exact(&mut buf)?;
    Ok(i32::from_le_bytes(buf))
}

fn read_i64<R: Read>(reader: &mut R) -> io::Result<i64> {
    let mut buf = [0u8; 8];
    reader.read_exact(&mut buf)?;
    Ok(i64::from_le_bytes(buf))
}

/// The file shrank between the length check and the read.
fn eof_as_truncated(err: io::Error, offset: u64, needed: u64, end: u64) -> CoreError {
    if err.kind() == io::ErrorKind::UnexpectedEof {
        CoreError::truncated_record(offset, needed, end.saturating_sub(offset))
    } else {
        CoreError::Io(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn two_records() -> (Vec<u8>, u64) {
        let mut file = SackRecord::encode("a", &[1], 0).unwrap();
        let second = file.len() as u64;
        file.extend(SackRecord::encode("a", &[2, 2], second).unwrap());
        (file, second)
    }

    #[test]
    fn encode_layout() {
        let bytes = SackRecord::encode("hi", &[0xCA, 0xFE], 0x0102).unwrap();

        assert_eq!(
            bytes,
            vec![
                2, 0, 0, 0, // name_len
                b'h', b'i', // name
                2, 0, 0, 0, // payload_len
                0x02, 0x01, 0, 0, 0, 0, 0, 0, // stored_offset
                0xCA, 0xFE, // payload
            ]
        );
        assert_eq!(bytes.len() as u64, encoded_len(2, 2));
    }

    #[test]
    fn decode_at_offset() {
        let (file, second) = two_records();
        let mut cursor = Cursor::new(file);

        let first = SackRecord::decode(&mut cursor, 0).unwrap();
        assert_eq!(first.name, "a");
        assert_eq!(first.payload, vec![1]);
        assert_eq!(first.stored_offset, 0);

        let record = SackRecord::decode(&mut cursor, second).unwrap();
        assert_eq!(record.payload, vec![2, 2]);
        assert_eq!(record.payload_len(), 2);
        assert_eq!(record.stored_offset, second);
    }

    #[test]
    fn empty_name_and_payload() {
        let bytes = SackRecord::encode("", &[], 0).unwrap();
        assert_eq!(bytes.len(), FIXED_HEADER_SIZE);

        let record = SackRecord::decode(&mut Cursor::new(bytes), 0).unwrap();
        assert!(record.name.is_empty());
        assert!(record.payload.is_empty());
    }

    #[test]
    fn multibyte_name_length_is_bytes() {
        let bytes = SackRecord::encode("héllo", &[], 0).unwrap();
        assert_eq!(&bytes[..4], &6i32.to_le_bytes());

        let record = SackRecord::decode(&mut Cursor::new(bytes), 0).unwrap();
        assert_eq!(record.name, "héllo");
    }

    #[test]
    fn truncated_payload() {
        let mut bytes = SackRecord::encode("key", &[9; 10], 0).unwrap();
        bytes.truncate(bytes.len() - 3);
        let len = bytes.len() as u64;

        let result = SackRecord::decode(&mut Cursor::new(bytes), 0);
        match result {
            Err(CoreError::TruncatedRecord {
                offset,
                needed,
                available,
            }) => {
                assert_eq!(offset, 0);
                assert_eq!(needed, len + 3);
                assert_eq!(available, len);
            }
            other => panic!("expected truncated record, got {other:?}"),
        }
    }

    #[test]
    fn truncated_header() {
        let bytes = SackRecord::encode("key", &[9; 10], 0).unwrap();

        for cut in [2, 5, 10] {
            let result = SackRecord::decode(&mut Cursor::new(bytes[..cut].to_vec()), 0);
            assert!(
                matches!(result, Err(CoreError::TruncatedRecord { .. })),
                "cut at {cut}"
            );
        }
    }

    #[test]
    fn offset_past_end() {
        let (file, _) = two_records();
        let len = file.len() as u64;

        let result = SackRecord::decode(&mut Cursor::new(file), len + 10);
        assert!(matches!(
            result,
            Err(CoreError::TruncatedRecord { available: 0, .. })
        ));
    }

    #[test]
    fn negative_lengths_are_invalid() {
        let mut bytes = SackRecord::encode("k", &[1], 0).unwrap();
        bytes[..4].copy_from_slice(&(-1i32).to_le_bytes());
        let result = SackRecord::decode(&mut Cursor::new(bytes), 0);
        assert!(matches!(result, Err(CoreError::InvalidRecord { .. })));

        let mut bytes = SackRecord::encode("k", &[1], 0).unwrap();
        bytes[5..9].copy_from_slice(&(-5i32).to_le_bytes());
        let result = SackRecord::decode(&mut Cursor::new(bytes), 0);
        assert!(matches!(result, Err(CoreError::InvalidRecord { .. })));
    }

    #[test]
    fn invalid_utf8_name() {
        let mut bytes = SackRecord::encode("ab", &[], 0).unwrap();
        bytes[4] = 0xFF;
        let result = SackRecord::decode(&mut Cursor::new(bytes), 0);
        assert!(matches!(result, Err(CoreError::InvalidRecord { .. })));
    }

    #[test]
    fn header_leaves_reader_at_payload() {
        let bytes = SackRecord::encode("name", &[5, 6, 7], 0).unwrap();
        let end = bytes.len() as u64;
        let mut cursor = Cursor::new(bytes);

        let header = RecordHeader::read_at(&mut cursor, 0, end).unwrap();
        assert_eq!(header.name, "name");
        assert_eq!(header.payload_len, 3);
        assert_eq!(header.encoded_len(), end);
        assert_eq!(cursor.position(), end - 3);
    }

    proptest! {
        #[test]
        fn encode_decode_roundtrip(
            name in ".{0,32}",
            payload in proptest::collection::vec(any::<u8>(), 0..512),
            position in 0u64..1 << 40,
        ) {
            let bytes = SackRecord::encode(&name, &payload, position).unwrap();
            prop_assert_eq!(bytes.len() as u64, encoded_len(name.len(), payload.len()));

            let record = SackRecord::decode(&mut Cursor::new(bytes), 0).unwrap();
            prop_assert_eq!(record.name, name);
            prop_assert_eq!(record.payload, payload);
            prop_assert_eq!(record.stored_offset, position);
        }
    }
}
