//! In-memory key index.

use crate::record::SackEntry;
use std::borrow::Borrow;
use std::collections::HashMap;

/// Maps key names to the offset of their most recent record.
///
/// Offsets point at the first byte of the record (its `name_len` field), both
/// when inserted by a write and when rebuilt by a scan.
///
/// The index is never persisted. It is rebuilt from the sack file by a full
/// scan or extended one insert at a time as records are appended. There is no
/// removal of single keys; a key stays resolvable until the whole index is
/// cleared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SackIndex {
    offsets: HashMap<String, u64>,
}

impl SackIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds an index from a full scan, in file order.
    ///
    /// Later records for a name replace earlier ones.
    pub fn rebuild_from_scan<I, E>(records: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Borrow<SackEntry>,
    {
        let mut index = Self::new();
        for record in records {
            let record = record.borrow();
            index.insert(record.name.clone(), record.offset);
        }
        index
    }

    /// Returns the record offset for `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u64> {
        self.offsets.get(name).copied()
    }

    /// Points `name` at `offset`, returning the offset it replaced.
    pub fn insert(&mut self, name: impl Into<String>, offset: u64) -> Option<u64> {
        self.offsets.insert(name.into(), offset)
    }

    /// Removes every entry.
    pub fn clear(&mut self) {
        self.offsets.clear();
    }

    /// Returns whether `name` is indexed.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.offsets.contains_key(name)
    }

    /// Returns the number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns whether the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Iterates over indexed names in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.offsets.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, offset: u64) -> SackEntry {
        SackEntry {
            name: name.to_string(),
            offset,
            length: 0,
            stored_offset: offset,
        }
    }

    #[test]
    fn insert_and_lookup() {
        let mut index = SackIndex::new();
        assert!(index.is_empty());
        assert_eq!(index.lookup("a"), None);

        assert_eq!(index.insert("a", 0), None);
        assert_eq!(index.lookup("a"), Some(0));
        assert!(index.contains("a"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn last_write_wins() {
        let mut index = SackIndex::new();
        index.insert("a", 0);
        assert_eq!(index.insert("a", 21), Some(0));
        assert_eq!(index.lookup("a"), Some(21));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn clear_empties() {
        let mut index = SackIndex::new();
        index.insert("a", 0);
        index.insert("b", 10);
        index.clear();
        assert!(index.is_empty());
        assert!(!index.contains("a"));
    }

    #[test]
    fn rebuild_keeps_last_offset() {
        let entries = vec![entry("a", 0), entry("b", 17), entry("a", 34)];
        let index = SackIndex::rebuild_from_scan(&entries);

        assert_eq!(index.len(), 2);
        assert_eq!(index.lookup("a"), Some(34));
        assert_eq!(index.lookup("b"), Some(17));

        let mut names: Vec<&str> = index.names().collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn rebuild_from_owned_entries() {
        let index = SackIndex::rebuild_from_scan(vec![entry("x", 5)]);
        assert_eq!(index.lookup("x"), Some(5));
    }
}
