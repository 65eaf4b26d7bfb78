//! Address-ordered snapshot of memory mappings.
//!
//! A snapshot is keyed only by start address. Two records that share a
//! start address are the same key even when their end, permissions or path
//! differ, and the first one inserted is the one that stays.

use crate::record::MappingRecord;
use serde::{Serialize, Serializer};
use std::collections::btree_map::{self, BTreeMap, Entry};

/// Ordered set of mapping records, unique by `start`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    records: BTreeMap<u64, MappingRecord>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record unless its start address is already present.
    ///
    /// Returns `true` if the record was stored. An existing record is never
    /// replaced.
    pub fn insert_if_absent(&mut self, record: MappingRecord) -> bool {
        match self.records.entry(record.start) {
            Entry::Vacant(slot) => {
                slot.insert(record);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    /// Look up the record starting at `start`
    pub fn get(&self, start: u64) -> Option<&MappingRecord> {
        self.records.get(&start)
    }

    pub fn contains(&self, start: u64) -> bool {
        self.records.contains_key(&start)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending start order
    pub fn iter(&self) -> btree_map::Values<'_, u64, MappingRecord> {
        self.records.values()
    }

    /// Start addresses in ascending order
    pub fn starts(&self) -> impl Iterator<Item = u64> + '_ {
        self.records.keys().copied()
    }

    /// Sum of the stored `size` of every record, saturating at `u64::MAX`
    ///
    /// Records may overlap, so the sum is not bounded by the address space.
    pub fn total_size(&self) -> u64 {
        self.records
            .values()
            .map(|r| r.size)
            .fold(0, u64::saturating_add)
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a MappingRecord;
    type IntoIter = btree_map::Values<'a, u64, MappingRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<MappingRecord> for Snapshot {
    fn from_iter<I: IntoIterator<Item = MappingRecord>>(iter: I) -> Self {
        let mut snapshot = Snapshot::new();
        for record in iter {
            snapshot.insert_if_absent(record);
        }
        snapshot
    }
}

impl Serialize for Snapshot {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.records.values())
    }
}
