//! Snapshot diffing
//!
//! Classifies every start address of two snapshots into exactly one of
//! `grew`, `shrank` or `both`.

use crate::record::MappingRecord;
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::cmp::Ordering;

/// How a single start address changed between two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// Only present on the right
    Added,
    /// Only present on the left
    Removed,
    /// Present in both, right end is larger
    Extended { delta: u64 },
    /// Present in both, right end is smaller
    Truncated { delta: u64 },
    /// Present in both with the same end
    Unchanged,
}

/// Compare the left and right record for one start address
pub fn classify(left: Option<&MappingRecord>, right: Option<&MappingRecord>) -> Option<Change> {
    match (left, right) {
        (None, None) => None,
        (None, Some(_)) => Some(Change::Added),
        (Some(_), None) => Some(Change::Removed),
        (Some(l), Some(r)) => Some(match l.end.cmp(&r.end) {
            Ordering::Less => Change::Extended {
                delta: r.end - l.end,
            },
            Ordering::Greater => Change::Truncated {
                delta: l.end - r.end,
            },
            Ordering::Equal => Change::Unchanged,
        }),
    }
}

/// Output collection of a [`DiffResult`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Grew,
    Shrank,
    Both,
}

impl Change {
    /// Output collection this change is recorded in
    pub fn category(self) -> Category {
        match self {
            Change::Added | Change::Extended { .. } => Category::Grew,
            Change::Removed | Change::Truncated { .. } => Category::Shrank,
            Change::Unchanged => Category::Both,
        }
    }
}

/// Result of diffing two snapshots
///
/// Each side is itself a [`Snapshot`], so the start-uniqueness rule holds.
/// The `size` of an entry is the number of bytes attributed to that
/// classification: the full size for added, removed and unchanged
/// mappings, only the delta for extended and truncated ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub grew: Snapshot,
    pub shrank: Snapshot,
    pub both: Snapshot,
}

impl DiffResult {
    /// Bytes in mappings that went away or got smaller
    pub fn lost_bytes(&self) -> u64 {
        self.shrank.total_size()
    }

    /// Bytes in mappings that appeared or got larger
    pub fn new_bytes(&self) -> u64 {
        self.grew.total_size()
    }

    /// Bytes in mappings whose extent did not change
    pub fn kept_bytes(&self) -> u64 {
        self.both.total_size()
    }

    fn bucket_mut(&mut self, category: Category) -> &mut Snapshot {
        match category {
            Category::Grew => &mut self.grew,
            Category::Shrank => &mut self.shrank,
            Category::Both => &mut self.both,
        }
    }

    /// Store `record` under `change`, sized by the bytes the change accounts for
    fn record(&mut self, record: &MappingRecord, change: Change) {
        let entry = match change {
            Change::Extended { delta } | Change::Truncated { delta } => record.with_size(delta),
            Change::Added | Change::Removed | Change::Unchanged => record.clone(),
        };
        self.bucket_mut(change.category()).insert_if_absent(entry);
    }

    /// Which output a start address was placed in, if any
    pub fn category_of(&self, start: u64) -> Option<Category> {
        if self.grew.contains(start) {
            Some(Category::Grew)
        } else if self.shrank.contains(start) {
            Some(Category::Shrank)
        } else if self.both.contains(start) {
            Some(Category::Both)
        } else {
            None
        }
    }
}

/// Diff two snapshots.
///
/// The first pass walks `left` and resolves every start address it holds,
/// including those shared with `right`. The second pass only picks up
/// starts that `left` never had.
pub fn diff(left: &Snapshot, right: &Snapshot) -> DiffResult {
    let mut result = DiffResult::default();

    for l in left {
        if let Some(change) = classify(Some(l), right.get(l.start)) {
            result.record(l, change);
        }
    }

    for r in right.iter().filter(|r| !left.contains(r.start)) {
        result.record(r, Change::Added);
    }

    tracing::debug!(
        grew = result.grew.len(),
        shrank = result.shrank.len(),
        both = result.both.len(),
        "classified mappings"
    );
    result
}
