//! Mapping Record Types
//!
//! A single virtual-memory region as it appeared in one maps snapshot.

use serde::Serialize;
use std::fmt;

/// Label used for regions that have no pathname field
pub const ANONYMOUS_LABEL: &str = "<Anonymous>";

/// Page size used when reporting sizes in pages
pub const PAGE_SIZE: u64 = 4096;

/// A memory region from one line of a maps snapshot
///
/// `size` starts out as `end - start`. Records stored in a diff result
/// carry the byte delta attributed to their classification instead, which
/// is why it is a field rather than computed on demand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRecord {
    pub start: u64,
    pub end: u64,
    pub size: u64,
    /// Raw permission characters, never interpreted
    pub perms: String,
    /// Backing pathname, `None` for anonymous mappings
    pub path: Option<String>,
}

impl MappingRecord {
    /// Create a record spanning `[start, end)`. Returns `None` for an empty
    /// or inverted range.
    pub fn new(start: u64, end: u64, perms: &str, path: Option<String>) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(Self {
            start,
            end,
            size: end - start,
            perms: perms.to_string(),
            path,
        })
    }

    /// Copy of this record with `size` replaced
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    /// Extent of the mapped range, independent of the stored size
    pub fn span(&self) -> u64 {
        self.end - self.start
    }

    /// Pathname, or the anonymous sentinel
    pub fn label(&self) -> &str {
        self.path.as_deref().unwrap_or(ANONYMOUS_LABEL)
    }

    pub fn is_anonymous(&self) -> bool {
        self.path.is_none()
    }

    /// Stored size in whole pages (truncating)
    pub fn pages(&self) -> u64 {
        self.size / PAGE_SIZE
    }
}

impl fmt::Display for MappingRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:x},{:x}] = {}",
            self.label(),
            self.start,
            self.end,
            self.pages()
        )
    }
}
