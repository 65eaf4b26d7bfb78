//! # mapdiff
//!
//! Compare two snapshots of a process's memory mappings.
//!
//! This library provides functionality to:
//! - Parse `/proc/<pid>/maps` style text into an address-ordered [`Snapshot`]
//! - Classify every mapping as grown, shrunk or unchanged between two snapshots
//! - Summarize the result as byte totals, a grown-region listing and a
//!   per-label breakdown
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let left = mapdiff::load(Path::new("before.maps"))?;
//! let right = mapdiff::load(Path::new("after.maps"))?;
//!
//! let result = mapdiff::diff(&left, &right);
//! print!("{}", mapdiff::Report::new(&result));
//! # Ok(())
//! # }
//! ```

pub mod diff;
pub mod parser;
pub mod record;
pub mod report;
pub mod snapshot;

use std::path::PathBuf;

// Re-export commonly used items
#[doc(inline)]
pub use diff::{classify, diff, Category, Change, DiffResult};
#[doc(inline)]
pub use parser::{build, load, parse, parse_line, parse_reader, ParseStats};
#[doc(inline)]
pub use record::{MappingRecord, ANONYMOUS_LABEL, PAGE_SIZE};
#[doc(inline)]
pub use report::{
    bytes_to_mb, bytes_to_pages, BulkSummary, GrownEntry, LabelTotal, LabelUsage, NetChange,
    Report, DEFAULT_LABEL_THRESHOLD, MEGABYTE,
};
#[doc(inline)]
pub use snapshot::Snapshot;

/// Errors from loading a snapshot
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Read(#[from] std::io::Error),

    #[error("Snapshot has {count} usable mapping(s), need at least 2")]
    TooFewRecords { count: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
