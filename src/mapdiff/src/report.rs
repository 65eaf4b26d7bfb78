//! Report model for a snapshot diff
//!
//! Byte totals, unit conversion and the per-label breakdown. Rendering to
//! text goes through the `Display` impls here; JSON through `Serialize`.

use crate::diff::DiffResult;
use crate::record::{MappingRecord, PAGE_SIZE};
use crate::snapshot::Snapshot;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Bytes per megabyte in bulk figures
pub const MEGABYTE: u64 = 1024 * 1024;

/// Default cutoff for the per-label summary
pub const DEFAULT_LABEL_THRESHOLD: u64 = 64 * MEGABYTE;

/// Width of the right-aligned labels in the bulk section
const BULK_LABEL_WIDTH: usize = 18;

pub fn bytes_to_mb(bytes: u64) -> u64 {
    bytes / MEGABYTE
}

pub fn bytes_to_pages(bytes: u64) -> u64 {
    bytes / PAGE_SIZE
}

/// Overall direction of the change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "direction", content = "bytes", rename_all = "lowercase")]
pub enum NetChange {
    Grew(u64),
    /// Also used when new and lost bytes are equal
    Shrank(u64),
}

impl NetChange {
    pub fn between(new_bytes: u64, lost_bytes: u64) -> Self {
        if new_bytes > lost_bytes {
            NetChange::Grew(new_bytes - lost_bytes)
        } else {
            NetChange::Shrank(lost_bytes - new_bytes)
        }
    }

    pub fn bytes(self) -> u64 {
        match self {
            NetChange::Grew(b) | NetChange::Shrank(b) => b,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NetChange::Grew(_) => "Grew",
            NetChange::Shrank(_) => "Shrank",
        }
    }
}

/// Aggregate byte counts for a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BulkSummary {
    pub lost_bytes: u64,
    pub new_bytes: u64,
    pub kept_bytes: u64,
    pub net: NetChange,
}

impl BulkSummary {
    pub fn from_diff(diff: &DiffResult) -> Self {
        let lost_bytes = diff.lost_bytes();
        let new_bytes = diff.new_bytes();
        Self {
            lost_bytes,
            new_bytes,
            kept_bytes: diff.kept_bytes(),
            net: NetChange::between(new_bytes, lost_bytes),
        }
    }
}

impl fmt::Display for BulkSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = BULK_LABEL_WIDTH;
        writeln!(f, "Bulk analysis (MB)")?;
        writeln!(f, "{:>w$}{}", "Lost: ", bytes_to_mb(self.lost_bytes))?;
        writeln!(f, "{:>w$}{}", "New: ", bytes_to_mb(self.new_bytes))?;
        writeln!(f, "{:>w$}{}", "Kept: ", bytes_to_mb(self.kept_bytes))?;
        let net_label = format!("{}: ", self.net.label());
        writeln!(f, "{:>w$}{}", net_label, bytes_to_mb(self.net.bytes()))
    }
}

/// One row of the grown listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrownEntry {
    pub label: String,
    pub start: u64,
    pub end: u64,
    pub bytes: u64,
    pub pages: u64,
}

impl From<&MappingRecord> for GrownEntry {
    fn from(record: &MappingRecord) -> Self {
        Self {
            label: record.label().to_string(),
            start: record.start,
            end: record.end,
            bytes: record.size,
            pages: record.pages(),
        }
    }
}

impl fmt::Display for GrownEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{:x},{:x}] = {}",
            self.label, self.start, self.end, self.pages
        )
    }
}

/// Total bytes per label across a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelTotal {
    pub label: String,
    pub bytes: u64,
    pub pages: u64,
}

/// Per-label breakdown, filtered to labels at or above a threshold
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabelUsage {
    pub threshold_bytes: u64,
    pub total_bytes: u64,
    pub labels: Vec<LabelTotal>,
    /// Column width for text output, derived from every label seen
    #[serde(skip)]
    width: usize,
}

impl LabelUsage {
    /// Sum stored sizes by label and keep labels totalling at least
    /// `threshold_bytes`, ordered by label.
    pub fn from_snapshot(snapshot: &Snapshot, threshold_bytes: u64) -> Self {
        let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
        for record in snapshot {
            let total = totals.entry(record.label()).or_default();
            *total = total.saturating_add(record.size);
        }

        let width = totals.keys().map(|l| l.chars().count()).max().unwrap_or(0) + 4;
        let labels = totals
            .into_iter()
            .filter(|&(_, bytes)| bytes >= threshold_bytes)
            .map(|(label, bytes)| LabelTotal {
                label: label.to_string(),
                bytes,
                pages: bytes_to_pages(bytes),
            })
            .collect();

        Self {
            threshold_bytes,
            total_bytes: snapshot.total_size(),
            labels,
            width,
        }
    }
}

impl fmt::Display for LabelUsage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let w = self.width;
        for entry in &self.labels {
            writeln!(f, "{:<w$}: {}", entry.label, entry.pages)?;
        }
        writeln!(f, "Total size (MB): {}", bytes_to_mb(self.total_bytes))
    }
}

/// Everything printed for one diff
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub bulk: BulkSummary,
    pub grown: Vec<GrownEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub by_label: Option<LabelUsage>,
}

impl Report {
    pub fn new(diff: &DiffResult) -> Self {
        Self {
            bulk: BulkSummary::from_diff(diff),
            grown: diff.grew.iter().map(GrownEntry::from).collect(),
            by_label: None,
        }
    }

    /// Attach a per-label breakdown of the grown mappings
    pub fn with_label_usage(mut self, diff: &DiffResult, threshold_bytes: u64) -> Self {
        self.by_label = Some(LabelUsage::from_snapshot(&diff.grew, threshold_bytes));
        self
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bulk)?;
        writeln!(f, "Grown (new or bigger) pages")?;
        for entry in &self.grown {
            writeln!(f, "{}", entry)?;
        }
        if let Some(usage) = &self.by_label {
            writeln!(
                f,
                "Grown by label (>= {} MB, pages)",
                bytes_to_mb(usage.threshold_bytes)
            )?;
            write!(f, "{}", usage)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff;

    fn record(start: u64, end: u64, path: Option<&str>) -> MappingRecord {
        MappingRecord::new(start, end, "rw-p", path.map(str::to_string)).unwrap()
    }

    fn example_diff() -> DiffResult {
        let left: Snapshot = [record(0x1000, 0x2000, None), record(0x5000, 0x6000, None)]
            .into_iter()
            .collect();
        let right: Snapshot = [
            record(0x1000, 0x3000, None),
            record(0x7000, 0x8000, Some("[heap]")),
        ]
        .into_iter()
        .collect();
        diff(&left, &right)
    }

    #[test]
    fn test_net_change() {
        assert_eq!(NetChange::between(8192, 4096), NetChange::Grew(4096));
        assert_eq!(NetChange::between(4096, 8192), NetChange::Shrank(4096));
        assert_eq!(NetChange::between(4096, 4096), NetChange::Shrank(0));
    }

    #[test]
    fn test_unit_conversion_truncates() {
        assert_eq!(bytes_to_mb(MEGABYTE - 1), 0);
        assert_eq!(bytes_to_mb(3 * MEGABYTE + 17), 3);
        assert_eq!(bytes_to_pages(4095), 0);
        assert_eq!(bytes_to_pages(8192), 2);
    }

    #[test]
    fn test_bulk_summary_from_diff() {
        let summary = BulkSummary::from_diff(&example_diff());
        assert_eq!(summary.lost_bytes, 4096);
        assert_eq!(summary.new_bytes, 8192);
        assert_eq!(summary.kept_bytes, 0);
        assert_eq!(summary.net, NetChange::Grew(4096));
    }

    #[test]
    fn test_bulk_summary_text() {
        let summary = BulkSummary {
            lost_bytes: 2 * MEGABYTE,
            new_bytes: 5 * MEGABYTE,
            kept_bytes: 10 * MEGABYTE,
            net: NetChange::Grew(3 * MEGABYTE),
        };
        let text = summary.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Bulk analysis (MB)");
        assert_eq!(lines[1], "            Lost: 2");
        assert_eq!(lines[2], "             New: 5");
        assert_eq!(lines[3], "            Kept: 10");
        assert_eq!(lines[4], "            Grew: 3");
    }

    #[test]
    fn test_report_grown_listing() {
        let report = Report::new(&example_diff());
        assert_eq!(report.grown.len(), 2);
        assert_eq!(report.grown[0].to_string(), "<Anonymous> [1000,2000] = 1");
        assert_eq!(report.grown[1].to_string(), "[heap] [7000,8000] = 1");

        let text = report.to_string();
        assert!(text.contains("Grown (new or bigger) pages\n<Anonymous> [1000,2000] = 1\n"));
        assert!(!text.contains("Grown by label"));
    }

    #[test]
    fn test_label_usage_threshold_and_padding() {
        let snapshot: Snapshot = [
            record(0x10000, 0x20000, Some("/lib/a.so")),
            record(0x20000, 0x30000, Some("/lib/a.so")),
            record(0x40000, 0x41000, None),
        ]
        .into_iter()
        .collect();

        let usage = LabelUsage::from_snapshot(&snapshot, 0x10000);
        assert_eq!(usage.labels.len(), 1);
        assert_eq!(usage.labels[0].label, "/lib/a.so");
        assert_eq!(usage.labels[0].bytes, 0x20000);
        assert_eq!(usage.labels[0].pages, 32);
        assert_eq!(usage.total_bytes, 0x21000);

        let text = usage.to_string();
        // widest label is "<Anonymous>" (11 chars), padded by 4
        assert!(text.starts_with("/lib/a.so      : 32\n"));
        assert!(text.ends_with("Total size (MB): 0\n"));
    }

    #[test]
    fn test_label_usage_pads_by_chars() {
        let snapshot: Snapshot = [
            record(0x10000, 0x20000, Some("/tmp/données.bin")),
            record(0x20000, 0x30000, Some("/lib/a.so")),
        ]
        .into_iter()
        .collect();

        let text = LabelUsage::from_snapshot(&snapshot, 0).to_string();
        // "/tmp/données.bin" is 16 chars (17 bytes), so the column is 20 wide
        assert!(text.starts_with("/lib/a.so           : 16\n"));
        assert!(text.contains("/tmp/données.bin    : 16\n"));
    }

    #[test]
    fn test_report_survives_overlapping_giant_mappings() {
        let left: Snapshot = [
            record(0x1000, 0x2000, Some("/big")),
            record(0x3000, 0x4000, None),
        ]
        .into_iter()
        .collect();
        let right: Snapshot = [
            record(0x1000, u64::MAX, Some("/big")),
            record(0x5000, u64::MAX, Some("/big")),
        ]
        .into_iter()
        .collect();
        let result = diff(&left, &right);

        let report = Report::new(&result).with_label_usage(&result, 0);
        assert_eq!(report.bulk.new_bytes, u64::MAX);
        assert_eq!(report.bulk.lost_bytes, 0x1000);
        assert_eq!(report.bulk.net, NetChange::Grew(u64::MAX - 0x1000));
        let usage = report.by_label.as_ref().unwrap();
        assert_eq!(usage.labels.len(), 1);
        assert_eq!(usage.labels[0].label, "/big");
        assert_eq!(usage.labels[0].bytes, u64::MAX);
        assert_eq!(usage.total_bytes, u64::MAX);
    }

    #[test]
    fn test_report_json_shape() {
        let report = Report::new(&example_diff()).with_label_usage(&example_diff(), 0);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["bulk"]["net"]["direction"], "grew");
        assert_eq!(value["bulk"]["net"]["bytes"], 4096);
        assert_eq!(value["grown"][1]["label"], "[heap]");
        assert_eq!(value["by_label"]["labels"].as_array().unwrap().len(), 2);
    }
}
