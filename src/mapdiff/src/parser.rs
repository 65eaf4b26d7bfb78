//! Maps snapshot parser
//!
//! Turns text in the `/proc/<pid>/maps` layout into a [`Snapshot`]:
//!
//! ```text
//! <start>-<end> <perms> <offset> <dev> <inode>   <path?>
//! ```
//!
//! Only `start-end perms` is required. Lines that do not get that far are
//! skipped without error, and a missing path marks the mapping anonymous.

use crate::record::MappingRecord;
use crate::snapshot::Snapshot;
use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Maximum number of permission characters kept per record
pub const MAX_PERMS_LEN: usize = 4;

/// Line counters gathered while building a snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    /// Lines that produced a stored record
    pub accepted: usize,
    /// Lines that did not match the grammar or had an empty range
    pub skipped: usize,
    /// Well-formed lines dropped because their start was already present
    pub duplicates: usize,
}

/// Char cursor over a single line
struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Consume the longest prefix whose chars satisfy `pred`
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .find(|&(_, c)| !pred(c))
            .map(|(i, _)| i)
            .unwrap_or(self.rest.len());
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    /// Consume up to `max` non-whitespace chars
    fn take_token(&mut self, max: usize) -> &'a str {
        let end = self
            .rest
            .char_indices()
            .take_while(|&(_, c)| !c.is_whitespace())
            .take(max)
            .last()
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let (taken, rest) = self.rest.split_at(end);
        self.rest = rest;
        taken
    }

    fn eat(&mut self, expected: char) -> bool {
        match self.rest.strip_prefix(expected) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Hex number with optional leading whitespace and `0x` prefix
    fn hex(&mut self) -> Option<u64> {
        self.skip_whitespace();
        if let Some(rest) = self
            .rest
            .strip_prefix("0x")
            .or_else(|| self.rest.strip_prefix("0X"))
        {
            self.rest = rest;
        }
        let digits = self.take_while(|c| c.is_ascii_hexdigit());
        if digits.is_empty() {
            return None;
        }
        u64::from_str_radix(digits, 16).ok()
    }

    /// Skip a whitespace-separated field, `false` if none was there
    fn skip_field(&mut self) -> bool {
        self.skip_whitespace();
        !self.take_while(|c| !c.is_whitespace()).is_empty()
    }
}

/// Parse the trailing `offset dev inode path` fields and return the path.
fn parse_path(cursor: &mut Cursor<'_>) -> Option<String> {
    if !cursor.skip_field() || !cursor.skip_field() {
        return None;
    }
    cursor.skip_whitespace();
    if cursor.take_while(|c| c.is_ascii_digit() || c == ' ').is_empty() {
        return None;
    }
    match cursor.rest {
        "" => None,
        path => Some(path.to_string()),
    }
}

/// Parse one maps line.
///
/// Returns `None` for lines without at least `start-end perms`, and for
/// lines whose range is empty or inverted.
pub fn parse_line(line: &str) -> Option<MappingRecord> {
    let line = line.trim_end_matches(['\n', '\r']);
    let mut cursor = Cursor::new(line);

    let start = cursor.hex()?;
    if !cursor.eat('-') {
        return None;
    }
    let end = cursor.hex()?;

    cursor.skip_whitespace();
    let perms = cursor.take_token(MAX_PERMS_LEN);
    if perms.is_empty() {
        return None;
    }

    let path = parse_path(&mut cursor);
    MappingRecord::new(start, end, perms, path)
}

fn accept_line(snapshot: &mut Snapshot, stats: &mut ParseStats, line_no: usize, line: &str) {
    let Some(record) = parse_line(line) else {
        tracing::trace!(line_no, "skipping unparsable maps line");
        stats.skipped += 1;
        return;
    };
    let start = record.start;
    if snapshot.insert_if_absent(record) {
        stats.accepted += 1;
    } else {
        tracing::trace!(line_no, "dropping duplicate start {:#x}", start);
        stats.duplicates += 1;
    }
}

/// Build a snapshot from text without checking the record count
pub fn build(content: &str) -> (Snapshot, ParseStats) {
    let mut snapshot = Snapshot::new();
    let mut stats = ParseStats::default();
    for (idx, line) in content.lines().enumerate() {
        accept_line(&mut snapshot, &mut stats, idx + 1, line);
    }
    (snapshot, stats)
}

fn validate(snapshot: Snapshot, stats: ParseStats) -> Result<Snapshot> {
    tracing::debug!(
        records = stats.accepted,
        skipped = stats.skipped,
        duplicates = stats.duplicates,
        bytes = snapshot.total_size(),
        "parsed maps snapshot"
    );
    if snapshot.len() <= 1 {
        return Err(Error::TooFewRecords {
            count: snapshot.len(),
        });
    }
    Ok(snapshot)
}

/// Parse snapshot text.
///
/// Fails when fewer than two records survive parsing.
pub fn parse(content: &str) -> Result<Snapshot> {
    let (snapshot, stats) = build(content);
    validate(snapshot, stats)
}

/// Parse a snapshot from a reader, line by line.
///
/// Lines that are not valid UTF-8 are decoded lossily so that odd path
/// names do not abort the whole snapshot.
pub fn parse_reader<R: BufRead>(mut reader: R) -> Result<Snapshot> {
    let mut snapshot = Snapshot::new();
    let mut stats = ParseStats::default();
    let mut buf = Vec::new();
    let mut line_no = 0;

    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            break;
        }
        line_no += 1;
        let line = String::from_utf8_lossy(&buf);
        accept_line(&mut snapshot, &mut stats, line_no, &line);
    }

    validate(snapshot, stats)
}

/// Load and parse a snapshot file
pub fn load(path: &Path) -> Result<Snapshot> {
    let io_error = |source| Error::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_error)?;
    tracing::debug!(path = %path.display(), "loading maps snapshot");

    match parse_reader(BufReader::new(file)) {
        Err(Error::Read(source)) => Err(io_error(source)),
        other => other,
    }
}
