//! CLI argument definitions for mapdiff

use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "mapdiff")]
#[command(about = "Compare two /proc/<pid>/maps snapshots and report what grew")]
#[command(version)]
pub struct Args {
    /// Earlier maps snapshot
    pub left: PathBuf,

    /// Later maps snapshot
    pub right: PathBuf,

    /// Output format (defaults to the configured format, then text)
    #[arg(short, long, value_enum)]
    pub format: Option<OutputFormat>,

    /// Also summarize grown mappings per backing path
    #[arg(long)]
    pub by_label: bool,

    /// Minimum megabytes for a path to appear in the per-path summary
    #[arg(long, value_name = "MB", requires = "by_label")]
    pub threshold_mb: Option<u64>,

    /// Verbose output (debug logging on stderr)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Report output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_require_two_paths() {
        assert!(Args::try_parse_from(["mapdiff"]).is_err());
        assert!(Args::try_parse_from(["mapdiff", "a.maps"]).is_err());
        let args = Args::try_parse_from(["mapdiff", "a.maps", "b.maps"]).unwrap();
        assert_eq!(args.left, PathBuf::from("a.maps"));
        assert_eq!(args.right, PathBuf::from("b.maps"));
        assert_eq!(args.format, None);
        assert!(!args.by_label);
    }

    #[test]
    fn test_args_options() {
        let args = Args::try_parse_from([
            "mapdiff",
            "-f",
            "json",
            "--by-label",
            "--threshold-mb",
            "8",
            "-v",
            "a",
            "b",
        ])
        .unwrap();
        assert_eq!(args.format, Some(OutputFormat::Json));
        assert!(args.by_label);
        assert_eq!(args.threshold_mb, Some(8));
        assert!(args.verbose);
    }

    #[test]
    fn test_threshold_requires_by_label() {
        let err = Args::try_parse_from(["mapdiff", "--threshold-mb", "8", "a", "b"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);
    }
}
