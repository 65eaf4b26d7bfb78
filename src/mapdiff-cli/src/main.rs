//! mapdiff - compare two memory mapping snapshots

mod cli;
mod config;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use cli::Args;
use config::Config;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_snapshot(path: &Path) -> Result<mapdiff::Snapshot> {
    mapdiff::load(path).with_context(|| format!("Failed to load snapshot {}", path.display()))
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = Config::load()?;
    let format = config.resolve_format(args.format);

    let left = load_snapshot(&args.left)?;
    let right = load_snapshot(&args.right)?;

    let result = mapdiff::diff(&left, &right);
    let mut report = mapdiff::Report::new(&result);
    if args.by_label {
        report = report.with_label_usage(&result, config.resolve_threshold(args.threshold_mb));
    }

    let stdout = std::io::stdout();
    output::render(&mut stdout.lock(), &report, format)
}
