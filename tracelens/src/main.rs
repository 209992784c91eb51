//! tracelens - behavioral analysis of coding-session transcripts
//!
//! Command-line front end: discovers session files, runs the corpus
//! scan, and prints or writes the analysis report.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracelens_core::{AnalysisReport, Config, CorpusScan, CorpusScanner};

/// Files scanned per progress-bar tick.
const SCAN_CHUNK: usize = 64;

#[derive(Debug, Parser)]
#[command(name = "tracelens", version, about = "Analyze coding-session transcripts for verification and delegation patterns")]
struct Args {
    /// Root directory to scan (default: ~/.claude/projects, or the
    /// configured scan root)
    #[arg(long)]
    root: Option<PathBuf>,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Scan at most this many session files
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = Config::load().context("failed to load configuration")?;
    if let Some(root) = args.root.clone() {
        config.scan.root = Some(root);
    }

    // Initialize logging (to file, stdout is reserved for the report)
    let _log_guard =
        tracelens_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("tracelens starting up");

    let scanner = CorpusScanner::new(config.analysis.clone(), config.scan.clone());
    let mut paths = scanner
        .discover()
        .context("failed to discover session files")?;
    if let Some(limit) = args.limit {
        paths.truncate(limit);
    }

    let scan = scan_with_progress(&scanner, &paths, config.analysis.stored_example_cap);
    tracing::info!(
        sessions = scan.metrics.sessions,
        skipped = scan.metrics.files_skipped,
        "corpus scan complete"
    );

    let report = AnalysisReport::from_scan(&scan).context("failed to assemble report")?;

    let rendered = match args.format {
        Format::Text => report.render_text(config.analysis.inline_example_cap),
        Format::Json => {
            serde_json::to_string_pretty(&report).context("failed to serialize report")?
        }
    };

    match &args.output {
        Some(path) => {
            let mut file = std::fs::File::create(path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            file.write_all(rendered.as_bytes())
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Report written to {}", path.display());
        }
        None => {
            print!("{rendered}");
        }
    }

    tracing::info!("tracelens shutting down");
    Ok(())
}

/// Scan the corpus in chunks so the progress bar advances as files
/// complete; each chunk is still processed in parallel internally.
fn scan_with_progress(scanner: &CorpusScanner, paths: &[PathBuf], example_cap: usize) -> CorpusScan {
    let bar = ProgressBar::new(paths.len() as u64);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} sessions")
            .expect("valid progress template")
            .progress_chars("=> "),
    );

    let mut scan = CorpusScan::empty(example_cap);
    for chunk in paths.chunks(SCAN_CHUNK) {
        scan = scan.merge(scanner.scan_paths(chunk));
        bar.inc(chunk.len() as u64);
    }
    bar.finish_and_clear();

    scan
}
