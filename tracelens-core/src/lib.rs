//! # tracelens-core
//!
//! Core library for tracelens - behavioral analysis of coding-session
//! transcripts.
//!
//! This library provides:
//! - A tolerant JSONL record reader for session transcripts
//! - Tool event extraction with streaming verification counters
//! - Sliding-window pattern detectors (cycles, corrections, retries)
//! - Corpus-wide metric aggregation and derived scores
//! - Report assembly with capped, anonymized examples
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! A scan is a pure fold: each session file is read once, reduced to
//! counters plus retained examples, and partial results are merged
//! with operations that are associative and commutative. Parallelism
//! never changes the output.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tracelens_core::{AnalysisReport, Config, CorpusScanner};
//!
//! let config = Config::load().expect("failed to load config");
//! let scanner = CorpusScanner::new(config.analysis.clone(), config.scan.clone());
//! let scan = scanner.scan().expect("scan failed");
//! let report = AnalysisReport::from_scan(&scan).expect("invalid metrics");
//! println!("{}", report.render_text(config.analysis.inline_example_cap));
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use corpus::{CorpusScan, CorpusScanner};
pub use error::{Error, Result};
pub use metrics::CorpusMetrics;
pub use report::AnalysisReport;
pub use types::*;

// Public modules
pub mod catalog;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod logging;
pub mod metrics;
pub mod patterns;
pub mod reader;
pub mod rejection;
pub mod report;
pub mod select;
pub mod types;
