//! Corpus discovery and the parallel scan over all session files.
//!
//! Discovery finds every `*.jsonl` under the scan root, excluding
//! agent sub-session files by filename marker. Each file is scanned
//! independently and the per-file results are folded together with a
//! parallel reduce; every fold operation is associative and
//! commutative, so the thread scheduling never changes the output.
//!
//! An unreadable file contributes nothing beyond a skip count. A
//! corrupted line inside a readable file was already dropped by the
//! record reader, so a partially corrupted transcript yields the same
//! result as the file with those lines deleted.

use crate::config::{AnalysisConfig, ScanConfig};
use crate::error::{Error, Result};
use crate::extract::EventExtractor;
use crate::metrics::{CategoryCounts, CorpusMetrics};
use crate::patterns::{
    find_bash_retries, find_correction_sequences, find_execute_explore_modify, DetectorParams,
};
use crate::reader::RecordReader;
use crate::select::{ExampleSelector, RejectionExample};
use crate::types::{EventSpan, PatternKind, PatternMatch, ToolEvent};
use chrono::Datelike;
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sessions shorter than this carry no meaningful sequence structure
/// and are excluded from pattern detection (their counters still
/// aggregate).
const MIN_EVENTS_FOR_PATTERNS: usize = 3;

/// Per-session retention caps, keeping any single long session from
/// dominating the corpus examples.
const SESSION_CYCLE_CAP: usize = 2;
const SESSION_CORRECTION_CAP: usize = 1;
const SESSION_RETRY_CAP: usize = 1;

/// Leading characters of the file stem used as the session id.
const SESSION_ID_LEN: usize = 8;

/// Accumulated result of scanning some subset of the corpus.
#[derive(Debug)]
pub struct CorpusScan {
    /// Summed counters and skip bookkeeping
    pub metrics: CorpusMetrics,
    /// Retained pattern and rejection examples
    pub examples: ExampleSelector,
    /// Tool-category tallies bucketed by ISO week
    pub weekly: BTreeMap<String, CategoryCounts>,
}

impl CorpusScan {
    pub fn empty(example_cap: usize) -> Self {
        Self {
            metrics: CorpusMetrics::default(),
            examples: ExampleSelector::new(example_cap),
            weekly: BTreeMap::new(),
        }
    }

    /// Fold another partial scan in (parallel reduce step).
    pub fn merge(mut self, other: CorpusScan) -> Self {
        self.metrics.merge(&other.metrics);
        self.examples.merge(other.examples);
        for (week, counts) in other.weekly {
            self.weekly.entry(week).or_default().merge(&counts);
        }
        self
    }
}

/// Scans a corpus of session transcripts.
pub struct CorpusScanner {
    analysis: AnalysisConfig,
    scan: ScanConfig,
}

impl CorpusScanner {
    pub fn new(analysis: AnalysisConfig, scan: ScanConfig) -> Self {
        Self { analysis, scan }
    }

    /// Discover all session files under the scan root, sorted for
    /// stable ordering. Agent sub-session files are excluded by
    /// filename marker.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let root = self.scan.effective_root();
        let pattern = root.join("**").join("*.jsonl");
        let pattern = pattern
            .to_str()
            .ok_or_else(|| Error::Discovery(format!("non-UTF-8 scan root {:?}", root)))?;

        let mut paths = Vec::new();
        for entry in glob::glob(pattern)
            .map_err(|e| Error::Discovery(format!("invalid scan pattern: {}", e)))?
        {
            match entry {
                Ok(path) => {
                    let excluded = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .is_some_and(|name| name.contains(&self.scan.exclude_marker));
                    if !excluded {
                        paths.push(path);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable directory entry");
                }
            }
        }

        paths.sort();
        tracing::info!(root = %root.display(), files = paths.len(), "discovered session files");
        Ok(paths)
    }

    /// Scan every discovered file and fold the results.
    pub fn scan(&self) -> Result<CorpusScan> {
        let paths = self.discover()?;
        Ok(self.scan_paths(&paths))
    }

    /// Scan an explicit set of files in parallel.
    pub fn scan_paths(&self, paths: &[PathBuf]) -> CorpusScan {
        let cap = self.analysis.stored_example_cap;
        paths
            .par_iter()
            .map(|path| self.scan_file(path))
            .reduce(|| CorpusScan::empty(cap), CorpusScan::merge)
    }

    /// Scan one session file. Read failures are logged and reported as
    /// a skip, never as a scan error.
    fn scan_file(&self, path: &Path) -> CorpusScan {
        let mut result = CorpusScan::empty(self.analysis.stored_example_cap);

        let reader = match RecordReader::open(path) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping unreadable file");
                result.metrics.files_skipped += 1;
                return result;
            }
        };

        let extractor = EventExtractor::new(self.analysis.correction_lookback);
        let scan = extractor.extract(reader);

        result.metrics.absorb_session(&scan.metrics);

        let session_id = session_id_of(path);
        let project = project_of(path);

        for preview in &scan.rejection_previews {
            result.examples.offer_rejection(RejectionExample {
                session_id: session_id.clone(),
                preview: preview.clone(),
            });
        }

        for event in &scan.events {
            if let Some(ts) = event.timestamp {
                let week = ts.iso_week();
                let key = format!("{}-W{:02}", week.year(), week.week());
                result.weekly.entry(key).or_default().record(event.category);
            }
        }

        if scan.events.len() >= MIN_EVENTS_FOR_PATTERNS {
            let params = DetectorParams::from(&self.analysis);
            self.offer_spans(
                &mut result.examples,
                PatternKind::ExecuteExploreModify,
                find_execute_explore_modify(&scan.events, params.cycle_window),
                SESSION_CYCLE_CAP,
                &scan.events,
                &session_id,
                &project,
            );
            self.offer_spans(
                &mut result.examples,
                PatternKind::CorrectionSequence,
                find_correction_sequences(&scan.events, params.correction_pair_distance),
                SESSION_CORRECTION_CAP,
                &scan.events,
                &session_id,
                &project,
            );
            self.offer_spans(
                &mut result.examples,
                PatternKind::BashRetry,
                find_bash_retries(&scan.events, params.retry_window),
                SESSION_RETRY_CAP,
                &scan.events,
                &session_id,
                &project,
            );
        }

        result
    }

    #[allow(clippy::too_many_arguments)]
    fn offer_spans(
        &self,
        examples: &mut ExampleSelector,
        kind: PatternKind,
        spans: Vec<EventSpan>,
        session_cap: usize,
        events: &[ToolEvent],
        session_id: &str,
        project: &str,
    ) {
        for span in spans.into_iter().take(session_cap) {
            let candidate = PatternMatch {
                pattern_type: kind,
                span,
                events: events[span.start..span.end].to_vec(),
                session_id: session_id.to_string(),
                project: project.to_string(),
            };
            tracing::debug!(session = session_id, pattern = %candidate.describe(), "pattern matched");
            examples.offer(candidate);
        }
    }
}

/// Anonymized session id: the first characters of the file stem.
fn session_id_of(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .chars()
        .take(SESSION_ID_LEN)
        .collect()
}

/// Project name: the transcript's parent directory name.
fn project_of(path: &Path) -> String {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}
