//! Sliding-window pattern detectors over a session's event sequence.
//!
//! All detectors are pure functions of one session's events; they run
//! independently and share no state. Spans from different detectors
//! may overlap, but the cycle and retry scans advance past each match
//! before resuming, so a single detector never emits overlapping spans
//! of its own kind. The correction detector emits one span per
//! adjacent same-file edit pair.

use crate::config::AnalysisConfig;
use crate::types::{EventSpan, ToolCategory, ToolEvent};
use std::collections::HashMap;

/// Window sizes for the sequence detectors.
///
/// Kept separate from [`AnalysisConfig`] so detectors can be driven
/// directly in tests without constructing a full config.
#[derive(Debug, Clone, Copy)]
pub struct DetectorParams {
    /// Forward window for each stage of the cycle scan
    pub cycle_window: usize,
    /// Forward window for the retry scan
    pub retry_window: usize,
    /// Max index distance between paired same-file edits
    pub correction_pair_distance: usize,
}

impl Default for DetectorParams {
    fn default() -> Self {
        Self {
            cycle_window: 4,
            retry_window: 4,
            correction_pair_distance: 10,
        }
    }
}

impl From<&AnalysisConfig> for DetectorParams {
    fn from(cfg: &AnalysisConfig) -> Self {
        Self {
            cycle_window: cfg.cycle_window,
            retry_window: cfg.retry_window,
            correction_pair_distance: cfg.correction_pair_distance,
        }
    }
}

/// Find execute -> explore -> modify cycles.
///
/// Upon an execution-category event at `i`, search the next
/// `window` events for an exploration event at `j`, then the next
/// `window` events after `j` for a modification event at `k`. On
/// success emit `[i, k+1)` and resume scanning after `k`; on failure
/// at either stage advance `i` by one and retry. Greedy and
/// non-backtracking: overlapping cycles are intentionally not
/// reported separately.
pub fn find_execute_explore_modify(events: &[ToolEvent], window: usize) -> Vec<EventSpan> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i + 2 < events.len() {
        if events[i].category == ToolCategory::Execution {
            'stages: for j in (i + 1)..events.len().min(i + 1 + window) {
                if events[j].category == ToolCategory::Exploration {
                    for k in (j + 1)..events.len().min(j + 1 + window) {
                        if events[k].category == ToolCategory::Modification {
                            spans.push(EventSpan::new(i, k + 1));
                            i = k;
                            break;
                        }
                    }
                    // Only the first exploration after i is considered.
                    break 'stages;
                }
            }
        }
        i += 1;
    }

    spans
}

/// Find correction sequences: repeated edits of the same file.
///
/// Modification events are grouped by file path; for each file edited
/// at least twice, every adjacent index pair at distance
/// `<= pair_distance` emits `[earlier, later+1)`. Spans never cross
/// files. Output is ordered by span start for deterministic reporting.
pub fn find_correction_sequences(events: &[ToolEvent], pair_distance: usize) -> Vec<EventSpan> {
    let mut file_edits: HashMap<&str, Vec<usize>> = HashMap::new();

    for (i, event) in events.iter().enumerate() {
        if event.category == ToolCategory::Modification {
            if let Some(path) = event.file_path.as_deref() {
                file_edits.entry(path).or_default().push(i);
            }
        }
    }

    let mut spans = Vec::new();
    for indices in file_edits.values() {
        if indices.len() < 2 {
            continue;
        }
        for pair in indices.windows(2) {
            if pair[1] - pair[0] <= pair_distance {
                spans.push(EventSpan::new(pair[0], pair[1] + 1));
            }
        }
    }

    spans.sort_by_key(|s| (s.start, s.end));
    spans
}

/// Find Bash retry sequences: a failed Bash at `i` followed by another
/// Bash within the next `window` events emits `[i, j+1)`. The scan
/// resumes after the retry, so spans of this kind never overlap.
pub fn find_bash_retries(events: &[ToolEvent], window: usize) -> Vec<EventSpan> {
    let mut spans = Vec::new();
    let mut i = 0;

    while i < events.len() {
        if events[i].tool_name == "Bash" && !events[i].success {
            for j in (i + 1)..events.len().min(i + 1 + window) {
                if events[j].tool_name == "Bash" {
                    spans.push(EventSpan::new(i, j + 1));
                    i = j;
                    break;
                }
            }
        }
        i += 1;
    }

    spans
}
