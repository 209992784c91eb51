//! Report assembly and rendering.
//!
//! [`AnalysisReport`] is the serializable end product of a corpus
//! scan: raw counters, derived rates and scores, weekly delegation
//! buckets, and the retained examples. Rates are reported as
//! percentages rounded to two decimals; composite scores keep four.
//! The same struct backs both the JSON output and the text rendering.

use crate::corpus::CorpusScan;
use crate::error::Result;
use crate::metrics::{
    delegation_score, interpret_endorsement, interpret_verification, CategoryCounts,
};
use crate::select::{render_excerpt, RejectionExample};
use crate::types::{PatternKind, PatternMatch, SessionMetrics};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

fn round_pct(rate: f64) -> f64 {
    (rate * 100.0 * 100.0).round() / 100.0
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Derived rates, as percentages.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Rates {
    pub error_rate_pct: f64,
    pub bash_failure_rate_pct: f64,
    pub correction_rate_pct: f64,
    pub rejection_rate_pct: f64,
}

/// Composite scores with their textual interpretations.
#[derive(Debug, Clone, Serialize)]
pub struct Scores {
    pub verification_score: f64,
    pub verification_interpretation: &'static str,
    pub endorsement_proxy: f64,
    pub endorsement_interpretation: &'static str,
}

/// One ISO-week delegation bucket.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyDelegation {
    pub delegation_score: f64,
    pub tool_events: u64,
    pub categories: BTreeMap<&'static str, u64>,
}

/// The complete analysis result for one corpus scan.
#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub sessions_analyzed: u64,
    pub files_skipped: u64,
    pub counters: SessionMetrics,
    pub rates: Rates,
    pub scores: Scores,
    /// ISO week key ("2025-W23") to delegation bucket
    pub weekly_delegation: BTreeMap<String, WeeklyDelegation>,
    /// Pattern kind name to retained example matches
    pub pattern_examples: BTreeMap<&'static str, Vec<PatternMatch>>,
    pub rejection_examples: Vec<RejectionExample>,
}

impl AnalysisReport {
    /// Assemble a report from a finished scan.
    ///
    /// Fails if any derived rate or score falls outside [0, 1].
    pub fn from_scan(scan: &CorpusScan) -> Result<Self> {
        scan.metrics.validate()?;

        let verification = scan.metrics.verification_score();
        let endorsement = scan.metrics.endorsement_proxy();

        let weekly_delegation = scan
            .weekly
            .iter()
            .map(|(week, counts)| (week.clone(), weekly_bucket(counts)))
            .collect();

        let pattern_examples = PatternKind::SEQUENCE_KINDS
            .iter()
            .map(|kind| (kind.as_str(), scan.examples.examples(*kind).to_vec()))
            .collect();

        Ok(Self {
            generated_at: Utc::now(),
            sessions_analyzed: scan.metrics.sessions,
            files_skipped: scan.metrics.files_skipped,
            counters: scan.metrics.totals,
            rates: Rates {
                error_rate_pct: round_pct(scan.metrics.error_rate()),
                bash_failure_rate_pct: round_pct(scan.metrics.bash_failure_rate()),
                correction_rate_pct: round_pct(scan.metrics.correction_rate()),
                rejection_rate_pct: round_pct(scan.metrics.rejection_rate()),
            },
            scores: Scores {
                verification_score: round4(verification),
                verification_interpretation: interpret_verification(verification),
                endorsement_proxy: round4(endorsement),
                endorsement_interpretation: interpret_endorsement(endorsement),
            },
            weekly_delegation,
            pattern_examples,
            rejection_examples: scan.examples.rejection_examples().to_vec(),
        })
    }

    /// Render the report as plain text, showing at most `inline_cap`
    /// examples per pattern kind.
    pub fn render_text(&self, inline_cap: usize) -> String {
        let mut out = String::new();

        out.push_str("Session behavior analysis\n");
        out.push_str("=========================\n\n");
        out.push_str(&format!(
            "Sessions analyzed: {} ({} files skipped)\n",
            self.sessions_analyzed, self.files_skipped
        ));
        out.push_str(&format!("Tool invocations:  {}\n", self.counters.tool_uses));
        out.push_str(&format!("User messages:     {}\n\n", self.counters.user_messages));

        out.push_str("Rates\n-----\n");
        out.push_str(&format!(
            "Tool error rate:       {:.2}% ({} errors)\n",
            self.rates.error_rate_pct, self.counters.tool_errors
        ));
        out.push_str(&format!(
            "Bash failure rate:     {:.2}% ({} failures, {} retried)\n",
            self.rates.bash_failure_rate_pct, self.counters.bash_failures, self.counters.bash_retries
        ));
        out.push_str(&format!(
            "Correction rate:       {:.2}% ({} immediate re-edits)\n",
            self.rates.correction_rate_pct, self.counters.consecutive_edits_same_file
        ));
        out.push_str(&format!(
            "Rejection rate:        {:.2}% ({} of {} user messages)\n\n",
            self.rates.rejection_rate_pct,
            self.counters.rejection_messages,
            self.counters.user_messages
        ));

        out.push_str("Scores\n------\n");
        out.push_str(&format!(
            "Verification score: {:.4}\n  {}\n",
            self.scores.verification_score, self.scores.verification_interpretation
        ));
        out.push_str(&format!(
            "Endorsement proxy:  {:.4}\n  {}\n\n",
            self.scores.endorsement_proxy, self.scores.endorsement_interpretation
        ));

        if !self.weekly_delegation.is_empty() {
            out.push_str("Weekly delegation\n-----------------\n");
            for (week, bucket) in &self.weekly_delegation {
                out.push_str(&format!(
                    "{}: {:.4} ({} tool events)\n",
                    week, bucket.delegation_score, bucket.tool_events
                ));
            }
            out.push('\n');
        }

        for kind in PatternKind::SEQUENCE_KINDS {
            let examples = self
                .pattern_examples
                .get(kind.as_str())
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            if examples.is_empty() {
                continue;
            }
            out.push_str(&format!("Examples: {}\n", kind));
            for example in examples.iter().take(inline_cap) {
                out.push_str(&render_excerpt(example));
            }
            out.push('\n');
        }

        if !self.rejection_examples.is_empty() {
            out.push_str("Examples: rejection messages\n");
            for example in self.rejection_examples.iter().take(inline_cap) {
                out.push_str(&format!("  [{}] {}\n", example.session_id, example.preview));
            }
            out.push('\n');
        }

        out
    }
}

fn weekly_bucket(counts: &CategoryCounts) -> WeeklyDelegation {
    WeeklyDelegation {
        delegation_score: round4(delegation_score(counts)),
        tool_events: counts.total(),
        categories: counts
            .iter()
            .filter(|(_, count)| *count > 0)
            .map(|(category, count)| (category.as_str(), count))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::CorpusMetrics;
    use crate::select::ExampleSelector;
    use crate::types::{EventSpan, ToolCategory, ToolEvent};

    fn scan_with(totals: SessionMetrics) -> CorpusScan {
        CorpusScan {
            metrics: CorpusMetrics {
                totals,
                sessions: 3,
                files_skipped: 1,
            },
            examples: ExampleSelector::new(5),
            weekly: BTreeMap::new(),
        }
    }

    #[test]
    fn test_report_rounds_rates_and_scores() {
        // error 10%, correction 5%, rejection 20% -> score 0.11
        let report = AnalysisReport::from_scan(&scan_with(SessionMetrics {
            tool_uses: 100,
            tool_errors: 10,
            bash_failures: 3,
            bash_retries: 2,
            consecutive_edits_same_file: 5,
            rejection_messages: 20,
            user_messages: 100,
        }))
        .unwrap();

        assert_eq!(report.rates.error_rate_pct, 10.0);
        assert_eq!(report.rates.correction_rate_pct, 5.0);
        assert_eq!(report.rates.rejection_rate_pct, 20.0);
        assert_eq!(report.scores.verification_score, 0.11);
        assert_eq!(report.scores.endorsement_proxy, 0.89);
        assert_eq!(
            report.scores.verification_interpretation,
            "Moderate verification behavior - mixed endorsement pattern"
        );
        assert_eq!(
            report.scores.endorsement_interpretation,
            "Moderate automatic endorsement"
        );
    }

    #[test]
    fn test_report_rejects_invalid_metrics() {
        let result = AnalysisReport::from_scan(&scan_with(SessionMetrics {
            tool_uses: 1,
            tool_errors: 5,
            ..Default::default()
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_corpus_report() {
        let report = AnalysisReport::from_scan(&CorpusScan {
            metrics: CorpusMetrics::default(),
            examples: ExampleSelector::new(5),
            weekly: BTreeMap::new(),
        })
        .unwrap();

        assert_eq!(report.sessions_analyzed, 0);
        assert_eq!(report.rates.error_rate_pct, 0.0);
        assert_eq!(report.scores.verification_score, 0.0);
        let text = report.render_text(3);
        assert!(text.contains("Sessions analyzed: 0"));
    }

    #[test]
    fn test_render_text_includes_examples() {
        let mut scan = scan_with(SessionMetrics {
            tool_uses: 10,
            user_messages: 2,
            ..Default::default()
        });
        scan.examples.offer(PatternMatch {
            pattern_type: PatternKind::BashRetry,
            span: EventSpan::new(0, 2),
            events: vec![
                ToolEvent {
                    tool_name: "Bash".to_string(),
                    category: ToolCategory::Execution,
                    timestamp: None,
                    input_preview: "cargo test".to_string(),
                    success: false,
                    model: None,
                    file_path: None,
                },
                ToolEvent {
                    tool_name: "Bash".to_string(),
                    category: ToolCategory::Execution,
                    timestamp: None,
                    input_preview: "cargo test -- --nocapture".to_string(),
                    success: true,
                    model: None,
                    file_path: None,
                },
            ],
            session_id: "abc12345".to_string(),
            project: "proj".to_string(),
        });
        scan.examples.offer_rejection(RejectionExample {
            session_id: "abc12345".to_string(),
            preview: "no, use the other branch".to_string(),
        });

        let report = AnalysisReport::from_scan(&scan).unwrap();
        let text = report.render_text(3);
        assert!(text.contains("Examples: bash_retry"));
        assert!(text.contains("cargo test"));
        assert!(text.contains("Examples: rejection messages"));
        assert!(text.contains("[abc12345] no, use the other branch"));
    }

    #[test]
    fn test_weekly_bucket_serialization_shape() {
        let mut counts = CategoryCounts::default();
        counts.record(ToolCategory::Exploration);
        counts.record(ToolCategory::Execution);
        let bucket = weekly_bucket(&counts);
        assert_eq!(bucket.tool_events, 2);
        assert_eq!(bucket.delegation_score, 0.75);
        assert_eq!(bucket.categories.get("exploration"), Some(&1));
        assert!(!bucket.categories.contains_key("planning"));
    }
}
