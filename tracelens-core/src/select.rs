//! Capped, deterministic selection of illustrative pattern matches.
//!
//! The corpus can contain far more matches than a report should carry,
//! so each pattern kind keeps at most a fixed number of examples.
//! Retention prefers matches covering more events, with a total
//! tie-break on session and span so the same corpus always yields the
//! same examples regardless of scan order. That makes [`ExampleSelector::merge`]
//! associative and commutative, which the parallel reduce relies on.

use crate::types::{PatternKind, PatternMatch, ToolEvent};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// A user message that matched the rejection keyword set, kept as a
/// report example.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionExample {
    /// Anonymized session identifier
    pub session_id: String,
    /// Redacted, truncated message text
    pub preview: String,
}

/// Retains the best few matches per pattern kind plus rejection
/// message examples.
#[derive(Debug, Clone)]
pub struct ExampleSelector {
    cap: usize,
    by_kind: HashMap<PatternKind, Vec<PatternMatch>>,
    rejections: Vec<RejectionExample>,
}

/// Total order used for retention: more events first, then session id
/// and span position for determinism.
fn rank(a: &PatternMatch, b: &PatternMatch) -> Ordering {
    b.events
        .len()
        .cmp(&a.events.len())
        .then_with(|| a.session_id.cmp(&b.session_id))
        .then_with(|| a.span.start.cmp(&b.span.start))
        .then_with(|| a.span.end.cmp(&b.span.end))
}

impl ExampleSelector {
    pub fn new(cap: usize) -> Self {
        Self {
            cap,
            by_kind: HashMap::new(),
            rejections: Vec::new(),
        }
    }

    /// Offer a match for retention; it is kept only if it ranks inside
    /// the cap for its kind.
    pub fn offer(&mut self, candidate: PatternMatch) {
        let bucket = self.by_kind.entry(candidate.pattern_type).or_default();
        bucket.push(candidate);
        bucket.sort_by(rank);
        bucket.truncate(self.cap);
    }

    /// Offer a rejection example for retention.
    pub fn offer_rejection(&mut self, example: RejectionExample) {
        self.rejections.push(example);
        self.rejections
            .sort_by(|a, b| a.session_id.cmp(&b.session_id).then_with(|| a.preview.cmp(&b.preview)));
        self.rejections.dedup();
        self.rejections.truncate(self.cap);
    }

    /// Fold another selector in (parallel reduce step).
    pub fn merge(&mut self, other: ExampleSelector) {
        for (_, matches) in other.by_kind {
            for m in matches {
                self.offer(m);
            }
        }
        for r in other.rejections {
            self.offer_rejection(r);
        }
    }

    /// Retained matches for one kind, best first.
    pub fn examples(&self, kind: PatternKind) -> &[PatternMatch] {
        self.by_kind.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn rejection_examples(&self) -> &[RejectionExample] {
        &self.rejections
    }
}

/// Render one match as a numbered excerpt for the text report.
///
/// Each event is one line with its category, tool name, and outcome
/// mark; a non-empty input preview follows on an indented line.
pub fn render_excerpt(example: &PatternMatch) -> String {
    let mut out = format!(
        "{} (session {}, project {}):\n",
        example.pattern_type, example.session_id, example.project
    );
    for (i, event) in example.events.iter().enumerate() {
        out.push_str(&format!(
            "  {}. [{}] {} {}\n",
            i + 1,
            event.category,
            event.tool_name,
            outcome_mark(event)
        ));
        if !event.input_preview.is_empty() {
            out.push_str(&format!("     {}\n", event.input_preview));
        }
    }
    out
}

fn outcome_mark(event: &ToolEvent) -> &'static str {
    if event.success {
        "ok"
    } else {
        "FAILED"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EventSpan, ToolCategory};

    fn event(tool_name: &str, success: bool) -> ToolEvent {
        ToolEvent {
            tool_name: tool_name.to_string(),
            category: ToolCategory::Execution,
            timestamp: None,
            input_preview: String::new(),
            success,
            model: None,
            file_path: None,
        }
    }

    fn match_with(session: &str, start: usize, n_events: usize) -> PatternMatch {
        PatternMatch {
            pattern_type: PatternKind::BashRetry,
            span: EventSpan::new(start, start + n_events),
            events: (0..n_events).map(|_| event("Bash", false)).collect(),
            session_id: session.to_string(),
            project: "proj".to_string(),
        }
    }

    #[test]
    fn test_cap_keeps_largest_matches() {
        let mut sel = ExampleSelector::new(2);
        sel.offer(match_with("a", 0, 2));
        sel.offer(match_with("b", 0, 4));
        sel.offer(match_with("c", 0, 3));

        let kept = sel.examples(PatternKind::BashRetry);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].session_id, "b");
        assert_eq!(kept[1].session_id, "c");
    }

    #[test]
    fn test_kinds_do_not_compete() {
        let mut sel = ExampleSelector::new(1);
        let mut cycle = match_with("a", 0, 3);
        cycle.pattern_type = PatternKind::ExecuteExploreModify;
        sel.offer(cycle);
        sel.offer(match_with("a", 5, 2));

        assert_eq!(sel.examples(PatternKind::ExecuteExploreModify).len(), 1);
        assert_eq!(sel.examples(PatternKind::BashRetry).len(), 1);
        assert!(sel.examples(PatternKind::CorrectionSequence).is_empty());
    }

    #[test]
    fn test_merge_order_independent() {
        let inputs = [
            match_with("a", 0, 2),
            match_with("b", 0, 5),
            match_with("c", 0, 3),
            match_with("d", 0, 4),
        ];

        let mut left = ExampleSelector::new(2);
        left.offer(inputs[0].clone());
        left.offer(inputs[1].clone());
        let mut right = ExampleSelector::new(2);
        right.offer(inputs[2].clone());
        right.offer(inputs[3].clone());

        let mut lr = left.clone();
        lr.merge(right.clone());
        let mut rl = right;
        rl.merge(left);

        let ids = |s: &ExampleSelector| -> Vec<String> {
            s.examples(PatternKind::BashRetry)
                .iter()
                .map(|m| m.session_id.clone())
                .collect()
        };
        assert_eq!(ids(&lr), ids(&rl));
        assert_eq!(ids(&lr), vec!["b".to_string(), "d".to_string()]);
    }

    #[test]
    fn test_rejection_examples_deduped_and_capped() {
        let mut sel = ExampleSelector::new(2);
        for _ in 0..2 {
            sel.offer_rejection(RejectionExample {
                session_id: "s1".to_string(),
                preview: "no, wrong file".to_string(),
            });
        }
        sel.offer_rejection(RejectionExample {
            session_id: "s2".to_string(),
            preview: "that's not it".to_string(),
        });
        sel.offer_rejection(RejectionExample {
            session_id: "s3".to_string(),
            preview: "stop".to_string(),
        });

        let kept = sel.rejection_examples();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].session_id, "s1");
        assert_eq!(kept[1].session_id, "s2");
    }

    #[test]
    fn test_render_excerpt_numbers_events() {
        let mut m = match_with("abc12345", 0, 2);
        m.events[0].input_preview = "cargo test".to_string();
        let text = render_excerpt(&m);

        assert!(text.starts_with("bash_retry (session abc12345, project proj):"));
        assert!(text.contains("  1. [execution] Bash FAILED"));
        assert!(text.contains("     cargo test"));
        assert!(text.contains("  2. [execution] Bash FAILED"));
    }
}
