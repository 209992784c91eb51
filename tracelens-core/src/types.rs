//! Core domain types for tracelens
//!
//! These types represent the canonical event model extracted from raw
//! transcript files.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Session** | One complete transcript file, representing one interactive run |
//! | **ToolEvent** | A discrete action request (read a file, run a command) issued by the assistant |
//! | **Tool result** | The recorded outcome (success/error) of a tool invocation |
//! | **Category** | Fixed taxonomy describing the cognitive role of a tool invocation |
//! | **PatternMatch** | A contiguous slice of a session's events matching a known behavioral pattern |
//!
//! Ownership: a [`ToolEvent`] belongs exclusively to the session-level
//! event sequence that created it and is never shared across sessions.
//! [`PatternMatch`] denormalizes the events it covers so matches from
//! many sessions can be merged and truncated independently.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================
// Tool categories
// ============================================

/// Behavioral category of a tool invocation.
///
/// Every tool name resolves to exactly one category via
/// [`crate::catalog::categorize`]; unrecognized names map to
/// [`ToolCategory::Other`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCategory {
    /// Read/search/web-fetch style tools
    Exploration,
    /// File write/edit tools
    Modification,
    /// Shell/subprocess/task-delegation tools
    Execution,
    /// Todo/plan-mode tools
    Planning,
    /// User-facing question/control tools
    Interaction,
    /// Remote-control/browser-automation tools
    Advanced,
    /// Everything else
    Other,
}

impl ToolCategory {
    /// All categories, in reporting order.
    pub const ALL: [ToolCategory; 7] = [
        ToolCategory::Exploration,
        ToolCategory::Modification,
        ToolCategory::Execution,
        ToolCategory::Planning,
        ToolCategory::Interaction,
        ToolCategory::Advanced,
        ToolCategory::Other,
    ];

    /// Identifier used in reports and serialized output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::Exploration => "exploration",
            ToolCategory::Modification => "modification",
            ToolCategory::Execution => "execution",
            ToolCategory::Planning => "planning",
            ToolCategory::Interaction => "interaction",
            ToolCategory::Advanced => "advanced",
            ToolCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================
// Tool events
// ============================================

/// One tool invocation extracted from a session transcript.
///
/// `success` starts as an optimistic `true` and is overwritten once if
/// a tool result with an error flag arrives before the next invocation
/// is appended (last-writer correlation, see crate docs).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolEvent {
    /// Tool name as it appears in the transcript (e.g., "Bash", "Edit")
    pub tool_name: String,
    /// Behavioral category from the catalog
    pub category: ToolCategory,
    /// Record timestamp, if the transcript carried one
    pub timestamp: Option<DateTime<Utc>>,
    /// Short anonymized summary of the invocation arguments
    pub input_preview: String,
    /// Outcome; mutable until the next matching result arrives
    pub success: bool,
    /// Last known model at time of invocation (sticky per session)
    pub model: Option<String>,
    /// File target extracted from tool arguments, when present
    pub file_path: Option<String>,
}

// ============================================
// Pattern matches
// ============================================

/// Kind of behavioral pattern a detector can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Execution event followed by exploration then modification
    ExecuteExploreModify,
    /// Repeated modification of the same file within a short distance
    CorrectionSequence,
    /// Failed Bash command retried shortly after
    BashRetry,
    /// User message matching the rejection keyword set.
    ///
    /// Rejections are a text signal, not an event-sequence signal: no
    /// event slice is produced. The variant exists so rejection
    /// excerpts carry the same kind tag as sequence excerpts.
    Rejection,
}

impl PatternKind {
    /// Kinds that produce event slices (everything except rejection).
    pub const SEQUENCE_KINDS: [PatternKind; 3] = [
        PatternKind::ExecuteExploreModify,
        PatternKind::CorrectionSequence,
        PatternKind::BashRetry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::ExecuteExploreModify => "execute_explore_modify",
            PatternKind::CorrectionSequence => "correction_sequence",
            PatternKind::BashRetry => "bash_retry",
            PatternKind::Rejection => "rejection",
        }
    }
}

impl std::fmt::Display for PatternKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A contiguous span `[start, end)` of a session's event sequence.
///
/// Invariant: `end > start`. Spans may overlap across different
/// pattern kinds, but a single detector never emits overlapping spans
/// of its own kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSpan {
    pub start: usize,
    pub end: usize,
}

impl EventSpan {
    pub fn new(start: usize, end: usize) -> Self {
        debug_assert!(end > start, "span must be non-empty");
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A matched behavioral pattern with its covered events denormalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternMatch {
    /// Which pattern this slice matched
    pub pattern_type: PatternKind,
    /// Span within the originating session's event sequence
    pub span: EventSpan,
    /// Events covered by the span (owned copy)
    pub events: Vec<ToolEvent>,
    /// Anonymized session identifier (truncated file stem)
    pub session_id: String,
    /// Project name derived from the transcript's directory
    pub project: String,
}

impl PatternMatch {
    /// Human-readable description, e.g. "bash_retry: Bash -> Read -> Bash".
    pub fn describe(&self) -> String {
        let tools: Vec<&str> = self.events.iter().map(|e| e.tool_name.as_str()).collect();
        format!("{}: {}", self.pattern_type, tools.join(" -> "))
    }
}

// ============================================
// Session metrics
// ============================================

/// Purely additive counters scoped to one session.
///
/// Corpus-wide aggregation is the pointwise sum of these, so the fold
/// is associative and commutative across sessions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Total tool invocations seen
    pub tool_uses: u64,
    /// Tool results flagged as errors
    pub tool_errors: u64,
    /// Error results attributed to Bash invocations
    pub bash_failures: u64,
    /// Bash invocations issued shortly after a Bash failure
    pub bash_retries: u64,
    /// Edits counted as immediate corrections (lookback rule)
    pub consecutive_edits_same_file: u64,
    /// User messages matching the rejection keyword set
    pub rejection_messages: u64,
    /// Total user-authored messages
    pub user_messages: u64,
}

impl SessionMetrics {
    /// Pointwise sum with another set of counters.
    pub fn merge(&mut self, other: &SessionMetrics) {
        self.tool_uses += other.tool_uses;
        self.tool_errors += other.tool_errors;
        self.bash_failures += other.bash_failures;
        self.bash_retries += other.bash_retries;
        self.consecutive_edits_same_file += other.consecutive_edits_same_file;
        self.rejection_messages += other.rejection_messages;
        self.user_messages += other.user_messages;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_roundtrip_strings() {
        for cat in ToolCategory::ALL {
            assert!(!cat.as_str().is_empty());
        }
        assert_eq!(ToolCategory::Exploration.as_str(), "exploration");
        assert_eq!(ToolCategory::Other.to_string(), "other");
    }

    #[test]
    fn test_span_len() {
        let span = EventSpan::new(2, 5);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_metrics_merge_is_pointwise_sum() {
        let mut a = SessionMetrics {
            tool_uses: 10,
            tool_errors: 1,
            bash_failures: 1,
            bash_retries: 0,
            consecutive_edits_same_file: 2,
            rejection_messages: 1,
            user_messages: 4,
        };
        let b = SessionMetrics {
            tool_uses: 5,
            tool_errors: 0,
            bash_failures: 0,
            bash_retries: 1,
            consecutive_edits_same_file: 0,
            rejection_messages: 0,
            user_messages: 2,
        };
        a.merge(&b);
        assert_eq!(a.tool_uses, 15);
        assert_eq!(a.bash_retries, 1);
        assert_eq!(a.user_messages, 6);
    }
}
