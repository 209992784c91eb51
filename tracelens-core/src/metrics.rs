//! Corpus-wide metric aggregation and derived scores.
//!
//! [`CorpusMetrics`] is the pointwise sum of all per-session counters.
//! Summation is associative and commutative, so per-file results can
//! be reduced in any order without changing the totals. Every derived
//! rate is defined as 0 when its denominator is 0.
//!
//! The composite weights and interpretation thresholds reproduce the
//! original study's values exactly; the threshold bands carry no
//! statistical justification and are kept as named constants rather
//! than re-derived.

use crate::error::{Error, Result};
use crate::types::{SessionMetrics, ToolCategory};

// Verification score weights. Must sum to 1.0.
const ERROR_RATE_WEIGHT: f64 = 0.3;
const CORRECTION_RATE_WEIGHT: f64 = 0.4;
const REJECTION_RATE_WEIGHT: f64 = 0.3;

// Verification interpretation bands, as half-open [lower, upper).
const VERIFICATION_MINIMAL_UPPER: f64 = 0.05;
const VERIFICATION_LOW_UPPER: f64 = 0.10;
const VERIFICATION_MODERATE_UPPER: f64 = 0.20;

// Endorsement interpretation bands, exclusive lower bounds.
const ENDORSEMENT_VERY_HIGH_LOWER: f64 = 0.95;
const ENDORSEMENT_HIGH_LOWER: f64 = 0.90;
const ENDORSEMENT_MODERATE_LOWER: f64 = 0.80;

/// Rate with a zero-denominator convention of 0.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

// ============================================
// Corpus metrics
// ============================================

/// Pointwise sum of all session counters plus corpus bookkeeping.
#[derive(Debug, Clone, Copy, Default)]
pub struct CorpusMetrics {
    /// Summed per-session counters
    pub totals: SessionMetrics,
    /// Sessions that contributed to the totals
    pub sessions: u64,
    /// Files skipped because they were missing or unreadable
    pub files_skipped: u64,
}

impl CorpusMetrics {
    /// Fold one session's counters into the corpus totals.
    pub fn absorb_session(&mut self, session: &SessionMetrics) {
        self.totals.merge(session);
        self.sessions += 1;
    }

    /// Merge another partial aggregate (parallel reduce step).
    pub fn merge(&mut self, other: &CorpusMetrics) {
        self.totals.merge(&other.totals);
        self.sessions += other.sessions;
        self.files_skipped += other.files_skipped;
    }

    /// Fraction of tool uses whose result was an error.
    pub fn error_rate(&self) -> f64 {
        ratio(self.totals.tool_errors, self.totals.tool_uses)
    }

    /// Fraction of tool uses that were failed Bash commands.
    pub fn bash_failure_rate(&self) -> f64 {
        ratio(self.totals.bash_failures, self.totals.tool_uses)
    }

    /// Fraction of tool uses that were immediate same-file corrections.
    pub fn correction_rate(&self) -> f64 {
        ratio(self.totals.consecutive_edits_same_file, self.totals.tool_uses)
    }

    /// Fraction of user messages containing rejection keywords.
    pub fn rejection_rate(&self) -> f64 {
        ratio(self.totals.rejection_messages, self.totals.user_messages)
    }

    /// Weighted composite estimating how often outputs are scrutinized.
    pub fn verification_score(&self) -> f64 {
        verification_score(self.error_rate(), self.correction_rate(), self.rejection_rate())
    }

    /// Inverse of the verification score: acceptance without challenge.
    pub fn endorsement_proxy(&self) -> f64 {
        1.0 - self.verification_score()
    }

    /// Check that every rate and score is inside [0, 1].
    ///
    /// An out-of-range value indicates a counting bug and is reported
    /// as a fatal error, never clamped.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("error_rate", self.error_rate()),
            ("bash_failure_rate", self.bash_failure_rate()),
            ("correction_rate", self.correction_rate()),
            ("rejection_rate", self.rejection_rate()),
            ("verification_score", self.verification_score()),
            ("endorsement_proxy", self.endorsement_proxy()),
        ];
        for (name, value) in checks {
            if !(0.0..=1.0).contains(&value) || value.is_nan() {
                return Err(Error::Invariant(format!(
                    "{name} = {value} is outside [0, 1]"
                )));
            }
        }
        Ok(())
    }
}

/// The weighted verification composite from its three input rates.
pub fn verification_score(error_rate: f64, correction_rate: f64, rejection_rate: f64) -> f64 {
    error_rate * ERROR_RATE_WEIGHT
        + correction_rate * CORRECTION_RATE_WEIGHT
        + rejection_rate * REJECTION_RATE_WEIGHT
}

/// Textual interpretation of a verification score.
pub fn interpret_verification(score: f64) -> &'static str {
    if score < VERIFICATION_MINIMAL_UPPER {
        "Minimal verification behavior - high automatic endorsement"
    } else if score < VERIFICATION_LOW_UPPER {
        "Low verification behavior - substantial automatic endorsement"
    } else if score < VERIFICATION_MODERATE_UPPER {
        "Moderate verification behavior - mixed endorsement pattern"
    } else {
        "High verification behavior - skeptical endorsement pattern"
    }
}

/// Textual interpretation of an endorsement proxy.
pub fn interpret_endorsement(score: f64) -> &'static str {
    if score > ENDORSEMENT_VERY_HIGH_LOWER {
        "Very high automatic endorsement"
    } else if score > ENDORSEMENT_HIGH_LOWER {
        "High automatic endorsement"
    } else if score > ENDORSEMENT_MODERATE_LOWER {
        "Moderate automatic endorsement"
    } else {
        "Low automatic endorsement"
    }
}

// ============================================
// Delegation score
// ============================================

/// Delegation weight per category: how much of the work the category
/// hands to the automated tool versus the human.
pub fn delegation_weight(category: ToolCategory) -> f64 {
    match category {
        ToolCategory::Exploration => 1.0,
        ToolCategory::Planning => 1.0,
        ToolCategory::Modification => 0.5,
        ToolCategory::Execution => 0.5,
        ToolCategory::Interaction => 0.0,
        ToolCategory::Advanced => 0.5,
        ToolCategory::Other => 0.5,
    }
}

/// Per-bucket tally of tool events by category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    counts: [u64; ToolCategory::ALL.len()],
}

impl CategoryCounts {
    fn index(category: ToolCategory) -> usize {
        ToolCategory::ALL
            .iter()
            .position(|c| *c == category)
            .expect("category listed in ALL")
    }

    pub fn record(&mut self, category: ToolCategory) {
        self.counts[Self::index(category)] += 1;
    }

    pub fn get(&self, category: ToolCategory) -> u64 {
        self.counts[Self::index(category)]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn merge(&mut self, other: &CategoryCounts) {
        for (a, b) in self.counts.iter_mut().zip(other.counts.iter()) {
            *a += b;
        }
    }

    /// Iterate (category, count) pairs in reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (ToolCategory, u64)> + '_ {
        ToolCategory::ALL.iter().map(|c| (*c, self.get(*c)))
    }
}

/// Delegation score for one bucket of category counts.
///
/// `sum(category_percentage x weight) / 100`, normalized to [0, 1].
/// An empty bucket scores 0.
pub fn delegation_score(counts: &CategoryCounts) -> f64 {
    let total = counts.total();
    if total == 0 {
        return 0.0;
    }

    let weighted_sum: f64 = counts
        .iter()
        .map(|(category, count)| {
            let percentage = (count as f64 / total as f64) * 100.0;
            percentage * delegation_weight(category)
        })
        .sum();

    weighted_sum / 100.0
}
