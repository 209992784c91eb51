//! Rejection keyword matching for user messages.
//!
//! A user message counts as a rejection when its concatenated text
//! content matches any of a fixed list of short patterns: negations,
//! correction words, explicit error/failure words, and stop/cancel
//! words. This is deliberate keyword matching, not language
//! understanding; a single hit marks the whole message.

use regex::RegexSet;

/// Rejection patterns, matched case-insensitively on word boundaries.
const REJECTION_PATTERNS: &[&str] = &[
    r"\bno\b",
    r"\bwrong\b",
    r"\bincorrect\b",
    r"\btry again\b",
    r"\bfix\b",
    r"\bundo\b",
    r"\brevert\b",
    r"\bnot what i\b",
    r"\bthat's not\b",
    r"\bactually\b",
    r"\binstead\b",
    r"\bdon't\b",
    r"\bstop\b",
    r"\bcancel\b",
    r"\berror\b",
    r"\bfailed\b",
    r"\bbroke\b",
];

/// Compiled matcher over the rejection keyword set.
pub struct RejectionMatcher {
    set: RegexSet,
}

impl RejectionMatcher {
    pub fn new() -> Self {
        // The pattern list is static and known-valid; a failure here is
        // a programming error, not an input error.
        let set = RegexSet::new(REJECTION_PATTERNS).unwrap_or_else(|e| {
            panic!("invalid rejection pattern: {e}");
        });
        Self { set }
    }

    /// Whether the text contains any rejection keyword.
    pub fn is_rejection(&self, text: &str) -> bool {
        self.set.is_match(&text.to_lowercase())
    }
}

impl Default for RejectionMatcher {
    fn default() -> Self {
        Self::new()
    }
}
