//! Event extractor: turns one session's record stream into typed tool
//! events plus streaming verification counters.
//!
//! The extractor scans forward once, holding two pieces of state:
//! the sticky `current_model` (updated whenever a record carries a
//! non-empty model field, carried forward otherwise) and the
//! append-only event list.
//!
//! ## Tool-result correlation
//!
//! Transcripts carry no reliable invocation id on result blocks, so a
//! tool result updates whichever event was appended last. When a model
//! emits several tool invocations before any result arrives, results
//! can be misattributed. This is a stated limitation of the source
//! format, not something to correct silently.

use crate::catalog::{categorize, is_edit_tool};
use crate::reader::{ContentBlock, RawRecord};
use crate::rejection::RejectionMatcher;
use crate::types::{SessionMetrics, ToolEvent};
use regex::Regex;
use std::path::Path;

/// Max characters kept from a shell command in a preview.
const COMMAND_PREVIEW_MAX: usize = 100;
/// Max characters kept from a search pattern in a preview.
const PATTERN_PREVIEW_MAX: usize = 50;
/// Max characters kept from a rejecting user message.
const REJECTION_PREVIEW_MAX: usize = 200;

/// Argument keys recognized as file targets, in probe order.
const FILE_PATH_KEYS: &[&str] = &["file_path", "filePath", "path", "notebook_path"];

/// Everything extracted from one session transcript.
#[derive(Debug, Default)]
pub struct SessionScan {
    /// Ordered tool events for the session
    pub events: Vec<ToolEvent>,
    /// Streaming counters (tool uses, errors, retries, corrections,
    /// user messages, rejections)
    pub metrics: SessionMetrics,
    /// Truncated text of user messages that matched the rejection set
    pub rejection_previews: Vec<String>,
}

/// Single-pass extractor over one session's records.
pub struct EventExtractor {
    rejection: RejectionMatcher,
    home_redaction: Regex,
    /// Lookback (in tool events) for the immediate-correction counter
    correction_lookback: usize,
}

impl EventExtractor {
    pub fn new(correction_lookback: usize) -> Self {
        Self {
            rejection: RejectionMatcher::new(),
            // User-home segments are the identifying part of most paths.
            home_redaction: Regex::new(r"/home/[^/\s]+").expect("valid redaction pattern"),
            correction_lookback,
        }
    }

    /// Consume a record stream and produce the session's scan result.
    ///
    /// Records arrive in file order; content items within a record are
    /// processed in their original order.
    pub fn extract<I>(&self, records: I) -> SessionScan
    where
        I: IntoIterator<Item = RawRecord>,
    {
        let mut scan = SessionScan::default();
        let mut current_model: Option<String> = None;
        let mut recent_bash_failed = false;

        for record in records {
            if record.record_type.as_deref() == Some("summary") {
                continue;
            }

            let timestamp = record.parsed_timestamp();

            // Sticky model: a non-empty model field overrides, anything
            // else carries the previous value forward.
            if let Some(model) = record.model() {
                current_model = Some(model.to_string());
            }

            if record.role() == Some("user") {
                scan.metrics.user_messages += 1;
                let text = record.text_content();
                if !text.is_empty() && self.rejection.is_rejection(&text) {
                    scan.metrics.rejection_messages += 1;
                    scan.rejection_previews.push(truncate_chars(
                        &self.home_redaction.replace_all(&text, "/home/user"),
                        REJECTION_PREVIEW_MAX,
                    ));
                }
            }

            for item in record.content_items() {
                match item {
                    ContentBlock::ToolUse { name, input } => {
                        scan.metrics.tool_uses += 1;

                        let file_path = extract_file_path(input);

                        // Bash retry: first Bash after a Bash failure.
                        if name == "Bash" && recent_bash_failed {
                            scan.metrics.bash_retries += 1;
                            recent_bash_failed = false;
                        }

                        // Immediate correction: an edit whose target
                        // already appears among the recent tool events.
                        if is_edit_tool(name) && file_path.is_some() {
                            if self.is_immediate_correction(&scan.events, file_path.as_deref()) {
                                scan.metrics.consecutive_edits_same_file += 1;
                            }
                        }

                        scan.events.push(ToolEvent {
                            tool_name: name.clone(),
                            category: categorize(name),
                            timestamp,
                            input_preview: self.input_preview(name, input),
                            success: true, // optimistic until a result says otherwise
                            model: current_model.clone(),
                            file_path,
                        });
                    }
                    ContentBlock::ToolResult { is_error } => {
                        // Last-writer correlation; an orphan result with
                        // no preceding invocation is ignored.
                        if let Some(last) = scan.events.last_mut() {
                            last.success = !is_error;
                        }
                        if *is_error {
                            scan.metrics.tool_errors += 1;
                            if scan.events.last().map(|e| e.tool_name.as_str()) == Some("Bash") {
                                scan.metrics.bash_failures += 1;
                                recent_bash_failed = true;
                            }
                        }
                    }
                    ContentBlock::Text { .. } | ContentBlock::Unknown => {}
                }
            }
        }

        scan
    }

    /// Whether an edit to `file_path` counts as an immediate correction:
    /// the same path was the target of an edit tool within the last
    /// `correction_lookback` tool events.
    fn is_immediate_correction(&self, events: &[ToolEvent], file_path: Option<&str>) -> bool {
        let Some(path) = file_path else {
            return false;
        };
        events
            .iter()
            .rev()
            .take(self.correction_lookback)
            .any(|prev| {
                is_edit_tool(&prev.tool_name) && prev.file_path.as_deref() == Some(path)
            })
    }

    /// Anonymized one-line summary of a tool invocation's arguments.
    fn input_preview(&self, tool_name: &str, input: &serde_json::Value) -> String {
        match tool_name {
            "Bash" => {
                let cmd = str_arg(input, "command").unwrap_or_default();
                let redacted = self.home_redaction.replace_all(cmd, "/home/user");
                truncate_chars(&redacted, COMMAND_PREVIEW_MAX)
            }
            "Read" => format!("Read: {}", file_name_of(str_arg(input, "file_path"))),
            "Edit" | "Write" | "MultiEdit" => {
                format!("{}: {}", tool_name, file_name_of(str_arg(input, "file_path")))
            }
            "Grep" => format!(
                "Grep: {}",
                truncate_chars(str_arg(input, "pattern").unwrap_or_default(), PATTERN_PREVIEW_MAX)
            ),
            "Glob" => format!("Glob: {}", str_arg(input, "pattern").unwrap_or_default()),
            _ => String::new(),
        }
    }
}

/// Pull a string argument out of a tool input object.
fn str_arg<'a>(input: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    input.get(key).and_then(|v| v.as_str())
}

/// File target from the recognized argument keys, if any.
fn extract_file_path(input: &serde_json::Value) -> Option<String> {
    FILE_PATH_KEYS
        .iter()
        .find_map(|key| str_arg(input, key))
        .map(|s| s.to_string())
}

/// Final path component, for previews that should not leak full paths.
fn file_name_of(path: Option<&str>) -> String {
    path.and_then(|p| Path::new(p).file_name())
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Truncate on char boundaries, never mid-codepoint.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::RecordReader;
    use crate::types::ToolCategory;

    fn extract_str(input: &str) -> SessionScan {
        let reader = RecordReader::new(input.as_bytes());
        EventExtractor::new(5).extract(reader)
    }

    fn tool_use_line(name: &str, input: serde_json::Value) -> String {
        format!(
            r#"{{"type":"assistant","message":{{"role":"assistant","content":[{{"type":"tool_use","name":"{name}","input":{input}}}]}}}}"#
        )
    }

    fn tool_result_line(is_error: bool) -> String {
        format!(
            r#"{{"type":"user","message":{{"role":"user","content":[{{"type":"tool_result","is_error":{is_error}}}]}}}}"#
        )
    }

    #[test]
    fn test_basic_event_extraction() {
        let input = [
            tool_use_line("Read", serde_json::json!({"file_path": "/src/main.rs"})),
            tool_use_line("Bash", serde_json::json!({"command": "cargo test"})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.events.len(), 2);
        assert_eq!(scan.metrics.tool_uses, 2);
        assert_eq!(scan.events[0].category, ToolCategory::Exploration);
        assert_eq!(scan.events[0].input_preview, "Read: main.rs");
        assert_eq!(scan.events[0].file_path.as_deref(), Some("/src/main.rs"));
        assert_eq!(scan.events[1].category, ToolCategory::Execution);
        assert!(scan.events[1].success);
    }

    #[test]
    fn test_sticky_model_carries_forward() {
        let input = [
            format!(
                r#"{{"type":"assistant","message":{{"role":"assistant","model":"opus-4","content":[{{"type":"tool_use","name":"Read","input":{{"file_path":"a.rs"}}}}]}}}}"#
            ),
            // No model on this record; last seen value carries forward.
            tool_use_line("Bash", serde_json::json!({"command": "ls"})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.events[0].model.as_deref(), Some("opus-4"));
        assert_eq!(scan.events[1].model.as_deref(), Some("opus-4"));
    }

    #[test]
    fn test_tool_result_updates_last_event() {
        let input = [
            tool_use_line("Bash", serde_json::json!({"command": "make"})),
            tool_result_line(true),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert!(!scan.events[0].success);
        assert_eq!(scan.metrics.tool_errors, 1);
        assert_eq!(scan.metrics.bash_failures, 1);
    }

    #[test]
    fn test_orphan_tool_result_ignored() {
        let scan = extract_str(&tool_result_line(true));
        assert!(scan.events.is_empty());
        // Error is still counted, but nothing crashes and no bash
        // failure is attributed.
        assert_eq!(scan.metrics.tool_errors, 1);
        assert_eq!(scan.metrics.bash_failures, 0);
    }

    #[test]
    fn test_bash_retry_counted_once() {
        let input = [
            tool_use_line("Bash", serde_json::json!({"command": "make"})),
            tool_result_line(true),
            tool_use_line("Bash", serde_json::json!({"command": "make -j1"})),
            tool_use_line("Bash", serde_json::json!({"command": "make check"})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.metrics.bash_failures, 1);
        // Only the first Bash after the failure is a retry.
        assert_eq!(scan.metrics.bash_retries, 1);
    }

    #[test]
    fn test_immediate_correction_lookback() {
        let input = [
            tool_use_line("Edit", serde_json::json!({"file_path": "/src/a.py"})),
            tool_use_line("Read", serde_json::json!({"file_path": "/src/a.py"})),
            tool_use_line("Edit", serde_json::json!({"file_path": "/src/a.py"})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        // The second edit of a.py lands within the lookback window.
        assert_eq!(scan.metrics.consecutive_edits_same_file, 1);
    }

    #[test]
    fn test_correction_outside_lookback_not_counted() {
        let mut lines = vec![tool_use_line(
            "Edit",
            serde_json::json!({"file_path": "/src/a.py"}),
        )];
        for _ in 0..6 {
            lines.push(tool_use_line("Read", serde_json::json!({"file_path": "b.rs"})));
        }
        lines.push(tool_use_line(
            "Edit",
            serde_json::json!({"file_path": "/src/a.py"}),
        ));

        let scan = extract_str(&lines.join("\n"));
        // Six intervening events push the first edit out of a
        // lookback-5 window.
        assert_eq!(scan.metrics.consecutive_edits_same_file, 0);
    }

    #[test]
    fn test_user_messages_and_rejections() {
        let input = [
            r#"{"type":"user","message":{"role":"user","content":"add a parser"}}"#.to_string(),
            r#"{"type":"user","message":{"role":"user","content":"no, that's wrong"}}"#.to_string(),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.metrics.user_messages, 2);
        assert_eq!(scan.metrics.rejection_messages, 1);
        assert_eq!(scan.rejection_previews.len(), 1);
        assert!(scan.rejection_previews[0].contains("wrong"));
    }

    #[test]
    fn test_summary_records_skipped() {
        let input = [
            r#"{"type":"summary","summary":"session about parsers"}"#.to_string(),
            tool_use_line("Read", serde_json::json!({"file_path": "x.rs"})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.events.len(), 1);
        assert_eq!(scan.metrics.user_messages, 0);
    }

    #[test]
    fn test_bash_preview_redacts_home() {
        let input = tool_use_line(
            "Bash",
            serde_json::json!({"command": "cat /home/anderson/notes.txt"}),
        );
        let scan = extract_str(&input);
        assert_eq!(scan.events[0].input_preview, "cat /home/user/notes.txt");
    }

    #[test]
    fn test_bash_preview_truncated() {
        let long_cmd = "x".repeat(300);
        let input = tool_use_line("Bash", serde_json::json!({ "command": long_cmd }));
        let scan = extract_str(&input);
        assert_eq!(scan.events[0].input_preview.chars().count(), 100);
    }

    #[test]
    fn test_grep_and_glob_previews() {
        let input = [
            tool_use_line("Grep", serde_json::json!({"pattern": "fn main"})),
            tool_use_line("Glob", serde_json::json!({"pattern": "**/*.rs"})),
            tool_use_line("TodoWrite", serde_json::json!({"todos": []})),
        ]
        .join("\n");

        let scan = extract_str(&input);
        assert_eq!(scan.events[0].input_preview, "Grep: fn main");
        assert_eq!(scan.events[1].input_preview, "Glob: **/*.rs");
        assert_eq!(scan.events[2].input_preview, "");
    }
}
