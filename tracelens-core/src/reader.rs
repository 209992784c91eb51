//! Record reader: streams one transcript file as parsed records.
//!
//! Transcripts are line-delimited JSON. The reader is deliberately
//! lossy in the safe direction: a malformed line never aborts the
//! stream, it is dropped and the next line is tried. End of file
//! terminates the sequence normally. Only one line is held in memory
//! at a time, so multi-gigabyte corpora stream without buffering.
//!
//! Raw record shapes use `#[serde(default)]` liberally so that missing
//! fields degrade to `None` instead of failing the whole line.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

// ============================================
// Raw JSONL record types (serde deserialization)
// ============================================

/// One parsed log line from a session transcript.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct RawRecord {
    /// Record type: "summary", "user", "assistant", or other markers
    #[serde(rename = "type")]
    pub record_type: Option<String>,
    /// ISO-8601 timestamp string
    pub timestamp: Option<String>,
    /// Message payload (role, model, content blocks)
    pub message: Option<RawMessage>,
}

impl RawRecord {
    /// Role carried by the message payload, if any.
    pub fn role(&self) -> Option<&str> {
        self.message.as_ref().and_then(|m| m.role.as_deref())
    }

    /// Model override carried by the message payload, if any.
    ///
    /// Present only on assistant records that changed model; callers
    /// thread the last seen value forward (sticky model).
    pub fn model(&self) -> Option<&str> {
        self.message
            .as_ref()
            .and_then(|m| m.model.as_deref())
            .filter(|m| !m.is_empty())
    }

    /// Parsed record timestamp, when present and well-formed.
    pub fn parsed_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// Content items in original order. String-form content is wrapped
    /// in a single text block so callers see one shape.
    pub fn content_items(&self) -> Vec<&ContentBlock> {
        match self.message.as_ref().and_then(|m| m.content.as_ref()) {
            Some(RawContent::Blocks(blocks)) => blocks.iter().collect(),
            _ => Vec::new(),
        }
    }

    /// Concatenated text of all text-bearing content, for keyword scans.
    pub fn text_content(&self) -> String {
        match self.message.as_ref().and_then(|m| m.content.as_ref()) {
            Some(RawContent::Text(s)) => s.clone(),
            Some(RawContent::Blocks(blocks)) => {
                let texts: Vec<&str> = blocks
                    .iter()
                    .filter_map(|b| match b {
                        ContentBlock::Text { text } => Some(text.as_str()),
                        _ => None,
                    })
                    .collect();
                texts.join(" ")
            }
            None => String::new(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RawMessage {
    pub role: Option<String>,
    pub model: Option<String>,
    pub content: Option<RawContent>,
}

/// Message content is either a bare string or a list of typed blocks.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RawContent {
    Text(String),
    Blocks(Vec<ContentBlock>),
}

impl Default for RawContent {
    fn default() -> Self {
        RawContent::Text(String::new())
    }
}

/// Tagged union of transcript content items.
///
/// The explicit `type` discriminator replaces duck-typed dictionary
/// access; unknown block types are captured rather than failing.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "tool_use")]
    ToolUse {
        #[serde(default)]
        name: String,
        #[serde(default)]
        input: serde_json::Value,
    },
    #[serde(rename = "tool_result")]
    ToolResult {
        #[serde(default)]
        is_error: bool,
    },
    // Catch-all for unknown block types
    #[serde(other)]
    Unknown,
}

// ============================================
// Reader
// ============================================

/// Lazy iterator of [`RawRecord`]s over a line-delimited JSON stream.
pub struct RecordReader<R> {
    lines: std::io::Lines<BufReader<R>>,
    line_number: usize,
    skipped: usize,
}

impl RecordReader<File> {
    /// Open a transcript file for streaming.
    pub fn open(path: &Path) -> std::io::Result<Self> {
        Ok(Self::new(File::open(path)?))
    }
}

impl<R: Read> RecordReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            lines: BufReader::new(inner).lines(),
            line_number: 0,
            skipped: 0,
        }
    }

    /// Number of lines dropped so far (malformed JSON or read errors).
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = RawRecord;

    fn next(&mut self) -> Option<RawRecord> {
        loop {
            let line = match self.lines.next()? {
                Ok(l) => l,
                Err(e) => {
                    self.line_number += 1;
                    self.skipped += 1;
                    tracing::debug!(line = self.line_number, error = %e, "read error, line dropped");
                    continue;
                }
            };
            self.line_number += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<RawRecord>(trimmed) {
                Ok(record) => return Some(record),
                Err(e) => {
                    self.skipped += 1;
                    tracing::debug!(line = self.line_number, error = %e, "malformed line dropped");
                    continue;
                }
            }
        }
    }
}
