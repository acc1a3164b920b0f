//! JSONL record stream parser
//!
//! Reads one line at a time, decodes each line as a JSON object, normalizes
//! its `pmid` in place and feeds the (pmid, aspect) pair to the order tracker.
//! A bad line is logged and skipped; only I/O failures abort the file.

use super::identifier::{normalize_identifier, IDENTIFIER_FIELD};
use super::order::OrderTracker;
use super::value::{Record, RecordValue};
use super::IngestError;
use serde_json::Value;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, warn};

/// Field naming the evaluation aspect of a record
pub const ASPECT_FIELD: &str = "aspect";

/// Longest line excerpt echoed into warnings
const LOG_EXCERPT_CHARS: usize = 120;

/// Flat parse result for one uploaded file
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    /// Upload name the records came from
    pub name: String,
    /// Decoded records in file order, `pmid` already canonical
    pub records: Vec<Record>,
    /// Lines that could not be decoded as a JSON object
    pub malformed_lines: usize,
}

#[derive(Debug, Error)]
enum LineError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object, found {0}")]
    NotAnObject(&'static str),
}

/// Canonical `pmid` of a record, if it has one
pub fn record_pmid(record: &Record) -> Option<String> {
    record.get(IDENTIFIER_FIELD).map(normalize_identifier)
}

/// Aspect label of a record, if it has one
pub fn record_aspect(record: &Record) -> Option<String> {
    record.get(ASPECT_FIELD).map(RecordValue::to_display_string)
}

/// Parse a JSONL stream into records, registering ids and aspects
///
/// Holds a single line buffer at a time. Returns `UnreadableFile` if the
/// underlying reader fails; malformed lines are counted, never returned.
pub async fn parse_records<R>(
    name: &str,
    mut reader: R,
    tracker: &mut OrderTracker,
) -> Result<ParsedFile, IngestError>
where
    R: AsyncBufRead + Unpin,
{
    let mut parsed = ParsedFile {
        name: name.to_string(),
        ..ParsedFile::default()
    };
    let mut line = Vec::new();
    let mut line_number = 0usize;

    loop {
        line.clear();
        let read = reader
            .read_until(b'\n', &mut line)
            .await
            .map_err(|source| IngestError::UnreadableFile {
                name: name.to_string(),
                source,
            })?;
        if read == 0 {
            break;
        }
        line_number += 1;

        match decode_line(&line) {
            Ok(mut record) => {
                register_record(&mut record, tracker);
                parsed.records.push(record);
            }
            Err(e) => {
                parsed.malformed_lines += 1;
                warn!(
                    "Skipping line {} of {}: {} (line: {})",
                    line_number,
                    name,
                    e,
                    excerpt(&line)
                );
            }
        }
    }

    debug!(
        "Parsed {}: {} records, {} malformed lines",
        name,
        parsed.records.len(),
        parsed.malformed_lines
    );

    Ok(parsed)
}

fn decode_line(line: &[u8]) -> Result<Record, LineError> {
    match serde_json::from_slice::<Value>(line)? {
        Value::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, RecordValue::from(v)))
            .collect()),
        Value::Null => Err(LineError::NotAnObject("null")),
        Value::Bool(_) => Err(LineError::NotAnObject("a boolean")),
        Value::Number(_) => Err(LineError::NotAnObject("a number")),
        Value::String(_) => Err(LineError::NotAnObject("a string")),
        Value::Array(_) => Err(LineError::NotAnObject("an array")),
    }
}

/// Rewrite `pmid` to canonical form and record first-seen order
///
/// Aspects only count toward ordering on records that carry a `pmid`.
fn register_record(record: &mut Record, tracker: &mut OrderTracker) {
    let Some(pmid) = record_pmid(record) else {
        return;
    };
    record.insert(IDENTIFIER_FIELD.to_string(), RecordValue::String(pmid.clone()));
    tracker.observe_document(&pmid);

    if let Some(aspect) = record_aspect(record) {
        tracker.observe_aspect(&pmid, &aspect);
    }
}

fn excerpt(line: &[u8]) -> String {
    let text = String::from_utf8_lossy(line);
    let text = text.trim_end();
    if text.chars().count() > LOG_EXCERPT_CHARS {
        let cut: String = text.chars().take(LOG_EXCERPT_CHARS).collect();
        format!("{}...", cut)
    } else {
        text.to_string()
    }
}
