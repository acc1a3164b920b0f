//! Reference/response JSONL ingestion
//!
//! Pipeline, run once per request:
//!
//! 1. [`parser`] decodes the reference file, then each response file, into
//!    flat record lists. `pmid` is normalized inline by [`identifier`] and
//!    first-seen order is accumulated in an [`order::OrderTracker`].
//! 2. [`reorganize`] builds document → {reference, responses} buckets.
//! 3. [`sanitize`] re-normalizes every `pmid` left anywhere in the tree.
//!
//! Nothing here is shared between requests.

pub mod identifier;
pub mod order;
pub mod parser;
pub mod reorganize;
pub mod sanitize;
pub mod value;

use std::path::Path;

use thiserror::Error;
use tokio::io::AsyncBufRead;
use tracing::{info, warn};

pub use identifier::normalize_identifier;
pub use order::OrderTracker;
pub use parser::{parse_records, ParsedFile};
pub use reorganize::{
    reorganize, PlacementStats, ReorganizedDocument, ReorganizedResult, ResponseSet,
};
pub use sanitize::{sanitize, sanitize_result};
pub use value::{Record, RecordValue};

/// Failures that abort a whole ingest request
#[derive(Debug, Error)]
pub enum IngestError {
    /// Reference or response upload absent
    #[error("Missing files: {0}")]
    MissingInput(String),

    /// An upload could not be opened or read to the end
    #[error("Failed to read {name}: {source}")]
    UnreadableFile {
        name: String,
        #[source]
        source: std::io::Error,
    },
}

/// A named JSONL input
pub struct Source {
    /// Upload (or file) name; response model labels derive from it
    pub name: String,
    pub reader: Box<dyn AsyncBufRead + Send + Unpin>,
}

impl Source {
    pub fn new<R>(name: impl Into<String>, reader: R) -> Self
    where
        R: AsyncBufRead + Send + Unpin + 'static,
    {
        Self {
            name: name.into(),
            reader: Box::new(reader),
        }
    }
}

/// Parsed records of one response file under its model label
#[derive(Debug, Clone)]
pub struct ModelResponses {
    pub model: String,
    pub file: ParsedFile,
}

/// Data-quality counters for one ingest run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Lines skipped across all files because they did not decode
    pub malformed_lines: usize,
    /// Records whose (pmid, aspect) had no bucket
    pub dropped_records: usize,
    /// Records without a `pmid` or `aspect`
    pub unplaced_records: usize,
}

/// Everything produced by one ingest run
#[derive(Debug, Clone)]
pub struct IngestOutcome {
    pub result: ReorganizedResult,
    pub reference: ParsedFile,
    pub responses: Vec<ModelResponses>,
    pub report: IngestReport,
}

/// Model label for a response upload: its base name without extension
///
/// `runs/modelA.jsonl` → `modelA`. Falls back to the full name when that
/// would leave nothing.
pub fn model_label(upload_name: &str) -> String {
    Path::new(upload_name)
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .filter(|stem| !stem.is_empty())
        .unwrap_or_else(|| upload_name.to_string())
}

/// Run the full pipeline over one reference and N response sources
///
/// The reference is always parsed first so it leads document and aspect
/// order. Fails on the first unreadable source; no partial result.
pub async fn ingest(reference: Source, responses: Vec<Source>) -> Result<IngestOutcome, IngestError> {
    if responses.is_empty() {
        return Err(IngestError::MissingInput(
            "at least one response file is required".to_string(),
        ));
    }

    let mut tracker = OrderTracker::new();
    let reference = parse_records(&reference.name, reference.reader, &mut tracker).await?;

    let mut parsed_responses: Vec<ModelResponses> = Vec::with_capacity(responses.len());
    for source in responses {
        let model = model_label(&source.name);
        let file = parse_records(&source.name, source.reader, &mut tracker).await?;

        match parsed_responses.iter_mut().find(|r| r.model == model) {
            Some(existing) => {
                warn!(
                    "Response file {} reuses model name {:?}; replacing records from {}",
                    file.name, model, existing.file.name
                );
                existing.file = file;
            }
            None => parsed_responses.push(ModelResponses { model, file }),
        }
    }

    let sets: Vec<ResponseSet<'_>> = parsed_responses
        .iter()
        .map(|r| ResponseSet {
            model: &r.model,
            records: &r.file.records,
        })
        .collect();
    let (result, stats) = reorganize(&reference.records, &sets, &tracker);
    let result = sanitize_result(result);

    let report = IngestReport {
        malformed_lines: reference.malformed_lines
            + parsed_responses
                .iter()
                .map(|r| r.file.malformed_lines)
                .sum::<usize>(),
        dropped_records: stats.unregistered,
        unplaced_records: stats.missing_keys,
    };

    info!(
        "Ingested {} documents, {} aspects from {} + {} response files ({} malformed lines, {} dropped records)",
        result.document_order.len(),
        tracker.aspect_order().len(),
        reference.name,
        parsed_responses.len(),
        report.malformed_lines,
        report.dropped_records
    );

    Ok(IngestOutcome {
        result,
        reference,
        responses: parsed_responses,
        report,
    })
}
