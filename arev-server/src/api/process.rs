//! JSONL upload processing
//!
//! POST /process takes one `reference` file and one or more `responses`
//! files, and returns the reorganized document structure.

use axum::{
    extract::Multipart,
    http::{HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;

use super::{ApiError, ApiResult};
use crate::ingest::{ingest, IngestError};
use crate::upload::{spool_uploads, SpooledFile};

/// Response header: lines skipped because they were not valid JSON objects
pub const MALFORMED_LINES_HEADER: &str = "x-arev-malformed-lines";

/// Response header: records dropped for lack of a registered (pmid, aspect)
pub const DROPPED_RECORDS_HEADER: &str = "x-arev-dropped-records";

/// POST /process
pub async fn process_files(multipart: Multipart) -> ApiResult<Response> {
    let uploads = spool_uploads(multipart).await?;

    let Some(reference) = uploads.reference else {
        return Err(missing("reference file is required"));
    };
    if uploads.responses.is_empty() {
        return Err(missing("at least one response file is required"));
    }

    info!(
        "Processing reference {} ({} bytes) and {} response files",
        reference.name,
        reference.size,
        uploads.responses.len()
    );

    let responses = uploads
        .responses
        .into_iter()
        .map(SpooledFile::into_source)
        .collect();
    let outcome = ingest(reference.into_source(), responses).await?;

    let headers = [
        (
            HeaderName::from_static(MALFORMED_LINES_HEADER),
            HeaderValue::from(outcome.report.malformed_lines),
        ),
        (
            HeaderName::from_static(DROPPED_RECORDS_HEADER),
            HeaderValue::from(outcome.report.dropped_records),
        ),
    ];

    Ok((headers, Json(outcome.result)).into_response())
}

fn missing(what: &str) -> ApiError {
    ApiError::Ingest(IngestError::MissingInput(what.to_string()))
}
