//! Multipart upload spooling
//!
//! Multipart fields arrive in whatever order the client sent them, but the
//! reference file must be parsed before any response file. Each file field is
//! streamed chunk by chunk into an anonymous temp file, which is later read
//! back line by line. No upload is ever held in memory whole.

use std::io::SeekFrom;

use axum::extract::multipart::{Field, Multipart};
use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use crate::api::ApiError;
use crate::ingest::Source;

/// Multipart field carrying the reference JSONL file
pub const REFERENCE_FIELD: &str = "reference";

/// Multipart field (repeatable) carrying response JSONL files
pub const RESPONSES_FIELD: &str = "responses";

/// One upload written to a temp file, rewound and ready to read
pub struct SpooledFile {
    pub name: String,
    pub size: u64,
    file: File,
}

impl SpooledFile {
    pub fn into_source(self) -> Source {
        Source::new(self.name, BufReader::new(self.file))
    }
}

/// Uploads collected from one `/process` request
#[derive(Default)]
pub struct SpooledUploads {
    pub reference: Option<SpooledFile>,
    pub responses: Vec<SpooledFile>,
}

/// Drain a multipart body into temp files
///
/// Only the first `reference` field is kept. Unknown fields are skipped.
pub async fn spool_uploads(mut multipart: Multipart) -> Result<SpooledUploads, ApiError> {
    let mut uploads = SpooledUploads::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            REFERENCE_FIELD => {
                if uploads.reference.is_some() {
                    warn!("Ignoring extra reference upload {:?}", field.file_name());
                    continue;
                }
                let name = upload_name(&field, REFERENCE_FIELD, 0);
                uploads.reference = Some(spool_field(field, name).await?);
            }
            RESPONSES_FIELD => {
                let name = upload_name(&field, RESPONSES_FIELD, uploads.responses.len());
                uploads.responses.push(spool_field(field, name).await?);
            }
            other => debug!("Ignoring multipart field {:?}", other),
        }
    }

    Ok(uploads)
}

fn upload_name(field: &Field<'_>, field_name: &str, index: usize) -> String {
    match field.file_name() {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => format!("{}-{}", field_name, index + 1),
    }
}

async fn spool_field(mut field: Field<'_>, name: String) -> Result<SpooledFile, ApiError> {
    let mut file = File::from_std(tempfile::tempfile()?);
    let mut size = 0u64;

    while let Some(chunk) = field.chunk().await? {
        size += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    file.seek(SeekFrom::Start(0)).await?;

    debug!("Spooled upload {} ({} bytes)", name, size);
    Ok(SpooledFile { name, size, file })
}
