//! Final identifier pass over the output tree
//!
//! Re-normalizes every `pmid` field at any depth, including identifiers nested
//! inside record payloads that the parser never looked at.

use super::identifier::{normalize_identifier, IDENTIFIER_FIELD};
use super::reorganize::ReorganizedResult;
use super::value::{Record, RecordValue};
use tracing::warn;

/// Nesting depth beyond which subtrees are passed through untouched
pub const MAX_SANITIZE_DEPTH: usize = 64;

/// Normalize every `pmid` value inside `value`
///
/// Idempotent; primitive leaves and non-`pmid` keys pass through unchanged.
pub fn sanitize(value: RecordValue) -> RecordValue {
    sanitize_at(value, 0)
}

fn sanitize_at(value: RecordValue, depth: usize) -> RecordValue {
    match value {
        RecordValue::Object(map) => {
            if depth >= MAX_SANITIZE_DEPTH {
                warn!("Sanitizer depth limit {} reached; subtree left as-is", MAX_SANITIZE_DEPTH);
                return RecordValue::Object(map);
            }
            RecordValue::Object(sanitize_map(map, depth))
        }
        RecordValue::Array(items) => {
            if depth >= MAX_SANITIZE_DEPTH {
                warn!("Sanitizer depth limit {} reached; subtree left as-is", MAX_SANITIZE_DEPTH);
                return RecordValue::Array(items);
            }
            RecordValue::Array(
                items
                    .into_iter()
                    .map(|item| sanitize_at(item, depth + 1))
                    .collect(),
            )
        }
        leaf => leaf,
    }
}

fn sanitize_map(map: Record, depth: usize) -> Record {
    map.into_iter()
        .map(|(key, value)| {
            let value = if key == IDENTIFIER_FIELD {
                RecordValue::String(normalize_identifier(&value))
            } else {
                sanitize_at(value, depth + 1)
            };
            (key, value)
        })
        .collect()
}

/// Sanitize one top-level record
pub fn sanitize_record(record: Record) -> Record {
    sanitize_map(record, 0)
}

/// Sanitize every record held in a reorganized result
pub fn sanitize_result(mut result: ReorganizedResult) -> ReorganizedResult {
    for document in result.documents.values_mut() {
        for bucket in document.reference.values_mut() {
            sanitize_bucket(bucket);
        }
        for by_aspect in document.responses.values_mut() {
            for bucket in by_aspect.values_mut() {
                sanitize_bucket(bucket);
            }
        }
    }
    result
}

fn sanitize_bucket(bucket: &mut Vec<Record>) {
    let records = std::mem::take(bucket);
    *bucket = records.into_iter().map(sanitize_record).collect();
}
