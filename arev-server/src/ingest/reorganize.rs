//! Per-document, per-aspect, per-model assembly
//!
//! Buckets are created up front from the order tracker: one per aspect the
//! document is known to have. Records are then appended in file order. A
//! record whose (pmid, aspect) pair has no bucket is dropped from this view
//! and counted; it still appears in the flat per-file parse.

use super::order::OrderTracker;
use super::parser::{record_aspect, record_pmid};
use super::value::Record;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

/// Output key holding the document order
pub const DOCUMENT_ORDER_KEY: &str = "pmid_order";

/// Records for one document, bucketed by aspect
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ReorganizedDocument {
    /// aspect → reference records
    pub reference: BTreeMap<String, Vec<Record>>,
    /// model → aspect → response records
    pub responses: BTreeMap<String, BTreeMap<String, Vec<Record>>>,
    /// This document's aspects in global first-seen order
    pub aspects: Vec<String>,
}

impl ReorganizedDocument {
    fn empty_buckets(&self) -> BTreeMap<String, Vec<Record>> {
        self.aspects
            .iter()
            .map(|aspect| (aspect.clone(), Vec::new()))
            .collect()
    }
}

/// All documents plus the order they should be presented in
///
/// Serializes as `{"pmid_order": [...], "<pmid>": {...}, ...}`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReorganizedResult {
    pub document_order: Vec<String>,
    pub documents: HashMap<String, ReorganizedDocument>,
}

impl ReorganizedResult {
    pub fn document(&self, pmid: &str) -> Option<&ReorganizedDocument> {
        self.documents.get(pmid)
    }
}

impl Serialize for ReorganizedResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(DOCUMENT_ORDER_KEY, &self.document_order)?;
        for pmid in &self.document_order {
            // A document literally named "pmid_order" cannot share the key
            if pmid == DOCUMENT_ORDER_KEY {
                continue;
            }
            if let Some(document) = self.documents.get(pmid) {
                map.serialize_entry(pmid, document)?;
            }
        }
        map.end()
    }
}

/// One model's response records, borrowed from its parsed file
#[derive(Debug, Clone, Copy)]
pub struct ResponseSet<'a> {
    pub model: &'a str,
    pub records: &'a [Record],
}

/// Placement counters for one reorganization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlacementStats {
    /// Records appended to a bucket
    pub placed: usize,
    /// Records lacking a `pmid` or an `aspect`
    pub missing_keys: usize,
    /// Records whose (pmid, aspect) pair had no bucket
    pub unregistered: usize,
}

/// Build the nested document structure from tracked order and records
pub fn reorganize(
    reference: &[Record],
    responses: &[ResponseSet<'_>],
    tracker: &OrderTracker,
) -> (ReorganizedResult, PlacementStats) {
    let mut stats = PlacementStats::default();
    let mut documents = HashMap::with_capacity(tracker.document_order().len());

    for pmid in tracker.document_order() {
        if pmid == DOCUMENT_ORDER_KEY {
            warn!(
                "Document id {:?} collides with the order key; its entry is omitted from output",
                pmid
            );
        }
        let mut document = ReorganizedDocument {
            aspects: tracker.sorted_document_aspects(pmid),
            ..ReorganizedDocument::default()
        };
        document.reference = document.empty_buckets();
        documents.insert(pmid.clone(), document);
    }

    for record in reference {
        let Some(pmid) = record_pmid(record) else {
            stats.missing_keys += 1;
            continue;
        };
        let Some(document) = documents.get_mut(&pmid) else {
            stats.unregistered += 1;
            continue;
        };
        let Some(aspect) = record_aspect(record) else {
            stats.missing_keys += 1;
            continue;
        };
        match document.reference.get_mut(&aspect) {
            Some(bucket) => {
                bucket.push(record.clone());
                stats.placed += 1;
            }
            None => stats.unregistered += 1,
        }
    }

    for set in responses {
        for record in set.records {
            let Some(pmid) = record_pmid(record) else {
                stats.missing_keys += 1;
                continue;
            };
            let Some(document) = documents.get_mut(&pmid) else {
                stats.unregistered += 1;
                continue;
            };
            if !document.responses.contains_key(set.model) {
                let buckets = document.empty_buckets();
                document.responses.insert(set.model.to_string(), buckets);
            }
            let Some(aspect) = record_aspect(record) else {
                stats.missing_keys += 1;
                continue;
            };
            let bucket = document
                .responses
                .get_mut(set.model)
                .and_then(|by_aspect| by_aspect.get_mut(&aspect));
            match bucket {
                Some(bucket) => {
                    bucket.push(record.clone());
                    stats.placed += 1;
                }
                None => stats.unregistered += 1,
            }
        }
    }

    if stats.unregistered > 0 {
        warn!(
            "{} records dropped: (pmid, aspect) not registered before reorganization",
            stats.unregistered
        );
    }
    debug!(
        "Reorganized {} documents: {} records placed, {} without pmid/aspect",
        documents.len(),
        stats.placed,
        stats.missing_keys
    );

    let result = ReorganizedResult {
        document_order: tracker.document_order().to_vec(),
        documents,
    };
    (result, stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::value::RecordValue;

    fn record(pmid: &str, aspect: &str) -> Record {
        let mut r = Record::new();
        r.insert("pmid".to_string(), RecordValue::from(pmid));
        r.insert("aspect".to_string(), RecordValue::from(aspect));
        r
    }

    fn tracked(records: &[Record]) -> OrderTracker {
        let mut tracker = OrderTracker::new();
        for r in records {
            let pmid = record_pmid(r).unwrap();
            match record_aspect(r) {
                Some(aspect) => tracker.observe_aspect(&pmid, &aspect),
                None => {
                    tracker.observe_document(&pmid);
                }
            }
        }
        tracker
    }

    #[test]
    fn test_reference_bucketed_by_aspect() {
        let reference = vec![record("1", "Fluency"), record("1", "Accuracy"), record("1", "Fluency")];
        let tracker = tracked(&reference);

        let (result, stats) = reorganize(&reference, &[], &tracker);
        let doc = result.document("1").unwrap();

        assert_eq!(doc.aspects, vec!["Fluency", "Accuracy"]);
        assert_eq!(doc.reference["Fluency"].len(), 2);
        assert_eq!(doc.reference["Accuracy"].len(), 1);
        assert!(doc.responses.is_empty());
        assert_eq!(stats.placed, 3);
    }

    #[test]
    fn test_model_buckets_cover_all_document_aspects() {
        let reference = vec![record("1", "Fluency"), record("1", "Accuracy")];
        let tracker = tracked(&reference);
        let model_records = vec![record("1", "Accuracy")];
        let sets = [ResponseSet {
            model: "modelA",
            records: &model_records,
        }];

        let (result, _) = reorganize(&reference, &sets, &tracker);
        let buckets = &result.document("1").unwrap().responses["modelA"];

        assert_eq!(buckets.len(), 2);
        assert!(buckets["Fluency"].is_empty());
        assert_eq!(buckets["Accuracy"].len(), 1);
    }

    #[test]
    fn test_unregistered_aspect_dropped() {
        let reference = vec![record("1", "Fluency")];
        let tracker = tracked(&reference);
        let model_records = vec![record("1", "Coherence"), record("2", "Fluency")];
        let sets = [ResponseSet {
            model: "modelA",
            records: &model_records,
        }];

        let (result, stats) = reorganize(&reference, &sets, &tracker);
        let doc = result.document("1").unwrap();

        assert!(!doc.responses["modelA"].contains_key("Coherence"));
        assert!(result.document("2").is_none());
        assert_eq!(stats.unregistered, 2);
        assert_eq!(stats.placed, 1);
    }

    #[test]
    fn test_records_without_aspect_counted_not_placed() {
        let mut bare = Record::new();
        bare.insert("pmid".to_string(), RecordValue::from("1"));
        let reference = vec![record("1", "Fluency"), bare.clone()];
        let tracker = tracked(&reference);
        let model_records = vec![bare];
        let sets = [ResponseSet {
            model: "modelB",
            records: &model_records,
        }];

        let (result, stats) = reorganize(&reference, &sets, &tracker);
        let doc = result.document("1").unwrap();

        // The model still gets its (empty) buckets for this document
        assert_eq!(doc.responses["modelB"]["Fluency"].len(), 0);
        assert_eq!(stats.missing_keys, 2);
    }

    #[test]
    fn test_serialized_shape() {
        let reference = vec![record("1001", "Fluency")];
        let tracker = tracked(&reference);
        let (result, _) = reorganize(&reference, &[], &tracker);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["pmid_order"], serde_json::json!(["1001"]));
        assert_eq!(json["1001"]["aspects"], serde_json::json!(["Fluency"]));
        assert_eq!(json["1001"]["reference"]["Fluency"][0]["pmid"], "1001");
        assert!(json["1001"]["responses"].as_object().unwrap().is_empty());
    }
}
