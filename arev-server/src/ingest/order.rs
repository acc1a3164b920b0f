//! First-seen ordering of documents and aspects
//!
//! The parser feeds every (pmid, aspect) pair it decodes into an
//! [`OrderTracker`]; the reorganizer later reads the accumulated order to lay
//! out its output deterministically.

use std::collections::{HashMap, HashSet};

/// Append-only first-seen order for documents and aspects
#[derive(Debug, Default, Clone)]
pub struct OrderTracker {
    document_order: Vec<String>,
    aspect_order: Vec<String>,
    aspect_positions: HashMap<String, usize>,
    document_aspects: HashMap<String, Vec<String>>,
    document_aspect_sets: HashMap<String, HashSet<String>>,
}

impl OrderTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a document, returning `true` the first time it is seen
    ///
    /// A newly seen document starts with an empty aspect list.
    pub fn observe_document(&mut self, pmid: &str) -> bool {
        if self.contains_document(pmid) {
            return false;
        }
        self.document_order.push(pmid.to_string());
        self.document_aspects.insert(pmid.to_string(), Vec::new());
        self.document_aspect_sets.insert(pmid.to_string(), HashSet::new());
        true
    }

    /// Register an aspect globally and for `pmid`
    ///
    /// Registers the document too if it is new.
    pub fn observe_aspect(&mut self, pmid: &str, aspect: &str) {
        self.observe_document(pmid);

        if !self.aspect_positions.contains_key(aspect) {
            self.aspect_positions
                .insert(aspect.to_string(), self.aspect_order.len());
            self.aspect_order.push(aspect.to_string());
        }

        let seen = self
            .document_aspect_sets
            .entry(pmid.to_string())
            .or_default();
        if seen.insert(aspect.to_string()) {
            self.document_aspects
                .entry(pmid.to_string())
                .or_default()
                .push(aspect.to_string());
        }
    }

    /// Documents in first-seen order
    pub fn document_order(&self) -> &[String] {
        &self.document_order
    }

    /// Aspects in first-seen order across all documents
    pub fn aspect_order(&self) -> &[String] {
        &self.aspect_order
    }

    pub fn contains_document(&self, pmid: &str) -> bool {
        self.document_aspects.contains_key(pmid)
    }

    /// Aspects of `pmid` in the order they were first seen for it
    pub fn document_aspects(&self, pmid: &str) -> &[String] {
        self.document_aspects
            .get(pmid)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Aspects of `pmid` sorted by their global first-seen position
    ///
    /// The sort is stable, so aspects sharing a position (which cannot happen
    /// through `observe_aspect`) keep their per-document order.
    pub fn sorted_document_aspects(&self, pmid: &str) -> Vec<String> {
        let mut aspects = self.document_aspects(pmid).to_vec();
        aspects.sort_by_key(|aspect| {
            self.aspect_positions
                .get(aspect)
                .copied()
                .unwrap_or(usize::MAX)
        });
        aspects
    }
}
