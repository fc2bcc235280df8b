//! Secondary indexes over stored records
//!
//! Positions point into the store's append-only record list, so every
//! posting list is sorted ascending by construction. Indexes only narrow
//! the candidate set; every candidate is still checked against the full
//! query.

use std::collections::HashMap;

use logbook_core::{LogQuery, LogRecord};

use super::filter::TextSearch;
use crate::tokenizer::distinct_tokens;

// ============================================================================
// FieldIndex
// ============================================================================

/// Exact-value index for one field
#[derive(Debug, Default)]
struct FieldIndex {
    postings: HashMap<String, Vec<usize>>,
}

impl FieldIndex {
    fn insert(&mut self, value: &str, position: usize) {
        if value.is_empty() {
            return;
        }
        self.postings
            .entry(value.to_string())
            .or_default()
            .push(position);
    }

    fn get(&self, value: &str) -> &[usize] {
        self.postings.get(value).map(Vec::as_slice).unwrap_or(&[])
    }
}

// ============================================================================
// RecordIndex
// ============================================================================

/// Indexes on the equality filter fields and on message tokens
#[derive(Debug, Default)]
pub struct RecordIndex {
    level: FieldIndex,
    resource_id: FieldIndex,
    trace_id: FieldIndex,
    span_id: FieldIndex,
    commit: FieldIndex,
    parent_resource_id: FieldIndex,
    tokens: FieldIndex,
    indexed: usize,
}

impl RecordIndex {
    /// Empty index
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from records in position order
    pub fn build(records: &[LogRecord]) -> Self {
        let mut index = Self::new();
        for (position, record) in records.iter().enumerate() {
            index.insert(position, record);
        }
        index
    }

    /// Index the record stored at `position`.
    pub fn insert(&mut self, position: usize, record: &LogRecord) {
        self.level.insert(&record.level, position);
        self.resource_id.insert(&record.resource_id, position);
        self.trace_id.insert(&record.trace_id, position);
        self.span_id.insert(&record.span_id, position);
        self.commit.insert(&record.commit, position);
        self.parent_resource_id
            .insert(record.parent_resource_id(), position);
        for token in distinct_tokens(&record.message) {
            self.tokens.insert(&token, position);
        }
        self.indexed += 1;
    }

    /// Number of records indexed
    pub fn len(&self) -> usize {
        self.indexed
    }

    /// True if nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// Positions that may match, ascending.
    ///
    /// `None` means no index applies and every record is a candidate.
    pub fn candidates(&self, query: &LogQuery, search: Option<&TextSearch>) -> Option<Vec<usize>> {
        let mut lists: Vec<&[usize]> = Vec::new();
        let fields = [
            (&self.level, &query.level),
            (&self.resource_id, &query.resource_id),
            (&self.trace_id, &query.trace_id),
            (&self.span_id, &query.span_id),
            (&self.commit, &query.commit),
            (&self.parent_resource_id, &query.parent_resource_id),
        ];
        for (index, value) in fields {
            if !value.is_empty() {
                lists.push(index.get(value));
            }
        }

        let mut result: Option<Vec<usize>> = None;
        for list in lists {
            result = Some(match result {
                None => list.to_vec(),
                Some(current) => intersect(&current, list),
            });
        }

        if let Some(search) = search {
            let text = self.text_candidates(search);
            result = Some(match result {
                None => text,
                Some(current) => intersect(&current, &text),
            });
        }
        result
    }

    fn text_candidates(&self, search: &TextSearch) -> Vec<usize> {
        if !search.phrases().is_empty() {
            let mut result: Option<Vec<usize>> = None;
            for token in search.phrases().iter().flatten() {
                let list = self.tokens.get(token);
                result = Some(match result {
                    None => list.to_vec(),
                    Some(current) => intersect(&current, list),
                });
            }
            return result.unwrap_or_default();
        }
        let mut result = Vec::new();
        for term in search.terms() {
            result = union(&result, self.tokens.get(term));
        }
        result
    }
}

/// Intersect two ascending lists
fn intersect(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out
}

/// Union of two ascending lists
fn union(a: &[usize], b: &[usize]) -> Vec<usize> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => {
                out.push(a[i]);
                i += 1;
            }
            std::cmp::Ordering::Greater => {
                out.push(b[j]);
                j += 1;
            }
            std::cmp::Ordering::Equal => {
                out.push(a[i]);
                i += 1;
                j += 1;
            }
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    out
}
