//! The `IndexReader` interface this core consumes, plus a simple in-memory
//! implementation used by tests and by small embedded deployments that
//! don't need the on-disk segment format.

use std::collections::BTreeMap;
use std::collections::HashMap;

use crate::document::{Document, FieldValue};
use crate::similarity::float_to_byte;

/// A cursor over one term's posting list: `(doc, freq, positions)` triples
/// in strictly increasing doc order, positions strictly increasing within
/// a document.
pub trait PostingIterator: Send {
    fn doc(&self) -> u32;
    fn freq(&self) -> u32;
    fn positions(&self) -> &[u32];
    /// Advances to the next posting. Returns false when exhausted.
    fn next(&mut self) -> bool;
    /// Advances to the first doc >= target. Returns false when exhausted.
    fn skip_to(&mut self, target: u32) -> bool;
}

/// A cursor over a field's term dictionary, ordered ascending by text.
pub trait TermsEnum: Send {
    fn term(&self) -> Option<&str>;
    fn doc_freq(&self) -> u32;
    /// Advances to the next term. Returns false when exhausted.
    fn next(&mut self) -> bool;
    /// Advances to the first term >= `from`. Returns false when exhausted.
    fn seek(&mut self, from: &str) -> bool;
}

/// A point-in-time snapshot of an inverted index. Deleted docs are skipped
/// by scorers, not by the reader itself.
pub trait IndexReader: Send + Sync {
    fn max_doc(&self) -> u32;

    fn num_docs(&self) -> u32 {
        self.max_doc() - self.deleted_count()
    }

    fn deleted_count(&self) -> u32 {
        0
    }

    fn doc_freq(&self, field: &str, text: &str) -> u32;

    fn postings(&self, field: &str, text: &str) -> Option<Box<dyn PostingIterator>>;

    fn terms(&self, field: &str) -> Option<Box<dyn TermsEnum>>;

    /// A byte per doc up to `max_doc`, or `None` if the field carries no
    /// norms (scorers then treat the norm factor as 1.0).
    fn norms(&self, field: &str) -> Option<std::sync::Arc<[u8]>>;

    fn has_deletions(&self) -> bool {
        self.deleted_count() > 0
    }

    fn is_deleted(&self, doc: u32) -> bool;

    fn document(&self, doc: u32) -> Option<Document>;

    fn field_value(&self, doc: u32, field: &str) -> Option<FieldValue> {
        self.document(doc).and_then(|d| d.get(field).cloned())
    }
}

struct VecPostingIterator {
    postings: Vec<(u32, Vec<u32>)>,
    index: i64,
}

impl PostingIterator for VecPostingIterator {
    fn doc(&self) -> u32 {
        self.postings[self.index as usize].0
    }

    fn freq(&self) -> u32 {
        self.postings[self.index as usize].1.len() as u32
    }

    fn positions(&self) -> &[u32] {
        &self.postings[self.index as usize].1
    }

    fn next(&mut self) -> bool {
        self.index += 1;
        (self.index as usize) < self.postings.len()
    }

    fn skip_to(&mut self, target: u32) -> bool {
        if self.index < 0 {
            self.index = 0;
        }
        while (self.index as usize) < self.postings.len() && self.doc() < target {
            self.index += 1;
        }
        (self.index as usize) < self.postings.len()
    }
}

struct VecTermsEnum {
    terms: Vec<(String, u32)>,
    index: i64,
}

impl TermsEnum for VecTermsEnum {
    fn term(&self) -> Option<&str> {
        self.terms
            .get(self.index as usize)
            .map(|(t, _)| t.as_str())
    }

    fn doc_freq(&self) -> u32 {
        self.terms.get(self.index as usize).map_or(0, |(_, f)| *f)
    }

    fn next(&mut self) -> bool {
        self.index += 1;
        (self.index as usize) < self.terms.len()
    }

    fn seek(&mut self, from: &str) -> bool {
        while let Some((t, _)) = self.terms.get(self.index.max(0) as usize) {
            if t.as_str() >= from {
                return true;
            }
            self.index += 1;
        }
        false
    }
}

/// A fully in-memory `IndexReader`, built up term-by-term. Useful for
/// tests and for small corpora that don't warrant an on-disk segment.
#[derive(Default)]
pub struct MemoryIndexReader {
    max_doc: u32,
    deleted: std::collections::HashSet<u32>,
    // field -> term -> postings (sorted by doc)
    postings: HashMap<String, BTreeMap<String, Vec<(u32, Vec<u32>)>>>,
    // field -> doc -> norm byte, densified into an Arc<[u8]> on build()
    norms: HashMap<String, HashMap<u32, u8>>,
    densified_norms: HashMap<String, std::sync::Arc<[u8]>>,
    documents: HashMap<u32, Document>,
}

impl MemoryIndexReader {
    pub fn builder() -> MemoryIndexReaderBuilder {
        MemoryIndexReaderBuilder::new()
    }
}

impl IndexReader for MemoryIndexReader {
    fn max_doc(&self) -> u32 {
        self.max_doc
    }

    fn deleted_count(&self) -> u32 {
        self.deleted.len() as u32
    }

    fn doc_freq(&self, field: &str, text: &str) -> u32 {
        self.postings
            .get(field)
            .and_then(|terms| terms.get(text))
            .map_or(0, |postings| postings.len() as u32)
    }

    fn postings(&self, field: &str, text: &str) -> Option<Box<dyn PostingIterator>> {
        let postings = self.postings.get(field)?.get(text)?.clone();
        if postings.is_empty() {
            return None;
        }
        Some(Box::new(VecPostingIterator {
            postings,
            index: -1,
        }))
    }

    fn terms(&self, field: &str) -> Option<Box<dyn TermsEnum>> {
        let terms = self.postings.get(field)?;
        let terms: Vec<(String, u32)> = terms
            .iter()
            .map(|(t, p)| (t.clone(), p.len() as u32))
            .collect();
        Some(Box::new(VecTermsEnum { terms, index: -1 }))
    }

    fn norms(&self, field: &str) -> Option<std::sync::Arc<[u8]>> {
        self.densified_norms.get(field).cloned()
    }

    fn is_deleted(&self, doc: u32) -> bool {
        self.deleted.contains(&doc)
    }

    fn document(&self, doc: u32) -> Option<Document> {
        self.documents.get(&doc).cloned()
    }
}

/// Builds a `MemoryIndexReader` document-by-document.
pub struct MemoryIndexReaderBuilder {
    reader: MemoryIndexReader,
}

impl MemoryIndexReaderBuilder {
    pub fn new() -> Self {
        MemoryIndexReaderBuilder {
            reader: MemoryIndexReader::default(),
        }
    }

    /// Adds a document with already-tokenized per-field text (positions
    /// are assigned 0, 1, 2, ... in token order) and a stored `Document`.
    pub fn add_document(&mut self, fields: &[(&str, &[&str])], stored: Document) -> u32 {
        let doc = self.reader.max_doc;
        self.reader.max_doc += 1;
        for (field, tokens) in fields {
            let terms = self
                .reader
                .postings
                .entry((*field).to_string())
                .or_default();
            let mut positions: HashMap<&str, Vec<u32>> = HashMap::new();
            for (pos, token) in tokens.iter().enumerate() {
                positions.entry(*token).or_default().push(pos as u32);
            }
            for (token, positions) in positions {
                terms
                    .entry(token.to_string())
                    .or_default()
                    .push((doc, positions));
            }
            let norm = crate::similarity::DefaultSimilarity.length_norm(field, tokens.len() as u32);
            self.reader
                .norms
                .entry((*field).to_string())
                .or_default()
                .insert(doc, float_to_byte(norm));
        }
        self.reader.documents.insert(doc, stored);
        doc
    }

    pub fn delete(&mut self, doc: u32) {
        self.reader.deleted.insert(doc);
    }

    /// Overrides the norm byte for a (field, doc) pair, e.g. to fold in a
    /// document-level boost on top of length normalization.
    pub fn set_norm(&mut self, field: &str, doc: u32, norm: f32) {
        self.reader
            .norms
            .entry(field.to_string())
            .or_default()
            .insert(doc, float_to_byte(norm));
    }

    pub fn build(mut self) -> MemoryIndexReader {
        let max_doc = self.reader.max_doc;
        for (field, by_doc) in self.reader.norms.drain() {
            let mut dense = vec![float_to_byte(1.0); max_doc as usize];
            for (doc, b) in by_doc {
                dense[doc as usize] = b;
            }
            self.reader
                .densified_norms
                .insert(field, std::sync::Arc::from(dense));
        }
        self.reader
    }
}

impl Default for MemoryIndexReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

use crate::similarity::Similarity as _;
