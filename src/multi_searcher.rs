//! Fans a single query out across several `IndexReader`s (e.g. one per
//! on-disk segment) and merges the results as if they were one reader,
//! using combined doc-freq/max-doc statistics so idf is computed
//! consistently across the whole corpus rather than per-segment.

use std::sync::Arc;

use crate::document::Document;
use crate::error::Result;
use crate::explain::Explanation;
use crate::hitqueue::{Hit, HitQueue, TopDocs};
use crate::query::Query;
use crate::reader::{IndexReader, PostingIterator, TermsEnum};
use crate::rewrite;
use crate::similarity::{DefaultSimilarity, Similarity};
use crate::weight::create_weight;

/// Presents one sub-reader's postings/terms/documents but reports
/// corpus-wide `max_doc`/`doc_freq`, so a `Weight` built against it scores
/// consistently with weights built against sibling sub-readers.
struct CombinedStatsReader<'a> {
    reader: &'a dyn IndexReader,
    total_max_doc: u32,
    siblings: &'a [&'a dyn IndexReader],
}

impl IndexReader for CombinedStatsReader<'_> {
    fn max_doc(&self) -> u32 {
        self.total_max_doc
    }

    fn deleted_count(&self) -> u32 {
        self.siblings.iter().map(|r| r.deleted_count()).sum()
    }

    fn doc_freq(&self, field: &str, text: &str) -> u32 {
        self.siblings.iter().map(|r| r.doc_freq(field, text)).sum()
    }

    fn postings(&self, field: &str, text: &str) -> Option<Box<dyn PostingIterator>> {
        self.reader.postings(field, text)
    }

    fn terms(&self, field: &str) -> Option<Box<dyn TermsEnum>> {
        self.reader.terms(field)
    }

    fn norms(&self, field: &str) -> Option<std::sync::Arc<[u8]>> {
        self.reader.norms(field)
    }

    fn is_deleted(&self, doc: u32) -> bool {
        self.reader.is_deleted(doc)
    }

    fn document(&self, doc: u32) -> Option<Document> {
        self.reader.document(doc)
    }
}

/// Searches several readers as one logical corpus, assigning each
/// sub-reader's docs a contiguous range of global doc ids by offsetting
/// with the running sum of the preceding readers' `max_doc`.
pub struct MultiSearcher<'r> {
    readers: Vec<&'r dyn IndexReader>,
    similarity: Arc<dyn Similarity>,
}

impl<'r> MultiSearcher<'r> {
    pub fn new(readers: Vec<&'r dyn IndexReader>) -> Self {
        MultiSearcher {
            readers,
            similarity: Arc::new(DefaultSimilarity),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    fn starts(&self) -> Vec<u32> {
        let mut starts = Vec::with_capacity(self.readers.len());
        let mut running = 0u32;
        for reader in &self.readers {
            starts.push(running);
            running += reader.max_doc();
        }
        starts
    }

    fn total_max_doc(&self) -> u32 {
        self.readers.iter().map(|r| r.max_doc()).sum()
    }

    pub fn max_doc(&self) -> u32 {
        self.total_max_doc()
    }

    /// Which sub-reader owns `global_doc`, and that doc's local id.
    fn locate(&self, starts: &[u32], global_doc: u32) -> Option<(usize, u32)> {
        for (i, &start) in starts.iter().enumerate() {
            let len = self.readers[i].max_doc();
            if global_doc >= start && global_doc < start + len {
                return Some((i, global_doc - start));
            }
        }
        None
    }

    pub fn search(&self, query: &Query, first_doc: usize, num_docs: usize) -> Result<TopDocs> {
        let starts = self.starts();
        let capacity = (first_doc + num_docs).max(1);
        let mut queue = HitQueue::new(capacity);
        for (i, reader) in self.readers.iter().enumerate() {
            let overlay = CombinedStatsReader {
                reader: *reader,
                total_max_doc: self.total_max_doc(),
                siblings: &self.readers,
            };
            let rewritten = rewrite::rewrite(query, &overlay);
            let mut weight = create_weight(&rewritten, &overlay, self.similarity.clone())?;
            let query_norm = self.similarity.query_norm(weight.sum_of_squared_weights());
            weight.normalize(query_norm);
            let Some(mut scorer) = weight.scorer(&overlay)? else {
                continue;
            };
            while scorer.next() {
                let local_doc = scorer.doc();
                if reader.is_deleted(local_doc) {
                    continue;
                }
                queue.offer(Hit {
                    doc: starts[i] + local_doc,
                    score: scorer.score(),
                });
            }
        }
        let mut top = queue.into_top_docs(first_doc);
        top.hits.truncate(num_docs);
        Ok(top)
    }

    pub fn get_doc(&self, global_doc: u32) -> Option<Document> {
        let starts = self.starts();
        let (i, local) = self.locate(&starts, global_doc)?;
        self.readers[i].document(local)
    }

    pub fn explain(&self, query: &Query, global_doc: u32) -> Result<Explanation> {
        let starts = self.starts();
        let Some((i, local)) = self.locate(&starts, global_doc) else {
            return Ok(Explanation::leaf(0.0, format!("doc {global_doc} out of range")));
        };
        let overlay = CombinedStatsReader {
            reader: self.readers[i],
            total_max_doc: self.total_max_doc(),
            siblings: &self.readers,
        };
        let rewritten = rewrite::rewrite(query, &overlay);
        let mut weight = create_weight(&rewritten, &overlay, self.similarity.clone())?;
        let query_norm = self.similarity.query_norm(weight.sum_of_squared_weights());
        weight.normalize(query_norm);
        weight.explain(&overlay, local)
    }
}
