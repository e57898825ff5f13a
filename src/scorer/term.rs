//! Term scorer: iterates one term's posting list, skipping deleted docs.

use std::sync::Arc;

use super::{Scorer, NO_MORE_DOCS};
use crate::reader::{IndexReader, PostingIterator};
use crate::similarity::Similarity;

/// Scores a single term's postings. Caches `tf(freq) * weight_value` for
/// small frequencies (up to 31) to avoid repeated `sqrt` calls on the hot
/// path, per the classic Lucene term scorer design.
pub struct TermScorer {
    postings: Box<dyn PostingIterator>,
    norms: Option<Arc<[u8]>>,
    score_cache: [f32; 32],
    current_doc: Option<u32>,
    current_score: f32,
    is_deleted: Box<dyn Fn(u32) -> bool + Send>,
}

impl TermScorer {
    pub fn new(
        postings: Box<dyn PostingIterator>,
        norms: Option<Arc<[u8]>>,
        weight_value: f32,
        similarity: &dyn Similarity,
        reader: &dyn IndexReader,
    ) -> Self {
        let mut score_cache = [0f32; 32];
        for (freq, slot) in score_cache.iter_mut().enumerate() {
            *slot = similarity.tf(freq as f32) * weight_value;
        }
        let deleted_docs: std::collections::HashSet<u32> = if reader.has_deletions() {
            (0..reader.max_doc()).filter(|d| reader.is_deleted(*d)).collect()
        } else {
            std::collections::HashSet::new()
        };
        TermScorer {
            postings,
            norms,
            score_cache,
            current_doc: None,
            current_score: 0.0,
            is_deleted: Box::new(move |d| deleted_docs.contains(&d)),
        }
    }

    fn raw_score(&self, freq: u32) -> f32 {
        let idx = freq.min(self.score_cache.len() as u32 - 1) as usize;
        self.score_cache[idx]
    }

    fn settle_on_current(&mut self) {
        let doc = self.postings.doc();
        let freq = self.postings.freq();
        let norm = self
            .norms
            .as_ref()
            .and_then(|n| n.get(doc as usize))
            .copied()
            .map(crate::similarity::byte_to_float)
            .unwrap_or(1.0);
        self.current_doc = Some(doc);
        self.current_score = self.raw_score(freq) * norm;
    }

    fn advance_past_deletions(&mut self, mut ok: bool) -> bool {
        while ok && (self.is_deleted)(self.postings.doc()) {
            ok = self.postings.next();
        }
        if ok {
            self.settle_on_current();
        }
        ok
    }
}

impl Scorer for TermScorer {
    fn doc(&self) -> u32 {
        self.current_doc.unwrap_or(NO_MORE_DOCS)
    }

    fn score(&self) -> f32 {
        self.current_score
    }

    fn next(&mut self) -> bool {
        let ok = self.postings.next();
        self.advance_past_deletions(ok)
    }

    fn skip_to(&mut self, target: u32) -> bool {
        if let Some(doc) = self.current_doc {
            if doc >= target {
                return true;
            }
        }
        let ok = self.postings.skip_to(target);
        self.advance_past_deletions(ok)
    }
}
