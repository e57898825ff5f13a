//! Exact phrase scorer (`slop == 0`).
//!
//! Each slot in the phrase may carry more than one term (a disjunctive
//! "multi-phrase" slot); positions from all of a slot's terms are merged
//! into one stream before intersecting across slots.

use std::sync::Arc;

use super::{Scorer, NO_MORE_DOCS};
use crate::reader::PostingIterator;
use crate::similarity::Similarity;

pub(crate) struct SlotCursor {
    declared_position: i32,
    iters: Vec<(Box<dyn PostingIterator>, bool)>,
}

impl SlotCursor {
    pub(crate) fn new(declared_position: i32, postings: Vec<Box<dyn PostingIterator>>) -> Self {
        let iters = postings
            .into_iter()
            .map(|mut p| {
                let has_more = p.next();
                (p, !has_more)
            })
            .collect();
        SlotCursor {
            declared_position,
            iters,
        }
    }

    pub(crate) fn declared_position(&self) -> i32 {
        self.declared_position
    }

    pub(crate) fn doc(&self) -> u32 {
        self.iters
            .iter()
            .filter(|(_, exhausted)| !exhausted)
            .map(|(p, _)| p.doc())
            .min()
            .unwrap_or(NO_MORE_DOCS)
    }

    pub(crate) fn advance_to(&mut self, target: u32) {
        for (p, exhausted) in &mut self.iters {
            if !*exhausted && p.doc() < target {
                *exhausted = !p.skip_to(target);
            }
        }
    }

    /// Sorted, deduplicated raw positions across every term in this slot,
    /// for the given doc.
    pub(crate) fn raw_positions_at(&self, doc: u32) -> Vec<i32> {
        let mut out: Vec<i32> = Vec::new();
        for (p, exhausted) in &self.iters {
            if !*exhausted && p.doc() == doc {
                out.extend(p.positions().iter().map(|&pos| pos as i32));
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Sorted, deduplicated `position - declared_position` values across
    /// every term in this slot, for the given doc.
    fn shifted_positions_at(&self, doc: u32) -> Vec<i32> {
        let mut out: Vec<i32> = Vec::new();
        for (p, exhausted) in &self.iters {
            if !*exhausted && p.doc() == doc {
                out.extend(p.positions().iter().map(|&pos| pos as i32 - self.declared_position));
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

/// Scores exact phrase matches: all slots must be present in a doc and
/// agree, for at least one offset, on `position - declared_position`.
pub struct PhraseScorer {
    slots: Vec<SlotCursor>,
    norms: Option<Arc<[u8]>>,
    weight_value: f32,
    score_cache: [f32; 32],
    current_doc: Option<u32>,
    current_score: f32,
}

impl PhraseScorer {
    pub fn new(
        slots: Vec<(i32, Vec<Box<dyn PostingIterator>>)>,
        norms: Option<Arc<[u8]>>,
        weight_value: f32,
        similarity: &dyn Similarity,
    ) -> Self {
        let mut score_cache = [0f32; 32];
        for (freq, slot) in score_cache.iter_mut().enumerate() {
            *slot = similarity.tf(freq as f32) * weight_value;
        }
        PhraseScorer {
            slots: slots
                .into_iter()
                .map(|(pos, postings)| SlotCursor::new(pos, postings))
                .collect(),
            norms,
            weight_value,
            score_cache,
            current_doc: None,
            current_score: 0.0,
        }
    }

    fn raw_score(&self, freq: u32) -> f32 {
        let idx = freq.min(self.score_cache.len() as u32 - 1) as usize;
        self.score_cache[idx]
    }

    fn conjunctive_candidate(&mut self, mut from: u32) -> Option<u32> {
        'outer: loop {
            let mut max_doc = from;
            for slot in &mut self.slots {
                slot.advance_to(max_doc);
                let doc = slot.doc();
                if doc == NO_MORE_DOCS {
                    return None;
                }
                if doc > max_doc {
                    max_doc = doc;
                }
            }
            for slot in &mut self.slots {
                if slot.doc() != max_doc {
                    from = max_doc;
                    continue 'outer;
                }
            }
            return Some(max_doc);
        }
    }

    /// Number of distinct anchor offsets shared by every slot at `doc`.
    fn phrase_freq(&self, doc: u32) -> u32 {
        let mut per_slot: Vec<Vec<i32>> = self.slots.iter().map(|s| s.shifted_positions_at(doc)).collect();
        if per_slot.iter().any(|v| v.is_empty()) {
            return 0;
        }
        per_slot.sort_by_key(|v| v.len());
        let (smallest, rest) = per_slot.split_first().unwrap();
        let mut count = 0u32;
        for value in smallest {
            if rest.iter().all(|v| v.binary_search(value).is_ok()) {
                count += 1;
            }
        }
        count
    }

    fn settle(&mut self, doc: u32) -> bool {
        let freq = self.phrase_freq(doc);
        if freq == 0 {
            return false;
        }
        let norm = self
            .norms
            .as_ref()
            .and_then(|n| n.get(doc as usize))
            .copied()
            .map(crate::similarity::byte_to_float)
            .unwrap_or(1.0);
        self.current_doc = Some(doc);
        self.current_score = self.raw_score(freq) * norm;
        true
    }

    fn advance(&mut self, mut from: u32) -> bool {
        loop {
            let Some(candidate) = self.conjunctive_candidate(from) else {
                self.current_doc = None;
                return false;
            };
            if self.settle(candidate) {
                return true;
            }
            from = candidate + 1;
        }
    }
}

impl Scorer for PhraseScorer {
    fn doc(&self) -> u32 {
        self.current_doc.unwrap_or(NO_MORE_DOCS)
    }

    fn score(&self) -> f32 {
        self.current_score
    }

    fn next(&mut self) -> bool {
        let from = self.current_doc.map_or(0, |d| d + 1);
        self.advance(from)
    }

    fn skip_to(&mut self, target: u32) -> bool {
        if let Some(doc) = self.current_doc {
            if doc >= target {
                return true;
            }
        }
        self.advance(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::reader::{IndexReader, MemoryIndexReader};
    use crate::similarity::DefaultSimilarity;

    fn fixture() -> MemoryIndexReader {
        let mut b = MemoryIndexReader::builder();
        b.add_document(&[("body", &["quick", "brown", "fox"])], Document::new());
        b.add_document(&[("body", &["quick", "red", "fox"])], Document::new());
        b.add_document(&[("body", &["brown", "quick", "fox"])], Document::new());
        b.build()
    }

    fn postings_for(reader: &MemoryIndexReader, terms: &[&str]) -> Vec<Box<dyn PostingIterator>> {
        terms
            .iter()
            .filter_map(|t| reader.postings("body", t))
            .collect()
    }

    #[test]
    fn exact_phrase_matches_only_contiguous_order() {
        let reader = fixture();
        let slots = vec![
            (0, postings_for(&reader, &["quick"])),
            (1, postings_for(&reader, &["brown"])),
            (2, postings_for(&reader, &["fox"])),
        ];
        let norms = reader.norms("body");
        let mut scorer = PhraseScorer::new(slots, norms, 1.0, &DefaultSimilarity);
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0]);
    }

    #[test]
    fn multi_phrase_slot_matches_any_alternative() {
        let reader = fixture();
        let slots = vec![
            (0, postings_for(&reader, &["quick"])),
            (1, postings_for(&reader, &["brown", "red"])),
            (2, postings_for(&reader, &["fox"])),
        ];
        let norms = reader.norms("body");
        let mut scorer = PhraseScorer::new(slots, norms, 1.0, &DefaultSimilarity);
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0, 1]);
    }

    #[test]
    fn gap_between_slots_is_honored() {
        let reader = fixture();
        // "quick <> fox" - fox must be two positions after quick regardless
        // of what occupies the gap.
        let slots = vec![
            (0, postings_for(&reader, &["quick"])),
            (2, postings_for(&reader, &["fox"])),
        ];
        let norms = reader.norms("body");
        let mut scorer = PhraseScorer::new(slots, norms, 1.0, &DefaultSimilarity);
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0, 1]);
    }
}
