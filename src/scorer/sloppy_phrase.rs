//! Sloppy phrase scorer (`slop > 0`).
//!
//! For each candidate doc, every combination of one raw position per slot
//! is weighed by how far it deviates from the phrase's declared layout.
//! Combinations within `slop` each contribute `sloppy_freq(distance)` to a
//! running total for the doc (mirroring how a doc with several in-slop
//! occurrences of a phrase scores higher than a doc with just one), and
//! the total is run through `tf()` exactly as an ordinary term frequency
//! would be. Slot counts in a phrase query are small, so exhaustive search
//! over each slot's (already filtered) small candidate position set is
//! cheap in practice.

use std::sync::Arc;

use super::phrase::SlotCursor;
use super::{Scorer, NO_MORE_DOCS};
use crate::reader::PostingIterator;
use crate::similarity::Similarity;

pub struct SloppyPhraseScorer {
    slots: Vec<SlotCursor>,
    slop: u32,
    norms: Option<Arc<[u8]>>,
    /// `sloppy_freq(distance)`, unweighted, indexed by distance up to `slop`.
    sloppy_freq_table: Vec<f32>,
    weight_value: f32,
    similarity: Arc<dyn Similarity>,
    current_doc: Option<u32>,
    current_score: f32,
}

impl SloppyPhraseScorer {
    pub fn new(
        slots: Vec<(i32, Vec<Box<dyn PostingIterator>>)>,
        slop: u32,
        norms: Option<Arc<[u8]>>,
        weight_value: f32,
        similarity: Arc<dyn Similarity>,
    ) -> Self {
        let sloppy_freq_table = (0..=slop).map(|distance| similarity.sloppy_freq(distance)).collect();
        SloppyPhraseScorer {
            slots: slots
                .into_iter()
                .map(|(pos, postings)| SlotCursor::new(pos, postings))
                .collect(),
            slop,
            norms,
            sloppy_freq_table,
            weight_value,
            similarity,
            current_doc: None,
            current_score: 0.0,
        }
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

    /// Sums `sloppy_freq(distance)` over every way of picking one raw
    /// position per slot whose total positional deviation from the
    /// declared layout (after a common anchor shift) is within `slop`.
    /// `None` if any slot has no candidate at `doc`.
    fn phrase_freq(&self, doc: u32) -> Option<f32> {
        let candidates: Vec<Vec<i32>> = self.slots.iter().map(|s| s.raw_positions_at(doc)).collect();
        if candidates.iter().any(|c| c.is_empty()) {
            return None;
        }
        let declared: Vec<i32> = self.slots.iter().map(|s| s.declared_position()).collect();
        let mut total = 0.0f32;
        let mut chosen = vec![0i32; candidates.len()];
        accumulate(0, &candidates, &declared, &mut chosen, self.slop, &self.sloppy_freq_table, &mut total);
        Some(total)
    }

    fn settle(&mut self, doc: u32) -> bool {
        let Some(freq) = self.phrase_freq(doc) else {
            return false;
        };
        if freq <= 0.0 {
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
        self.current_score = self.similarity.tf(freq) * self.weight_value * norm;
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

impl Scorer for SloppyPhraseScorer {
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

/// Exhaustive search over one candidate position per slot. Every
/// combination whose total absolute deviation from the declared layout
/// (once shifted by a common anchor fixed by the first slot's chosen
/// position) falls within `slop` contributes `sloppy_freq_table[distance]`
/// to `total`.
fn accumulate(
    slot_idx: usize,
    candidates: &[Vec<i32>],
    declared: &[i32],
    chosen: &mut [i32],
    slop: u32,
    sloppy_freq_table: &[f32],
    total: &mut f32,
) {
    if slot_idx == candidates.len() {
        let anchor = chosen[0] - declared[0];
        let distance: i64 = chosen
            .iter()
            .zip(declared)
            .map(|(&c, &d)| (c - d - anchor).unsigned_abs() as i64)
            .sum();
        if distance as u32 <= slop {
            *total += sloppy_freq_table[distance as usize];
        }
        return;
    }
    for &pos in &candidates[slot_idx] {
        chosen[slot_idx] = pos;
        accumulate(slot_idx + 1, candidates, declared, chosen, slop, sloppy_freq_table, total);
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
        b.add_document(&[("body", &["brown", "quick", "fox"])], Document::new());
        b.add_document(
            &[("body", &["quick", "a", "b", "c", "d", "e", "brown", "fox"])],
            Document::new(),
        );
        b.build()
    }

    fn postings_for(reader: &MemoryIndexReader, term: &str) -> Vec<Box<dyn PostingIterator>> {
        reader.postings("body", term).into_iter().collect()
    }

    #[test]
    fn exact_order_matches_at_zero_distance() {
        let reader = fixture();
        let slots = vec![
            (0, postings_for(&reader, "quick")),
            (1, postings_for(&reader, "brown")),
            (2, postings_for(&reader, "fox")),
        ];
        let mut scorer = SloppyPhraseScorer::new(slots, 0, reader.norms("body"), 1.0, Arc::new(DefaultSimilarity));
        assert!(scorer.next());
        assert_eq!(scorer.doc(), 0);
    }

    #[test]
    fn swapped_terms_need_slop_to_match() {
        let reader = fixture();
        let slots = || {
            vec![
                (0, postings_for(&reader, "quick")),
                (1, postings_for(&reader, "brown")),
                (2, postings_for(&reader, "fox")),
            ]
        };
        let mut strict = SloppyPhraseScorer::new(slots(), 0, reader.norms("body"), 1.0, Arc::new(DefaultSimilarity));
        let mut strict_docs = Vec::new();
        while strict.next() {
            strict_docs.push(strict.doc());
        }
        assert!(!strict_docs.contains(&1));

        let mut loose = SloppyPhraseScorer::new(slots(), 4, reader.norms("body"), 1.0, Arc::new(DefaultSimilarity));
        let mut docs = Vec::new();
        while loose.next() {
            docs.push(loose.doc());
        }
        assert!(docs.contains(&1));
    }

    #[test]
    fn matches_beyond_slop_are_discarded() {
        let reader = fixture();
        let slots = vec![
            (0, postings_for(&reader, "quick")),
            (1, postings_for(&reader, "brown")),
            (2, postings_for(&reader, "fox")),
        ];
        let mut scorer = SloppyPhraseScorer::new(slots, 2, reader.norms("body"), 1.0, Arc::new(DefaultSimilarity));
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert!(!docs.contains(&2));
    }

    #[test]
    fn two_occurrences_in_one_doc_score_higher_than_one() {
        let mut single_b = MemoryIndexReader::builder();
        single_b.add_document(&[("body", &["quick", "brown", "fox"])], Document::new());
        let single_reader = single_b.build();

        let mut double_b = MemoryIndexReader::builder();
        double_b.add_document(&[("body", &["quick", "brown", "fox", "quick", "brown", "fox"])], Document::new());
        let double_reader = double_b.build();

        let slots = |reader: &MemoryIndexReader| {
            vec![
                (0, postings_for(reader, "quick")),
                (1, postings_for(reader, "brown")),
                (2, postings_for(reader, "fox")),
            ]
        };

        // Norms are passed as None so the comparison isolates the effect of
        // the accumulated frequency, not the length-norm penalty.
        let mut single = SloppyPhraseScorer::new(slots(&single_reader), 0, None, 1.0, Arc::new(DefaultSimilarity));
        assert!(single.next() && single.doc() == 0);
        let single_score = single.score();

        let mut double = SloppyPhraseScorer::new(slots(&double_reader), 0, None, 1.0, Arc::new(DefaultSimilarity));
        assert!(double.next() && double.doc() == 0);
        let double_score = double.score();

        assert!(double_score > single_score, "double={double_score} single={single_score}");
    }
}
