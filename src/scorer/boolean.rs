//! Boolean scorer: conjunctive/disjunctive composition over sub-scorers,
//! with prohibited-clause masking and a coord factor.

use super::{Scorer, NO_MORE_DOCS};
use crate::similarity::Similarity;

struct SubScorer {
    scorer: Box<dyn Scorer>,
    exhausted: bool,
}

impl SubScorer {
    fn new(mut scorer: Box<dyn Scorer>) -> Self {
        let exhausted = !scorer.next();
        SubScorer { scorer, exhausted }
    }

    fn advance_to(&mut self, target: u32) {
        if !self.exhausted && self.scorer.doc() < target {
            self.exhausted = !self.scorer.skip_to(target);
        }
    }

    fn doc(&self) -> u32 {
        if self.exhausted {
            NO_MORE_DOCS
        } else {
            self.scorer.doc()
        }
    }
}

/// Scores a Boolean query over required, optional, and prohibited
/// sub-scorers. See the component design for the exact composition rules.
pub struct BooleanScorer {
    required: Vec<SubScorer>,
    optional: Vec<SubScorer>,
    prohibited: Vec<SubScorer>,
    coord_disabled: bool,
    max_overlap: u32,
    coord_table: Vec<f32>,
    current_doc: Option<u32>,
    current_score: f32,
}

impl BooleanScorer {
    pub fn new(
        required: Vec<Box<dyn Scorer>>,
        optional: Vec<Box<dyn Scorer>>,
        prohibited: Vec<Box<dyn Scorer>>,
        coord_disabled: bool,
        similarity: &dyn Similarity,
    ) -> Self {
        let max_overlap = (required.len() + optional.len()) as u32;
        let coord_table = (0..=max_overlap)
            .map(|overlap| similarity.coord(overlap, max_overlap))
            .collect();
        BooleanScorer {
            required: required.into_iter().map(SubScorer::new).collect(),
            optional: optional.into_iter().map(SubScorer::new).collect(),
            prohibited: prohibited.into_iter().map(SubScorer::new).collect(),
            coord_disabled,
            max_overlap,
            coord_table,
            current_doc: None,
            current_score: 0.0,
        }
    }

    fn coord(&self, overlap: u32) -> f32 {
        if self.coord_disabled {
            1.0
        } else {
            self.coord_table[overlap as usize]
        }
    }

    fn is_prohibited(&mut self, doc: u32) -> bool {
        self.prohibited.iter_mut().any(|p| {
            p.advance_to(doc);
            p.doc() == doc
        })
    }

    /// Finds the next doc >= `from` satisfying the conjunction of required
    /// clauses (or, if there are none, any optional clause), not masked by
    /// a prohibited clause, and settles `current_doc`/`current_score`.
    fn advance(&mut self, mut from: u32) -> bool {
        loop {
            let candidate = if self.required.is_empty() {
                self.next_disjunctive_candidate(from)
            } else {
                self.next_conjunctive_candidate(from)
            };
            let Some(candidate) = candidate else {
                self.current_doc = None;
                return false;
            };
            if self.is_prohibited(candidate) {
                from = candidate + 1;
                continue;
            }
            self.settle(candidate);
            return true;
        }
    }

    fn next_conjunctive_candidate(&mut self, mut from: u32) -> Option<u32> {
        'outer: loop {
            let mut max_doc = from;
            for req in &mut self.required {
                req.advance_to(max_doc);
                if req.doc() == NO_MORE_DOCS {
                    return None;
                }
                if req.doc() > max_doc {
                    max_doc = req.doc();
                }
            }
            for req in &mut self.required {
                if req.doc() != max_doc {
                    from = max_doc;
                    continue 'outer;
                }
            }
            return Some(max_doc);
        }
    }

    fn next_disjunctive_candidate(&mut self, from: u32) -> Option<u32> {
        let mut min_doc = NO_MORE_DOCS;
        for opt in &mut self.optional {
            opt.advance_to(from);
            if opt.doc() < min_doc {
                min_doc = opt.doc();
            }
        }
        if min_doc == NO_MORE_DOCS {
            None
        } else {
            Some(min_doc)
        }
    }

    fn settle(&mut self, doc: u32) {
        let mut score = 0.0f32;
        let mut overlap = 0u32;
        for req in &mut self.required {
            score += req.scorer.score();
            overlap += 1;
        }
        for opt in &mut self.optional {
            opt.advance_to(doc);
            if opt.doc() == doc {
                score += opt.scorer.score();
                overlap += 1;
            }
        }
        self.current_doc = Some(doc);
        self.current_score = score * self.coord(overlap.min(self.max_overlap));
    }
}

impl Scorer for BooleanScorer {
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
    use crate::scorer::TermScorer;
    use crate::similarity::DefaultSimilarity;

    fn fixture() -> MemoryIndexReader {
        let mut b = MemoryIndexReader::builder();
        b.add_document(&[("body", &["quick", "fox"])], Document::new());
        b.add_document(&[("body", &["quick", "dog"])], Document::new());
        b.add_document(&[("body", &["fox", "dog"])], Document::new());
        b.build()
    }

    fn term_scorer(reader: &MemoryIndexReader, text: &str) -> Box<dyn Scorer> {
        let sim = DefaultSimilarity;
        let postings = reader.postings("body", text).unwrap();
        let norms = reader.norms("body");
        Box::new(TermScorer::new(postings, norms, 1.0, &sim, reader))
    }

    #[test]
    fn conjunction_requires_all_required_clauses() {
        let reader = fixture();
        let required = vec![term_scorer(&reader, "quick"), term_scorer(&reader, "fox")];
        let mut scorer = BooleanScorer::new(required, vec![], vec![], false, &DefaultSimilarity);
        assert!(scorer.next());
        assert_eq!(scorer.doc(), 0);
        assert!(!scorer.next());
    }

    #[test]
    fn disjunction_matches_any_optional_clause() {
        let reader = fixture();
        let optional = vec![term_scorer(&reader, "quick"), term_scorer(&reader, "fox")];
        let mut scorer = BooleanScorer::new(vec![], optional, vec![], false, &DefaultSimilarity);
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0, 1, 2]);
    }

    #[test]
    fn prohibited_clause_masks_matches() {
        let reader = fixture();
        let optional = vec![term_scorer(&reader, "quick"), term_scorer(&reader, "fox")];
        let prohibited = vec![term_scorer(&reader, "dog")];
        let mut scorer =
            BooleanScorer::new(vec![], optional, prohibited, false, &DefaultSimilarity);
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0]);
    }

    #[test]
    fn skip_to_lands_on_first_match_at_or_after_target() {
        let reader = fixture();
        let optional = vec![term_scorer(&reader, "quick"), term_scorer(&reader, "fox")];
        let mut scorer = BooleanScorer::new(vec![], optional, vec![], false, &DefaultSimilarity);
        assert!(scorer.skip_to(1));
        assert_eq!(scorer.doc(), 1);
    }
}
