//! Turns a (rewritten) query into a `Weight`: the per-searcher scalar
//! computation (idf, boost, query norm) that in turn produces a `Scorer`
//! per reader. Mirrors the classic two-phase Lucene `Query` -> `Weight`
//! -> `Scorer` pipeline.

use std::sync::Arc;

use crate::error::Result;
use crate::explain::Explanation;
use crate::query::{Occur, Query};
use crate::reader::IndexReader;
use crate::rewrite;
use crate::scorer::{AllDocsScorer, BooleanScorer, ConstantScorer, PhraseScorer, Scorer, SloppyPhraseScorer, TermScorer};
use crate::similarity::Similarity;

/// Computes scalar weighting once per (query, searcher) pair, then
/// produces scorers and explanations against individual readers.
pub trait Weight: Send {
    /// The squared weight contributed to the enclosing query's norm.
    fn sum_of_squared_weights(&self) -> f32;

    /// Folds the overall query norm into this weight's scoring value.
    fn normalize(&mut self, query_norm: f32);

    /// Builds a scorer against `reader`, or `None` if nothing in `reader`
    /// can possibly match.
    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>>;

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation>;
}

/// Rewrites `query` to its terminal form and builds the matching `Weight`
/// tree against `reader`, using `similarity` for every scoring formula.
pub fn create_weight(query: &Query, reader: &dyn IndexReader, similarity: Arc<dyn Similarity>) -> Result<Box<dyn Weight>> {
    let rewritten = rewrite::rewrite(query, reader);
    Ok(build_weight(&rewritten, reader, similarity))
}

fn build_weight(query: &Query, reader: &dyn IndexReader, similarity: Arc<dyn Similarity>) -> Box<dyn Weight> {
    match query {
        Query::Term { field, text, boost } => {
            let doc_freq = reader.doc_freq(field, text);
            let idf = similarity.idf(doc_freq, reader.max_doc());
            Box::new(TermWeight {
                field: field.clone(),
                text: text.clone(),
                boost: boost.value(),
                idf,
                query_norm: 1.0,
                value: 0.0,
                similarity,
            })
        }
        Query::Boolean {
            clauses,
            coord_disabled,
            boost,
        } => {
            let children = clauses
                .iter()
                .map(|c| (build_weight(&c.query, reader, similarity.clone()), c.occur))
                .collect();
            Box::new(BooleanWeight {
                clauses: children,
                coord_disabled: *coord_disabled,
                boost: boost.value(),
                similarity,
            })
        }
        Query::Phrase {
            field,
            positions,
            slop,
            boost,
        } => {
            let mut idf_sum = 0.0f32;
            for slot in positions {
                for term in &slot.terms {
                    idf_sum += similarity.idf(reader.doc_freq(field, term), reader.max_doc());
                }
            }
            Box::new(PhraseWeight {
                field: field.clone(),
                positions: positions.clone(),
                slop: *slop,
                boost: boost.value(),
                idf: idf_sum,
                query_norm: 1.0,
                value: 0.0,
                similarity,
            })
        }
        Query::MultiTerm {
            field, terms, boost, ..
        } => {
            let entries = terms
                .iter()
                .map(|t| {
                    let idf = similarity.idf(reader.doc_freq(field, &t.text), reader.max_doc());
                    (t.text.clone(), t.boost.value(), idf)
                })
                .collect();
            Box::new(MultiTermWeight {
                field: field.clone(),
                entries,
                boost: boost.value(),
                value: 0.0,
                similarity,
            })
        }
        Query::MatchAll { boost } => Box::new(MatchAllWeight {
            boost: boost.value(),
            value: 0.0,
        }),
        Query::ConstantScore { filter, boost } => {
            let filter_weight = build_weight(filter, reader, similarity.clone());
            Box::new(ConstantScoreWeight {
                filter_weight,
                boost: boost.value(),
                value: 0.0,
            })
        }
        Query::Filtered { inner, filter } => {
            let inner_weight = build_weight(inner, reader, similarity.clone());
            let filter_weight = build_weight(filter, reader, similarity);
            Box::new(FilteredWeight {
                inner_weight,
                filter_weight,
            })
        }
        // Prefix/Wildcard/Range/TypedRange never survive rewrite().
        other => unreachable!("query not in terminal form after rewrite: {other:?}"),
    }
}

struct TermWeight {
    field: String,
    text: String,
    boost: f32,
    idf: f32,
    query_norm: f32,
    value: f32,
    similarity: Arc<dyn Similarity>,
}

impl Weight for TermWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        let w = self.idf * self.boost;
        w * w
    }

    fn normalize(&mut self, query_norm: f32) {
        // value = queryWeight * idf, where queryWeight = idf * boost *
        // queryNorm, so idf is folded in twice: once for the query side of
        // the weight, once for the field side that multiplies tf * norm at
        // scoring time (see explain() for the two halves spelled out).
        self.query_norm = query_norm;
        self.value = self.idf * self.idf * self.boost * query_norm;
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(postings) = reader.postings(&self.field, &self.text) else {
            return Ok(None);
        };
        let norms = reader.norms(&self.field);
        Ok(Some(Box::new(TermScorer::new(
            postings,
            norms,
            self.value,
            self.similarity.as_ref(),
            reader,
        ))))
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let doc_freq = reader.doc_freq(&self.field, &self.text);
        let freq = reader
            .postings(&self.field, &self.text)
            .map(|mut p| if p.skip_to(doc) && p.doc() == doc { p.freq() } else { 0 })
            .unwrap_or(0);
        if freq == 0 {
            return Ok(Explanation::leaf(0.0, format!("{}:{} does not match doc {doc}", self.field, self.text)));
        }
        let tf = self.similarity.tf(freq as f32);
        let norm = reader
            .norms(&self.field)
            .and_then(|n| n.get(doc as usize).copied())
            .map(|b| self.similarity.decode_norm(b))
            .unwrap_or(1.0);
        // score = queryWeight * fieldWeight, where queryWeight is the part
        // that doesn't depend on this doc (idf, boost, queryNorm) and
        // fieldWeight is the part that does (tf, idf again, fieldNorm).
        let query_weight = self.idf * self.boost * self.query_norm;
        let field_weight = tf * self.idf * norm;
        let score = query_weight * field_weight;
        let description = format!("weight({}:{} in {doc}), product of:", self.field, self.text);
        if (query_weight - 1.0).abs() < f32::EPSILON {
            // queryWeight contributes nothing multiplicatively; collapse it
            // out of the tree rather than showing a redundant "* 1" node.
            return Ok(Explanation::combine(
                score,
                description,
                vec![
                    Explanation::leaf(tf, format!("tf(freq={freq})")),
                    Explanation::leaf(self.idf, format!("idf(docFreq={doc_freq})")),
                    Explanation::leaf(norm, "fieldNorm"),
                ],
            ));
        }
        Ok(Explanation::combine(
            score,
            description,
            vec![
                Explanation::combine(
                    query_weight,
                    "queryWeight, product of:",
                    vec![
                        Explanation::leaf(self.idf, format!("idf(docFreq={doc_freq})")),
                        Explanation::leaf(self.boost, "boost"),
                        Explanation::leaf(self.query_norm, "queryNorm"),
                    ],
                ),
                Explanation::combine(
                    field_weight,
                    "fieldWeight, product of:",
                    vec![
                        Explanation::leaf(tf, format!("tf(freq={freq})")),
                        Explanation::leaf(self.idf, format!("idf(docFreq={doc_freq})")),
                        Explanation::leaf(norm, "fieldNorm"),
                    ],
                ),
            ],
        ))
    }
}

struct BooleanWeight {
    clauses: Vec<(Box<dyn Weight>, Occur)>,
    coord_disabled: bool,
    boost: f32,
    similarity: Arc<dyn Similarity>,
}

impl Weight for BooleanWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        let inner: f32 = self
            .clauses
            .iter()
            .filter(|(_, occur)| *occur != Occur::MustNot)
            .map(|(w, _)| w.sum_of_squared_weights())
            .sum();
        inner * self.boost * self.boost
    }

    fn normalize(&mut self, query_norm: f32) {
        for (weight, occur) in &mut self.clauses {
            if *occur != Occur::MustNot {
                weight.normalize(query_norm);
            } else {
                weight.normalize(1.0);
            }
        }
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let mut required = Vec::new();
        let mut optional = Vec::new();
        let mut prohibited = Vec::new();
        for (weight, occur) in &self.clauses {
            let scorer = weight.scorer(reader)?;
            match (occur, scorer) {
                (Occur::Must, Some(s)) => required.push(s),
                (Occur::Must, None) => return Ok(None),
                (Occur::Should, Some(s)) => optional.push(s),
                (Occur::Should, None) => {}
                (Occur::MustNot, Some(s)) => prohibited.push(s),
                (Occur::MustNot, None) => {}
            }
        }
        if required.is_empty() && optional.is_empty() {
            return Ok(None);
        }
        let scorer = BooleanScorer::new(required, optional, prohibited, self.coord_disabled, self.similarity.as_ref());
        Ok(Some(boost_scorer(Box::new(scorer), self.boost)))
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let mut children = Vec::new();
        let mut total = 0.0f32;
        let mut overlap = 0u32;
        for (weight, occur) in &self.clauses {
            if *occur == Occur::MustNot {
                let explanation = weight.explain(reader, doc)?;
                if explanation.value > 0.0 {
                    return Ok(Explanation::combine(
                        0.0,
                        "Boolean query, product of:",
                        vec![Explanation::combine(0.0, "match excluded by prohibited clause:", vec![explanation])],
                    ));
                }
                continue;
            }
            let explanation = weight.explain(reader, doc)?;
            if *occur == Occur::Must && explanation.value == 0.0 {
                return Ok(Explanation::combine(
                    0.0,
                    "Boolean query, product of:",
                    vec![Explanation::combine(0.0, "required clause does not match:", vec![explanation])],
                ));
            }
            if explanation.value > 0.0 {
                total += explanation.value;
                overlap += 1;
            }
            children.push(explanation);
        }
        let max_overlap = self.clauses.iter().filter(|(_, o)| *o != Occur::MustNot).count() as u32;
        let coord = if self.coord_disabled {
            1.0
        } else {
            self.similarity.coord(overlap, max_overlap)
        };
        let score = total * coord * self.boost;
        Ok(Explanation::combine(score, "sum of:", children))
    }
}

struct PhraseWeight {
    field: String,
    positions: Vec<crate::query::PhraseSlot>,
    slop: u32,
    boost: f32,
    idf: f32,
    query_norm: f32,
    value: f32,
    similarity: Arc<dyn Similarity>,
}

impl PhraseWeight {
    fn slot_postings(&self, reader: &dyn IndexReader) -> Option<Vec<(i32, Vec<Box<dyn crate::reader::PostingIterator>>)>> {
        let mut slots = Vec::with_capacity(self.positions.len());
        for slot in &self.positions {
            let postings: Vec<_> = slot
                .terms
                .iter()
                .filter_map(|t| reader.postings(&self.field, t))
                .collect();
            if postings.is_empty() {
                return None;
            }
            slots.push((slot.position, postings));
        }
        Some(slots)
    }
}

impl Weight for PhraseWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        let w = self.idf * self.boost;
        w * w
    }

    fn normalize(&mut self, query_norm: f32) {
        self.query_norm = query_norm;
        self.value = self.idf * self.idf * self.boost * query_norm;
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(slots) = self.slot_postings(reader) else {
            return Ok(None);
        };
        let norms = reader.norms(&self.field);
        if self.slop == 0 {
            Ok(Some(Box::new(PhraseScorer::new(slots, norms, self.value, self.similarity.as_ref()))))
        } else {
            Ok(Some(Box::new(SloppyPhraseScorer::new(
                slots,
                self.slop,
                norms,
                self.value,
                self.similarity.clone(),
            ))))
        }
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let mut scorer = match self.scorer(reader)? {
            Some(s) => s,
            None => return Ok(Explanation::leaf(0.0, "phrase does not match (missing term)")),
        };
        if !scorer.skip_to(doc) || scorer.doc() != doc {
            return Ok(Explanation::leaf(0.0, format!("phrase does not match doc {doc}")));
        }
        let score = scorer.score();
        let query_weight = self.idf * self.boost * self.query_norm;
        let description = format!("weight(phrase {} in {doc}), product of:", self.field);
        if query_weight == 0.0 || (query_weight - 1.0).abs() < f32::EPSILON {
            return Ok(Explanation::combine(
                score,
                description,
                vec![Explanation::leaf(score, "fieldWeight, tf(phraseFreq) * idf * fieldNorm")],
            ));
        }
        let field_weight = score / query_weight;
        Ok(Explanation::combine(
            score,
            description,
            vec![
                Explanation::combine(
                    query_weight,
                    "queryWeight, product of:",
                    vec![
                        Explanation::leaf(self.idf, "idf"),
                        Explanation::leaf(self.boost, "boost"),
                        Explanation::leaf(self.query_norm, "queryNorm"),
                    ],
                ),
                Explanation::leaf(field_weight, "fieldWeight, tf(phraseFreq) * idf * fieldNorm"),
            ],
        ))
    }
}

struct MultiTermWeight {
    field: String,
    /// `(text, entry_boost, idf)` per term.
    entries: Vec<(String, f32, f32)>,
    boost: f32,
    value: f32,
    similarity: Arc<dyn Similarity>,
}

impl Weight for MultiTermWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        let inner: f32 = self.entries.iter().map(|(_, b, idf)| (b * idf).powi(2)).sum();
        inner * self.boost * self.boost
    }

    fn normalize(&mut self, query_norm: f32) {
        self.value = self.boost * query_norm;
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let norms = reader.norms(&self.field);
        let mut optional: Vec<Box<dyn Scorer>> = Vec::new();
        for (text, entry_boost, idf) in &self.entries {
            if let Some(postings) = reader.postings(&self.field, text) {
                let value = idf * idf * entry_boost * self.value;
                optional.push(Box::new(TermScorer::new(postings, norms.clone(), value, self.similarity.as_ref(), reader)));
            }
        }
        if optional.is_empty() {
            return Ok(None);
        }
        Ok(Some(Box::new(BooleanScorer::new(vec![], optional, vec![], true, self.similarity.as_ref()))))
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let mut scorer = match self.scorer(reader)? {
            Some(s) => s,
            None => return Ok(Explanation::leaf(0.0, "no term in this set occurs in the index")),
        };
        if !scorer.skip_to(doc) || scorer.doc() != doc {
            return Ok(Explanation::leaf(0.0, format!("multi-term set does not match doc {doc}")));
        }
        Ok(Explanation::leaf(scorer.score(), format!("{} multi-term match", self.field)))
    }
}

struct MatchAllWeight {
    boost: f32,
    value: f32,
}

impl Weight for MatchAllWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        self.boost * self.boost
    }

    fn normalize(&mut self, query_norm: f32) {
        self.value = self.boost * query_norm;
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let deleted: std::collections::HashSet<u32> = if reader.has_deletions() {
            (0..reader.max_doc()).filter(|d| reader.is_deleted(*d)).collect()
        } else {
            std::collections::HashSet::new()
        };
        let all = AllDocsScorer::new(reader.max_doc(), Box::new(move |d| deleted.contains(&d)));
        Ok(Some(Box::new(ConstantScorer::new(Box::new(all), self.value))))
    }

    fn explain(&self, _reader: &dyn IndexReader, _doc: u32) -> Result<Explanation> {
        Ok(Explanation::leaf(self.value, "MatchAllQuery, product of boost and query norm"))
    }
}

struct ConstantScoreWeight {
    filter_weight: Box<dyn Weight>,
    boost: f32,
    value: f32,
}

impl Weight for ConstantScoreWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        self.boost * self.boost
    }

    fn normalize(&mut self, query_norm: f32) {
        self.value = self.boost * query_norm;
        self.filter_weight.normalize(1.0);
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let Some(inner) = self.filter_weight.scorer(reader)? else {
            return Ok(None);
        };
        Ok(Some(Box::new(ConstantScorer::new(inner, self.value))))
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let matches = self
            .filter_weight
            .scorer(reader)?
            .map(|mut s| s.skip_to(doc) && s.doc() == doc)
            .unwrap_or(false);
        if matches {
            Ok(Explanation::leaf(self.value, "ConstantScore, product of boost and query norm"))
        } else {
            Ok(Explanation::leaf(0.0, format!("filter does not match doc {doc}")))
        }
    }
}

struct FilteredWeight {
    inner_weight: Box<dyn Weight>,
    filter_weight: Box<dyn Weight>,
}

impl Weight for FilteredWeight {
    fn sum_of_squared_weights(&self) -> f32 {
        self.inner_weight.sum_of_squared_weights()
    }

    fn normalize(&mut self, query_norm: f32) {
        self.inner_weight.normalize(query_norm);
        self.filter_weight.normalize(1.0);
    }

    fn scorer(&self, reader: &dyn IndexReader) -> Result<Option<Box<dyn Scorer>>> {
        let (Some(inner), Some(filter)) = (self.inner_weight.scorer(reader)?, self.filter_weight.scorer(reader)?) else {
            return Ok(None);
        };
        Ok(Some(Box::new(FilteredScorer { inner, filter })))
    }

    fn explain(&self, reader: &dyn IndexReader, doc: u32) -> Result<Explanation> {
        let passes_filter = self
            .filter_weight
            .scorer(reader)?
            .map(|mut s| s.skip_to(doc) && s.doc() == doc)
            .unwrap_or(false);
        if !passes_filter {
            return Ok(Explanation::leaf(0.0, format!("filter does not match doc {doc}")));
        }
        self.inner_weight.explain(reader, doc)
    }
}

/// Conjunction of an inner scorer and a filter scorer, scoring by `inner`
/// alone (the filter only gates which docs are visited).
struct FilteredScorer {
    inner: Box<dyn Scorer>,
    filter: Box<dyn Scorer>,
}

impl FilteredScorer {
    fn advance(&mut self, mut from: u32) -> bool {
        loop {
            if !self.inner.skip_to(from) {
                return false;
            }
            let candidate = self.inner.doc();
            if !self.filter.skip_to(candidate) {
                return false;
            }
            if self.filter.doc() == candidate {
                return true;
            }
            from = self.filter.doc();
        }
    }
}

impl Scorer for FilteredScorer {
    fn doc(&self) -> u32 {
        self.inner.doc()
    }

    fn score(&self) -> f32 {
        self.inner.score()
    }

    fn next(&mut self) -> bool {
        self.advance(self.inner.doc().wrapping_add(1))
    }

    fn skip_to(&mut self, target: u32) -> bool {
        self.advance(target)
    }
}

/// Scales an inner scorer's reported score by a fixed factor, used to
/// apply a Boolean query's own boost on top of its clauses' scores.
struct BoostScorer {
    inner: Box<dyn Scorer>,
    factor: f32,
}

impl Scorer for BoostScorer {
    fn doc(&self) -> u32 {
        self.inner.doc()
    }

    fn score(&self) -> f32 {
        self.inner.score() * self.factor
    }

    fn next(&mut self) -> bool {
        self.inner.next()
    }

    fn skip_to(&mut self, target: u32) -> bool {
        self.inner.skip_to(target)
    }
}

fn boost_scorer(inner: Box<dyn Scorer>, factor: f32) -> Box<dyn Scorer> {
    if factor == 1.0 {
        inner
    } else {
        Box::new(BoostScorer { inner, factor })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::reader::MemoryIndexReader;
    use crate::similarity::DefaultSimilarity;

    fn fixture() -> MemoryIndexReader {
        let mut b = MemoryIndexReader::builder();
        b.add_document(&[("body", &["quick", "fox"])], Document::new());
        b.add_document(&[("body", &["quick", "dog"])], Document::new());
        b.add_document(&[("body", &["fox", "dog"])], Document::new());
        b.build()
    }

    #[test]
    fn term_weight_scores_all_matching_docs() {
        let reader = fixture();
        let q = Query::Term {
            field: "body".into(),
            text: "fox".into(),
            boost: crate::term::Boost::DEFAULT,
        };
        let mut weight = create_weight(&q, &reader, Arc::new(DefaultSimilarity)).unwrap();
        weight.normalize(1.0);
        let mut scorer = weight.scorer(&reader).unwrap().unwrap();
        let mut docs = Vec::new();
        while scorer.next() {
            docs.push(scorer.doc());
        }
        assert_eq!(docs, vec![0, 2]);
    }

    #[test]
    fn boolean_weight_with_required_clause_limits_matches() {
        let reader = fixture();
        let q = crate::query::BooleanBuilder::new()
            .must(Query::Term {
                field: "body".into(),
                text: "quick".into(),
                boost: crate::term::Boost::DEFAULT,
            })
            .must(Query::Term {
                field: "body".into(),
                text: "fox".into(),
                boost: crate::term::Boost::DEFAULT,
            })
            .build();
        let mut weight = create_weight(&q, &reader, Arc::new(DefaultSimilarity)).unwrap();
        weight.normalize(1.0);
        let mut scorer = weight.scorer(&reader).unwrap().unwrap();
        assert!(scorer.next());
        assert_eq!(scorer.doc(), 0);
        assert!(!scorer.next());
    }

    #[test]
    fn match_all_weight_visits_every_doc() {
        let reader = fixture();
        let q = Query::MatchAll { boost: crate::term::Boost::DEFAULT };
        let mut weight = create_weight(&q, &reader, Arc::new(DefaultSimilarity)).unwrap();
        weight.normalize(1.0);
        let mut scorer = weight.scorer(&reader).unwrap().unwrap();
        let mut count = 0;
        while scorer.next() {
            count += 1;
        }
        assert_eq!(count, 3);
    }

    #[test]
    fn missing_term_yields_no_scorer() {
        let reader = fixture();
        let q = Query::Term {
            field: "body".into(),
            text: "zzz".into(),
            boost: crate::term::Boost::DEFAULT,
        };
        let mut weight = create_weight(&q, &reader, Arc::new(DefaultSimilarity)).unwrap();
        weight.normalize(1.0);
        assert!(weight.scorer(&reader).unwrap().is_none());
    }
}
