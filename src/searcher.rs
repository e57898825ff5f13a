//! The top-level entry point: runs a query against one `IndexReader` and
//! collects ranked hits, unscored doc ids, or a score explanation.

use std::sync::Arc;

use log::{debug, trace};

use crate::error::Result;
use crate::explain::Explanation;
use crate::filter::{Filter, PostFilter};
use crate::hitqueue::{Hit, HitQueue, TopDocs};
use crate::query::Query;
use crate::reader::IndexReader;
use crate::rewrite;
use crate::similarity::{DefaultSimilarity, Similarity};
use crate::sort::Sort;
use crate::weight::create_weight;

/// Tunables that don't belong on every call site.
#[derive(Debug, Clone)]
pub struct SearcherConfig {
    /// Hard cap on how many hits a single `search` call will collect,
    /// independent of the caller-requested `num_docs`, as a guard against
    /// accidentally unbounded result sets.
    pub max_hits: usize,
}

impl Default for SearcherConfig {
    fn default() -> Self {
        SearcherConfig { max_hits: 10_000 }
    }
}

/// Per-call context handed to `search_each`'s callback and to
/// `post_filter`, giving access to the reader a hit was found against
/// without each caller having to capture it separately.
pub struct SearchContext<'a> {
    pub reader: &'a dyn IndexReader,
}

/// Searches a single `IndexReader` with an explicit `Similarity`.
pub struct Searcher<R: IndexReader> {
    reader: R,
    similarity: Arc<dyn Similarity>,
    config: SearcherConfig,
}

impl<R: IndexReader> Searcher<R> {
    pub fn new(reader: R) -> Self {
        Searcher {
            reader,
            similarity: Arc::new(DefaultSimilarity),
            config: SearcherConfig::default(),
        }
    }

    pub fn with_similarity(mut self, similarity: Arc<dyn Similarity>) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn with_config(mut self, config: SearcherConfig) -> Self {
        self.config = config;
        self
    }

    pub fn reader(&self) -> &R {
        &self.reader
    }

    pub fn max_doc(&self) -> u32 {
        self.reader.max_doc()
    }

    pub fn doc_freq(&self, field: &str, text: &str) -> u32 {
        self.reader.doc_freq(field, text)
    }

    pub fn get_doc(&self, doc: u32) -> Option<crate::document::Document> {
        self.reader.document(doc)
    }

    pub fn rewrite(&self, query: &Query) -> Query {
        rewrite::rewrite(query, &self.reader)
    }

    /// Runs `query`, returning at most `num_docs` hits starting at
    /// `first_doc`, optionally restricted to docs an external `filter`
    /// and `post_filter` accept and ordered by `sort` (relevance order
    /// when `None`).
    ///
    /// When `sort` is supplied, truncating to a score-bounded top-k before
    /// re-sorting would drop docs the sort comparator would have ranked
    /// ahead of the survivors, so matches are fully accumulated (capped
    /// only by `max_hits`) before the requested page is sliced off.
    pub fn search(
        &self,
        query: &Query,
        first_doc: usize,
        num_docs: usize,
        filter: Option<&dyn Filter>,
        sort: Option<&Sort>,
        post_filter: Option<&dyn PostFilter>,
    ) -> Result<TopDocs> {
        debug!("searching {}", query.to_pretty_string());
        if let Some(sort) = sort {
            let mut hits = Vec::new();
            let mut total_hits = 0u64;
            let mut max_score = f32::NEG_INFINITY;
            self.search_each(query, filter, post_filter, |doc, score, _ctx| {
                total_hits += 1;
                if score > max_score {
                    max_score = score;
                }
                if hits.len() < self.config.max_hits {
                    hits.push(Hit { doc, score });
                }
            })?;
            hits.sort_by(|a, b| sort.compare(&self.reader, (a.doc, a.score), (b.doc, b.score)));
            let hits = hits.into_iter().skip(first_doc).take(num_docs).collect();
            let max_score = if total_hits == 0 { 0.0 } else { max_score };
            return Ok(TopDocs { total_hits, max_score, hits });
        }
        let capacity = (first_doc + num_docs).min(self.config.max_hits);
        let mut queue = HitQueue::new(capacity.max(1));
        self.search_each(query, filter, post_filter, |doc, score, _ctx| {
            queue.offer(Hit { doc, score });
        })?;
        let mut top = queue.into_top_docs(first_doc);
        top.hits.truncate(num_docs);
        Ok(top)
    }

    /// Invokes `collect(doc, score, ctx)` for every matching, non-deleted,
    /// filter- and post-filter-accepted doc, in ascending doc order.
    /// `post_filter` runs after `filter`, once a score is available, for
    /// checks that need the score rather than just the doc id.
    pub fn search_each(
        &self,
        query: &Query,
        filter: Option<&dyn Filter>,
        post_filter: Option<&dyn PostFilter>,
        mut collect: impl FnMut(u32, f32, &SearchContext),
    ) -> Result<()> {
        let mut weight = create_weight(query, &self.reader, self.similarity.clone())?;
        let query_norm = self.similarity.query_norm(weight.sum_of_squared_weights());
        weight.normalize(query_norm);
        let Some(mut scorer) = weight.scorer(&self.reader)? else {
            return Ok(());
        };
        let ctx = SearchContext { reader: &self.reader };
        while scorer.next() {
            let doc = scorer.doc();
            if self.reader.is_deleted(doc) {
                continue;
            }
            if let Some(filter) = filter {
                if !filter.matches(&self.reader, doc) {
                    continue;
                }
            }
            let score = scorer.score();
            if let Some(post_filter) = post_filter {
                if !post_filter.accepts(&ctx, doc, score) {
                    continue;
                }
            }
            trace!("doc {doc} scored {score}");
            collect(doc, score, &ctx);
        }
        Ok(())
    }

    /// Writes up to `buf.len()` matching doc ids (no scoring) into `buf`,
    /// starting at `offset`, for callers that only need membership.
    pub fn search_unscored(&self, query: &Query, buf: &mut [u32], offset: usize) -> Result<usize> {
        let mut weight = create_weight(query, &self.reader, self.similarity.clone())?;
        weight.normalize(1.0);
        let Some(mut scorer) = weight.scorer(&self.reader)? else {
            return Ok(0);
        };
        let mut seen = 0usize;
        let mut written = 0usize;
        while written < buf.len() && scorer.next() {
            let doc = scorer.doc();
            if self.reader.is_deleted(doc) {
                continue;
            }
            if seen >= offset {
                buf[written] = doc;
                written += 1;
            }
            seen += 1;
        }
        Ok(written)
    }

    pub fn explain(&self, query: &Query, doc: u32) -> Result<Explanation> {
        let mut weight = create_weight(query, &self.reader, self.similarity.clone())?;
        let query_norm = self.similarity.query_norm(weight.sum_of_squared_weights());
        weight.normalize(query_norm);
        weight.explain(&self.reader, doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::query::{BooleanBuilder, PhraseBuilder};
    use crate::reader::MemoryIndexReader;
    use crate::term::Boost;

    fn fixture() -> MemoryIndexReader {
        let mut b = MemoryIndexReader::builder();
        b.add_document(&[("body", &["quick", "brown", "fox"])], Document::new().with_field("id", "a"));
        b.add_document(&[("body", &["quick", "quick", "dog"])], Document::new().with_field("id", "b"));
        b.add_document(&[("body", &["lazy", "dog"])], Document::new().with_field("id", "c"));
        b.build()
    }

    fn term(text: &str) -> Query {
        Query::Term {
            field: "body".into(),
            text: text.into(),
            boost: Boost::DEFAULT,
        }
    }

    #[test]
    fn ranks_higher_frequency_doc_first() {
        let searcher = Searcher::new(fixture());
        let top = searcher.search(&term("quick"), 0, 10, None, None, None).unwrap();
        assert_eq!(top.total_hits, 2);
        assert_eq!(top.hits[0].doc, 1);
        assert_eq!(top.hits[1].doc, 0);
    }

    #[test]
    fn boolean_must_not_excludes_matches() {
        let searcher = Searcher::new(fixture());
        let q = BooleanBuilder::new().must(term("dog")).must_not(term("lazy")).build();
        let top = searcher.search(&q, 0, 10, None, None, None).unwrap();
        assert_eq!(top.hits.len(), 1);
        assert_eq!(top.hits[0].doc, 1);
    }

    #[test]
    fn phrase_query_matches_exact_order_only() {
        let searcher = Searcher::new(fixture());
        let q = PhraseBuilder::new("body").add("quick").add("brown").build().unwrap();
        let top = searcher.search(&q, 0, 10, None, None, None).unwrap();
        assert_eq!(top.hits.len(), 1);
        assert_eq!(top.hits[0].doc, 0);
    }

    #[test]
    fn paging_respects_first_doc_offset() {
        let searcher = Searcher::new(fixture());
        let q = Query::MatchAll { boost: Boost::DEFAULT };
        let top = searcher.search(&q, 1, 10, None, None, None).unwrap();
        assert_eq!(top.hits.len(), 2);
    }

    #[test]
    fn explain_value_matches_search_score() {
        let searcher = Searcher::new(fixture());
        let q = term("quick");
        let top = searcher.search(&q, 0, 10, None, None, None).unwrap();
        let explanation = searcher.explain(&q, top.hits[0].doc).unwrap();
        assert!((explanation.value - top.hits[0].score).abs() < 1e-4);
    }

    #[test]
    fn search_unscored_collects_matching_doc_ids() {
        let searcher = Searcher::new(fixture());
        let mut buf = [0u32; 2];
        let written = searcher.search_unscored(&term("dog"), &mut buf, 0).unwrap();
        assert_eq!(written, 2);
        assert_eq!(&buf[..written], &[1, 2]);
    }
}
