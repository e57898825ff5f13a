//! Runtime doc filtering, orthogonal to the query AST: a `Filter` narrows
//! which docs a search considers without affecting relevance scoring.

use std::collections::HashSet;

use crate::query::Query;
use crate::reader::IndexReader;
use crate::rewrite;
use crate::searcher::SearchContext;
use crate::weight::create_weight;
use crate::similarity::DefaultSimilarity;

/// Something that accepts or rejects individual docs.
pub trait Filter: Send + Sync {
    fn matches(&self, reader: &dyn IndexReader, doc: u32) -> bool;
}

/// Runs after `Filter` and after scoring, for accept decisions that need
/// the doc's score (e.g. a relevance threshold) rather than just its id.
pub trait PostFilter: Send + Sync {
    fn accepts(&self, ctx: &SearchContext, doc: u32, score: f32) -> bool;
}

/// Adapts any `Query` into a `Filter` by running its matcher (ignoring
/// its score) over a reader.
pub struct QueryFilter {
    query: Query,
}

impl QueryFilter {
    pub fn new(query: Query) -> Self {
        QueryFilter { query }
    }
}

impl Filter for QueryFilter {
    fn matches(&self, reader: &dyn IndexReader, doc: u32) -> bool {
        let rewritten = rewrite::rewrite(&self.query, reader);
        let Ok(mut weight) = create_weight(&rewritten, reader, std::sync::Arc::new(DefaultSimilarity)) else {
            return false;
        };
        weight.normalize(1.0);
        match weight.scorer(reader) {
            Ok(Some(mut scorer)) => scorer.skip_to(doc) && scorer.doc() == doc,
            _ => false,
        }
    }
}

/// A filter backed by a precomputed set of accepted doc ids, for callers
/// who already know which docs qualify (e.g. from an external ACL check).
pub struct BitSetFilter {
    accepted: HashSet<u32>,
}

impl BitSetFilter {
    pub fn new(accepted: impl IntoIterator<Item = u32>) -> Self {
        BitSetFilter {
            accepted: accepted.into_iter().collect(),
        }
    }
}

impl Filter for BitSetFilter {
    fn matches(&self, _reader: &dyn IndexReader, doc: u32) -> bool {
        self.accepted.contains(&doc)
    }
}
