//! # ferret-core
//!
//! The query evaluation core of a Lucene-style full-text search engine:
//! a query AST, tf-idf/cosine-normalized scoring, ranked top-k search, and
//! human-readable score explanations, evaluated over an already-built
//! inverted index exposed through the `IndexReader` trait.
//!
//! Index construction, tokenization/analysis, the query-string parser, and
//! network/CLI glue all live outside this crate; it only consumes a
//! finished index and answers queries against it.

mod document;
mod error;
mod explain;
mod filter;
mod hitqueue;
mod multi_searcher;
mod query;
mod reader;
mod rewrite;
mod scorer;
mod searcher;
mod similarity;
mod sort;
mod term;
mod weight;
mod wildcard;

pub use document::{Document, FieldValue};
pub use error::{FerretError, Result};
pub use explain::Explanation;
pub use filter::{BitSetFilter, Filter, PostFilter, QueryFilter};
pub use hitqueue::{Hit, TopDocs};
pub use multi_searcher::MultiSearcher;
pub use query::{BooleanBuilder, BooleanClause, MultiTermBuilder, MultiTermEntry, Occur, PhraseBuilder, PhraseSlot, Query};
pub use reader::{IndexReader, MemoryIndexReader, MemoryIndexReaderBuilder, PostingIterator, TermsEnum};
pub use rewrite::rewrite;
pub use scorer::Scorer;
pub use searcher::{SearchContext, Searcher, SearcherConfig};
pub use similarity::{DefaultSimilarity, Similarity};
pub use sort::{Sort, SortField};
pub use term::{Boost, Term};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
