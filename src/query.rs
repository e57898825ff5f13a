//! The query AST: an immutable sum type with pretty-printing, equality,
//! and hashing mechanical enough to support fixed-point rewrite.

use crate::error::{FerretError, Result};
use crate::term::Boost;

/// Whether a Boolean clause is required, optional, or prohibited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Occur {
    Must,
    Should,
    MustNot,
}

impl Occur {
    fn prefix(self) -> &'static str {
        match self {
            Occur::Must => "+",
            Occur::Should => "",
            Occur::MustNot => "-",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct BooleanClause {
    pub query: Box<Query>,
    pub occur: Occur,
}

impl BooleanClause {
    pub fn new(query: Query, occur: Occur) -> Self {
        BooleanClause {
            query: Box::new(query),
            occur,
        }
    }
}

/// One phrase slot: a declared relative position and the set of terms
/// that may occupy it (more than one term means a disjunctive slot, i.e.
/// what callers commonly call a "multi-phrase").
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PhraseSlot {
    pub position: i32,
    pub terms: Vec<String>,
}

/// One entry in a `MultiTerm` query's term set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct MultiTermEntry {
    pub text: String,
    pub boost: Boost,
}

/// The query AST. Variants mirror the data model exactly; construction
/// helpers below enforce the invariants (same field across phrase terms,
/// canonical term-set ordering for `MultiTerm`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Query {
    Term {
        field: String,
        text: String,
        boost: Boost,
    },
    Boolean {
        clauses: Vec<BooleanClause>,
        coord_disabled: bool,
        boost: Boost,
    },
    /// A phrase over one or more slots. A slot with a single term and
    /// `slop == 0` is what callers usually mean by "phrase query"; a slot
    /// with multiple terms is what callers usually mean by "multi-phrase".
    Phrase {
        field: String,
        positions: Vec<PhraseSlot>,
        slop: u32,
        boost: Boost,
    },
    Prefix {
        field: String,
        prefix: String,
        boost: Boost,
    },
    Wildcard {
        field: String,
        pattern: String,
        boost: Boost,
    },
    Range {
        field: String,
        lo: Option<String>,
        hi: Option<String>,
        inc_lo: bool,
        inc_hi: bool,
        boost: Boost,
    },
    TypedRange {
        field: String,
        lo: Option<String>,
        hi: Option<String>,
        inc_lo: bool,
        inc_hi: bool,
        boost: Boost,
    },
    MultiTerm {
        field: String,
        terms: Vec<MultiTermEntry>,
        max_terms: usize,
        min_score: Boost,
        boost: Boost,
    },
    MatchAll {
        boost: Boost,
    },
    /// Scores every matching doc at `boost`, ignoring the inner query's
    /// own scoring; the inner query's matcher is used purely as a filter.
    ConstantScore {
        filter: Box<Query>,
        boost: Boost,
    },
    /// Scores `inner` normally but restricts matches to docs `filter` also
    /// matches.
    Filtered {
        inner: Box<Query>,
        filter: Box<Query>,
    },
}

impl Query {
    pub fn boost(&self) -> f32 {
        match self {
            Query::Term { boost, .. }
            | Query::Boolean { boost, .. }
            | Query::Phrase { boost, .. }
            | Query::Prefix { boost, .. }
            | Query::Wildcard { boost, .. }
            | Query::Range { boost, .. }
            | Query::TypedRange { boost, .. }
            | Query::MultiTerm { boost, .. }
            | Query::MatchAll { boost } => boost.value(),
            Query::ConstantScore { boost, .. } => boost.value(),
            Query::Filtered { inner, .. } => inner.boost(),
        }
    }

    pub fn with_boost(mut self, boost: f32) -> Self {
        match &mut self {
            Query::Term { boost: b, .. }
            | Query::Boolean { boost: b, .. }
            | Query::Phrase { boost: b, .. }
            | Query::Prefix { boost: b, .. }
            | Query::Wildcard { boost: b, .. }
            | Query::Range { boost: b, .. }
            | Query::TypedRange { boost: b, .. }
            | Query::MultiTerm { boost: b, .. }
            | Query::MatchAll { boost: b } => *b = Boost(boost),
            Query::ConstantScore { boost: b, .. } => *b = Boost(boost),
            Query::Filtered { inner, .. } => {
                let replaced = std::mem::replace(inner.as_mut(), Query::MatchAll { boost: Boost::DEFAULT });
                *inner = Box::new(replaced.with_boost(boost));
            }
        }
        self
    }

    /// Pretty-prints per the grammar: `field:text[^boost]` for terms,
    /// `field:"t1 t2"[~slop][^boost]` for phrases (with `<>` for gaps and
    /// `|`/`&` for slot alternatives/additions), `+`/`-`/nothing-prefixed
    /// space-separated clauses for Boolean, `field:prefix*` for Prefix,
    /// `field:pattern` for Wildcard, `field:[lo lo_incl..hi hi_incl]` for
    /// ranges, and `field:"t1|t2[^b]|t3"[^boost]` for MultiTerm.
    pub fn to_pretty_string(&self) -> String {
        let boost_suffix = |b: f32| if b == 1.0 { String::new() } else { format!("^{b}") };
        match self {
            Query::Term { field, text, boost } => {
                format!("{field}:{text}{}", boost_suffix(boost.value()))
            }
            Query::Boolean {
                clauses,
                boost,
                ..
            } => {
                let body = clauses
                    .iter()
                    .map(|c| format!("{}{}", c.occur.prefix(), c.query.to_pretty_string()))
                    .collect::<Vec<_>>()
                    .join(" ");
                format!("({body}){}", boost_suffix(boost.value()))
            }
            Query::Phrase {
                field,
                positions,
                slop,
                boost,
            } => {
                let mut slots_text = Vec::new();
                let mut expected_pos = positions.first().map(|s| s.position).unwrap_or(0);
                for slot in positions {
                    while expected_pos < slot.position {
                        slots_text.push("<>".to_string());
                        expected_pos += 1;
                    }
                    slots_text.push(slot.terms.join("|"));
                    expected_pos = slot.position + 1;
                }
                let slop_suffix = if *slop == 0 {
                    String::new()
                } else {
                    format!("~{slop}")
                };
                format!(
                    "{field}:\"{}\"{slop_suffix}{}",
                    slots_text.join(" "),
                    boost_suffix(boost.value())
                )
            }
            Query::Prefix { field, prefix, boost } => {
                format!("{field}:{prefix}*{}", boost_suffix(boost.value()))
            }
            Query::Wildcard { field, pattern, boost } => {
                format!("{field}:{pattern}{}", boost_suffix(boost.value()))
            }
            Query::Range {
                field,
                lo,
                hi,
                inc_lo,
                inc_hi,
                boost,
            }
            | Query::TypedRange {
                field,
                lo,
                hi,
                inc_lo,
                inc_hi,
                boost,
            } => {
                format!(
                    "{field}:[{} {}..{} {}]{}",
                    lo.as_deref().unwrap_or("*"),
                    inc_lo,
                    hi.as_deref().unwrap_or("*"),
                    inc_hi,
                    boost_suffix(boost.value())
                )
            }
            Query::MultiTerm {
                field,
                terms,
                boost,
                ..
            } => {
                let mut sorted = terms.clone();
                sorted.sort_by(|a, b| {
                    b.boost
                        .value()
                        .partial_cmp(&a.boost.value())
                        .unwrap_or(std::cmp::Ordering::Equal)
                        .then_with(|| a.text.cmp(&b.text))
                });
                let body = sorted
                    .iter()
                    .map(|t| {
                        if t.boost.value() == 1.0 {
                            t.text.clone()
                        } else {
                            format!("{}^{}", t.text, t.boost.value())
                        }
                    })
                    .collect::<Vec<_>>()
                    .join("|");
                format!("{field}:\"{body}\"{}", boost_suffix(boost.value()))
            }
            Query::MatchAll { boost } => format!("*:*{}", boost_suffix(boost.value())),
            Query::ConstantScore { filter, boost } => {
                format!(
                    "ConstantScore({}){}",
                    filter.to_pretty_string(),
                    boost_suffix(boost.value())
                )
            }
            Query::Filtered { inner, filter } => {
                format!(
                    "Filtered({}, {})",
                    inner.to_pretty_string(),
                    filter.to_pretty_string()
                )
            }
        }
    }
}

/// Builds a `Phrase` query slot by slot, enforcing a single shared field.
pub struct PhraseBuilder {
    field: String,
    positions: Vec<PhraseSlot>,
    last_pos: i32,
    slop: u32,
    boost: f32,
}

impl PhraseBuilder {
    pub fn new(field: impl Into<String>) -> Self {
        PhraseBuilder {
            field: field.into(),
            positions: Vec::new(),
            last_pos: -1,
            slop: 0,
            boost: 1.0,
        }
    }

    /// Appends a single term at `last_pos + 1`.
    pub fn add(mut self, term: impl Into<String>) -> Self {
        let pos = self.last_pos + 1;
        self.add_slot(pos, vec![term.into()])
    }

    /// Appends a disjunctive slot (multiple alternative terms) at
    /// `last_pos + 1`.
    pub fn add_alternatives(self, terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let pos = self.last_pos + 1;
        let terms = terms.into_iter().map(Into::into).collect();
        self.add_slot(pos, terms)
    }

    /// Appends (or merges into an existing) slot at an explicit position,
    /// so callers can express a gap by passing a later position than
    /// `last_pos + 1`.
    pub fn add_at(self, position: i32, terms: impl IntoIterator<Item = impl Into<String>>) -> Self {
        let terms = terms.into_iter().map(Into::into).collect();
        self.add_slot(position, terms)
    }

    fn add_slot(mut self, position: i32, mut terms: Vec<String>) -> Self {
        if let Some(existing) = self.positions.iter_mut().find(|s| s.position == position) {
            existing.terms.append(&mut terms);
            existing.terms.sort();
            existing.terms.dedup();
        } else {
            terms.sort();
            terms.dedup();
            self.positions.push(PhraseSlot { position, terms });
        }
        self.last_pos = position;
        self
    }

    pub fn slop(mut self, slop: u32) -> Self {
        self.slop = slop;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn build(self) -> Result<Query> {
        if self.positions.is_empty() {
            return Err(FerretError::arg("phrase query has no terms"));
        }
        let mut positions = self.positions;
        positions.sort_by_key(|s| s.position);
        Ok(Query::Phrase {
            field: self.field,
            positions,
            slop: self.slop,
            boost: Boost(self.boost),
        })
    }
}

/// Builds a `Boolean` query clause by clause.
#[derive(Default)]
pub struct BooleanBuilder {
    clauses: Vec<BooleanClause>,
    coord_disabled: bool,
    boost: f32,
}

impl BooleanBuilder {
    pub fn new() -> Self {
        BooleanBuilder {
            clauses: Vec::new(),
            coord_disabled: false,
            boost: 1.0,
        }
    }

    pub fn must(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::Must));
        self
    }

    pub fn should(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::Should));
        self
    }

    pub fn must_not(mut self, query: Query) -> Self {
        self.clauses.push(BooleanClause::new(query, Occur::MustNot));
        self
    }

    pub fn disable_coord(mut self) -> Self {
        self.coord_disabled = true;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn build(self) -> Query {
        Query::Boolean {
            clauses: self.clauses,
            coord_disabled: self.coord_disabled,
            boost: Boost(self.boost),
        }
    }
}

/// Builds a `MultiTerm` query, normalizing term order so equal term sets
/// always compare and hash equal regardless of insertion order.
pub struct MultiTermBuilder {
    field: String,
    terms: Vec<MultiTermEntry>,
    max_terms: usize,
    min_score: f32,
    boost: f32,
}

impl MultiTermBuilder {
    pub fn new(field: impl Into<String>) -> Self {
        MultiTermBuilder {
            field: field.into(),
            terms: Vec::new(),
            max_terms: usize::MAX,
            min_score: 0.0,
            boost: 1.0,
        }
    }

    pub fn add_term(mut self, text: impl Into<String>, boost: f32) -> Self {
        self.terms.push(MultiTermEntry {
            text: text.into(),
            boost: Boost(boost),
        });
        self
    }

    pub fn max_terms(mut self, max_terms: usize) -> Self {
        self.max_terms = max_terms;
        self
    }

    pub fn min_score(mut self, min_score: f32) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn boost(mut self, boost: f32) -> Self {
        self.boost = boost;
        self
    }

    pub fn build(self) -> Query {
        let mut terms: Vec<MultiTermEntry> = self
            .terms
            .into_iter()
            .filter(|t| t.boost.value() >= self.min_score)
            .collect();
        terms.sort_by(|a, b| {
            b.boost
                .value()
                .partial_cmp(&a.boost.value())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.text.cmp(&b.text))
        });
        terms.truncate(self.max_terms);
        // Canonicalize storage order to (text asc) so Eq/Hash don't depend
        // on insertion order once truncation/filtering has settled the set.
        terms.sort_by(|a, b| a.text.cmp(&b.text));
        Query::MultiTerm {
            field: self.field,
            terms,
            max_terms: self.max_terms,
            min_score: Boost(self.min_score),
            boost: Boost(self.boost),
        }
    }
}
