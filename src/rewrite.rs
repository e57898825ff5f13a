//! Rewrites a query into one built only from `Term`, `Boolean`, `Phrase`,
//! `MultiTerm`, `MatchAll`, `ConstantScore`, and `Filtered` nodes — the
//! variants a `Weight` knows how to score directly. `Prefix`, `Wildcard`,
//! `Range`, and `TypedRange` are expanded against the reader's term
//! dictionary; a single-slot `Phrase` collapses to a `Term` or a
//! disjunction of `Term`s.

use crate::query::{BooleanClause, MultiTermBuilder, Occur, Query};
use crate::reader::{IndexReader, TermsEnum};
use crate::term::Boost;
use crate::wildcard;

/// Rewrites `query` against `reader`, repeating until a pass makes no
/// further change.
pub fn rewrite(query: &Query, reader: &dyn IndexReader) -> Query {
    let mut current = query.clone();
    loop {
        let next = rewrite_once(&current, reader);
        if next == current {
            return next;
        }
        current = next;
    }
}

fn rewrite_once(query: &Query, reader: &dyn IndexReader) -> Query {
    match query {
        Query::Boolean {
            clauses,
            coord_disabled,
            boost,
        } => Query::Boolean {
            clauses: clauses
                .iter()
                .map(|c| BooleanClause {
                    query: Box::new(rewrite_once(&c.query, reader)),
                    occur: c.occur,
                })
                .collect(),
            coord_disabled: *coord_disabled,
            boost: *boost,
        },
        Query::Phrase {
            field,
            positions,
            slop,
            boost,
        } if positions.len() == 1 => {
            let slot = &positions[0];
            if slot.terms.len() == 1 {
                Query::Term {
                    field: field.clone(),
                    text: slot.terms[0].clone(),
                    boost: *boost,
                }
            } else {
                let clauses = slot
                    .terms
                    .iter()
                    .map(|t| {
                        BooleanClause::new(
                            Query::Term {
                                field: field.clone(),
                                text: t.clone(),
                                boost: Boost::DEFAULT,
                            },
                            Occur::Should,
                        )
                    })
                    .collect();
                Query::Boolean {
                    clauses,
                    coord_disabled: false,
                    boost: *boost,
                }
            }
        }
        Query::Phrase { .. } => query.clone(),
        Query::Prefix { field, prefix, boost } => {
            let terms = matching_terms(reader, field, |t| t.starts_with(prefix.as_str()));
            terms_to_query(field, terms, *boost)
        }
        Query::Wildcard { field, pattern, boost } => {
            let literal = wildcard::literal_prefix(pattern);
            let terms = matching_terms(reader, field, |t| {
                t.starts_with(literal) && wildcard::matches(pattern, t)
            });
            terms_to_query(field, terms, *boost)
        }
        Query::Range {
            field,
            lo,
            hi,
            inc_lo,
            inc_hi,
            boost,
        } => {
            let terms = matching_terms(reader, field, |t| in_range(t, lo, hi, *inc_lo, *inc_hi));
            terms_to_query(field, terms, *boost)
        }
        Query::TypedRange {
            field,
            lo,
            hi,
            inc_lo,
            inc_hi,
            boost,
        } => {
            let terms = matching_terms(reader, field, |t| in_typed_range(t, lo, hi, *inc_lo, *inc_hi));
            terms_to_query(field, terms, *boost)
        }
        Query::ConstantScore { filter, boost } => Query::ConstantScore {
            filter: Box::new(rewrite_once(filter, reader)),
            boost: *boost,
        },
        Query::Filtered { inner, filter } => Query::Filtered {
            inner: Box::new(rewrite_once(inner, reader)),
            filter: Box::new(rewrite_once(filter, reader)),
        },
        // Term, MultiTerm, MatchAll are already terminal.
        other => other.clone(),
    }
}

fn matching_terms(reader: &dyn IndexReader, field: &str, mut predicate: impl FnMut(&str) -> bool) -> Vec<String> {
    let mut out = Vec::new();
    let Some(mut terms) = reader.terms(field) else {
        return out;
    };
    if !terms.next() {
        return out;
    }
    loop {
        if let Some(text) = terms.term() {
            if predicate(text) {
                out.push(text.to_string());
            }
        }
        if !terms.next() {
            break;
        }
    }
    out
}

/// Turns an enumerated term set into the appropriate terminal query: no
/// terms matches nothing, one term is a plain `Term`, more than one
/// becomes a `MultiTerm`.
fn terms_to_query(field: &str, terms: Vec<String>, boost: Boost) -> Query {
    match terms.len() {
        0 => Query::Boolean {
            clauses: Vec::new(),
            coord_disabled: false,
            boost,
        },
        1 => Query::Term {
            field: field.to_string(),
            text: terms.into_iter().next().unwrap(),
            boost,
        },
        _ => {
            let mut builder = MultiTermBuilder::new(field).boost(boost.value());
            for term in terms {
                builder = builder.add_term(term, 1.0);
            }
            builder.build()
        }
    }
}

fn in_range(text: &str, lo: &Option<String>, hi: &Option<String>, inc_lo: bool, inc_hi: bool) -> bool {
    let above_lo = match lo {
        None => true,
        Some(lo) => {
            if inc_lo {
                text >= lo.as_str()
            } else {
                text > lo.as_str()
            }
        }
    };
    let below_hi = match hi {
        None => true,
        Some(hi) => {
            if inc_hi {
                text <= hi.as_str()
            } else {
                text < hi.as_str()
            }
        }
    };
    above_lo && below_hi
}

/// Like `in_range`, but compares as numbers when the term text and both
/// present bounds parse as `f64` (with optional `0x`-prefixed hex integers
/// also recognized), falling back to lexicographic comparison otherwise.
fn in_typed_range(text: &str, lo: &Option<String>, hi: &Option<String>, inc_lo: bool, inc_hi: bool) -> bool {
    let Some(t) = parse_numeric(text) else {
        return in_range(text, lo, hi, inc_lo, inc_hi);
    };
    let lo_parsed = lo.as_deref().map(parse_numeric);
    let hi_parsed = hi.as_deref().map(parse_numeric);
    if lo_parsed == Some(None) || hi_parsed == Some(None) {
        return in_range(text, lo, hi, inc_lo, inc_hi);
    }
    let above_lo = match lo_parsed.flatten() {
        None => true,
        Some(lo) => {
            if inc_lo {
                t >= lo
            } else {
                t > lo
            }
        }
    };
    let below_hi = match hi_parsed.flatten() {
        None => true,
        Some(hi) => {
            if inc_hi {
                t <= hi
            } else {
                t < hi
            }
        }
    };
    above_lo && below_hi
}

fn parse_numeric(s: &str) -> Option<f64> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok().map(|v| v as f64);
    }
    s.parse::<f64>().ok()
}
