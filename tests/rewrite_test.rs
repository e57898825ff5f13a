mod support;

use ferret_core::{Boost, Document, MemoryIndexReader, Query, Searcher};

fn term(field: &str, text: &str) -> Query {
    Query::Term {
        field: field.into(),
        text: text.into(),
        boost: Boost::DEFAULT,
    }
}

#[test]
fn prefix_collapses_to_a_single_term_when_only_one_match() {
    let searcher = Searcher::new(support::build_reader());
    let q = Query::Prefix {
        field: "body".into(),
        prefix: "sund".into(),
        boost: Boost::DEFAULT,
    };
    let rewritten = searcher.rewrite(&q);
    assert_eq!(rewritten, term("body", "sundae"));
}

#[test]
fn prefix_with_no_matches_rewrites_to_an_empty_boolean_with_no_hits() {
    let searcher = Searcher::new(support::build_reader());
    let q = Query::Prefix {
        field: "body".into(),
        prefix: "zzz".into(),
        boost: Boost::DEFAULT,
    };
    let top = searcher.search(&q, 0, 10, None, None, None).unwrap();
    assert_eq!(top.total_hits, 0);
}

#[test]
fn rewrite_reaches_a_fixed_point_on_a_second_pass() {
    let searcher = Searcher::new(support::build_reader());
    let q = Query::Wildcard {
        field: "body".into(),
        pattern: "ap*".into(),
        boost: Boost::DEFAULT,
    };
    let once = searcher.rewrite(&q);
    let twice = searcher.rewrite(&once);
    assert_eq!(once, twice);
}

#[test]
fn typed_range_parses_numeric_tag_bounds_lexicographically_when_non_numeric() {
    let searcher = Searcher::new(support::build_reader());
    // tag values here are words, not numbers, so TypedRange falls back to
    // lexicographic comparison and should behave like Range.
    let typed = Query::TypedRange {
        field: "tag".into(),
        lo: Some("alpha".into()),
        hi: Some("beta".into()),
        inc_lo: true,
        inc_hi: true,
        boost: Boost::DEFAULT,
    };
    let plain = Query::Range {
        field: "tag".into(),
        lo: Some("alpha".into()),
        hi: Some("beta".into()),
        inc_lo: true,
        inc_hi: true,
        boost: Boost::DEFAULT,
    };
    assert_eq!(searcher.rewrite(&typed), searcher.rewrite(&plain));
}

#[test]
fn typed_range_compares_numerically_instead_of_lexicographically() {
    // "-5.0" sorts between "-1.0" and "0.0" lexicographically (the digit
    // '5' beats '1' right after the shared minus sign), but numerically it
    // sits well outside [-1.0, 1.0]. A numeric range must exclude it; the
    // plain lexicographic Range must include it.
    let mut b = MemoryIndexReader::builder();
    for value in ["-5.0", "-1.0", "0.0", "0.5", "1.0", "2.0"] {
        b.add_document(&[("number", &[value])], Document::new().with_field("id", value));
    }
    let reader = b.build();
    let searcher = Searcher::new(reader);

    let typed = Query::TypedRange {
        field: "number".into(),
        lo: Some("-1.0".into()),
        hi: Some("1.0".into()),
        inc_lo: true,
        inc_hi: true,
        boost: Boost::DEFAULT,
    };
    let plain = Query::Range {
        field: "number".into(),
        lo: Some("-1.0".into()),
        hi: Some("1.0".into()),
        inc_lo: true,
        inc_hi: true,
        boost: Boost::DEFAULT,
    };

    let typed_top = searcher.search(&typed, 0, 10, None, None, None).unwrap();
    let plain_top = searcher.search(&plain, 0, 10, None, None, None).unwrap();

    assert_eq!(typed_top.total_hits, 4); // -1.0, 0.0, 0.5, 1.0
    assert_eq!(plain_top.total_hits, 5); // also picks up "-5.0" lexicographically

    // doc 0 indexed the outlier value "-5.0".
    let typed_docs: std::collections::HashSet<u32> = typed_top.hits.iter().map(|h| h.doc).collect();
    let plain_docs: std::collections::HashSet<u32> = plain_top.hits.iter().map(|h| h.doc).collect();
    assert!(!typed_docs.contains(&0));
    assert!(plain_docs.contains(&0));
}

#[test]
fn pretty_printed_query_round_trips_through_equality_of_the_original() {
    let q = Query::Term {
        field: "body".into(),
        text: "fox".into(),
        boost: Boost(2.5),
    };
    let printed = q.to_pretty_string();
    assert_eq!(printed, "body:fox^2.5");
    // Equal ASTs print identically; this is the invariant the rewrite loop
    // relies on to detect a fixed point without a deep walk.
    assert_eq!(q.to_pretty_string(), q.clone().to_pretty_string());
}
