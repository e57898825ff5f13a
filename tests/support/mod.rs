//! Shared in-memory corpus for the integration suite: eight short
//! documents over a `body` field (for term/phrase/boolean coverage) and a
//! `tag` field (for prefix/wildcard/range coverage).

use ferret_core::{Document, MemoryIndexReader};

pub fn build_reader() -> MemoryIndexReader {
    let mut b = MemoryIndexReader::builder();
    let docs: &[(&[&str], &[&str], &str, i64)] = &[
        (&["the", "quick", "brown", "fox", "jumps"], &["animal", "alpha"], "fox-jump", 10),
        (&["the", "lazy", "dog", "sleeps"], &["animal", "beta"], "dog-sleep", 3),
        (&["quick", "fox", "quick", "fox"], &["animal", "gamma"], "fox-fox", 7),
        (&["the", "brown", "cat", "chased", "the", "mouse"], &["animal", "alpha"], "cat-chase", 5),
        (&["apple", "banana", "cherry"], &["fruit", "alpha"], "fruit-basket", 1),
        (&["apricot", "avocado"], &["fruit", "beta"], "fruit-a", 9),
        (&["the", "quick", "cat", "jumps", "over", "the", "lazy", "fox"], &["animal", "delta"], "cat-jump", 6),
        (&["banana", "split", "sundae"], &["fruit", "gamma"], "dessert", 2),
    ];
    for (i, (body, tag, id, score)) in docs.iter().enumerate() {
        b.add_document(
            &[("body", body), ("tag", tag)],
            Document::new().with_field("id", *id).with_field("score", *score),
        );
        let _ = i;
    }
    b.build()
}

/// Splits the same eight documents across two segments, for exercising
/// fan-out search: the first four land in the first reader, the rest in
/// the second.
pub fn build_two_readers() -> (MemoryIndexReader, MemoryIndexReader) {
    let docs: &[(&[&str], &str)] = &[
        (&["the", "quick", "brown", "fox", "jumps"], "fox-jump"),
        (&["the", "lazy", "dog", "sleeps"], "dog-sleep"),
        (&["quick", "fox", "quick", "fox"], "fox-fox"),
        (&["the", "brown", "cat", "chased", "the", "mouse"], "cat-chase"),
        (&["apple", "banana", "cherry"], "fruit-basket"),
        (&["apricot", "avocado"], "fruit-a"),
        (&["the", "quick", "cat", "jumps", "over", "the", "lazy", "fox"], "cat-jump"),
        (&["banana", "split", "sundae"], "dessert"),
    ];
    let mut b0 = MemoryIndexReader::builder();
    let mut b1 = MemoryIndexReader::builder();
    for (i, (body, id)) in docs.iter().enumerate() {
        let target = if i < 4 { &mut b0 } else { &mut b1 };
        target.add_document(&[("body", body)], Document::new().with_field("id", *id));
    }
    (b0.build(), b1.build())
}
