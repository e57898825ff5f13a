//! Wildcard pattern matching: `*` matches any run of characters (including
//! none), `?` matches exactly one character. No regex compilation; this is
//! a direct recursive matcher over the pattern and candidate text.

/// Reports whether `text` matches `pattern` under the `*`/`?` grammar.
pub fn matches(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let text: Vec<char> = text.chars().collect();
    matches_from(&pattern, &text)
}

fn matches_from(pattern: &[char], text: &[char]) -> bool {
    match pattern.first() {
        None => text.is_empty(),
        Some('*') => {
            // Collapse consecutive stars, then try consuming zero or more
            // characters of text before matching the remainder.
            let rest = &pattern[1..];
            if matches_from(rest, text) {
                return true;
            }
            !text.is_empty() && matches_from(pattern, &text[1..])
        }
        Some('?') => !text.is_empty() && matches_from(&pattern[1..], &text[1..]),
        Some(&c) => text.first() == Some(&c) && matches_from(&pattern[1..], &text[1..]),
    }
}

/// The fixed literal prefix before the first `*`/`?`, used to seek a term
/// dictionary to the first term that could possibly match.
pub fn literal_prefix(pattern: &str) -> &str {
    let end = pattern.find(['*', '?']).unwrap_or(pattern.len());
    &pattern[..end]
}
