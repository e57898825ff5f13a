//! Constant-score scorer: every doc the inner matcher visits scores the
//! same fixed value, used for `MatchAll` and `ConstantScore`.

use super::Scorer;

pub struct ConstantScorer {
    inner: Box<dyn Scorer>,
    value: f32,
}

impl ConstantScorer {
    pub fn new(inner: Box<dyn Scorer>, value: f32) -> Self {
        ConstantScorer { inner, value }
    }
}

impl Scorer for ConstantScorer {
    fn doc(&self) -> u32 {
        self.inner.doc()
    }

    fn score(&self) -> f32 {
        self.value
    }

    fn next(&mut self) -> bool {
        self.inner.next()
    }

    fn skip_to(&mut self, target: u32) -> bool {
        self.inner.skip_to(target)
    }
}

/// Iterates every non-deleted doc in `[0, max_doc)`, for `MatchAll`.
pub struct AllDocsScorer {
    max_doc: u32,
    is_deleted: Box<dyn Fn(u32) -> bool + Send>,
    current: Option<u32>,
}

impl AllDocsScorer {
    pub fn new(max_doc: u32, is_deleted: Box<dyn Fn(u32) -> bool + Send>) -> Self {
        AllDocsScorer {
            max_doc,
            is_deleted,
            current: None,
        }
    }
}

impl Scorer for AllDocsScorer {
    fn doc(&self) -> u32 {
        self.current.unwrap_or(super::NO_MORE_DOCS)
    }

    fn score(&self) -> f32 {
        1.0
    }

    fn next(&mut self) -> bool {
        let mut candidate = self.current.map_or(0, |d| d + 1);
        while candidate < self.max_doc {
            if !(self.is_deleted)(candidate) {
                self.current = Some(candidate);
                return true;
            }
            candidate += 1;
        }
        self.current = None;
        false
    }

    fn skip_to(&mut self, target: u32) -> bool {
        if let Some(doc) = self.current {
            if doc >= target {
                return true;
            }
        }
        let mut candidate = target;
        while candidate < self.max_doc {
            if !(self.is_deleted)(candidate) {
                self.current = Some(candidate);
                return true;
            }
            candidate += 1;
        }
        self.current = None;
        false
    }
}
