//! A bounded min-heap of the best-scoring hits seen so far, the classic
//! "priority queue of size k" approach to top-k ranking without sorting
//! the full result set.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// One scored document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub doc: u32,
    pub score: f32,
}

/// Ordered so the *weakest* hit sorts greatest — `BinaryHeap` is a max-heap,
/// so the weakest hit naturally rises to the top and is the one evicted.
/// Ties break toward the higher doc id being weaker, so that among equal
/// scores, lower doc ids are kept preferentially (matching insertion-order
/// stability expectations).
impl Eq for Hit {}

impl Ord for Hit {
    fn cmp(&self, other: &Self) -> Ordering {
        match other.score.partial_cmp(&self.score) {
            Some(Ordering::Equal) | None => other.doc.cmp(&self.doc),
            Some(ordering) => ordering,
        }
    }
}

impl PartialOrd for Hit {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The final, score-descending result of a search.
#[derive(Debug, Clone, Default)]
pub struct TopDocs {
    pub total_hits: u64,
    pub max_score: f32,
    pub hits: Vec<Hit>,
}

/// Collects the top `capacity` hits out of a (possibly much larger)
/// candidate stream, plus a running count of every candidate offered.
pub struct HitQueue {
    capacity: usize,
    heap: BinaryHeap<Hit>,
    total_hits: u64,
    max_score: f32,
}

impl HitQueue {
    pub fn new(capacity: usize) -> Self {
        HitQueue {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
            total_hits: 0,
            max_score: f32::NEG_INFINITY,
        }
    }

    /// Offers a candidate hit. Every offer counts toward `total_hits`
    /// regardless of whether it survives into the final top-k.
    pub fn offer(&mut self, hit: Hit) {
        self.total_hits += 1;
        if hit.score > self.max_score {
            self.max_score = hit.score;
        }
        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(hit);
        } else if let Some(weakest) = self.heap.peek() {
            if hit.score > weakest.score || (hit.score == weakest.score && hit.doc < weakest.doc) {
                self.heap.pop();
                self.heap.push(hit);
            }
        }
    }

    /// Drains the queue into a score-descending (doc-ascending on ties)
    /// `TopDocs`, optionally skipping the first `skip` hits (for paging).
    pub fn into_top_docs(self, skip: usize) -> TopDocs {
        let mut hits: Vec<Hit> = self.heap.into_vec();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal).then_with(|| a.doc.cmp(&b.doc)));
        let hits = hits.into_iter().skip(skip).collect();
        let max_score = if self.total_hits == 0 { 0.0 } else { self.max_score };
        TopDocs {
            total_hits: self.total_hits,
            max_score,
            hits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_highest_scoring_k() {
        let mut q = HitQueue::new(2);
        q.offer(Hit { doc: 0, score: 1.0 });
        q.offer(Hit { doc: 1, score: 3.0 });
        q.offer(Hit { doc: 2, score: 2.0 });
        let top = q.into_top_docs(0);
        assert_eq!(top.total_hits, 3);
        assert_eq!(top.hits.len(), 2);
        assert_eq!(top.hits[0].doc, 1);
        assert_eq!(top.hits[1].doc, 2);
    }

    #[test]
    fn ties_break_by_ascending_doc_id() {
        let mut q = HitQueue::new(10);
        q.offer(Hit { doc: 5, score: 1.0 });
        q.offer(Hit { doc: 1, score: 1.0 });
        let top = q.into_top_docs(0);
        assert_eq!(top.hits[0].doc, 1);
        assert_eq!(top.hits[1].doc, 5);
    }

    #[test]
    fn total_hits_counts_every_offer_not_just_survivors() {
        let mut q = HitQueue::new(1);
        for doc in 0..5 {
            q.offer(Hit { doc, score: doc as f32 });
        }
        let top = q.into_top_docs(0);
        assert_eq!(top.total_hits, 5);
        assert_eq!(top.hits.len(), 1);
        assert_eq!(top.hits[0].doc, 4);
    }

    #[test]
    fn skip_pages_past_leading_hits() {
        let mut q = HitQueue::new(10);
        for doc in 0..5 {
            q.offer(Hit { doc, score: (5 - doc) as f32 });
        }
        let top = q.into_top_docs(2);
        assert_eq!(top.hits[0].doc, 2);
    }
}
