//! Variable-activity priority queue for the arithmetic plugin's
//! decision heuristic, scoped to a single type index per spec §4.6
//! ("The queue is keyed only within a single type index").
//!
//! Grounded on CVC4's `mcsat/util/var_priority_queue.h` (score vector
//! + rescale-on-threshold + pop-highest-scoring), re-expressed without
//! a pairing heap: a `BTreeSet` ordered by `(score bits, VarId)` gives
//! the same pop-max/reinsert-on-bump behavior in safe Rust, since
//! every score here is non-negative and `f64::to_bits` preserves
//! ordering for non-negative values.

use crate::types::VarId;
use std::collections::{BTreeSet, HashMap};

#[derive(Default)]
pub struct VariablePriorityQueue {
    scores: HashMap<VarId, f64>,
    queued: BTreeSet<(u64, VarId)>,
    in_queue: HashMap<VarId, bool>,
    inc: f64,
}

impl VariablePriorityQueue {
    pub fn new() -> VariablePriorityQueue {
        VariablePriorityQueue {
            scores: HashMap::new(),
            queued: BTreeSet::new(),
            in_queue: HashMap::new(),
            inc: 1.0,
        }
    }

    fn score(&self, vi: VarId) -> f64 {
        self.scores.get(&vi).copied().unwrap_or(0.0)
    }

    fn key(&self, vi: VarId) -> (u64, VarId) {
        (self.score(vi).to_bits(), vi)
    }

    pub fn enqueue(&mut self, vi: VarId) {
        if self.in_queue.get(&vi).copied().unwrap_or(false) {
            return;
        }
        self.queued.insert(self.key(vi));
        self.in_queue.insert(vi, true);
    }

    pub fn is_queued(&self, vi: VarId) -> bool {
        self.in_queue.get(&vi).copied().unwrap_or(false)
    }

    /// Removes and returns the highest-scoring queued variable.
    pub fn pop(&mut self) -> Option<VarId> {
        let top = *self.queued.iter().next_back()?;
        self.queued.remove(&top);
        self.in_queue.insert(top.1, false);
        Some(top.1)
    }

    /// Bumps `vi`'s score by the current increment, rescaling every
    /// known variable's score (and the increment) if this bump would
    /// push any score past `rescale_threshold`. Re-keys `vi` in the
    /// queue if it is currently enqueued, since its sort key changed.
    pub fn bump_variable(&mut self, vi: VarId, rescale_threshold: f64) {
        let was_queued = self.is_queued(vi);
        if was_queued {
            self.queued.remove(&self.key(vi));
        }
        let new_score = self.score(vi) + self.inc;
        self.scores.insert(vi, new_score);
        if new_score > rescale_threshold {
            self.rescale(rescale_threshold);
        }
        if was_queued {
            self.queued.insert(self.key(vi));
        }
    }

    fn rescale(&mut self, rescale_threshold: f64) {
        let factor = 1.0 / rescale_threshold;
        for v in self.scores.values_mut() {
            *v *= factor;
        }
        self.inc *= factor;
        self.queued = self
            .in_queue
            .iter()
            .filter(|(_, &q)| q)
            .map(|(&vi, _)| self.key(vi))
            .collect();
    }

    pub fn decay(&mut self, decay: f64) {
        self.inc *= 1.0 / decay;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_returns_highest_score() {
        let mut q = VariablePriorityQueue::new();
        q.enqueue(1);
        q.enqueue(2);
        q.enqueue(3);
        q.bump_variable(2, 1e20);
        q.bump_variable(2, 1e20);
        assert_eq!(q.pop(), Some(2));
    }

    #[test]
    fn rescale_preserves_order_and_bounds_scores() {
        let mut q = VariablePriorityQueue::new();
        q.enqueue(1);
        q.enqueue(2);
        // Push var 1 well ahead of var 2, then force a rescale.
        for _ in 0..3 {
            q.bump_variable(1, 1e20);
        }
        q.bump_variable(2, 1e20);
        let threshold = q.score(1) * 0.5;
        q.bump_variable(1, threshold);
        assert!(q.score(1) <= 2.0);
        assert!(q.score(1) > q.score(2));
        assert_eq!(q.pop(), Some(1));
    }
}
