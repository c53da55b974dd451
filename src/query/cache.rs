//! # Position Cache
//!
//! Exact membership set over absolute genome positions, used by the column
//! iterator to avoid revisiting a locus when the duplication graph cycles.
//!
//! Column traversals insert long runs of adjacent positions, so the set is
//! stored as coalesced half-open intervals in a `BTreeMap<start, end>` rather
//! than as individual points. Semantics are identical to an unbounded exact
//! set: no false positives or negatives, ever.

use std::collections::BTreeMap;

/// Exact visited-position set backed by coalesced intervals
#[derive(Clone, Debug, Default)]
pub struct PositionCache {
    /// start -> end (exclusive); intervals are disjoint and non-adjacent
    intervals: BTreeMap<i64, i64>,
    size: u64,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a position. Returns `true` if newly inserted, `false` if it was
    /// already present (same contract as a standard set insert).
    pub fn insert(&mut self, position: i64) -> bool {
        if self.find(position) {
            return false;
        }

        // neighbors that the new point may fuse with
        let left = self
            .intervals
            .range(..position)
            .next_back()
            .map(|(&s, &e)| (s, e))
            .filter(|&(_, e)| e == position);
        let right = self
            .intervals
            .get(&(position + 1))
            .map(|&e| (position + 1, e));

        match (left, right) {
            (Some((ls, _)), Some((rs, re))) => {
                self.intervals.remove(&rs);
                self.intervals.insert(ls, re);
            }
            (Some((ls, _)), None) => {
                self.intervals.insert(ls, position + 1);
            }
            (None, Some((rs, re))) => {
                self.intervals.remove(&rs);
                self.intervals.insert(position, re);
            }
            (None, None) => {
                self.intervals.insert(position, position + 1);
            }
        }
        self.size += 1;
        true
    }

    /// Whether the position is present
    pub fn find(&self, position: i64) -> bool {
        self.intervals
            .range(..=position)
            .next_back()
            .is_some_and(|(_, &end)| position < end)
    }

    /// Number of positions stored
    pub fn len(&self) -> u64 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Number of coalesced intervals (diagnostic)
    pub fn num_intervals(&self) -> usize {
        self.intervals.len()
    }

    pub fn clear(&mut self) {
        self.intervals.clear();
        self.size = 0;
    }

    /// Structural self-check: intervals sorted, disjoint, non-adjacent, and
    /// the tracked size equals the summed interval widths. Must never fail on
    /// a cache reachable through `insert`/`clear` alone.
    pub fn check(&self) -> bool {
        let mut total = 0u64;
        let mut prev_end: Option<i64> = None;
        for (&start, &end) in &self.intervals {
            if start >= end {
                return false;
            }
            if let Some(pe) = prev_end {
                // adjacent intervals should have been coalesced
                if start <= pe {
                    return false;
                }
            }
            total += (end - start) as u64;
            prev_end = Some(end);
        }
        total == self.size
    }
}
