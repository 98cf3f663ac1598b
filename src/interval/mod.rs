//! Closed genomic intervals and the set algebra used for coverage bookkeeping.
//!
//! Both [`Interval`] and [`ContigInterval`] are value types: every operation
//! that derives a new range returns a new instance.
//!
//! ```text
//! | 1 | 2 | 3 | 4 | 5 | 6 | 7 | 8 | 9 |
//! |   |   | X | X | X | X |   |   |   |  <= 3-6, length 4
//! ```

mod contig;

pub use contig::ContigInterval;

use crate::{Error, Result};
use std::fmt;

/// A closed `[start, stop]` range of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Interval {
    start: u64,
    stop: u64,
}

impl Interval {
    /// Create a new interval.
    ///
    /// Panics if `start > stop`; use [`Interval::try_new`] for untrusted input.
    pub fn new(start: u64, stop: u64) -> Self {
        assert!(start <= stop, "interval start {start} is after stop {stop}");
        Self { start, stop }
    }

    pub fn try_new(start: u64, stop: u64) -> Result<Self> {
        if start > stop {
            return Err(Error::InvalidRange(format!(
                "start {} is greater than stop {}",
                start, stop
            )));
        }
        Ok(Self { start, stop })
    }

    pub fn start(&self) -> u64 {
        self.start
    }

    pub fn stop(&self) -> u64 {
        self.stop
    }

    /// Number of positions in the interval; both ends are included.
    ///
    /// Saturates at `u64::MAX` for `[0, u64::MAX]`.
    pub fn length(&self) -> u64 {
        self.span().saturating_add(1)
    }

    /// Distance from `start` to `stop`, one less than [`Interval::length`].
    pub fn span(&self) -> u64 {
        self.stop - self.start
    }

    pub fn contains(&self, value: u64) -> bool {
        self.start <= value && value <= self.stop
    }

    pub fn contains_interval(&self, other: &Interval) -> bool {
        self.start <= other.start && other.stop <= self.stop
    }

    pub fn intersects(&self, other: &Interval) -> bool {
        self.start <= other.stop && other.start <= self.stop
    }

    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if !self.intersects(other) {
            return None;
        }
        Some(Interval {
            start: self.start.max(other.start),
            stop: self.stop.min(other.stop),
        })
    }

    /// True if the two intervals touch end-to-end without overlapping.
    pub fn is_adjacent_to(&self, other: &Interval) -> bool {
        self.stop.checked_add(1) == Some(other.start)
            || other.stop.checked_add(1) == Some(self.start)
    }

    /// The parts of `self` not covered by `other`, in ascending order.
    pub fn subtract(&self, other: &Interval) -> Vec<Interval> {
        if !self.intersects(other) {
            return vec![*self];
        }

        let mut pieces = Vec::with_capacity(2);
        if self.start < other.start {
            pieces.push(Interval::new(self.start, other.start - 1));
        }
        if other.stop < self.stop {
            pieces.push(Interval::new(other.stop + 1, self.stop));
        }
        pieces
    }

    /// Find the disjoint sub-intervals of `self` not covered by any of `others`.
    ///
    /// If `comp = self.complement_intervals(others)`, then `comp` together with
    /// the parts of `others` inside `self` is exactly `self`, and no element of
    /// `comp` intersects any element of `others`. The input need not be sorted
    /// or disjoint; the result is sorted by start.
    pub fn complement_intervals<'a, I>(&self, others: I) -> Vec<Interval>
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        let mut remaining = vec![*self];
        for other in others {
            if remaining.is_empty() {
                break;
            }
            remaining = remaining
                .iter()
                .flat_map(|piece| piece.subtract(other))
                .collect();
        }
        remaining
    }

    pub fn is_covered_by<'a, I>(&self, others: I) -> bool
    where
        I: IntoIterator<Item = &'a Interval>,
    {
        self.complement_intervals(others).is_empty()
    }

    /// Expand outward so that `start` is a multiple of `multiple` and `stop`
    /// sits just before the next multiple.
    ///
    /// `start` never drops below 0 (`zero_based`) or 1 (one-based).
    pub fn round(&self, multiple: u64, zero_based: bool) -> Interval {
        if multiple <= 1 {
            return *self;
        }
        let min_value = if zero_based { 0 } else { 1 };
        let start = (self.start - self.start % multiple).max(min_value);
        let stop = (self.stop - self.stop % multiple).saturating_add(multiple - 1);
        Interval::new(start.min(stop), stop)
    }

    /// Widen to bucket boundaries: `start` rounds down to a multiple of
    /// `bucket` (but not below `min_start`), `stop` rounds up to one.
    pub fn expand(&self, bucket: u64, min_start: u64) -> Interval {
        if bucket <= 1 {
            return *self;
        }
        let round_down = |x: u64| x - x % bucket;
        let start = round_down(self.start).max(min_start);
        let stop = round_down(self.stop.saturating_add(bucket - 1));
        Interval::new(start.min(stop), stop.max(self.stop))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.stop)
    }
}
