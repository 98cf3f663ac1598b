use super::Interval;
use crate::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// An [`Interval`] on a named contig.
///
/// Ordering is by contig name, then start, then stop. Intersection and
/// adjacency only ever hold between intervals on the same contig.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContigInterval {
    contig: String,
    interval: Interval,
}

/// Strip a leading `chr` so that `chr17` and `17` compare equal.
fn normalize(contig: &str) -> &str {
    contig.strip_prefix("chr").unwrap_or(contig)
}

impl ContigInterval {
    /// Panics if `start > stop`; see [`ContigInterval::try_new`].
    pub fn new(contig: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            contig: contig.into(),
            interval: Interval::new(start, stop),
        }
    }

    pub fn try_new(contig: impl Into<String>, start: u64, stop: u64) -> Result<Self> {
        Ok(Self {
            contig: contig.into(),
            interval: Interval::try_new(start, stop)?,
        })
    }

    pub fn from_interval(contig: impl Into<String>, interval: Interval) -> Self {
        Self {
            contig: contig.into(),
            interval,
        }
    }

    pub fn contig(&self) -> &str {
        &self.contig
    }

    pub fn interval(&self) -> &Interval {
        &self.interval
    }

    pub fn start(&self) -> u64 {
        self.interval.start()
    }

    pub fn stop(&self) -> u64 {
        self.interval.stop()
    }

    pub fn length(&self) -> u64 {
        self.interval.length()
    }

    pub fn on_contig(&self, contig: &str) -> bool {
        self.contig == contig
    }

    /// Like [`ContigInterval::on_contig`], ignoring a `chr` prefix on either side.
    pub fn chr_on_contig(&self, contig: &str) -> bool {
        normalize(&self.contig) == normalize(contig)
    }

    pub fn intersects(&self, other: &ContigInterval) -> bool {
        self.contig == other.contig && self.interval.intersects(&other.interval)
    }

    pub fn intersect(&self, other: &ContigInterval) -> Option<ContigInterval> {
        if self.contig != other.contig {
            return None;
        }
        self.interval
            .intersect(&other.interval)
            .map(|interval| Self::from_interval(self.contig.clone(), interval))
    }

    pub fn contains_interval(&self, other: &ContigInterval) -> bool {
        self.contig == other.contig && self.interval.contains_interval(&other.interval)
    }

    pub fn contains_locus(&self, contig: &str, position: u64) -> bool {
        self.contig == contig && self.interval.contains(position)
    }

    pub fn chr_contains_locus(&self, contig: &str, position: u64) -> bool {
        self.chr_on_contig(contig) && self.interval.contains(position)
    }

    pub fn is_adjacent_to(&self, other: &ContigInterval) -> bool {
        self.contig == other.contig && self.interval.is_adjacent_to(&other.interval)
    }

    /// The disjoint pieces of `self` not covered by `others`, sorted by start.
    ///
    /// Intervals in `others` on a different contig are ignored.
    pub fn complement_intervals<'a, I>(&self, others: I) -> Vec<ContigInterval>
    where
        I: IntoIterator<Item = &'a ContigInterval>,
    {
        let same_contig = others
            .into_iter()
            .filter(|other| other.contig == self.contig)
            .map(|other| &other.interval);

        self.interval
            .complement_intervals(same_contig)
            .into_iter()
            .map(|interval| Self::from_interval(self.contig.clone(), interval))
            .collect()
    }

    pub fn is_covered_by<'a, I>(&self, others: I) -> bool
    where
        I: IntoIterator<Item = &'a ContigInterval>,
    {
        self.complement_intervals(others).is_empty()
    }

    /// Sort and merge overlapping or adjacent intervals.
    ///
    /// The result is sorted, pairwise disjoint and non-adjacent, and covers
    /// exactly the union of the input, regardless of input order.
    pub fn coalesce(mut intervals: Vec<ContigInterval>) -> Vec<ContigInterval> {
        intervals.sort();

        let mut merged: Vec<ContigInterval> = Vec::with_capacity(intervals.len());
        for next in intervals {
            if let Some(last) = merged.last_mut() {
                if last.intersects(&next) || last.is_adjacent_to(&next) {
                    let stop = last.stop().max(next.stop());
                    last.interval = Interval::new(last.start(), stop);
                    continue;
                }
            }
            merged.push(next);
        }
        merged
    }

    pub fn round(&self, multiple: u64, zero_based: bool) -> ContigInterval {
        Self::from_interval(self.contig.clone(), self.interval.round(multiple, zero_based))
    }

    pub fn expand(&self, bucket: u64, min_start: u64) -> ContigInterval {
        Self::from_interval(self.contig.clone(), self.interval.expand(bucket, min_start))
    }
}

impl fmt::Display for ContigInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.contig, self.interval)
    }
}

/// Parses `<contig>:<start>-<stop>` or `<contig>:<position>`.
impl FromStr for ContigInterval {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parse_err = || Error::InvalidRange(format!("could not parse region: {}", s));

        let (contig, span) = s.rsplit_once(':').ok_or_else(parse_err)?;
        if contig.is_empty() {
            return Err(parse_err());
        }

        let parse_pos = |v: &str| v.trim().replace(',', "").parse::<u64>().map_err(|_| parse_err());
        let (start, stop) = match span.split_once('-') {
            Some((start, stop)) => (parse_pos(start)?, parse_pos(stop)?),
            None => {
                let pos = parse_pos(span)?;
                (pos, pos)
            }
        };

        Self::try_new(contig, start, stop)
    }
}
