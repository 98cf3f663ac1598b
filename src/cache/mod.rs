//! Resolution-aware record cache with coverage bookkeeping.
//!
//! A [`ResolutionCache`] stores records per resolution tier and remembers which
//! `(range, resolution)` pairs have been completely fetched. The covered set
//! is what lets a data source compute the exact gaps it still has to request.
//!
//! Nothing is ever evicted: the covered set and the records grow for the
//! lifetime of the cache, until [`ResolutionCache::clear`].

mod strategy;

pub use strategy::{CacheStrategy, GenomicRecord, LocusStrategy, SpanStrategy};

use crate::interval::{ContigInterval, Interval};
use std::collections::HashMap;
use std::fmt;

/// Number of base positions aggregated into one cached unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Resolution(u32);

impl Resolution {
    /// One record per base: no binning.
    pub const BASE: Resolution = Resolution(1);

    /// Zero is treated as [`Resolution::BASE`].
    pub const fn new(bases_per_bin: u32) -> Self {
        if bases_per_bin == 0 {
            Self::BASE
        } else {
            Resolution(bases_per_bin)
        }
    }

    pub const fn bases_per_bin(self) -> u64 {
        self.0 as u64
    }

    /// Binning for a view of `interval`, chosen for a ~1000 pixel display.
    ///
    /// - spans under 10,000 bp are not binned (1)
    /// - spans under 100,000 bp bin 10 bp into one (10)
    /// - spans under 1,000,000 bp bin 100 bp into one (100)
    /// - anything wider bins 1000 bp into one (1000)
    ///
    /// The span is `stop - start`, i.e. one less than [`Interval::length`].
    pub fn for_interval(interval: &Interval) -> Self {
        match interval.span() {
            0..10_000 => Resolution(1),
            10_000..100_000 => Resolution(10),
            100_000..1_000_000 => Resolution(100),
            _ => Resolution(1000),
        }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::BASE
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marks a range as completely fetched at a resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionCacheKey {
    pub contig_interval: ContigInterval,
    pub resolution: Resolution,
}

impl ResolutionCacheKey {
    pub fn new(contig_interval: ContigInterval, resolution: Resolution) -> Self {
        Self {
            contig_interval,
            resolution,
        }
    }

    /// Merge overlapping or adjacent keys of the same resolution.
    ///
    /// The result is sorted by resolution, then contig and start; keys of
    /// different resolutions are never merged.
    pub fn coalesce(keys: Vec<ResolutionCacheKey>) -> Vec<ResolutionCacheKey> {
        let mut by_resolution: HashMap<Resolution, Vec<ContigInterval>> = HashMap::new();
        for key in keys {
            by_resolution
                .entry(key.resolution)
                .or_default()
                .push(key.contig_interval);
        }

        let mut tiers: Vec<_> = by_resolution.into_iter().collect();
        tiers.sort_by_key(|(resolution, _)| *resolution);

        tiers
            .into_iter()
            .flat_map(|(resolution, intervals)| {
                ContigInterval::coalesce(intervals)
                    .into_iter()
                    .map(move |ci| ResolutionCacheKey::new(ci, resolution))
            })
            .collect()
    }
}

/// Records of type `T`, tiered by resolution, plus the covered set.
pub struct ResolutionCache<T, S> {
    covered: Vec<ResolutionCacheKey>,
    records: HashMap<Resolution, HashMap<String, T>>,
    strategy: S,
}

impl<T, S: CacheStrategy<T>> ResolutionCache<T, S> {
    pub fn new(strategy: S) -> Self {
        Self {
            covered: Vec::new(),
            records: HashMap::new(),
            strategy,
        }
    }

    pub fn get_resolution(interval: &Interval) -> Resolution {
        Resolution::for_interval(interval)
    }

    fn tier_for(range: &ContigInterval, resolution: Option<Resolution>) -> Resolution {
        resolution.unwrap_or_else(|| Resolution::for_interval(range.interval()))
    }

    fn covered_at(&self, resolution: Resolution) -> impl Iterator<Item = &ContigInterval> {
        self.covered
            .iter()
            .filter(move |key| key.resolution == resolution)
            .map(|key| &key.contig_interval)
    }

    /// Record `range` as fully fetched. Without a resolution, the tier is
    /// derived from the range length.
    pub fn cover_range(&mut self, range: &ContigInterval, resolution: Option<Resolution>) {
        let resolution = Self::tier_for(range, resolution);
        let mut keys = std::mem::take(&mut self.covered);
        keys.push(ResolutionCacheKey::new(range.clone(), resolution));
        self.covered = ResolutionCacheKey::coalesce(keys);
    }

    /// The sub-ranges of `range` not yet covered at `resolution`.
    pub fn complement_interval(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<ContigInterval> {
        let resolution = Self::tier_for(range, resolution);
        range.complement_intervals(self.covered_at(resolution))
    }

    pub fn covers_range(&self, range: &ContigInterval, resolution: Option<Resolution>) -> bool {
        let resolution = Self::tier_for(range, resolution);
        range.is_covered_by(self.covered_at(resolution))
    }

    /// Insert a record; the first record stored under a key wins.
    ///
    /// Returns `false` if a record with the same key already existed at this
    /// resolution. Without a resolution, the record goes to the unbinned tier.
    pub fn put(&mut self, record: T, resolution: Option<Resolution>) -> bool {
        let resolution = resolution.unwrap_or(Resolution::BASE);
        let key = self.strategy.key(&record);
        let tier = self.records.entry(resolution).or_default();
        if tier.contains_key(&key) {
            return false;
        }
        tier.insert(key, record);
        true
    }

    /// Cached records matching `range`, in no particular order.
    ///
    /// Without a resolution only the unbinned tier is searched.
    pub fn get(&self, range: &ContigInterval, resolution: Option<Resolution>) -> Vec<&T> {
        let tier = resolution.unwrap_or(Resolution::BASE);
        self.records
            .get(&tier)
            .map(|records| {
                records
                    .values()
                    .filter(|record| self.strategy.filter(range, record, resolution))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn covered_ranges(&self) -> &[ResolutionCacheKey] {
        &self.covered
    }

    /// Number of records across all tiers.
    pub fn len(&self) -> usize {
        self.records.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        self.covered.clear();
        self.records.clear();
    }
}
