use super::Resolution;
use crate::interval::ContigInterval;

/// A record that sits at a position (or span) on a contig.
pub trait GenomicRecord {
    fn contig(&self) -> &str;

    fn start(&self) -> u64;

    /// Last position covered by the record; single-position records end where they start.
    fn stop(&self) -> u64 {
        self.start()
    }
}

/// How a [`ResolutionCache`](super::ResolutionCache) identifies and selects records.
///
/// `key` decides deduplication: two records with the same key at the same
/// resolution are the same record. `filter` decides whether a cached record
/// belongs in the answer to a range query.
pub trait CacheStrategy<T>: Send + Sync {
    fn key(&self, record: &T) -> String;

    fn filter(&self, range: &ContigInterval, record: &T, resolution: Option<Resolution>) -> bool;
}

/// Records with an extent, selected when they overlap the query range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanStrategy;

impl<T: GenomicRecord> CacheStrategy<T> for SpanStrategy {
    fn key(&self, record: &T) -> String {
        format!("{}:{}-{}", record.contig(), record.start(), record.stop())
    }

    fn filter(&self, range: &ContigInterval, record: &T, _resolution: Option<Resolution>) -> bool {
        range.on_contig(record.contig())
            && record.start() <= range.stop()
            && range.start() <= record.stop()
    }
}

/// Single-position records, selected when their locus falls inside the query
/// range. Contig names match with or without a `chr` prefix.
///
/// When `binned`, a query at a given resolution only returns records sitting
/// on a bin boundary (`position % resolution == 0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct LocusStrategy {
    binned: bool,
}

impl LocusStrategy {
    pub fn new() -> Self {
        Self { binned: false }
    }

    pub fn binned() -> Self {
        Self { binned: true }
    }
}

impl<T: GenomicRecord> CacheStrategy<T> for LocusStrategy {
    fn key(&self, record: &T) -> String {
        format!("{}:{}", record.contig(), record.start())
    }

    fn filter(&self, range: &ContigInterval, record: &T, resolution: Option<Resolution>) -> bool {
        if !range.chr_contains_locus(record.contig(), record.start()) {
            return false;
        }
        match resolution {
            Some(res) if self.binned => record.start() % res.bases_per_bin() == 0,
            _ => true,
        }
    }
}
