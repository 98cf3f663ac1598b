//! Data sources: the glue between a viewer and a remote range endpoint.
//!
//! Every source follows the same protocol, implemented once by
//! [`RangeDataSource`]. The viewer calls [`RangeDataSource::range_changed`]
//! whenever the visible range moves; the source works out which parts of that
//! range it has not fetched yet, marks the whole range covered, and fetches
//! each gap in its own task. As responses arrive, records land in the cache
//! and a [`Notification::NewData`] is published. Reads through
//! [`RangeDataSource::get_in_range`] never touch the network.
//!
//! What varies between sources (record type, keying, fetch rounding, binning,
//! response shape) is described by a [`SourceKind`].

mod alignments;
mod coverage;
mod features;
mod genotypes;
mod karyogram;
mod variants;

pub use alignments::{AlignmentDataSource, AlignmentStrategy, Alignments, MAX_BASE_PAIRS_TO_FETCH};
pub use coverage::{Coverage, CoverageDataSource};
pub use features::{FeatureDataSource, Features};
pub use genotypes::{GenotypeDataSource, Genotypes};
pub use karyogram::{ChromosomeStrategy, Karyogram, KaryogramDataSource};
pub use variants::{VariantDataSource, Variants};

use crate::cache::{CacheStrategy, GenomicRecord, Resolution, ResolutionCache};
use crate::interval::ContigInterval;
use crate::remote::{FetchOptions, MAX_REQUEST_SPAN, RemoteRequest};
use crate::types::GenomeRange;
use crate::{Error, Result};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Lifecycle events published by a data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Records for this range are now in the cache.
    NewData(ContigInterval),
    /// Fetches are about to start.
    NetworkProgress(Progress),
    /// One gap's fetch has settled, successfully or not.
    NetworkDone,
    /// A fetch failed; the message is human-readable.
    NetworkFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// Number of gaps dispatched by one range change.
    Gaps(usize),
    /// Running request count for one gap that is being paged through.
    Requests(usize),
}

/// How a requested range is widened before gaps are computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchAlignment {
    #[default]
    None,
    /// See [`ContigInterval::expand`].
    Expand { bucket: u64, min_start: u64 },
    /// See [`ContigInterval::round`].
    Round { multiple: u64, zero_based: bool },
}

impl FetchAlignment {
    pub fn apply(&self, range: &ContigInterval) -> ContigInterval {
        match *self {
            FetchAlignment::None => range.clone(),
            FetchAlignment::Expand { bucket, min_start } => range.expand(bucket, min_start),
            FetchAlignment::Round {
                multiple,
                zero_based,
            } => range.round(multiple, zero_based),
        }
    }
}

/// Per-source fetch tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceOptions {
    pub alignment: FetchAlignment,
    /// Widened ranges longer than this are silently not fetched.
    pub max_span: u64,
    /// Whether requests carry a `binning` option and records are tiered by resolution.
    /// Unbinned sources keep everything at [`Resolution::BASE`].
    pub binned: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        Self {
            alignment: FetchAlignment::None,
            max_span: MAX_REQUEST_SPAN,
            binned: false,
        }
    }
}

/// Records parsed from one response, plus the token for the next page, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub records: Vec<T>,
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    /// A page with nothing after it.
    pub fn last(records: Vec<T>) -> Self {
        Self {
            records,
            next_page_token: None,
        }
    }
}

/// The per-record-type half of a data source.
pub trait SourceKind: Send + Sync + 'static {
    type Record: GenomicRecord + Clone + Send + Sync + 'static;
    type Strategy: CacheStrategy<Self::Record> + 'static;

    /// Name used in log output.
    const NAME: &'static str;

    fn strategy(&self) -> Self::Strategy;

    fn options(&self) -> SourceOptions;

    /// Turn one response for `range` into records.
    fn parse(&self, range: &ContigInterval, response: &Value) -> Result<Page<Self::Record>>;
}

/// Decode a JSON array of records; `null` (an empty body) is no records.
pub(crate) fn parse_records<T: DeserializeOwned>(response: &Value) -> Result<Vec<T>> {
    match response {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| T::deserialize(item).map_err(Error::from))
            .collect(),
        other => Err(Error::InvalidResponse(format!(
            "expected an array of records, got: {}",
            other
        ))),
    }
}

/// Handles to the fetch tasks started by one range change.
///
/// Dropping this does not cancel anything; the fetches complete in the
/// background and still populate the cache.
#[derive(Debug, Default)]
pub struct PendingFetches {
    handles: Vec<JoinHandle<()>>,
}

impl PendingFetches {
    fn none() -> Self {
        Self::default()
    }

    /// Number of gaps being fetched.
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Wait until every gap's fetch has settled.
    pub async fn wait(self) {
        for handle in self.handles {
            if let Err(e) = handle.await {
                tracing::error!("fetch task failed: {}", e);
            }
        }
    }
}

struct Shared<K: SourceKind> {
    kind: K,
    options: SourceOptions,
    remote: RemoteRequest,
    cache: Mutex<ResolutionCache<K::Record, K::Strategy>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Notification>>>,
}

/// Fetch orchestration for one remote endpoint and one record type.
///
/// Cloning is cheap and clones share the same cache, fetcher and subscribers.
pub struct RangeDataSource<K: SourceKind> {
    shared: Arc<Shared<K>>,
}

impl<K: SourceKind> Clone for RangeDataSource<K> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<K: SourceKind> RangeDataSource<K> {
    pub fn new(kind: K, remote: RemoteRequest) -> Self {
        let options = kind.options();
        let cache = Mutex::new(ResolutionCache::new(kind.strategy()));
        Self {
            shared: Arc::new(Shared {
                kind,
                options,
                remote,
                cache,
                subscribers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a source fetching over HTTP from `url`.
    #[cfg(feature = "http")]
    pub fn from_url(kind: K, url: &str) -> Result<Self> {
        Ok(Self::new(kind, RemoteRequest::http(url)?))
    }

    pub fn kind(&self) -> &K {
        &self.shared.kind
    }

    pub fn options(&self) -> &SourceOptions {
        &self.shared.options
    }

    /// Receive every notification published from now on.
    ///
    /// Each subscriber gets its own unbounded queue, so a slow reader never
    /// loses events. The receiver yields `None` once every clone of this
    /// source has been dropped and all fetches have settled.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<Notification> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.shared.subscribers.lock().push(tx);
        rx
    }

    /// Resolution tier used for a view of `range`.
    pub fn resolution_for(&self, range: &ContigInterval) -> Resolution {
        if self.shared.options.binned {
            Resolution::for_interval(range.interval())
        } else {
            Resolution::BASE
        }
    }

    /// The viewer moved to `range`; start fetching whatever is missing.
    ///
    /// An invalid range (start after stop) is logged and ignored.
    pub fn range_changed(&self, range: &GenomeRange) -> PendingFetches {
        match ContigInterval::try_from(range) {
            Ok(interval) => self.request(&interval),
            Err(e) => {
                tracing::warn!(source = K::NAME, "ignoring range change: {}", e);
                PendingFetches::none()
            }
        }
    }

    /// Fetch the uncovered parts of `range`.
    ///
    /// Covering happens before this returns, so any later call for an
    /// overlapping range only sees what is still missing. Fetches run on the
    /// current Tokio runtime; called outside one, nothing is covered or
    /// fetched and a warning is logged.
    pub fn request(&self, range: &ContigInterval) -> PendingFetches {
        let shared = &self.shared;
        let Ok(runtime) = Handle::try_current() else {
            tracing::warn!(source = K::NAME, %range, "no Tokio runtime, not fetching");
            return PendingFetches::none();
        };
        // The tier comes from the range as viewed, not as widened.
        let resolution = self.resolution_for(range);
        let interval = shared.options.alignment.apply(range);

        if interval.length() > shared.options.max_span {
            tracing::debug!(source = K::NAME, %interval, "range too large, not fetching");
            return PendingFetches::none();
        }

        let gaps = {
            let mut cache = shared.cache.lock();
            if cache.covers_range(range, Some(resolution)) {
                tracing::debug!(source = K::NAME, %range, %resolution, "range already covered");
                return PendingFetches::none();
            }
            let gaps = cache.complement_interval(&interval, Some(resolution));
            cache.cover_range(&interval, Some(resolution));
            gaps
        };

        if gaps.is_empty() {
            return PendingFetches::none();
        }

        shared.notify(Notification::NetworkProgress(Progress::Gaps(gaps.len())));
        let handles = gaps
            .into_iter()
            .map(|gap| {
                let shared = Arc::clone(&self.shared);
                runtime.spawn(async move { shared.fetch_gap(gap, resolution).await })
            })
            .collect();

        PendingFetches { handles }
    }

    /// [`range_changed`](Self::range_changed), then wait for every gap to settle.
    pub async fn fetch(&self, range: &GenomeRange) {
        self.range_changed(range).wait().await
    }

    /// Cached records in `range`, sorted by position.
    ///
    /// Only ranges for which [`covers_range`](Self::covers_range) holds are
    /// guaranteed complete. Without a resolution, the unbinned tier is read.
    pub fn get_in_range(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<K::Record> {
        let mut records: Vec<K::Record> = self
            .shared
            .cache
            .lock()
            .get(range, resolution)
            .into_iter()
            .cloned()
            .collect();
        records.sort_by_key(|record| (record.start(), record.stop()));
        records
    }

    pub fn covers_range(&self, range: &ContigInterval, resolution: Option<Resolution>) -> bool {
        self.shared.cache.lock().covers_range(range, resolution)
    }

    pub fn num_network_requests(&self) -> usize {
        self.shared.remote.num_network_requests()
    }

    /// Forget everything: covered set, records and fetched chunks.
    pub fn clear(&self) {
        self.shared.cache.lock().clear();
        self.shared.remote.clear_cache();
    }
}

/// The span actually requested for `gap`.
///
/// The fetcher refuses single-position requests, so a one-base gap asks for
/// the neighbouring base too; the cache filter ignores the extra record.
fn request_span(gap: &ContigInterval) -> (u64, u64) {
    match (gap.start(), gap.stop()) {
        (start, stop) if start < stop => (start, stop),
        (start, stop) if stop < u64::MAX => (start, stop + 1),
        (start, stop) => (start - 1, stop),
    }
}

impl<K: SourceKind> Shared<K> {
    fn notify(&self, notification: Notification) {
        // Receivers that were dropped are forgotten here.
        self.subscribers
            .lock()
            .retain(|tx| tx.send(notification.clone()).is_ok());
    }

    async fn fetch_gap(&self, gap: ContigInterval, resolution: Resolution) {
        let mut options = if self.options.binned {
            FetchOptions::binned(resolution)
        } else {
            FetchOptions::default()
        };
        let mut requests = 1;

        loop {
            match self.fetch_page(&gap, resolution, &options).await {
                Ok(Some(token)) if options.page_token.as_deref() == Some(token.as_str()) => {
                    tracing::warn!(source = K::NAME, %gap, "server repeated page token {}", token);
                    break;
                }
                Ok(Some(token)) => {
                    requests += 1;
                    self.notify(Notification::NetworkProgress(Progress::Requests(requests)));
                    options = options.with_page_token(token);
                }
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!(source = K::NAME, %gap, kind = e.kind(), "fetch failed: {}", e);
                    self.notify(Notification::NetworkFailure(e.to_string()));
                    break;
                }
            }
        }

        self.notify(Notification::NetworkDone);
    }

    /// Fetch and cache one page; returns the next page token.
    async fn fetch_page(
        &self,
        gap: &ContigInterval,
        resolution: Resolution,
        options: &FetchOptions,
    ) -> Result<Option<String>> {
        let (start, stop) = request_span(gap);
        let response = self.remote.get(gap.contig(), start, stop, options).await?;
        let page = self.kind.parse(gap, &response)?;

        let received = page.records.len();
        let mut inserted = 0;
        {
            let mut cache = self.cache.lock();
            for record in page.records {
                if cache.put(record, Some(resolution)) {
                    inserted += 1;
                }
            }
        }
        tracing::info!(source = K::NAME, %gap, received, inserted, "fetched records");

        self.notify(Notification::NewData(gap.clone()));
        Ok(page.next_page_token)
    }
}
