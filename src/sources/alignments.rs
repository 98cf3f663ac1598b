use super::{FetchAlignment, Page, RangeDataSource, SourceKind, SourceOptions};
use crate::cache::{CacheStrategy, GenomicRecord, Resolution};
use crate::interval::ContigInterval;
use crate::types::Alignment;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Rounded views wider than this are not fetched; reads at that zoom are
/// too dense to be useful.
pub const MAX_BASE_PAIRS_TO_FETCH: u64 = 40_000;

const BASE_PAIRS_PER_FETCH: u64 = 1_000;

/// Reads from a GA4GH-style endpoint, paged with `nextPageToken`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Alignments;

/// Reads are keyed by fragment and read number, so the same read returned
/// for two neighbouring gaps is stored once.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlignmentStrategy;

impl CacheStrategy<Alignment> for AlignmentStrategy {
    fn key(&self, record: &Alignment) -> String {
        record.key()
    }

    fn filter(&self, range: &ContigInterval, record: &Alignment, _resolution: Option<Resolution>) -> bool {
        range.chr_on_contig(record.contig())
            && record.start() <= range.stop()
            && range.start() <= record.stop()
    }
}

impl SourceKind for Alignments {
    type Record = Alignment;
    type Strategy = AlignmentStrategy;

    const NAME: &'static str = "alignments";

    fn strategy(&self) -> AlignmentStrategy {
        AlignmentStrategy
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            alignment: FetchAlignment::Round {
                multiple: BASE_PAIRS_PER_FETCH,
                zero_based: false,
            },
            max_span: MAX_BASE_PAIRS_TO_FETCH,
            binned: false,
        }
    }

    fn parse(&self, range: &ContigInterval, response: &Value) -> Result<Page<Alignment>> {
        let body = match response {
            Value::Null => return Ok(Page::last(Vec::new())),
            Value::Object(body) => body,
            other => {
                return Err(Error::InvalidResponse(format!(
                    "expected an alignments object, got: {}",
                    other
                )));
            }
        };

        let mut records = Vec::new();
        if let Some(Value::Array(items)) = body.get("alignments") {
            for item in items {
                match Alignment::deserialize(item) {
                    Ok(alignment) => records.push(alignment),
                    Err(e) => tracing::debug!(%range, "skipping malformed alignment: {}", e),
                }
            }
        }

        let next_page_token = body
            .get("nextPageToken")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string);

        Ok(Page {
            records,
            next_page_token,
        })
    }
}

pub type AlignmentDataSource = RangeDataSource<Alignments>;

impl AlignmentDataSource {
    pub fn get_alignments_in_range(&self, range: &ContigInterval) -> Vec<Alignment> {
        self.get_in_range(range, Some(Resolution::BASE))
    }
}
