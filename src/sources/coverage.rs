use super::{Page, RangeDataSource, SourceKind, SourceOptions};
use crate::cache::{LocusStrategy, Resolution};
use crate::interval::ContigInterval;
use crate::types::PositionCount;
use crate::{Error, Result};
use serde::Deserialize;
use serde_json::Value;

/// Read depth per position, served binned at coarse zoom levels.
#[derive(Debug, Clone, Copy, Default)]
pub struct Coverage;

#[derive(Deserialize)]
struct RawCount {
    position: u64,
    count: u64,
}

impl SourceKind for Coverage {
    type Record = PositionCount;
    type Strategy = LocusStrategy;

    const NAME: &'static str = "coverage";

    fn strategy(&self) -> LocusStrategy {
        LocusStrategy::binned()
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            binned: true,
            ..SourceOptions::default()
        }
    }

    /// Counts are filed under the contig that was requested, whatever the
    /// server calls it.
    fn parse(&self, range: &ContigInterval, response: &Value) -> Result<Page<PositionCount>> {
        let items = match response {
            Value::Null => return Ok(Page::last(Vec::new())),
            Value::Array(items) => items,
            other => {
                return Err(Error::InvalidResponse(format!(
                    "expected an array of position counts, got: {}",
                    other
                )));
            }
        };

        let mut records = Vec::with_capacity(items.len());
        for item in items {
            let raw = RawCount::deserialize(item)?;
            records.push(PositionCount {
                contig: range.contig().to_string(),
                position: raw.position,
                count: raw.count,
            });
        }
        Ok(Page::last(records))
    }
}

pub type CoverageDataSource = RangeDataSource<Coverage>;

impl CoverageDataSource {
    pub fn get_coverage_in_range(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<PositionCount> {
        self.get_in_range(range, resolution)
    }

    /// Highest count cached in `range`, or `None` when nothing is cached there.
    pub fn max_coverage(&self, range: &ContigInterval, resolution: Option<Resolution>) -> Option<u64> {
        self.shared
            .cache
            .lock()
            .get(range, resolution)
            .into_iter()
            .map(|p| p.count)
            .max()
    }
}
