use super::{Page, RangeDataSource, SourceKind, SourceOptions, parse_records};
use crate::cache::{CacheStrategy, Resolution};
use crate::interval::ContigInterval;
use crate::types::Chromosome;
use crate::{Error, Result};
use serde_json::Value;

/// Chromosome ideograms with their cytobands.
#[derive(Debug, Clone, Copy, Default)]
pub struct Karyogram;

/// One record per chromosome name; a query returns the chromosome the range
/// is on, regardless of position.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromosomeStrategy;

impl CacheStrategy<Chromosome> for ChromosomeStrategy {
    fn key(&self, record: &Chromosome) -> String {
        record.name.clone()
    }

    fn filter(&self, range: &ContigInterval, record: &Chromosome, _resolution: Option<Resolution>) -> bool {
        range.chr_on_contig(&record.name)
    }
}

impl SourceKind for Karyogram {
    type Record = Chromosome;
    type Strategy = ChromosomeStrategy;

    const NAME: &'static str = "karyogram";

    fn strategy(&self) -> ChromosomeStrategy {
        ChromosomeStrategy
    }

    fn options(&self) -> SourceOptions {
        SourceOptions::default()
    }

    /// Accepts a bare array, or a `{"chromosomes": [...], "nextPageToken": ..}` page.
    fn parse(&self, _range: &ContigInterval, response: &Value) -> Result<Page<Chromosome>> {
        match response {
            Value::Object(body) => {
                let records = match body.get("chromosomes") {
                    Some(chromosomes) => parse_records(chromosomes)?,
                    None => Vec::new(),
                };
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
            Value::Null | Value::Array(_) => Ok(Page::last(parse_records(response)?)),
            other => Err(Error::InvalidResponse(format!(
                "expected chromosomes, got: {}",
                other
            ))),
        }
    }
}

pub type KaryogramDataSource = RangeDataSource<Karyogram>;

impl KaryogramDataSource {
    pub fn get_chromosomes_in_range(&self, range: &ContigInterval) -> Vec<Chromosome> {
        self.get_in_range(range, Some(Resolution::BASE))
    }
}
