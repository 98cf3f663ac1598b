use super::variants::parse_variant;
use super::{FetchAlignment, Page, RangeDataSource, SourceKind, SourceOptions};
use crate::cache::{LocusStrategy, Resolution};
use crate::interval::ContigInterval;
use crate::types::Genotype;
use crate::{Error, Result};
use serde_json::Value;

const BASE_PAIRS_PER_FETCH: u64 = 1_000;

/// Genotype calls, one record per variant position.
#[derive(Debug, Clone, Copy, Default)]
pub struct Genotypes;

impl SourceKind for Genotypes {
    type Record = Genotype;
    type Strategy = LocusStrategy;

    const NAME: &'static str = "genotypes";

    fn strategy(&self) -> LocusStrategy {
        LocusStrategy::new()
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            alignment: FetchAlignment::Expand {
                bucket: BASE_PAIRS_PER_FETCH,
                min_start: 1,
            },
            ..SourceOptions::default()
        }
    }

    fn parse(&self, _range: &ContigInterval, response: &Value) -> Result<Page<Genotype>> {
        match response {
            Value::Null => Ok(Page::last(Vec::new())),
            Value::Array(items) => Ok(Page::last(
                items.iter().map(parse_variant).collect::<Result<_>>()?,
            )),
            other => Err(Error::InvalidResponse(format!(
                "expected an array of genotypes, got: {}",
                other
            ))),
        }
    }
}

pub type GenotypeDataSource = RangeDataSource<Genotypes>;

impl GenotypeDataSource {
    pub fn get_genotypes_in_range(&self, range: &ContigInterval) -> Vec<Genotype> {
        self.get_in_range(range, Some(Resolution::BASE))
    }
}
