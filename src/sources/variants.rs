use super::{FetchAlignment, Page, RangeDataSource, SourceKind, SourceOptions};
use crate::cache::{LocusStrategy, Resolution};
use crate::interval::ContigInterval;
use crate::types::{Variant, VariantContext};
use crate::{Error, Result};
use serde_json::Value;

const BASE_PAIRS_PER_FETCH: u64 = 10_000;

/// Variants (and, when samples are known, their genotype calls).
#[derive(Debug, Clone, Default)]
pub struct Variants {
    samples: Option<Vec<String>>,
}

impl Variants {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_samples(samples: Vec<String>) -> Self {
        Self {
            samples: Some(samples),
        }
    }
}

/// Endpoints may send each variant as an object or as a JSON-encoded string,
/// with or without the surrounding context.
pub(super) fn parse_variant(item: &Value) -> Result<VariantContext> {
    if let Value::String(encoded) = item {
        let decoded: Value = serde_json::from_str(encoded)?;
        return parse_variant(&decoded);
    }

    if item.get("variant").is_some() {
        Ok(serde_json::from_value(item.clone())?)
    } else {
        let variant: Variant = serde_json::from_value(item.clone())?;
        Ok(VariantContext {
            variant,
            sample_ids: Vec::new(),
        })
    }
}

impl SourceKind for Variants {
    type Record = VariantContext;
    type Strategy = LocusStrategy;

    const NAME: &'static str = "variants";

    fn strategy(&self) -> LocusStrategy {
        LocusStrategy::new()
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            alignment: FetchAlignment::Expand {
                bucket: BASE_PAIRS_PER_FETCH,
                min_start: 1,
            },
            binned: true,
            ..SourceOptions::default()
        }
    }

    fn parse(&self, _range: &ContigInterval, response: &Value) -> Result<Page<VariantContext>> {
        let records = match response {
            Value::Null => Vec::new(),
            Value::Array(items) => items.iter().map(parse_variant).collect::<Result<_>>()?,
            other => {
                return Err(Error::InvalidResponse(format!(
                    "expected an array of variants, got: {}",
                    other
                )));
            }
        };
        Ok(Page::last(records))
    }
}

pub type VariantDataSource = RangeDataSource<Variants>;

impl VariantDataSource {
    pub fn get_variants_in_range(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<Variant> {
        self.get_in_range(range, resolution)
            .into_iter()
            .map(|context| context.variant)
            .collect()
    }

    /// Variant contexts with their calls; empty when no samples were configured.
    pub fn get_genotypes_in_range(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<VariantContext> {
        if self.kind().samples.is_none() {
            return Vec::new();
        }
        self.get_in_range(range, resolution)
    }

    pub fn samples(&self) -> Result<&[String]> {
        self.kind()
            .samples
            .as_deref()
            .ok_or_else(|| Error::InvalidInput("no samples for genotypes".to_string()))
    }
}
