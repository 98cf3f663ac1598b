use super::{FetchAlignment, Page, RangeDataSource, SourceKind, SourceOptions, parse_records};
use crate::Result;
use crate::cache::{Resolution, SpanStrategy};
use crate::interval::ContigInterval;
use crate::types::Feature;
use serde_json::Value;

// Requests are widened to multiples of this so that panning rarely needs
// another round trip.
const BASE_PAIRS_PER_FETCH: u64 = 10_000;

/// Annotation features served as a JSON array.
#[derive(Debug, Clone, Copy, Default)]
pub struct Features;

impl SourceKind for Features {
    type Record = Feature;
    type Strategy = SpanStrategy;

    const NAME: &'static str = "features";

    fn strategy(&self) -> SpanStrategy {
        SpanStrategy
    }

    fn options(&self) -> SourceOptions {
        SourceOptions {
            alignment: FetchAlignment::Expand {
                bucket: BASE_PAIRS_PER_FETCH,
                min_start: 0,
            },
            binned: true,
            ..SourceOptions::default()
        }
    }

    fn parse(&self, _range: &ContigInterval, response: &Value) -> Result<Page<Feature>> {
        Ok(Page::last(parse_records(response)?))
    }
}

pub type FeatureDataSource = RangeDataSource<Features>;

impl FeatureDataSource {
    pub fn get_features_in_range(
        &self,
        range: &ContigInterval,
        resolution: Option<Resolution>,
    ) -> Vec<Feature> {
        self.get_in_range(range, resolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::RemoteRequest;
    use crate::remote::mock::MockTransport;
    use crate::types::GenomeRange;
    use serde_json::json;
    use std::sync::Arc;

    fn fixture() -> Value {
        json!([
            {"id": "4ee7469a-b468-429b-a109-07a484817037", "featureType": "exon",
             "contig": "chrM", "start": 1107, "stop": 1200, "score": 1000},
            {"id": "e105ce29-a840-4fc6-819f-a9aac5166163", "featureType": "gene",
             "contig": "chrM", "start": 1011, "stop": 1400, "score": 1000}
        ])
    }

    fn source() -> (FeatureDataSource, Arc<MockTransport>) {
        let transport = Arc::new(MockTransport::new(|url| {
            if url.path() == "/features/chrM" {
                Ok(fixture())
            } else {
                Ok(Value::Null)
            }
        }));
        let remote = RemoteRequest::new("http://localhost/features", transport.clone()).unwrap();
        (FeatureDataSource::new(Features, remote), transport)
    }

    #[tokio::test]
    async fn test_extract_features_in_range() {
        let (source, transport) = source();
        let range = ContigInterval::new("chrM", 1000, 1200);

        assert!(source.get_features_in_range(&range, None).is_empty());

        source.fetch(&GenomeRange::new("chrM", 1000, 1200)).await;

        let features = source.get_features_in_range(&range, None);
        assert_eq!(features.len(), 2);
        assert_eq!(features[0].start, 1011);
        assert_eq!(features[0].contig, "chrM");
        assert_eq!(features[1].start, 1107);
        assert_eq!(
            transport.urls(),
            vec!["http://localhost/features/chrM?start=0&end=10000&binning=1".to_string()]
        );
    }

    #[tokio::test]
    async fn test_no_feature_data_is_not_an_error() {
        let (source, _) = source();
        let range = ContigInterval::new("chr2", 1, 100);

        source.fetch(&GenomeRange::new("chr2", 1, 100)).await;

        assert!(source.covers_range(&range, None));
        assert!(source.get_features_in_range(&range, None).is_empty());
    }
}
