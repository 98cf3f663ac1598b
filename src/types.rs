use crate::cache::GenomicRecord;
use crate::interval::ContigInterval;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize};

/// A view range as sent by the viewer on every pan or zoom.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenomeRange {
    pub contig: String,
    pub start: u64,
    pub stop: u64,
}

impl GenomeRange {
    pub fn new(contig: impl Into<String>, start: u64, stop: u64) -> Self {
        Self {
            contig: contig.into(),
            start,
            stop,
        }
    }
}

impl TryFrom<&GenomeRange> for ContigInterval {
    type Error = Error;

    fn try_from(range: &GenomeRange) -> Result<Self> {
        ContigInterval::try_new(range.contig.clone(), range.start, range.stop)
    }
}

impl From<&ContigInterval> for GenomeRange {
    fn from(range: &ContigInterval) -> Self {
        Self::new(range.contig(), range.start(), range.stop())
    }
}

/// Annotation feature (gene, exon, peak, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feature {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub feature_type: String,
    pub contig: String,
    pub start: u64,
    pub stop: u64,
    #[serde(default)]
    pub score: f64,
}

impl GenomicRecord for Feature {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.start
    }

    fn stop(&self) -> u64 {
        self.stop
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub contig: String,
    pub position: u64,
    #[serde(default)]
    pub end: Option<u64>,
    #[serde(rename = "ref", default)]
    pub reference: String,
    #[serde(default)]
    pub alt: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// A variant together with the samples called at it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantContext {
    pub variant: Variant,
    #[serde(rename = "sampleIds", default)]
    pub sample_ids: Vec<String>,
}

/// Genotype sources serve the same shape as variant contexts.
pub type Genotype = VariantContext;

impl GenomicRecord for VariantContext {
    fn contig(&self) -> &str {
        &self.variant.contig
    }

    fn start(&self) -> u64 {
        self.variant.position
    }
}

/// Read depth at one position (or one bin, when binned).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionCount {
    #[serde(default)]
    pub contig: String,
    pub position: u64,
    pub count: u64,
}

impl GenomicRecord for PositionCount {
    fn contig(&self) -> &str {
        &self.contig
    }

    fn start(&self) -> u64 {
        self.position
    }
}

/// GA4GH read alignment, reduced to what placement needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alignment {
    #[serde(default)]
    pub id: String,
    pub fragment_name: String,
    #[serde(default, deserialize_with = "u64_or_string")]
    pub read_number: u64,
    pub alignment: LinearAlignment,
    #[serde(default)]
    pub aligned_sequence: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinearAlignment {
    pub position: AlignmentPosition,
    #[serde(default)]
    pub mapping_quality: u32,
    #[serde(default)]
    pub cigar: Vec<CigarUnit>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlignmentPosition {
    pub reference_name: String,
    #[serde(deserialize_with = "u64_or_string")]
    pub position: u64,
    #[serde(default)]
    pub reverse_strand: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CigarUnit {
    pub operation: CigarOperation,
    #[serde(deserialize_with = "u64_or_string")]
    pub operation_length: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CigarOperation {
    AlignmentMatch,
    Insert,
    Delete,
    Skip,
    ClipSoft,
    ClipHard,
    Pad,
    SequenceMatch,
    SequenceMismatch,
}

impl CigarOperation {
    pub fn consumes_reference(&self) -> bool {
        matches!(
            self,
            CigarOperation::AlignmentMatch
                | CigarOperation::Delete
                | CigarOperation::Skip
                | CigarOperation::SequenceMatch
                | CigarOperation::SequenceMismatch
        )
    }
}

impl Alignment {
    /// Identifies a read within its fragment; mates share a fragment name.
    pub fn key(&self) -> String {
        format!("{}:{}", self.fragment_name, self.read_number)
    }

    /// Number of reference bases spanned by the CIGAR.
    pub fn reference_length(&self) -> u64 {
        self.alignment
            .cigar
            .iter()
            .filter(|unit| unit.operation.consumes_reference())
            .map(|unit| unit.operation_length)
            .sum()
    }
}

impl GenomicRecord for Alignment {
    fn contig(&self) -> &str {
        &self.alignment.position.reference_name
    }

    fn start(&self) -> u64 {
        self.alignment.position.position
    }

    fn stop(&self) -> u64 {
        self.start() + self.reference_length().saturating_sub(1)
    }
}

/// One chromosome of a karyogram, with its cytobands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chromosome {
    pub name: String,
    #[serde(default)]
    pub length: u64,
    #[serde(default)]
    pub bands: Vec<Band>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub start: u64,
    pub end: u64,
    #[serde(rename = "type", default)]
    pub band_type: String,
}

impl GenomicRecord for Chromosome {
    fn contig(&self) -> &str {
        &self.name
    }

    fn start(&self) -> u64 {
        0
    }

    fn stop(&self) -> u64 {
        self.bands
            .iter()
            .map(|band| band.end)
            .max()
            .unwrap_or(0)
            .max(self.length)
    }
}

/// GA4GH JSON encodes 64-bit integers as strings; accept both forms.
fn u64_or_string<'de, D>(deserializer: D) -> std::result::Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Int(u64),
        Str(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Int(v) => Ok(v),
        Raw::Str(s) => s.parse().map_err(serde::de::Error::custom),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_feature_deserialize() {
        let feature: Feature = serde_json::from_value(json!({
            "id": "ENSG0001",
            "featureType": "gene",
            "contig": "chrM",
            "start": 1011,
            "stop": 1400,
            "score": 1000
        }))
        .unwrap();
        assert_eq!(feature.feature_type, "gene");
        assert_eq!(GenomicRecord::stop(&feature), 1400);
    }

    #[test]
    fn test_alignment_span_from_cigar() {
        let alignment: Alignment = serde_json::from_value(json!({
            "id": "r1",
            "fragmentName": "read/1",
            "readNumber": "1",
            "alignment": {
                "position": {"referenceName": "1", "position": "10000", "reverseStrand": true},
                "mappingQuality": 60,
                "cigar": [
                    {"operation": "CLIP_SOFT", "operationLength": "5"},
                    {"operation": "ALIGNMENT_MATCH", "operationLength": "50"},
                    {"operation": "INSERT", "operationLength": 3},
                    {"operation": "DELETE", "operationLength": "2"},
                    {"operation": "ALIGNMENT_MATCH", "operationLength": "40"}
                ]
            }
        }))
        .unwrap();
        assert_eq!(alignment.reference_length(), 92);
        assert_eq!(GenomicRecord::start(&alignment), 10000);
        assert_eq!(GenomicRecord::stop(&alignment), 10091);
        assert_eq!(alignment.key(), "read/1:1");
    }

    #[test]
    fn test_genome_range_conversion() {
        let range = GenomeRange::new("chr1", 10, 20);
        let ci = ContigInterval::try_from(&range).unwrap();
        assert_eq!(ci, ContigInterval::new("chr1", 10, 20));
        assert_eq!(GenomeRange::from(&ci), range);
        assert!(ContigInterval::try_from(&GenomeRange::new("chr1", 20, 10)).is_err());
    }

    #[test]
    fn test_chromosome_extent() {
        let chr: Chromosome = serde_json::from_value(json!({
            "name": "chr1",
            "bands": [
                {"name": "p36.33", "start": 0, "end": 2300000, "type": "gneg"},
                {"name": "p36.32", "start": 2300000, "end": 5300000, "type": "gpos25"}
            ]
        }))
        .unwrap();
        assert_eq!(GenomicRecord::stop(&chr), 5300000);
        assert_eq!(chr.bands[1].band_type, "gpos25");
    }
}
