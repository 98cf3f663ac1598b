use crate::cache::Resolution;
use crate::interval::ContigInterval;
use clap::{Parser, ValueEnum};

/// Which record type the endpoint serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceType {
    Features,
    Variants,
    Genotypes,
    Coverage,
    Alignments,
    Karyogram,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "rangecache")]
#[command(about = "Fetch genomic ranges from a remote endpoint through a resolution-aware cache")]
pub struct Config {
    /// Endpoint base URL; requests go to <base>/<contig>?start=..&end=..
    #[arg(long, env = "RANGECACHE_BASE_URL")]
    pub base_url: String,

    /// Record type served by the endpoint
    #[arg(short, long, env = "RANGECACHE_KIND", value_enum, default_value = "features")]
    pub kind: SourceType,

    /// Region to fetch, as contig:start-stop (repeatable)
    #[arg(short, long = "region", required = true)]
    pub regions: Vec<ContigInterval>,

    /// Resolution tier to read back (bases per bin); defaults to the tier of each region
    #[arg(long, env = "RANGECACHE_RESOLUTION")]
    pub resolution: Option<u32>,

    /// Sample names, for variant sources
    #[arg(long, env = "RANGECACHE_SAMPLES", value_delimiter = ',')]
    pub samples: Vec<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "info")]
    pub log_level: String,
}

impl Config {
    /// Tier used when reading `region` back out of the cache.
    pub fn resolution_for(&self, region: &ContigInterval, binned: bool) -> Resolution {
        match self.resolution {
            Some(bases) => Resolution::new(bases),
            None if binned => Resolution::for_interval(region.interval()),
            None => Resolution::BASE,
        }
    }

    pub fn samples(&self) -> Option<Vec<String>> {
        if self.samples.is_empty() {
            None
        } else {
            Some(self.samples.clone())
        }
    }
}
