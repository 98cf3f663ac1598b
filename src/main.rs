use clap::Parser;
use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rangecache::{
    Config,
    config::SourceType,
    sources::{
        Alignments, Coverage, Features, Genotypes, Karyogram, Notification, RangeDataSource,
        SourceKind, Variants,
    },
    types::GenomeRange,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match config.kind {
        SourceType::Features => run(Features, &config).await,
        SourceType::Variants => {
            let kind = match config.samples() {
                Some(samples) => Variants::with_samples(samples),
                None => Variants::new(),
            };
            run(kind, &config).await
        }
        SourceType::Genotypes => run(Genotypes, &config).await,
        SourceType::Coverage => run(Coverage, &config).await,
        SourceType::Alignments => run(Alignments, &config).await,
        SourceType::Karyogram => run(Karyogram, &config).await,
    }
}

async fn run<K>(kind: K, config: &Config) -> anyhow::Result<()>
where
    K: SourceKind,
    K::Record: Serialize,
{
    let source = RangeDataSource::from_url(kind, &config.base_url)?;
    tracing::info!("Fetching {} from {}", K::NAME, config.base_url);

    let mut events = source.subscribe();
    let logger = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                Notification::NetworkFailure(message) => tracing::error!("{}", message),
                event => tracing::debug!(?event, "notification"),
            }
        }
    });

    for region in &config.regions {
        source.fetch(&GenomeRange::from(region)).await;

        let resolution = config.resolution_for(region, source.options().binned);
        let records = source.get_in_range(region, Some(resolution));
        tracing::info!(%region, %resolution, count = records.len(), "records in region");

        for record in &records {
            println!("{}", serde_json::to_string(record)?);
        }
    }

    tracing::info!("{} network requests", source.num_network_requests());

    // Closing the channel ends the logger.
    drop(source);
    logger.await?;

    Ok(())
}
