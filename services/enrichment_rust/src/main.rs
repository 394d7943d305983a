use anyhow::Result;
use dotenv::dotenv;
use enrichment_rust::EnrichmentConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting mention price enrichment...");

    let config = EnrichmentConfig::from_env()?;
    info!(
        "Posts: {} | Catalog cache: {} | Output: {}",
        config.posts_path.display(),
        config.catalog_cache_path.display(),
        config.output_path.display()
    );
    info!(
        "Offset: {}m | Delay: {}ms | Quote: {}",
        config.offset_minutes, config.request_delay_ms, config.quote_currency
    );
    if config.coingecko.api_key.is_none() {
        info!("COINGECKO_API_KEY not set; using keyless access");
    }

    enrichment_rust::run(&config).await?;

    info!("Done");
    Ok(())
}
