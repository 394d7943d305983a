//! enrichment_rust - Price every ticker mention in a post dump
//!
//! Reads posts, resolves `$SYMBOL` mentions against the CoinGecko catalog,
//! fetches daily prices at post time and a fixed offset later, and writes
//! one CSV row per mention.

pub mod config;
pub mod sink;
pub mod source;

pub use config::EnrichmentConfig;

use anyhow::Result;
use memeprice_core::clients::{CoinGeckoClient, PriceService};
use memeprice_core::enrichment::{EnrichmentSummary, Enricher};
use memeprice_core::history::HistoricalPriceFetcher;
use memeprice_core::symbol_index::SymbolIndex;
use memeprice_core::throttle::{FixedDelayThrottle, Throttle};
use std::sync::Arc;
use tracing::{info, warn};

/// Run against the live CoinGecko API.
pub async fn run(config: &EnrichmentConfig) -> Result<EnrichmentSummary> {
    let service: Arc<dyn PriceService> =
        Arc::new(CoinGeckoClient::with_config(config.coingecko.clone())?);
    let throttle = Arc::new(FixedDelayThrottle::new(config.request_delay()));
    info!(
        "Pausing {}ms after every {} request",
        throttle.delay().as_millis(),
        service.service_name()
    );

    run_with_service(config, service, throttle).await
}

/// Full pipeline with an injected service and throttle.
///
/// Input and output errors abort the run; everything between them degrades
/// to absent prices.
pub async fn run_with_service(
    config: &EnrichmentConfig,
    service: Arc<dyn PriceService>,
    throttle: Arc<dyn Throttle>,
) -> Result<EnrichmentSummary> {
    let offset = config.offset()?;
    let posts = source::load_posts(&config.posts_path)?;

    let index =
        SymbolIndex::load_or_fetch(service.as_ref(), throttle.as_ref(), &config.catalog_cache_path)
            .await;

    let fetcher = HistoricalPriceFetcher::with_quote(service, throttle, &config.quote_currency);
    let output = Enricher::new(&index, &fetcher)
        .with_offset(offset)
        .enrich(&posts)
        .await;

    sink::write_rows(&config.output_path, &output.rows)?;

    log_summary(&output.summary);
    Ok(output.summary)
}

fn log_summary(summary: &EnrichmentSummary) {
    info!(
        "Processed {} posts -> {} mention rows ({} with prices)",
        summary.posts, summary.mentions, summary.priced_rows
    );
    info!(
        "Mentions: {} resolved, {} unresolved, {} without timestamp",
        summary.resolved, summary.unresolved, summary.untimed
    );
    info!(
        "Catalog: {:?} ({} ambiguous symbols resolved to their last entry)",
        summary.catalog, summary.overwritten_symbols
    );
    info!(
        "Price requests: {} sent, {} priced, {} without data, {} failed ({} rate limited)",
        summary.fetch.requests,
        summary.fetch.priced,
        summary.fetch.missing,
        summary.fetch.failed,
        summary.fetch.rate_limited
    );
    if summary.fetch.rate_limited > 0 {
        warn!(
            "{} requests were rate limited; raise PRICE_REQUEST_DELAY_MS",
            summary.fetch.rate_limited
        );
    }
}
