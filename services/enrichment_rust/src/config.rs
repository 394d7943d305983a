//! Configuration for enrichment_rust

use anyhow::{anyhow, Result};
use memeprice_core::clients::coingecko::{ApiPlan, CoinGeckoConfig};
use memeprice_core::enrichment::DEFAULT_OFFSET_MINUTES;
use memeprice_core::history::DEFAULT_QUOTE;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EnrichmentConfig {
    // Price Service
    pub coingecko: CoinGeckoConfig,
    pub request_delay_ms: u64,
    pub quote_currency: String,

    // Pricing policy
    pub offset_minutes: i64,

    // Files
    pub catalog_cache_path: PathBuf,
    pub posts_path: PathBuf,
    pub output_path: PathBuf,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            coingecko: CoinGeckoConfig::default(),
            request_delay_ms: 2000,
            quote_currency: DEFAULT_QUOTE.to_string(),
            offset_minutes: DEFAULT_OFFSET_MINUTES,
            catalog_cache_path: PathBuf::from("coin_ids.json"),
            posts_path: PathBuf::from("posts.jsonl"),
            output_path: PathBuf::from("tweet_historical_prices.csv"),
        }
    }
}

impl EnrichmentConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let plan: ApiPlan = env::var("COINGECKO_API_PLAN")
            .unwrap_or_else(|_| "demo".to_string())
            .parse()?;

        let quote_currency = env::var("QUOTE_CURRENCY")
            .unwrap_or_else(|_| DEFAULT_QUOTE.to_string())
            .trim()
            .to_lowercase();
        if quote_currency.is_empty() {
            return Err(anyhow!("QUOTE_CURRENCY must not be empty"));
        }

        let offset_minutes = parse_i64("PRICE_OFFSET_MINUTES", defaults.offset_minutes)?;
        offset_from_minutes(offset_minutes)?;

        let timeout_secs = parse_u64("COINGECKO_TIMEOUT_SECS", 30)?;
        if timeout_secs == 0 {
            return Err(anyhow!("COINGECKO_TIMEOUT_SECS must be > 0"));
        }

        Ok(Self {
            coingecko: CoinGeckoConfig {
                api_key: env::var("COINGECKO_API_KEY").ok(),
                plan,
                api_root: env::var("COINGECKO_API_ROOT").ok().filter(|s| !s.is_empty()),
                timeout_secs,
            },
            request_delay_ms: parse_u64("PRICE_REQUEST_DELAY_MS", defaults.request_delay_ms)?,
            quote_currency,
            offset_minutes,
            catalog_cache_path: parse_path("CATALOG_CACHE_PATH", defaults.catalog_cache_path),
            posts_path: parse_path("POSTS_PATH", defaults.posts_path),
            output_path: parse_path("OUTPUT_PATH", defaults.output_path),
        })
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn offset(&self) -> Result<chrono::Duration> {
        offset_from_minutes(self.offset_minutes)
    }
}

/// Second price point offset; rejects values chrono cannot represent
fn offset_from_minutes(minutes: i64) -> Result<chrono::Duration> {
    chrono::Duration::try_minutes(minutes)
        .ok_or_else(|| anyhow!("PRICE_OFFSET_MINUTES out of range: {}", minutes))
}

/// Parse environment variable as u64 with default fallback
fn parse_u64(var_name: &str, default: u64) -> Result<u64> {
    match env::var(var_name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid u64", var_name)),
        Err(_) => Ok(default),
    }
}

/// Parse environment variable as i64 with default fallback
fn parse_i64(var_name: &str, default: i64) -> Result<i64> {
    match env::var(var_name) {
        Ok(val) => val
            .trim()
            .parse()
            .map_err(|_| anyhow!("{} must be a valid i64", var_name)),
        Err(_) => Ok(default),
    }
}

fn parse_path(var_name: &str, default: PathBuf) -> PathBuf {
    env::var(var_name)
        .ok()
        .filter(|s| !s.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-driven loading is not tested directly; tests run in parallel and
    // share the process environment.

    #[test]
    fn test_parse_u64_with_default() {
        assert_eq!(parse_u64("NON_EXISTENT_VAR_MEMEPRICE_U64", 2000).unwrap(), 2000);
    }

    #[test]
    fn test_parse_i64_with_default() {
        assert_eq!(parse_i64("NON_EXISTENT_VAR_MEMEPRICE_I64", 60).unwrap(), 60);
    }

    #[test]
    fn test_parse_path_with_default() {
        assert_eq!(
            parse_path("NON_EXISTENT_VAR_MEMEPRICE_PATH", PathBuf::from("coin_ids.json")),
            PathBuf::from("coin_ids.json")
        );
    }

    #[test]
    fn test_defaults() {
        let config = EnrichmentConfig::default();
        assert_eq!(config.request_delay(), Duration::from_secs(2));
        assert_eq!(config.offset().unwrap(), chrono::Duration::minutes(60));
        assert_eq!(config.quote_currency, "usd");
        assert_eq!(config.coingecko.plan, ApiPlan::Demo);
    }

    #[test]
    fn test_offset_from_minutes_bounds() {
        assert_eq!(offset_from_minutes(-30).unwrap(), chrono::Duration::minutes(-30));
        assert!(offset_from_minutes(i64::MAX).is_err());
        assert!(offset_from_minutes(i64::MIN).is_err());
    }

    #[test]
    fn test_out_of_range_offset_is_an_error() {
        let config = EnrichmentConfig {
            offset_minutes: i64::MAX / 2,
            ..Default::default()
        };
        let err = config.offset().unwrap_err();
        assert!(err.to_string().contains("PRICE_OFFSET_MINUTES"));
    }
}
