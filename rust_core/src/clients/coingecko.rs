//! CoinGecko API Client
//!
//! Catalog (`/coins/list`) and daily history (`/coins/{id}/history`) lookups
//! for mention price enrichment.

use super::price_service::{PriceService, ServiceError};
use crate::models::CatalogEntry;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::collections::HashMap;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

const DEMO_API_ROOT: &str = "https://api.coingecko.com/api/v3";
const PRO_API_ROOT: &str = "https://pro-api.coingecko.com/api/v3";

/// Date format the history endpoint expects (dd-mm-yyyy)
pub const HISTORY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Which CoinGecko plan the API key belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApiPlan {
    #[default]
    Demo,
    Pro,
}

impl ApiPlan {
    pub fn default_root(&self) -> &'static str {
        match self {
            ApiPlan::Demo => DEMO_API_ROOT,
            ApiPlan::Pro => PRO_API_ROOT,
        }
    }

    /// Query parameter carrying the API key
    pub fn key_param(&self) -> &'static str {
        match self {
            ApiPlan::Demo => "x_cg_demo_api_key",
            ApiPlan::Pro => "x_cg_pro_api_key",
        }
    }
}

impl FromStr for ApiPlan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "demo" | "" => Ok(ApiPlan::Demo),
            "pro" => Ok(ApiPlan::Pro),
            other => Err(anyhow!("unknown CoinGecko plan: {}", other)),
        }
    }
}

/// Connection settings for [`CoinGeckoClient`]
#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub api_key: Option<String>,
    pub plan: ApiPlan,
    /// Overrides the plan's default root when set
    pub api_root: Option<String>,
    pub timeout_secs: u64,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            plan: ApiPlan::Demo,
            api_root: None,
            timeout_secs: 30,
        }
    }
}

/// CoinGecko API client
pub struct CoinGeckoClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    key_param: &'static str,
}

impl CoinGeckoClient {
    /// Create a client against the public demo API without a key
    pub fn new() -> Result<Self> {
        Self::with_config(CoinGeckoConfig::default())
    }

    pub fn with_config(config: CoinGeckoConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("memeprice/0.1")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self::with_http_client(client, config))
    }

    /// Use a preconfigured reqwest client; `timeout_secs` is ignored
    pub fn with_http_client(client: Client, config: CoinGeckoConfig) -> Self {
        let base_url = config
            .api_root
            .unwrap_or_else(|| config.plan.default_root().to_string())
            .trim_end_matches('/')
            .to_string();

        Self {
            client,
            base_url,
            api_key: config.api_key.filter(|k| !k.is_empty()),
            key_param: config.plan.key_param(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn auth_params(&self) -> Vec<(&str, &str)> {
        match &self.api_key {
            Some(key) => vec![(self.key_param, key.as_str())],
            None => Vec::new(),
        }
    }

    async fn checked(response: Response) -> Result<Vec<u8>, ServiceError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl PriceService for CoinGeckoClient {
    fn service_name(&self) -> &str {
        "CoinGecko"
    }

    async fn coin_list(&self) -> Result<Vec<CatalogEntry>, ServiceError> {
        let url = format!("{}/coins/list", self.base_url);
        debug!("Fetching coin list from CoinGecko");

        let response = self
            .client
            .get(&url)
            .query(&self.auth_params())
            .send()
            .await?;

        let body = Self::checked(response).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn price_on(
        &self,
        coin_id: &str,
        date: NaiveDate,
        quote: &str,
    ) -> Result<Option<f64>, ServiceError> {
        let url = format!("{}/coins/{}/history", self.base_url, coin_id);
        let date_param = format_history_date(date);
        debug!("Fetching {} history for {} from CoinGecko", date_param, coin_id);

        let mut params = vec![("date", date_param.as_str()), ("localization", "false")];
        params.extend(self.auth_params());

        let response = self.client.get(&url).query(&params).send().await?;

        let body = Self::checked(response).await?;
        Ok(parse_history_price(&body, quote)?)
    }
}

/// Render a date the way the history endpoint wants it
pub fn format_history_date(date: NaiveDate) -> String {
    date.format(HISTORY_DATE_FORMAT).to_string()
}

/// Extract `market_data.current_price.<quote>` from a history response body.
///
/// Coins without data for the requested day come back without `market_data`
/// (or without the quote key); that is `Ok(None)`, not an error.
pub fn parse_history_price(body: &[u8], quote: &str) -> Result<Option<f64>, serde_json::Error> {
    let parsed: CoinGeckoHistoryResponse = serde_json::from_slice(body)?;

    Ok(parsed
        .market_data
        .and_then(|md| md.current_price)
        .and_then(|prices| prices.get(&quote.to_lowercase()).and_then(|v| v.as_f64())))
}

/// Internal response struct matching CoinGecko `/coins/{id}/history`
#[derive(Debug, Deserialize)]
struct CoinGeckoHistoryResponse {
    #[serde(default)]
    market_data: Option<CoinGeckoHistoryMarketData>,
}

#[derive(Debug, Deserialize)]
struct CoinGeckoHistoryMarketData {
    #[serde(default)]
    current_price: Option<HashMap<String, serde_json::Value>>,
}
