//! Historical price lookups.
//!
//! One throttled Price Service call per lookup. Every failure is logged and
//! turned into an absent price so a single bad coin or date never stops the
//! batch.

use crate::clients::coingecko::format_history_date;
use crate::clients::PriceService;
use crate::models::PricePoint;
use crate::throttle::Throttle;
use chrono::NaiveDate;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default quote currency
pub const DEFAULT_QUOTE: &str = "usd";

/// Per-run fetch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub requests: u64,
    pub priced: u64,
    /// Successful responses without a price for the day
    pub missing: u64,
    pub failed: u64,
    /// Failures the service answered with 429, counted in `failed` too
    pub rate_limited: u64,
}

#[derive(Default)]
struct Counters {
    requests: AtomicU64,
    priced: AtomicU64,
    missing: AtomicU64,
    failed: AtomicU64,
    rate_limited: AtomicU64,
}

/// Throttled point-in-time price lookups
pub struct HistoricalPriceFetcher {
    service: Arc<dyn PriceService>,
    throttle: Arc<dyn Throttle>,
    quote: String,
    counters: Counters,
}

impl HistoricalPriceFetcher {
    pub fn new(service: Arc<dyn PriceService>, throttle: Arc<dyn Throttle>) -> Self {
        Self::with_quote(service, throttle, DEFAULT_QUOTE)
    }

    pub fn with_quote(
        service: Arc<dyn PriceService>,
        throttle: Arc<dyn Throttle>,
        quote: &str,
    ) -> Self {
        Self {
            service,
            throttle,
            quote: quote.to_lowercase(),
            counters: Counters::default(),
        }
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    /// Price of `coin_id` on `date`, or `None` when unavailable for any reason.
    pub async fn fetch(&self, coin_id: &str, date: NaiveDate) -> PricePoint {
        self.counters.requests.fetch_add(1, Ordering::Relaxed);

        let result = self.service.price_on(coin_id, date, &self.quote).await;
        self.throttle.pause().await;

        match result {
            Ok(Some(price)) => {
                self.counters.priced.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "{} on {}: {} {}",
                    coin_id,
                    format_history_date(date),
                    price,
                    self.quote
                );
                Some(price)
            }
            Ok(None) => {
                self.counters.missing.fetch_add(1, Ordering::Relaxed);
                debug!(
                    "No {} price for {} on {}",
                    self.quote,
                    coin_id,
                    format_history_date(date)
                );
                None
            }
            Err(e) if e.is_rate_limited() => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                self.counters.rate_limited.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Rate limited fetching {} on {}; consider raising PRICE_REQUEST_DELAY_MS ({})",
                    coin_id,
                    format_history_date(date),
                    e
                );
                None
            }
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Failed to fetch price for {} on {} ({})",
                    coin_id,
                    format_history_date(date),
                    e
                );
                None
            }
        }
    }

    pub fn stats(&self) -> FetchStats {
        FetchStats {
            requests: self.counters.requests.load(Ordering::Relaxed),
            priced: self.counters.priced.load(Ordering::Relaxed),
            missing: self.counters.missing.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            rate_limited: self.counters.rate_limited.load(Ordering::Relaxed),
        }
    }
}
