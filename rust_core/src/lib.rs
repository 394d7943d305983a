//! Memeprice Core - Ticker mention resolution and historical pricing.
//!
//! This module provides:
//! - `$SYMBOL` extraction and normalization from free text
//! - Catalog-backed symbol -> identifier index with JSON snapshot caching
//! - Throttled, failure-tolerant daily price lookups (CoinGecko)
//! - Mention fan-out, two-point pricing and stable ordering of results
//!
//! Every remote failure degrades to an absent price for the affected row;
//! nothing in the pipeline aborts a batch.

pub mod clients;
pub mod enrichment;
pub mod extract;
pub mod history;
pub mod models;
pub mod symbol_index;
pub mod throttle;
pub mod utils;

pub use enrichment::{expand_mentions, sort_rows, Enricher, EnrichmentOutput, EnrichmentSummary};
pub use extract::{extract_symbols, normalize_symbol};
pub use history::{FetchStats, HistoricalPriceFetcher};
pub use models::{CatalogEntry, EnrichedRow, Mention, Post, PricePoint};
pub use symbol_index::{CatalogSource, SymbolIndex};
pub use throttle::{FixedDelayThrottle, Sleeper, Throttle, TokioSleeper};
