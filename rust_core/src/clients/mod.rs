pub mod coingecko;
pub mod price_service;

// Re-export commonly used types
pub use coingecko::{ApiPlan, CoinGeckoClient, CoinGeckoConfig};
pub use price_service::{PriceService, ServiceError};
