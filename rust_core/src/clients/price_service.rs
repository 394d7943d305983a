//! Price Service Trait
//!
//! Common interface for the remote catalog + historical price service.
//! The CoinGecko client is the production implementation; tests plug in
//! in-memory fakes.

use crate::models::CatalogEntry;
use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

/// Failure talking to the Price Service
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Connection, TLS, timeout or body read failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body was not the expected JSON shape
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ServiceError {
    /// HTTP status, when the failure came from the service itself
    pub fn status(&self) -> Option<u16> {
        match self {
            ServiceError::Status { status, .. } => Some(*status),
            ServiceError::Transport(e) => e.status().map(|s| s.as_u16()),
            ServiceError::Decode(_) => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.status() == Some(429)
    }
}

/// Remote catalog and per-asset history endpoints.
///
/// Implementations perform exactly one request per call. Pacing is the
/// caller's job (see [`crate::throttle`]).
#[async_trait]
pub trait PriceService: Send + Sync {
    /// Display name used in logs
    fn service_name(&self) -> &str;

    /// Full symbol -> identifier listing
    async fn coin_list(&self) -> Result<Vec<CatalogEntry>, ServiceError>;

    /// Price of `coin_id` on `date` in `quote` currency.
    ///
    /// `Ok(None)` means the service answered but holds no price for that day.
    async fn price_on(
        &self,
        coin_id: &str,
        date: NaiveDate,
        quote: &str,
    ) -> Result<Option<f64>, ServiceError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_classification() {
        let not_found = ServiceError::Status {
            status: 404,
            body: r#"{"error":"coin not found"}"#.to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_rate_limited());
        assert_eq!(not_found.status(), Some(404));

        let limited = ServiceError::Status {
            status: 429,
            body: String::new(),
        };
        assert!(limited.is_rate_limited());
    }

    #[test]
    fn test_decode_error_has_no_status() {
        let err: ServiceError = serde_json::from_str::<Vec<CatalogEntry>>("{")
            .unwrap_err()
            .into();
        assert_eq!(err.status(), None);
        assert!(err.to_string().starts_with("decode error"));
    }
}
