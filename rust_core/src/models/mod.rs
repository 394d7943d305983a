// Shared models for the mention price pipeline
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Price in the configured quote currency, or `None` when the service has no
/// data for that identifier/date.
pub type PricePoint = Option<f64>;

// ============================================================================
// Input
// ============================================================================

/// A single post as handed over by the post source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Post {
    pub text: String,
    /// Raw timestamp as found in the source record. Parsed per mention.
    pub posted_at: Option<String>,
    /// Remaining fields of the source record, passed through to the sink.
    pub record: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    pub fn new(text: impl Into<String>, posted_at: Option<&str>) -> Self {
        Self {
            text: text.into(),
            posted_at: posted_at.map(str::to_string),
            record: serde_json::Map::new(),
        }
    }
}

/// One occurrence of a symbol inside a post.
#[derive(Debug, Clone, PartialEq)]
pub struct Mention {
    /// Position of the post in the input sequence
    pub post_index: usize,
    pub post: Post,
    /// Symbol as extracted, e.g. "$DOGE"
    pub raw_symbol: String,
    /// Normalized symbol, e.g. "doge"
    pub symbol: String,
}

// ============================================================================
// Catalog
// ============================================================================

/// One entry of the Price Service catalog (`/coins/list`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub id: String,
    pub symbol: String,
    #[serde(default)]
    pub name: String,
    /// Any other fields of the entry (e.g. `platforms`), kept for the snapshot
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl CatalogEntry {
    pub fn new(id: &str, symbol: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            symbol: symbol.to_string(),
            name: name.to_string(),
            extra: serde_json::Map::new(),
        }
    }
}

// ============================================================================
// Output
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedRow {
    pub post_index: usize,
    pub post: Post,
    pub symbol: String,
    pub posted_at: Option<DateTime<Utc>>,
    pub price_at_mention: PricePoint,
    pub price_at_offset: PricePoint,
}

impl EnrichedRow {
    /// Row with both price points absent.
    pub fn unpriced(mention: Mention, posted_at: Option<DateTime<Utc>>) -> Self {
        Self {
            post_index: mention.post_index,
            post: mention.post,
            symbol: mention.symbol,
            posted_at,
            price_at_mention: None,
            price_at_offset: None,
        }
    }

    pub fn is_priced(&self) -> bool {
        self.price_at_mention.is_some() || self.price_at_offset.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entry_deserializes_without_name() {
        let entry: CatalogEntry =
            serde_json::from_str(r#"{"id":"dogecoin","symbol":"doge"}"#).unwrap();
        assert_eq!(entry.id, "dogecoin");
        assert_eq!(entry.name, "");
        assert!(entry.extra.is_empty());
    }

    #[test]
    fn test_catalog_entry_keeps_unknown_fields() {
        let raw = r#"{"id":"dogecoin","symbol":"doge","name":"Dogecoin","platforms":{"binance-smart-chain":"0xba2a"}}"#;
        let entry: CatalogEntry = serde_json::from_str(raw).unwrap();
        assert!(entry.extra.contains_key("platforms"));

        let written: serde_json::Value = serde_json::to_value(&entry).unwrap();
        let expected: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(written, expected);
    }

    #[test]
    fn test_unpriced_row_keeps_mention_fields() {
        let mention = Mention {
            post_index: 3,
            post: Post::new("gm $DOGE", None),
            raw_symbol: "$DOGE".to_string(),
            symbol: "doge".to_string(),
        };
        let row = EnrichedRow::unpriced(mention, None);
        assert_eq!(row.post_index, 3);
        assert_eq!(row.symbol, "doge");
        assert!(!row.is_priced());
    }
}
