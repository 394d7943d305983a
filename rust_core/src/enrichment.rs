//! Mention enrichment.
//!
//! Expands posts into one mention per extracted symbol, prices each mention at
//! post time and at a fixed offset afterwards, and returns rows sorted by
//! (symbol, posted_at).
//!
//! Rows are never dropped once a mention exists. A mention without a usable
//! timestamp or without a catalog identifier is emitted with both prices
//! absent and costs no remote calls.

use crate::extract::{extract_symbols, normalize_symbol};
use crate::history::{FetchStats, HistoricalPriceFetcher};
use crate::models::{EnrichedRow, Mention, Post};
use crate::symbol_index::{CatalogSource, SymbolIndex};
use crate::utils::timestamps::parse_posted_at;
use chrono::{DateTime, Duration, Utc};
use std::cmp::Ordering;
use tracing::{debug, info, warn};

/// Offset of the second price point, in minutes
pub const DEFAULT_OFFSET_MINUTES: i64 = 60;

/// Counts for the end-of-run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichmentSummary {
    pub posts: usize,
    pub mentions: usize,
    /// Mentions priced through the service (at least one call made)
    pub resolved: usize,
    /// Timestamped mentions whose symbol is not in the index
    pub unresolved: usize,
    /// Mentions without a parseable timestamp
    pub untimed: usize,
    /// Rows with at least one price present
    pub priced_rows: usize,
    pub fetch: FetchStats,
    /// Where the symbol index was loaded from
    pub catalog: CatalogSource,
    /// Catalog symbols shared by several coins; only the last one resolves
    pub overwritten_symbols: usize,
}

/// Rows plus the counts that produced them
#[derive(Debug, Clone)]
pub struct EnrichmentOutput {
    pub rows: Vec<EnrichedRow>,
    pub summary: EnrichmentSummary,
}

/// Flat-map posts into mentions, preserving post order and duplicates.
/// Posts without symbols contribute nothing.
pub fn expand_mentions(posts: &[Post]) -> Vec<Mention> {
    posts
        .iter()
        .enumerate()
        .flat_map(|(post_index, post)| {
            extract_symbols(&post.text)
                .into_iter()
                .map(move |raw_symbol| Mention {
                    post_index,
                    post: post.clone(),
                    symbol: normalize_symbol(&raw_symbol),
                    raw_symbol,
                })
        })
        .collect()
}

/// Stable sort by (symbol, posted_at); rows without a timestamp go last
/// within their symbol.
pub fn sort_rows(rows: &mut [EnrichedRow]) {
    rows.sort_by(|a, b| {
        a.symbol
            .cmp(&b.symbol)
            .then_with(|| cmp_timestamps(a.posted_at, b.posted_at))
    });
}

fn cmp_timestamps(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Drives extraction, resolution and price lookups for a batch of posts.
pub struct Enricher<'a> {
    index: &'a SymbolIndex,
    fetcher: &'a HistoricalPriceFetcher,
    offset: Duration,
}

impl<'a> Enricher<'a> {
    pub fn new(index: &'a SymbolIndex, fetcher: &'a HistoricalPriceFetcher) -> Self {
        Self {
            index,
            fetcher,
            offset: Duration::minutes(DEFAULT_OFFSET_MINUTES),
        }
    }

    pub fn with_offset(mut self, offset: Duration) -> Self {
        self.offset = offset;
        self
    }

    /// Enrich every mention in `posts`, one mention at a time.
    pub async fn enrich(&self, posts: &[Post]) -> EnrichmentOutput {
        let mentions = expand_mentions(posts);
        info!(
            "Extracted {} symbol mentions from {} posts",
            mentions.len(),
            posts.len()
        );

        let mut summary = EnrichmentSummary {
            posts: posts.len(),
            mentions: mentions.len(),
            catalog: self.index.source(),
            overwritten_symbols: self.index.overwritten(),
            ..Default::default()
        };
        let mut rows = Vec::with_capacity(mentions.len());

        for (i, mention) in mentions.into_iter().enumerate() {
            let row = self.enrich_mention(mention, &mut summary).await;
            if row.is_priced() {
                summary.priced_rows += 1;
            }
            rows.push(row);

            if (i + 1) % 100 == 0 {
                info!("Enriched {}/{} mentions", i + 1, summary.mentions);
            }
        }

        sort_rows(&mut rows);
        summary.fetch = self.fetcher.stats();

        EnrichmentOutput { rows, summary }
    }

    async fn enrich_mention(
        &self,
        mention: Mention,
        summary: &mut EnrichmentSummary,
    ) -> EnrichedRow {
        let posted_at = match mention.post.posted_at.as_deref().and_then(parse_posted_at) {
            Some(ts) => ts,
            None => {
                debug!(
                    "Post {} has no usable timestamp ({:?}); skipping price lookup for {}",
                    mention.post_index, mention.post.posted_at, mention.raw_symbol
                );
                summary.untimed += 1;
                return EnrichedRow::unpriced(mention, None);
            }
        };

        let coin_id = match self.index.resolve(&mention.symbol) {
            Some(id) => id,
            None => {
                debug!("No identifier found for {}", mention.symbol);
                summary.unresolved += 1;
                return EnrichedRow::unpriced(mention, Some(posted_at));
            }
        };
        summary.resolved += 1;

        let price_at_mention = self.fetcher.fetch(coin_id, posted_at.date_naive()).await;
        let price_at_offset = match posted_at.checked_add_signed(self.offset) {
            Some(later) => self.fetcher.fetch(coin_id, later.date_naive()).await,
            None => {
                warn!(
                    "Post {} timestamp {} is out of range for a {} minute offset",
                    mention.post_index,
                    posted_at,
                    self.offset.num_minutes()
                );
                None
            }
        };

        EnrichedRow {
            post_index: mention.post_index,
            post: mention.post,
            symbol: mention.symbol,
            posted_at: Some(posted_at),
            price_at_mention,
            price_at_offset,
        }
    }
}
