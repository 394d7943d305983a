//! CSV sink for enriched rows.

use anyhow::{Context, Result};
use memeprice_core::models::EnrichedRow;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const HEADER: [&str; 8] = [
    "post_index",
    "text",
    "posted_at_raw",
    "symbol",
    "posted_at",
    "price_at_mention",
    "price_at_offset",
    "record",
];

/// One CSV line. Absent values serialize as empty cells.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    post_index: usize,
    text: &'a str,
    posted_at_raw: Option<&'a str>,
    symbol: &'a str,
    posted_at: Option<String>,
    price_at_mention: Option<f64>,
    price_at_offset: Option<f64>,
    /// Original source record as compact JSON
    record: String,
}

impl<'a> CsvRow<'a> {
    fn from_row(row: &'a EnrichedRow) -> Result<Self> {
        Ok(Self {
            post_index: row.post_index,
            text: &row.post.text,
            posted_at_raw: row.post.posted_at.as_deref(),
            symbol: &row.symbol,
            posted_at: row.posted_at.map(|ts| ts.to_rfc3339()),
            price_at_mention: row.price_at_mention,
            price_at_offset: row.price_at_offset,
            record: serde_json::to_string(&row.post.record)?,
        })
    }
}

/// Write all rows to `path`, header first. Returns the number of rows written.
pub fn write_rows(path: &Path, rows: &[EnrichedRow]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(HEADER)?;
    for row in rows {
        writer.serialize(CsvRow::from_row(row)?)?;
    }
    writer.flush()?;

    info!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}
