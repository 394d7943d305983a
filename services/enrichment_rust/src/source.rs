//! Post source: JSON Lines reader.
//!
//! Two record shapes are understood:
//! - scraped tweets: `{"Tweet": {"Text": "...", "TimeParsed": "..."}, ...}`
//! - flat posts: `{"text": "...", "posted_at": "..."}`

use anyhow::{Context, Result};
use memeprice_core::models::Post;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{info, warn};

/// Load every post from a JSON Lines file, in file order.
pub fn load_posts(path: &Path) -> Result<Vec<Post>> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut posts = Vec::new();
    let mut skipped = 0usize;

    for (line_no, bytes) in reader.split(b'\n').enumerate() {
        let bytes = bytes.with_context(|| format!("Failed to read {}", path.display()))?;
        let line = match std::str::from_utf8(&bytes) {
            Ok(line) => line.trim_end_matches('\r'),
            Err(e) => {
                skipped += 1;
                warn!("Skipping line {} of {}: {}", line_no + 1, path.display(), e);
                continue;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        match parse_post_line(line) {
            Some(post) => posts.push(post),
            None => {
                skipped += 1;
                warn!("Skipping line {} of {}: not a post record", line_no + 1, path.display());
            }
        }
    }

    info!("Loaded {} posts from {} ({} skipped)", posts.len(), path.display(), skipped);
    Ok(posts)
}

/// Parse one JSON line into a post. `None` for non-objects and records
/// without text.
pub fn parse_post_line(line: &str) -> Option<Post> {
    let record: Map<String, Value> = match serde_json::from_str::<Value>(line).ok()? {
        Value::Object(map) => map,
        _ => return None,
    };

    let tweet = record.get("Tweet").and_then(Value::as_object);

    let text = tweet
        .and_then(|t| t.get("Text"))
        .or_else(|| record.get("text"))
        .and_then(Value::as_str)?
        .to_string();

    let posted_at = tweet
        .and_then(|t| t.get("TimeParsed"))
        .or_else(|| record.get("posted_at"))
        .and_then(timestamp_text);

    Some(Post {
        text,
        posted_at,
        record,
    })
}

fn timestamp_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => n.as_i64().map(|secs| secs.to_string()),
        _ => None,
    }
}
