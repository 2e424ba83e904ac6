//! Raw record normalization
//!
//! Turns per-source raw records into canonical items. Identifier
//! derivation is the important part: web hits get a hash of their URL,
//! registry hits reuse the study identifier, and both carry a
//! source-kind prefix so the same trial arriving through two registry
//! endpoints stays distinguishable until dedup compares the stripped
//! identifiers.

use super::item::NewsItem;
use super::profile::Category;
use super::sources::{RawRecord, SourceKind};
use chrono::Utc;
use sha2::{Digest, Sha256};

pub const SNIPPET_MAX_LEN: usize = 300;

/// Map raw source records into canonical items.
///
/// Records that cannot yield a stable identifier (web hits without a
/// URL, registry hits without a study ID) are dropped.
pub fn normalize(records: Vec<RawRecord>, kind: SourceKind, category: Category) -> Vec<NewsItem> {
    records
        .into_iter()
        .filter_map(|record| normalize_record(record, kind, category))
        .collect()
}

fn normalize_record(record: RawRecord, kind: SourceKind, category: Category) -> Option<NewsItem> {
    let id = match kind {
        SourceKind::WebSearch => {
            let url = record.url.as_deref().filter(|u| !u.is_empty())?;
            format!("{}_{}", kind.id_prefix(), url_hash(url))
        }
        SourceKind::RegistryClassic | SourceKind::RegistryV2 => {
            let registry_id = record.registry_id.as_deref().filter(|id| !id.is_empty())?;
            format!("{}_{}", kind.id_prefix(), registry_id)
        }
    };

    // Web feeds without a date get stamped "now"; registry records keep
    // an empty date for the dedup pass to sanitize.
    let date = match record.date.filter(|d| !d.is_empty()) {
        Some(date) => date,
        None if kind == SourceKind::WebSearch => Utc::now().to_rfc3339(),
        None => String::new(),
    };

    Some(NewsItem {
        id,
        title: record.title.unwrap_or_default(),
        snippet: truncate_snippet(&record.snippet.unwrap_or_default()),
        source: record.source.unwrap_or_default(),
        date,
        category: category.as_str().to_string(),
        url: record.url.unwrap_or_default(),
        relevance_score: 0.0,
        is_new: true,
    })
}

/// First 8 bytes of the URL's SHA-256, hex encoded.
fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..8])
}

fn truncate_snippet(snippet: &str) -> String {
    snippet.chars().take(SNIPPET_MAX_LEN).collect()
}
