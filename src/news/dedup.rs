//! Duplicate collapse and date sanitation
//!
//! Runs once per category after all sources have been normalized and
//! merged. Two duplicate keys are checked independently: a lowercased
//! title prefix (same story syndicated across outlets) and the bare
//! registry identifier (same trial arriving through both registry
//! endpoints). The winner for each key is chosen deterministically:
//! the most complete record first, lexicographic ID as the final
//! tie-break, so the nondeterministic arrival order of concurrent
//! fetches can never change which record survives.

use super::dates::{parse_loose_date, within_window, DATE_NOT_FOUND};
use super::item::NewsItem;
use super::sources::SourceKind;
use chrono::{DateTime, Utc};
use std::collections::HashSet;

pub const TITLE_KEY_LEN: usize = 50;
pub const MAX_ITEM_AGE_DAYS: i64 = 365;

/// Collapse duplicates within one category's merged item set.
///
/// Also sanitizes dates: items older than [`MAX_ITEM_AGE_DAYS`] are
/// dropped, while items whose date cannot be parsed are kept with the
/// sentinel "date not found" rather than discarded. Idempotent.
pub fn deduplicate(items: Vec<NewsItem>) -> Vec<NewsItem> {
    deduplicate_at(items, Utc::now())
}

fn deduplicate_at(items: Vec<NewsItem>, now: DateTime<Utc>) -> Vec<NewsItem> {
    let sanitized = items.into_iter().filter_map(|mut item| {
        match parse_loose_date(&item.date, now) {
            Some(parsed) if within_window(parsed, now, MAX_ITEM_AGE_DAYS) => Some(item),
            Some(_) => None,
            None => {
                item.date = DATE_NOT_FOUND.to_string();
                Some(item)
            }
        }
    });

    let mut decorated: Vec<(usize, NewsItem)> = sanitized
        .map(|item| (completeness(&item, now), item))
        .collect();
    decorated.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.id.cmp(&b.1.id)));

    let mut seen_titles: HashSet<String> = HashSet::new();
    let mut seen_registry_ids: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();

    for (_, item) in decorated {
        let title_key = title_key(&item.title);
        if let Some(ref key) = title_key {
            if seen_titles.contains(key) {
                continue;
            }
        }

        let registry_key = registry_key(&item.id);
        if let Some(ref key) = registry_key {
            if seen_registry_ids.contains(key) {
                continue;
            }
        }

        if let Some(key) = title_key {
            seen_titles.insert(key);
        }
        if let Some(key) = registry_key {
            seen_registry_ids.insert(key);
        }
        unique.push(item);
    }

    unique
}

/// How many of the fields worth keeping this record actually carries.
fn completeness(item: &NewsItem, now: DateTime<Utc>) -> usize {
    let mut filled = 0;
    if !item.title.trim().is_empty() {
        filled += 1;
    }
    if !item.snippet.trim().is_empty() {
        filled += 1;
    }
    if !item.source.trim().is_empty() {
        filled += 1;
    }
    if !item.url.trim().is_empty() {
        filled += 1;
    }
    if parse_loose_date(&item.date, now).is_some() {
        filled += 1;
    }
    filled
}

fn title_key(title: &str) -> Option<String> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_lowercase().chars().take(TITLE_KEY_LEN).collect())
}

/// Registry identifier with the source-kind prefix stripped, so the
/// same trial from different registry endpoints compares equal.
fn registry_key(id: &str) -> Option<String> {
    for kind in [SourceKind::RegistryClassic, SourceKind::RegistryV2] {
        if let Some(rest) = id.strip_prefix(kind.id_prefix()) {
            if let Some(rest) = rest.strip_prefix('_') {
                return Some(rest.to_string());
            }
        }
    }
    None
}
