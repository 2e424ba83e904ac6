//! Two-phase relevance scoring
//!
//! Phase one is a cheap lexical pre-filter that bounds how many oracle
//! calls phase two may spend: items sharing no vocabulary with the
//! profile are dropped (trusted sources exempt) and the survivors are
//! capped. Phase two asks the oracle to rate each survivor, then layers
//! deterministic boosts on top: profile term matches, a fixed table of
//! high-value domain phrases, and a trusted-source bonus. A failed or
//! unparseable oracle call costs one item its oracle opinion, never the
//! whole batch.

use super::dates::parse_loose_date;
use super::item::NewsItem;
use super::profile::{Category, UserProfile};
use crate::llm::LLM;
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Upper bound on oracle calls per category run.
pub const PREFILTER_CAP: usize = 20;
/// Score assigned when the oracle fails or returns something unusable.
pub const FALLBACK_SCORE: f64 = 0.4;
/// Items below this final score are dropped.
pub const INCLUSION_THRESHOLD: f64 = 0.4;
/// Maximum items surfaced per category.
pub const TOP_N: usize = 10;

/// Additive boost per matched expertise or therapeutic-area phrase.
const TERM_MATCH_BOOST: f64 = 0.08;

/// High-value domain phrases and their boosts.
const HIGH_VALUE_KEYWORDS: [(&str, f64); 10] = [
    ("fda approval", 0.15),
    ("breakthrough therapy", 0.12),
    ("drug recall", 0.12),
    ("accelerated approval", 0.12),
    ("safety alert", 0.10),
    ("phase iii", 0.10),
    ("cost effectiveness", 0.10),
    ("real world evidence", 0.10),
    ("reimbursement", 0.08),
    ("formulary", 0.06),
];

/// Source names that bypass the pre-filter and earn a scoring bonus.
const TRUSTED_SOURCES: [(&str, f64); 6] = [
    ("clinicaltrials.gov", 0.10),
    ("fda", 0.10),
    ("ema", 0.08),
    ("nih", 0.08),
    ("cdc", 0.05),
    ("who", 0.05),
];

pub struct RelevanceScorer {
    llm: Arc<LLM>,
    concurrency: usize,
}

impl RelevanceScorer {
    pub fn new(llm: Arc<LLM>, concurrency: usize) -> Self {
        Self {
            llm,
            concurrency: concurrency.max(1),
        }
    }

    /// Score, filter, and rank one category's deduplicated items.
    pub async fn score(
        &self,
        items: Vec<NewsItem>,
        profile: &UserProfile,
        category: Category,
    ) -> Vec<NewsItem> {
        let terms = keyword_set(profile);
        let candidates = prefilter(items, &terms);

        debug!(category = %category, count = candidates.len(), "Scoring candidates");

        let scored: Vec<NewsItem> = stream::iter(candidates)
            .map(|item| {
                let llm = Arc::clone(&self.llm);
                async move { score_item(llm, item, profile, category).await }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let now = Utc::now();
        let mut kept: Vec<NewsItem> = scored
            .into_iter()
            .filter(|item| item.relevance_score >= INCLUSION_THRESHOLD)
            .collect();

        kept.sort_by(|a, b| {
            b.relevance_score
                .partial_cmp(&a.relevance_score)
                .unwrap_or(Ordering::Equal)
                .then_with(|| parse_loose_date(&b.date, now).cmp(&parse_loose_date(&a.date, now)))
        });
        kept.truncate(TOP_N);
        kept
    }
}

async fn score_item(
    llm: Arc<LLM>,
    mut item: NewsItem,
    profile: &UserProfile,
    category: Category,
) -> NewsItem {
    let prompt = format!(
        r#"Rate the relevance of this news item for a HEOR professional interested in {focus}.
User expertise: {expertise}
Therapeutic areas: {therapeutic}

Title: {title}
Snippet: {snippet}

Return only a number between 0.0 and 1.0 representing relevance score."#,
        focus = category.domain_focus(),
        expertise = profile.expertise_areas.join(", "),
        therapeutic = profile.therapeutic_areas.join(", "),
        title = item.title,
        snippet = item.snippet,
    );

    let base = match llm.complete(&prompt).await {
        Ok(response) => match parse_score(&response) {
            Some(score) => score,
            None => {
                warn!(item_id = %item.id, "Unparseable relevance response, using fallback score");
                FALLBACK_SCORE
            }
        },
        Err(e) => {
            warn!(item_id = %item.id, error = %e, "Relevance scoring failed, using fallback score");
            FALLBACK_SCORE
        }
    };

    let mut score = base + term_boost(&item, profile) + keyword_boost(&item);
    if let Some(bonus) = trusted_source_boost(&item.source) {
        score += bonus;
    }

    item.relevance_score = score.clamp(0.0, 1.0);
    item
}

/// Pull a relevance number out of an oracle response. Accepts a bare
/// float or one embedded in surrounding prose ("Relevance: 0.85").
fn parse_score(response: &str) -> Option<f64> {
    let trimmed = response.trim();
    if let Ok(score) = trimmed.parse::<f64>() {
        return Some(score);
    }

    trimmed
        .split(|c: char| !matches!(c, '0'..='9' | '.'))
        .filter(|token| !token.is_empty())
        .filter_map(|token| token.trim_matches('.').parse::<f64>().ok())
        .find(|score| (0.0..=1.0).contains(score))
}

/// Lowercased profile vocabulary: whole phrases plus their sub-tokens.
fn keyword_set(profile: &UserProfile) -> HashSet<String> {
    let mut terms = HashSet::new();
    for phrase in profile
        .keywords
        .iter()
        .chain(profile.expertise_areas.iter())
        .chain(profile.therapeutic_areas.iter())
    {
        let lower = phrase.trim().to_lowercase();
        if lower.is_empty() {
            continue;
        }
        for token in lower.split_whitespace() {
            if token.len() >= 3 {
                terms.insert(token.to_string());
            }
        }
        terms.insert(lower);
    }
    terms
}

/// Keep items sharing vocabulary with the profile (or from a trusted
/// source), best matches first, capped at [`PREFILTER_CAP`]. With an
/// empty profile the ratio gate is meaningless, so only the cap applies.
fn prefilter(items: Vec<NewsItem>, terms: &HashSet<String>) -> Vec<NewsItem> {
    if terms.is_empty() {
        let mut items = items;
        items.truncate(PREFILTER_CAP);
        return items;
    }

    let mut survivors: Vec<(f64, NewsItem)> = items
        .into_iter()
        .filter_map(|item| {
            let ratio = match_ratio(&item, terms);
            if ratio > 0.0 || trusted_source_boost(&item.source).is_some() {
                Some((ratio, item))
            } else {
                None
            }
        })
        .collect();

    survivors.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    survivors.truncate(PREFILTER_CAP);
    survivors.into_iter().map(|(_, item)| item).collect()
}

fn match_ratio(item: &NewsItem, terms: &HashSet<String>) -> f64 {
    let text = format!("{} {}", item.title, item.snippet).to_lowercase();
    let hits = terms
        .iter()
        .filter(|term| text.contains(term.as_str()))
        .count();
    hits as f64 / terms.len() as f64
}

fn term_boost(item: &NewsItem, profile: &UserProfile) -> f64 {
    let text = format!("{} {}", item.title, item.snippet).to_lowercase();
    let matches = profile
        .expertise_areas
        .iter()
        .chain(profile.therapeutic_areas.iter())
        .filter(|phrase| {
            let lower = phrase.trim().to_lowercase();
            !lower.is_empty() && text.contains(&lower)
        })
        .count();
    matches as f64 * TERM_MATCH_BOOST
}

fn keyword_boost(item: &NewsItem) -> f64 {
    let text = format!("{} {}", item.title, item.snippet).to_lowercase();
    HIGH_VALUE_KEYWORDS
        .iter()
        .filter(|(phrase, _)| text.contains(phrase))
        .map(|(_, boost)| boost)
        .sum()
}

fn trusted_source_boost(source: &str) -> Option<f64> {
    let lower = source.to_lowercase();
    for (name, boost) in TRUSTED_SOURCES {
        let matched = if name.contains('.') {
            lower.contains(name)
        } else {
            lower
                .split(|c: char| !c.is_ascii_alphanumeric())
                .any(|token| token == name)
        };
        if matched {
            return Some(boost);
        }
    }
    None
}
