//! SerpAPI news search
//!
//! Issues Google News queries scoped to the past week. Each query gets
//! a category-specific suffix appended ("FDA EMA regulatory", "payer
//! reimbursement coverage", ...) to keep generic user phrasing anchored
//! to the category's beat.

use super::{RawRecord, SourceAdapter, SourceKind};
use crate::news::profile::Category;
use async_trait::async_trait;
use serde_json::Value;
use serpapi_search_rust::serp_api_search::SerpApiSearch;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

const SEARCH_TIMEOUT_SECS: u64 = 30;

/// Errors from a single news search call.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search request failed: {0}")]
    RequestFailed(String),

    #[error("Search request timed out")]
    Timeout,
}

/// SerpAPI-backed Google News search.
pub struct SerpNewsSearch {
    api_key: String,
    max_results: usize,
}

impl SerpNewsSearch {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            max_results: 10,
        }
    }

    /// Configure from config. Returns `None` when no API key is set,
    /// in which case the pipeline simply runs without web search.
    pub fn from_config(config: &crate::config::SearchConfig) -> Option<Self> {
        if config.serpapi_key.is_empty() {
            return None;
        }

        Some(Self {
            api_key: config.serpapi_key.clone(),
            max_results: config.max_results,
        })
    }

    /// Set maximum results per search
    pub fn with_max_results(mut self, max: usize) -> Self {
        self.max_results = max;
        self
    }

    async fn search_news(&self, query: &str) -> Result<Vec<RawRecord>, SearchError> {
        let mut params = HashMap::<String, String>::new();
        params.insert("engine".to_string(), "google".to_string());
        params.insert("q".to_string(), query.to_string());
        params.insert("tbm".to_string(), "nws".to_string());
        params.insert("tbs".to_string(), "qdr:w".to_string());
        params.insert("num".to_string(), self.max_results.to_string());

        let search = SerpApiSearch::google(params, self.api_key.clone());

        let results = tokio::time::timeout(Duration::from_secs(SEARCH_TIMEOUT_SECS), search.json())
            .await
            .map_err(|_| SearchError::Timeout)?
            .map_err(|e| SearchError::RequestFailed(e.to_string()))?;

        debug!("Raw news response received");
        Ok(parse_news_results(&results, self.max_results))
    }
}

#[async_trait]
impl SourceAdapter for SerpNewsSearch {
    fn kind(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    async fn fetch(&self, query: &str, category: Category) -> Vec<RawRecord> {
        let scoped = format!("{} {}", query, category.search_suffix());

        match self.search_news(&scoped).await {
            Ok(records) => {
                debug!(
                    category = %category,
                    query = %query,
                    count = records.len(),
                    "News search completed"
                );
                records
            }
            Err(e) => {
                warn!(category = %category, query = %query, error = %e, "News search failed");
                Vec::new()
            }
        }
    }
}

/// Pull raw records out of a SerpAPI news response.
///
/// The `source` field arrives either as a plain string or as an object
/// with a `name` key depending on the result type; both are accepted.
fn parse_news_results(results: &Value, max_results: usize) -> Vec<RawRecord> {
    let news = match results.get("news_results").and_then(|v| v.as_array()) {
        Some(news) => news,
        None => return Vec::new(),
    };

    news.iter()
        .take(max_results)
        .map(|result| {
            let source = match result.get("source") {
                Some(Value::String(name)) => Some(name.clone()),
                Some(other) => other
                    .get("name")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                None => None,
            };

            RawRecord {
                title: result.get("title").and_then(|v| v.as_str()).map(String::from),
                snippet: result
                    .get("snippet")
                    .and_then(|v| v.as_str())
                    .map(String::from),
                url: result.get("link").and_then(|v| v.as_str()).map(String::from),
                source,
                date: result.get("date").and_then(|v| v.as_str()).map(String::from),
                registry_id: None,
            }
        })
        .collect()
}
