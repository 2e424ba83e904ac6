//! Canonical news items and per-category pipeline state

use super::profile::{Category, UserProfile};
use serde::{Deserialize, Serialize};

/// A single news item in its canonical, client-facing shape.
///
/// Created by normalization, scored in place by the relevance pass, and
/// immutable once a pipeline run completes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsItem {
    /// Stable identifier: `web_` + URL hash, or the source-kind prefix
    /// plus the registry study identifier.
    pub id: String,
    pub title: String,
    pub snippet: String,
    pub source: String,
    /// ISO-ish date string, or the literal sentinel "date not found".
    pub date: String,
    pub category: String,
    pub url: String,
    /// Clamped to [0.0, 1.0] by the scorer.
    pub relevance_score: f64,
    #[serde(default = "default_is_new")]
    pub is_new: bool,
}

fn default_is_new() -> bool {
    true
}

/// Where a category run currently is in its pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Pending,
    GeneratingQueries,
    Searching,
    Merging,
    Filtering,
    Done,
    Error,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Pending => "pending",
            PipelineStage::GeneratingQueries => "generating_queries",
            PipelineStage::Searching => "searching",
            PipelineStage::Merging => "merging",
            PipelineStage::Filtering => "filtering",
            PipelineStage::Done => "done",
            PipelineStage::Error => "error",
        }
    }
}

/// Working state for one category within one pipeline run.
///
/// Lives only for the duration of a single orchestration call. A failed
/// run carries an error message and an empty item list; it never
/// poisons the other categories.
#[derive(Debug, Clone)]
pub struct AggregationState {
    pub profile: UserProfile,
    pub category: Category,
    pub queries: Vec<String>,
    pub items: Vec<NewsItem>,
    pub stage: PipelineStage,
    pub error_message: Option<String>,
}

impl AggregationState {
    pub fn new(profile: UserProfile, category: Category) -> Self {
        Self {
            profile,
            category,
            queries: Vec::new(),
            items: Vec::new(),
            stage: PipelineStage::Pending,
            error_message: None,
        }
    }

    /// Terminal error state with no items.
    pub fn failed(profile: UserProfile, category: Category, message: impl Into<String>) -> Self {
        Self {
            profile,
            category,
            queries: Vec::new(),
            items: Vec::new(),
            stage: PipelineStage::Error,
            error_message: Some(message.into()),
        }
    }
}
