//! Parallel category fan-out
//!
//! Runs all four category pipelines concurrently, each inside its own
//! task with a wall-clock budget. A category that times out or panics
//! settles as an error state with an empty item list; sibling
//! categories never notice. The returned map always carries every
//! category key, and nothing is returned until every category has
//! settled.

use super::item::{AggregationState, NewsItem};
use super::orchestrator::CategoryOrchestrator;
use super::profile::{Category, UserProfile};
use super::query_gen::QueryGenerator;
use super::score::RelevanceScorer;
use super::sources::{ClassicRegistrySearch, RegistryV2Search, SerpNewsSearch, SourceAdapter};
use crate::config::Config;
use crate::llm::LLM;
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::error::Elapsed;
use tracing::{error, info, warn};

pub struct NewsAggregator {
    orchestrator: Arc<CategoryOrchestrator>,
    category_timeout: Duration,
}

impl NewsAggregator {
    pub fn new(orchestrator: CategoryOrchestrator, category_timeout: Duration) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            category_timeout,
        }
    }

    /// Wire up the production pipeline: shared oracle and whichever
    /// sources are configured. Web search drops out without an API key;
    /// both registry endpoints are always on.
    pub fn from_config(config: &Config, llm: Arc<LLM>) -> Self {
        let mut sources: Vec<Arc<dyn SourceAdapter>> = Vec::new();
        match SerpNewsSearch::from_config(&config.search) {
            Some(serp) => sources.push(Arc::new(serp)),
            None => warn!("SERP API key not configured, web search disabled"),
        }
        sources.push(Arc::new(ClassicRegistrySearch::new(
            config.search.registry_max_results,
        )));
        sources.push(Arc::new(RegistryV2Search::new(
            config.search.registry_max_results,
        )));

        let orchestrator = CategoryOrchestrator::new(
            QueryGenerator::new(Arc::clone(&llm)),
            sources,
            RelevanceScorer::new(llm, config.news.scoring_concurrency),
        );

        Self::new(orchestrator, Duration::from_secs(config.news.category_timeout_secs))
    }

    /// Run every category concurrently and collect the results.
    ///
    /// Every category key is present in the map; a failed category maps
    /// to an empty list.
    pub async fn aggregate(&self, profile: &UserProfile) -> HashMap<Category, Vec<NewsItem>> {
        info!("Starting parallel news aggregation");

        let states = join_all(
            Category::ALL
                .iter()
                .map(|&category| self.run_category(profile.clone(), category)),
        )
        .await;

        let mut results = HashMap::new();
        for state in states {
            if let Some(message) = &state.error_message {
                warn!(category = %state.category, error = %message, "Category completed with error");
            }
            results.insert(state.category, state.items);
        }
        results
    }

    /// Run the pipeline for a single category.
    pub async fn aggregate_category(
        &self,
        profile: &UserProfile,
        category: Category,
    ) -> AggregationState {
        self.run_category(profile.clone(), category).await
    }

    /// Search and score with caller-supplied queries, under the same
    /// supervision as a regular category run.
    pub async fn run_with_queries(
        &self,
        profile: &UserProfile,
        category: Category,
        queries: Vec<String>,
    ) -> AggregationState {
        let orchestrator = Arc::clone(&self.orchestrator);
        let timeout = self.category_timeout;
        let task_profile = profile.clone();

        let handle = tokio::spawn(async move {
            tokio::time::timeout(
                timeout,
                orchestrator.run_with_queries(task_profile, category, queries),
            )
            .await
        });

        settle(handle, profile.clone(), category, timeout).await
    }

    async fn run_category(&self, profile: UserProfile, category: Category) -> AggregationState {
        let orchestrator = Arc::clone(&self.orchestrator);
        let timeout = self.category_timeout;
        let task_profile = profile.clone();

        // The budget covers the whole pipeline, so the timeout wraps the
        // run inside its own task rather than just the spawn.
        let handle = tokio::spawn(async move {
            tokio::time::timeout(timeout, orchestrator.run(task_profile, category)).await
        });

        settle(handle, profile, category, timeout).await
    }
}

/// Resolve a supervised category task into a state, absorbing timeouts
/// and panics.
async fn settle(
    handle: JoinHandle<Result<AggregationState, Elapsed>>,
    profile: UserProfile,
    category: Category,
    timeout: Duration,
) -> AggregationState {
    match handle.await {
        Ok(Ok(state)) => state,
        Ok(Err(_)) => {
            error!(
                category = %category,
                timeout_secs = timeout.as_secs(),
                "Category run exceeded time budget"
            );
            AggregationState::failed(
                profile,
                category,
                format!("timed out after {}s", timeout.as_secs()),
            )
        }
        Err(e) => {
            error!(category = %category, error = %e, "Category run aborted");
            AggregationState::failed(profile, category, e.to_string())
        }
    }
}
