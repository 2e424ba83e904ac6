//! Per-category pipeline orchestration
//!
//! One orchestrator instance serves the whole process; each call runs
//! the fixed stage sequence for a single category: generate queries,
//! fan out every query over every source, merge and dedup, score. The
//! stages never fail on their own since every component degrades to
//! an empty result; panics and timeouts are absorbed one level up by
//! the aggregator.

use super::dedup::deduplicate;
use super::item::{AggregationState, PipelineStage};
use super::normalize::normalize;
use super::profile::{Category, UserProfile};
use super::query_gen::QueryGenerator;
use super::score::RelevanceScorer;
use super::sources::SourceAdapter;
use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info};

pub struct CategoryOrchestrator {
    query_gen: QueryGenerator,
    sources: Vec<Arc<dyn SourceAdapter>>,
    scorer: RelevanceScorer,
}

impl CategoryOrchestrator {
    pub fn new(
        query_gen: QueryGenerator,
        sources: Vec<Arc<dyn SourceAdapter>>,
        scorer: RelevanceScorer,
    ) -> Self {
        Self {
            query_gen,
            sources,
            scorer,
        }
    }

    /// Run the full pipeline for one category.
    pub async fn run(&self, profile: UserProfile, category: Category) -> AggregationState {
        let mut state = AggregationState::new(profile, category);

        state.stage = PipelineStage::GeneratingQueries;
        state.queries = self.query_gen.generate(&state.profile, category).await;

        self.execute_search_stages(state).await
    }

    /// Run the search stages with externally supplied queries. Chat
    /// sessions build their own queries from the conversation.
    pub async fn run_with_queries(
        &self,
        profile: UserProfile,
        category: Category,
        queries: Vec<String>,
    ) -> AggregationState {
        let mut state = AggregationState::new(profile, category);
        state.queries = queries;
        self.execute_search_stages(state).await
    }

    async fn execute_search_stages(&self, mut state: AggregationState) -> AggregationState {
        let category = state.category;

        state.stage = PipelineStage::Searching;
        let queries = &state.queries;
        let per_source = join_all(self.sources.iter().map(|source| async move {
            let batches =
                join_all(queries.iter().map(|query| source.fetch(query, category))).await;
            let records: Vec<_> = batches.into_iter().flatten().collect();
            (source.kind(), records)
        }))
        .await;

        for (kind, records) in per_source {
            let items = normalize(records, kind, category);
            debug!(
                category = %category,
                source = kind.as_str(),
                count = items.len(),
                "Source results normalized"
            );
            state.items.extend(items);
        }

        state.stage = PipelineStage::Merging;
        state.items = deduplicate(std::mem::take(&mut state.items));

        state.stage = PipelineStage::Filtering;
        state.items = self
            .scorer
            .score(std::mem::take(&mut state.items), &state.profile, category)
            .await;

        state.stage = PipelineStage::Done;
        info!(category = %category, count = state.items.len(), "Category pipeline completed");
        state
    }
}
