//! Personalized news aggregation pipeline
//!
//! Fans out over four coverage categories in parallel. Each category
//! run generates search queries from the user's profile, dispatches
//! them across every configured source, then merges, dedupes, scores,
//! and ranks the results. Failures stay local: a dead source, a flaky
//! oracle call, or an entire category timing out costs only that slice
//! of the response.

pub mod aggregator;
pub mod dates;
pub mod dedup;
pub mod item;
pub mod normalize;
pub mod orchestrator;
pub mod profile;
pub mod query_gen;
pub mod score;
pub mod sources;

pub use aggregator::NewsAggregator;
pub use item::{AggregationState, NewsItem, PipelineStage};
pub use profile::{Category, UserProfile};

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted oracle double shared by pipeline unit tests.

    use crate::llm::LLMAdapter;
    use crate::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Completion adapter double that replays canned responses.
    pub struct ScriptedOracle {
        responses: Mutex<VecDeque<String>>,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    impl ScriptedOracle {
        /// Replay responses in order; the last one repeats forever.
        pub fn with_responses<I>(responses: I) -> Self
        where
            I: IntoIterator,
            I::Item: Into<String>,
        {
            Self {
                responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
                fail: false,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Answer every call with the same response.
        pub fn always(response: impl Into<String>) -> Self {
            Self::with_responses([response.into()])
        }

        /// Fail every call.
        pub fn failing() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                fail: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        /// Shared call counter, readable after the oracle moves into an
        /// [`crate::llm::LLM`].
        pub fn counter(&self) -> Arc<AtomicUsize> {
            Arc::clone(&self.calls)
        }
    }

    #[async_trait]
    impl LLMAdapter for ScriptedOracle {
        async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(AppError::LLMApi("scripted failure".to_string()));
            }

            let mut responses = self.responses.lock().unwrap();
            let content = if responses.len() > 1 {
                responses.pop_front().unwrap()
            } else {
                responses
                    .front()
                    .cloned()
                    .ok_or_else(|| AppError::LLMApi("script exhausted".to_string()))?
            };

            Ok(LLMResponse {
                content,
                finish_reason: "stop".to_string(),
                usage: TokenUsage {
                    prompt_tokens: 0,
                    completion_tokens: 0,
                    total_tokens: 0,
                },
            })
        }
    }
}
