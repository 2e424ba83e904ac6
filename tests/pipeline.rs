//! End-to-end aggregation runs against mocked registry endpoints.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use pharma_signal::llm::{LLMAdapter, LLM};
use pharma_signal::news::orchestrator::CategoryOrchestrator;
use pharma_signal::news::query_gen::QueryGenerator;
use pharma_signal::news::score::RelevanceScorer;
use pharma_signal::news::sources::{
    ClassicRegistrySearch, RawRecord, RegistryV2Search, SourceAdapter, SourceKind,
};
use pharma_signal::news::{Category, NewsAggregator, PipelineStage, UserProfile};
use pharma_signal::types::{AppError, AppResult, LLMRequest, LLMResponse, TokenUsage};

/// Replays canned completions; the last response repeats.
struct ScriptedAdapter {
    responses: Mutex<VecDeque<String>>,
    fail: bool,
}

impl ScriptedAdapter {
    fn with_responses<I>(responses: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            responses: Mutex::new(responses.into_iter().map(Into::into).collect()),
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl LLMAdapter for ScriptedAdapter {
    async fn create_chat_completion(&self, _request: &LLMRequest) -> AppResult<LLMResponse> {
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

fn scripted_llm(adapter: ScriptedAdapter) -> Arc<LLM> {
    Arc::new(LLM::with_adapter(Box::new(adapter), "test-model"))
}

/// A start date recent enough to survive age sanitation whenever the
/// suite runs.
fn recent_date() -> String {
    (Utc::now() - chrono::Duration::days(3))
        .format("%Y-%m-%d")
        .to_string()
}

fn classic_body(ncts: &[&str]) -> serde_json::Value {
    let studies: Vec<_> = ncts
        .iter()
        .map(|nct| {
            json!({
                "NCTId": [nct],
                "BriefTitle": [format!("Oncology trial {}", nct)],
                "BriefSummary": ["Evaluating an oncology therapy."],
                "StartDate": [recent_date()]
            })
        })
        .collect();
    json!({"StudyFieldsResponse": {"StudyFields": studies}})
}

fn v2_body(ncts: &[&str]) -> serde_json::Value {
    let studies: Vec<_> = ncts
        .iter()
        .map(|nct| {
            json!({
                "protocolSection": {
                    "identificationModule": {
                        "nctId": nct,
                        "briefTitle": format!("Oncology trial {}", nct)
                    },
                    "statusModule": {
                        "overallStatus": "RECRUITING",
                        "startDateStruct": {"date": recent_date()}
                    },
                    "descriptionModule": {
                        "briefSummary": "Evaluating an oncology therapy."
                    }
                }
            })
        })
        .collect();
    json!({"studies": studies})
}

async fn mock_registries(
    server: &MockServer,
    classic_ncts: &[&str],
    v2_ncts: &[&str],
) {
    Mock::given(method("GET"))
        .and(path("/api/query/study_fields"))
        .respond_with(ResponseTemplate::new(200).set_body_json(classic_body(classic_ncts)))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v2/studies"))
        .respond_with(ResponseTemplate::new(200).set_body_json(v2_body(v2_ncts)))
        .mount(server)
        .await;
}

fn registry_aggregator(server: &MockServer, llm: Arc<LLM>) -> NewsAggregator {
    let sources: Vec<Arc<dyn SourceAdapter>> = vec![
        Arc::new(ClassicRegistrySearch::new(20).with_base_url(server.uri())),
        Arc::new(RegistryV2Search::new(20).with_base_url(server.uri())),
    ];
    let orchestrator = CategoryOrchestrator::new(
        QueryGenerator::new(Arc::clone(&llm)),
        sources,
        RelevanceScorer::new(llm, 4),
    );
    NewsAggregator::new(orchestrator, Duration::from_secs(30))
}

fn oncology_profile() -> UserProfile {
    UserProfile {
        expertise_areas: vec!["oncology".to_string()],
        therapeutic_areas: vec!["oncology".to_string()],
        regions: vec!["US".to_string()],
        keywords: vec!["clinical trials".to_string()],
        news_recency_days: 7,
    }
}

#[tokio::test]
async fn category_run_merges_both_registry_endpoints() {
    let server = MockServer::start().await;
    // NCT90000001 appears on both endpoints and must collapse to one item.
    mock_registries(
        &server,
        &["NCT90000001", "NCT90000002"],
        &["NCT90000001", "NCT90000003"],
    )
    .await;

    let llm = scripted_llm(ScriptedAdapter::with_responses([
        r#"["oncology trial results"]"#.to_string(),
        "0.9".to_string(),
    ]));
    let aggregator = registry_aggregator(&server, llm);

    let result = aggregator
        .aggregate_category(&oncology_profile(), Category::Clinical)
        .await;

    assert_eq!(result.stage, PipelineStage::Done);
    assert!(result.error_message.is_none());

    let ids: Vec<_> = result.items.iter().map(|item| item.id.as_str()).collect();
    let shared: Vec<_> = ids
        .iter()
        .filter(|id| id.ends_with("NCT90000001"))
        .collect();
    assert_eq!(shared.len(), 1, "duplicate registry record survived: {:?}", ids);

    assert_eq!(result.items.len(), 3);
    for item in &result.items {
        assert_eq!(item.category, "clinical");
        assert!(item.relevance_score >= 0.4);
        assert!(item.url.starts_with("https://clinicaltrials.gov/"));
    }
}

#[tokio::test]
async fn aggregate_covers_every_category_without_an_oracle() {
    let server = MockServer::start().await;
    mock_registries(&server, &["NCT90000010"], &["NCT90000011"]).await;

    // Failing oracle: templated queries and the neutral fallback score.
    let aggregator = registry_aggregator(&server, scripted_llm(ScriptedAdapter::failing()));
    let results = aggregator.aggregate(&oncology_profile()).await;

    assert_eq!(results.len(), 4);
    for category in Category::ALL {
        let items = results
            .get(&category)
            .unwrap_or_else(|| panic!("missing category {}", category.as_str()));
        assert!(!items.is_empty());
        for item in items {
            assert_eq!(item.category, category.as_str());
            assert!(item.relevance_score >= 0.4);
        }
    }
}

/// Source that never answers; used to drive the per-category budget.
struct StalledSource;

#[async_trait]
impl SourceAdapter for StalledSource {
    fn kind(&self) -> SourceKind {
        SourceKind::WebSearch
    }

    async fn fetch(&self, _query: &str, _category: Category) -> Vec<RawRecord> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Vec::new()
    }
}

#[tokio::test]
async fn budget_overrun_yields_empty_results_for_every_category() {
    let sources: Vec<Arc<dyn SourceAdapter>> = vec![Arc::new(StalledSource)];
    let llm = scripted_llm(ScriptedAdapter::failing());
    let orchestrator = CategoryOrchestrator::new(
        QueryGenerator::new(Arc::clone(&llm)),
        sources,
        RelevanceScorer::new(llm, 4),
    );
    let aggregator = NewsAggregator::new(orchestrator, Duration::from_millis(50));

    let results = aggregator.aggregate(&oncology_profile()).await;

    assert_eq!(results.len(), 4);
    for items in results.values() {
        assert!(items.is_empty());
    }
}
