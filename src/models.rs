use sqlx::PgPool;
use std::sync::Arc;
use crate::config::Config;
use crate::llm::LLM;
use crate::news::{NewsAggregator, NewsItem, UserProfile};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub llm: Arc<LLM>,
    pub aggregator: Arc<NewsAggregator>,
}

// Persisted records
// Note: FromRow is needed for runtime query_as (without DATABASE_URL at compile time)

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct UserRecord {
    pub id: uuid::Uuid,
    pub session_id: String,
    pub expertise_areas: Vec<String>,
    pub therapeutic_areas: Vec<String>,
    pub regions: Vec<String>,
    pub keywords: Vec<String>,
    pub news_recency_days: i32,
    pub selected_categories: Vec<String>,
    pub onboarding_completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct ChatMessageRecord {
    pub id: uuid::Uuid,
    pub session_id: String,
    pub category: String,
    pub role: String, // "user" | "assistant"
    pub content: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

// Stored records and inline payloads both convert to the pipeline's
// profile with per-field defaults, so a sparse record still scores
// against a usable profile.

fn non_empty_or(values: &[String], fallback: Vec<String>) -> Vec<String> {
    if values.is_empty() {
        fallback
    } else {
        values.to_vec()
    }
}

impl From<&UserRecord> for UserProfile {
    fn from(record: &UserRecord) -> Self {
        let defaults = UserProfile::default();
        UserProfile {
            expertise_areas: non_empty_or(&record.expertise_areas, defaults.expertise_areas),
            therapeutic_areas: non_empty_or(&record.therapeutic_areas, defaults.therapeutic_areas),
            regions: non_empty_or(&record.regions, defaults.regions),
            keywords: non_empty_or(&record.keywords, defaults.keywords),
            news_recency_days: if record.news_recency_days > 0 {
                i64::from(record.news_recency_days)
            } else {
                defaults.news_recency_days
            },
        }
    }
}

impl From<&PreferencesRequest> for UserProfile {
    fn from(request: &PreferencesRequest) -> Self {
        let defaults = UserProfile::default();
        UserProfile {
            expertise_areas: non_empty_or(&request.expertise_areas, defaults.expertise_areas),
            therapeutic_areas: non_empty_or(&request.therapeutic_areas, defaults.therapeutic_areas),
            regions: non_empty_or(&request.regions, defaults.regions),
            keywords: non_empty_or(&request.keywords, defaults.keywords),
            news_recency_days: if request.news_recency_days > 0 {
                request.news_recency_days
            } else {
                defaults.news_recency_days
            },
        }
    }
}

// API Request/Response types

#[derive(Debug, Clone, serde::Deserialize)]
pub struct PreferencesRequest {
    pub expertise_areas: Vec<String>,
    pub therapeutic_areas: Vec<String>,
    pub regions: Vec<String>,
    pub keywords: Vec<String>,
    #[serde(default = "default_recency_days")]
    pub news_recency_days: i64,
}

fn default_recency_days() -> i64 {
    7
}

#[derive(Debug, serde::Deserialize)]
pub struct PersonalizedRequest {
    pub session_id: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct SavePreferencesRequest {
    pub session_id: String,
    #[serde(flatten)]
    pub preferences: PreferencesRequest,
}

#[derive(Debug, serde::Serialize)]
pub struct PreferencesResponse {
    pub success: bool,
    pub user: UserRecord,
}

#[derive(Debug, serde::Serialize)]
pub struct AggregateResponse {
    pub regulatory: Vec<NewsItem>,
    pub clinical: Vec<NewsItem>,
    pub market: Vec<NewsItem>,
    pub rwe: Vec<NewsItem>,
    pub processing_time: f64,
    pub timestamp: String,
}

#[derive(Debug, serde::Serialize)]
pub struct CategoryResponse {
    pub category: String,
    pub news_items: Vec<NewsItem>,
    pub count: usize,
    pub timestamp: String,
}

#[derive(Debug, serde::Deserialize)]
pub struct CategoryChatRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, serde::Serialize)]
pub struct CategoryChatResponse {
    pub success: bool,
    pub response: String,
    pub news_items: Vec<NewsItem>,
    pub queries_used: Vec<String>,
    pub suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ChatHistoryResponse {
    pub success: bool,
    pub category: String,
    pub session_id: String,
    pub messages: Vec<ChatMessageRecord>,
}

#[derive(Debug, serde::Serialize)]
pub struct NewsHealthResponse {
    pub status: String,
    pub service: String,
    pub agents: Vec<String>,
    pub timestamp: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub database: String,
}
