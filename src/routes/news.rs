use axum::{
    Router,
    routing::{get, post},
    Json,
    extract::{State, Path},
    response::Json as ResponseJson,
};
use crate::db::DatabaseOperations;
use crate::models::{
    AggregateResponse, AppState, CategoryResponse, NewsHealthResponse, PersonalizedRequest,
    PreferencesRequest,
};
use crate::news::{Category, UserProfile};
use std::time::Instant;
use tracing::{error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/news/fetch-parallel", post(fetch_parallel))
        .route("/api/news/fetch-category/{category}", post(fetch_category))
        .route("/api/news/fetch-personalized", post(fetch_personalized))
        .route("/api/news/health", get(news_health))
        .with_state(state)
}

/// Aggregate all four categories with preferences supplied inline.
async fn fetch_parallel(
    State(state): State<AppState>,
    Json(request): Json<PreferencesRequest>,
) -> Result<ResponseJson<AggregateResponse>, axum::http::StatusCode> {
    info!(
        expertise = ?request.expertise_areas,
        "Received parallel aggregation request"
    );

    let profile = UserProfile::from(&request);
    Ok(Json(aggregate_all(&state, profile).await))
}

/// Aggregate one category; 400 on an unrecognized category segment.
async fn fetch_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<PreferencesRequest>,
) -> Result<ResponseJson<CategoryResponse>, axum::http::StatusCode> {
    let category: Category = category
        .parse()
        .map_err(|_| axum::http::StatusCode::BAD_REQUEST)?;
    info!(category = %category, "Received single-category aggregation request");

    let profile = UserProfile::from(&request);
    let result = state.aggregator.aggregate_category(&profile, category).await;

    let response = CategoryResponse {
        category: category.as_str().to_string(),
        count: result.items.len(),
        news_items: result.items,
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Ok(Json(response))
}

/// Aggregate all four categories from the stored preference record.
///
/// A missing record falls back to the documented default profile; only
/// a store failure surfaces as an error.
async fn fetch_personalized(
    State(state): State<AppState>,
    Json(request): Json<PersonalizedRequest>,
) -> Result<ResponseJson<AggregateResponse>, axum::http::StatusCode> {
    info!(session_id = %request.session_id, "Received personalized aggregation request");

    let profile = match DatabaseOperations::get_user_by_session(&state.pool, &request.session_id)
        .await
    {
        Ok(Some(record)) => UserProfile::from(&record),
        Ok(None) => UserProfile::default(),
        Err(e) => {
            error!(session_id = %request.session_id, error = %e, "Failed to load preferences");
            return Err(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        }
    };

    Ok(Json(aggregate_all(&state, profile).await))
}

async fn news_health() -> ResponseJson<NewsHealthResponse> {
    let response = NewsHealthResponse {
        status: "healthy".to_string(),
        service: "news_aggregation".to_string(),
        agents: Category::ALL
            .iter()
            .map(|category| category.as_str().to_string())
            .collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    Json(response)
}

async fn aggregate_all(state: &AppState, profile: UserProfile) -> AggregateResponse {
    let started = Instant::now();
    let mut results = state.aggregator.aggregate(&profile).await;

    let response = AggregateResponse {
        regulatory: results.remove(&Category::Regulatory).unwrap_or_default(),
        clinical: results.remove(&Category::Clinical).unwrap_or_default(),
        market: results.remove(&Category::Market).unwrap_or_default(),
        rwe: results.remove(&Category::Rwe).unwrap_or_default(),
        processing_time: started.elapsed().as_secs_f64(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };

    info!(
        regulatory = response.regulatory.len(),
        clinical = response.clinical.len(),
        market = response.market.len(),
        rwe = response.rwe.len(),
        elapsed_secs = response.processing_time,
        "Aggregation complete"
    );

    response
}
