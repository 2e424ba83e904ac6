use axum::{
    Router,
    routing::{delete, get, post},
    Json,
    extract::{State, Path},
    response::Json as ResponseJson,
};
use crate::chat::handle_category_chat;
use crate::db::DatabaseOperations;
use crate::models::{AppState, CategoryChatRequest, CategoryChatResponse, ChatHistoryResponse};
use crate::news::Category;
use tracing::{error, info};

/// Most messages a history read returns.
const HISTORY_PAGE_LIMIT: i64 = 50;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/chat/{category}", post(post_category_chat))
        .route(
            "/api/chat/{category}/history/{session_id}",
            get(get_history),
        )
        .route(
            "/api/chat/{category}/history/{session_id}",
            delete(clear_history),
        )
        .with_state(state)
}

async fn post_category_chat(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Json(request): Json<CategoryChatRequest>,
) -> Result<ResponseJson<CategoryChatResponse>, axum::http::StatusCode> {
    let category: Category = category
        .parse()
        .map_err(|_| axum::http::StatusCode::BAD_REQUEST)?;
    info!(category = %category, session_id = %request.session_id, "Received chat message");

    let response =
        handle_category_chat(&state, category, &request.session_id, &request.message).await;

    Ok(Json(response))
}

async fn get_history(
    State(state): State<AppState>,
    Path((category, session_id)): Path<(String, String)>,
) -> Result<ResponseJson<ChatHistoryResponse>, axum::http::StatusCode> {
    let category: Category = category
        .parse()
        .map_err(|_| axum::http::StatusCode::BAD_REQUEST)?;

    let messages = DatabaseOperations::get_chat_messages(
        &state.pool,
        &session_id,
        category.as_str(),
        HISTORY_PAGE_LIMIT,
    )
    .await
    .map_err(|e| {
        error!(session_id = %session_id, error = %e, "Failed to load chat history");
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let response = ChatHistoryResponse {
        success: true,
        category: category.as_str().to_string(),
        session_id,
        messages,
    };

    Ok(Json(response))
}

async fn clear_history(
    State(state): State<AppState>,
    Path((category, session_id)): Path<(String, String)>,
) -> Result<ResponseJson<serde_json::Value>, axum::http::StatusCode> {
    let category: Category = category
        .parse()
        .map_err(|_| axum::http::StatusCode::BAD_REQUEST)?;

    let deleted =
        DatabaseOperations::delete_chat_messages(&state.pool, &session_id, category.as_str())
            .await
            .map_err(|e| {
                error!(session_id = %session_id, error = %e, "Failed to clear chat history");
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            })?;

    info!(category = %category, session_id = %session_id, deleted, "Chat history cleared");

    Ok(Json(serde_json::json!({
        "success": true,
        "deleted": deleted
    })))
}
