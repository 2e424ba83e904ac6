use axum::{
    Router,
    routing::{get, post},
    Json,
    extract::{State, Path},
    response::Json as ResponseJson,
};
use crate::db::DatabaseOperations;
use crate::models::{AppState, PreferencesResponse, SavePreferencesRequest, UserRecord};
use tracing::{error, info};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/users/preferences", post(save_preferences))
        .route("/api/users/preferences/{session_id}", get(get_preferences))
        .with_state(state)
}

async fn save_preferences(
    State(state): State<AppState>,
    Json(request): Json<SavePreferencesRequest>,
) -> Result<ResponseJson<PreferencesResponse>, axum::http::StatusCode> {
    info!(session_id = %request.session_id, "Saving user preferences");

    let user = DatabaseOperations::upsert_preferences(
        &state.pool,
        &request.session_id,
        &request.preferences,
    )
    .await
    .map_err(|e| {
        error!(session_id = %request.session_id, error = %e, "Failed to save preferences");
        axum::http::StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(PreferencesResponse {
        success: true,
        user,
    }))
}

async fn get_preferences(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<ResponseJson<UserRecord>, axum::http::StatusCode> {
    let user = DatabaseOperations::get_user_by_session(&state.pool, &session_id)
        .await
        .map_err(|e| {
            error!(session_id = %session_id, error = %e, "Failed to load preferences");
            axum::http::StatusCode::INTERNAL_SERVER_ERROR
        })?
        .ok_or(axum::http::StatusCode::NOT_FOUND)?;

    Ok(Json(user))
}
