//! API Routes
//!
//! This module organizes all HTTP endpoints for the application:
//! - `/api/news/fetch-parallel` - All four categories, aggregated in parallel
//! - `/api/news/fetch-category/{category}` - Single category aggregation
//! - `/api/news/fetch-personalized` - Aggregation from stored preferences
//! - `/api/news/health` - Aggregation service health
//! - `/api/chat/{category}` - Category-scoped news chat
//! - `/api/chat/{category}/history/{session_id}` - Chat history reads/clears
//! - `/api/users/preferences` - Preference storage
//! - `/api/health` - Liveness and database status

pub mod chat;
pub mod health;
pub mod news;
pub mod users;

use axum::Router;
use crate::models::AppState;
use tracing::info;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    info!("Creating application router");

    Router::new()
        .merge(news::router(state.clone()))
        .merge(chat::router(state.clone()))
        .merge(users::router(state.clone()))
        .merge(health::router(state))
}
