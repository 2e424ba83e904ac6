// Pharma Signal - personalized healthcare and pharma news aggregation

pub mod config;
pub mod db;
pub mod models;
pub mod types;
pub mod llm;
pub mod news;      // Aggregation pipeline: query generation, search fan-out, dedup, scoring
pub mod chat;      // Category-scoped chat over the same pipeline
pub mod routes;
pub mod middleware;

// Re-exports for convenience
pub use config::Config;
pub use models::AppState;
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use pharma_signal::types::{LLMRequest, LLMResponse, AppResult};

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
