//! Quest HTTP API
//!
//! Read-only routes over the quest registry.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use super::registry::QuestRegistry;

#[derive(Clone)]
pub struct ApiState {
    pub registry: Arc<QuestRegistry>,
}

/// Build the service router; quest routes live under `base_path`
pub fn router(registry: Arc<QuestRegistry>, base_path: &str) -> Router {
    let base = base_path.trim_end_matches('/');

    Router::new()
        .route("/health", get(health_check))
        .route(&format!("{}/quests/:id", base), get(get_quest))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(tower_http::cors::Any)
                .allow_methods([axum::http::Method::GET, axum::http::Method::OPTIONS])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
        .with_state(ApiState { registry })
}

async fn health_check(State(state): State<ApiState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "quests": state.registry.count().await,
        "timestamp": chrono::Utc::now().timestamp_millis()
    }))
}

/// 200 with an empty body when the quest exists
async fn get_quest(State(state): State<ApiState>, Path(id): Path<String>) -> StatusCode {
    let Ok(id) = id.parse::<u32>() else {
        return StatusCode::BAD_REQUEST;
    };
    // Ids past the quest id range cannot exist
    let Ok(quest_id) = u16::try_from(id) else {
        return StatusCode::NOT_FOUND;
    };

    match state.registry.lookup(quest_id).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            debug!("{}", e);
            StatusCode::NOT_FOUND
        }
    }
}
