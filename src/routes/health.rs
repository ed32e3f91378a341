use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::api::AppState;

use super::message;

/// Liveness probe
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Liveness plus which backends are live
pub async fn api_health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "env": state.config.app_env,
        "storage": state.storage.name(),
        "hasDb": state.storage.is_persistent(),
        "hasTmdb": state.catalog.is_some(),
        "hasOpenAI": state.recommender.is_some(),
    }))
}

pub async fn login_hint() -> (StatusCode, Json<Value>) {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        message("Login is handled by the upstream identity proxy"),
    )
}
