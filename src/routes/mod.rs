use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

pub mod ai;
pub mod auth;
pub mod catalog;
pub mod feed;
pub mod health;
pub mod lists;
pub mod posts;
pub mod recommendations;
pub mod reports;
pub mod search;
pub mod titles;
pub mod users;

/// Upper bound for any `?limit=` parameter
pub const MAX_LIMIT: usize = 100;

/// `?limit=` with a per-route default
#[derive(Debug, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

impl LimitQuery {
    pub fn or(&self, default: usize) -> usize {
        clamp_limit(self.limit, default)
    }
}

pub fn clamp_limit(limit: Option<usize>, default: usize) -> usize {
    limit.unwrap_or(default).clamp(1, MAX_LIMIT)
}

/// `{"message": ...}` body used by acknowledgement responses
pub fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}
