use axum::{extract::State, Json};
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{AppJson, AppState},
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{AiSearchRequest, AiSearchResponse, ChatRequest, ChatResponse},
    services::discovery,
};

fn new_session_id() -> String {
    format!("session_{}", Uuid::new_v4().simple())
}

/// One discovery chat turn. Answers 503 before looking at the body when no
/// recommender is configured.
pub async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<ChatRequest>,
) -> AppResult<Json<ChatResponse>> {
    let recommender = state.require_recommender()?;
    request
        .validate()
        .map_err(|e| AppError::validation("Invalid chat request", e))?;

    tracing::info!(
        user_id = %user.id,
        history = request.conversation_history.len(),
        "AI chat request"
    );

    let outcome = discovery::chat(
        recommender.as_ref(),
        state.storage.clone(),
        state.catalog.clone(),
        &request.message,
        &request.conversation_history,
    )
    .await;

    Ok(Json(ChatResponse {
        message: outcome.message,
        recommendations: outcome.recommendations,
        conversation_continues: outcome.continues,
        session_id: request.session_id.unwrap_or_else(new_session_id),
    }))
}

pub async fn search(
    State(state): State<AppState>,
    user: CurrentUser,
    AppJson(request): AppJson<AiSearchRequest>,
) -> AppResult<Json<AiSearchResponse>> {
    let recommender = state.require_recommender()?;
    request
        .validate()
        .map_err(|e| AppError::validation("Invalid search request", e))?;

    tracing::info!(user_id = %user.id, query = %request.query, "AI search request");

    let results = discovery::search(
        recommender.as_ref(),
        state.storage.clone(),
        state.catalog.clone(),
        &request.query,
        request.context,
    )
    .await;

    Ok(Json(AiSearchResponse { results }))
}
