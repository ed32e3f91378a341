use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api::{AppState, ValidatedJson},
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateRecommendationRequest, Recommendation, RecommendationWithTitle},
};

use super::{message, titles::existing_title, LimitQuery};

/// The caller's unshown recommendations, best first, each with its title
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<RecommendationWithTitle>>> {
    let recommendations = state
        .storage
        .user_recommendations(&user.id, params.or(10))
        .await?;

    let mut results = Vec::with_capacity(recommendations.len());
    for recommendation in recommendations {
        let title = state.storage.get_title(recommendation.title_id).await?;
        results.push(RecommendationWithTitle {
            recommendation,
            title,
        });
    }
    Ok(Json(results))
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateRecommendationRequest>,
) -> AppResult<(StatusCode, Json<Recommendation>)> {
    user.ensure(state.storage.as_ref()).await?;
    existing_title(&state, request.title_id).await?;

    let recommendation = state
        .storage
        .create_recommendation(request.into_recommendation(user.id.clone()))
        .await?;
    Ok((StatusCode::CREATED, Json(recommendation)))
}

pub async fn mark_shown(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    if !state.storage.mark_recommendation_shown(id, &user.id).await? {
        return Err(AppError::NotFound("Recommendation not found".to_string()));
    }
    Ok(message("Marked as shown"))
}
