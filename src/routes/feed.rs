use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::AppState, error::AppResult, middleware::CurrentUser, models::EnrichedPost, services::feed,
};

use super::clamp_limit;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    limit: Option<usize>,
    offset: Option<usize>,
}

pub async fn get_feed(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<FeedQuery>,
) -> AppResult<Json<Vec<EnrichedPost>>> {
    let limit = clamp_limit(params.limit, 20);
    let offset = params.offset.unwrap_or(0);

    let posts = feed::get_feed(state.storage.clone(), &user.id, limit, offset).await?;
    Ok(Json(posts))
}
