use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{Follow, FollowStats, PostWithRefs, User},
    services::feed,
    storage::Storage,
};

use super::{message, LimitQuery};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub user: User,
    pub follow_stats: FollowStats,
    pub is_following: bool,
}

async fn follow_stats_for(storage: &dyn Storage, user_id: &str) -> AppResult<FollowStats> {
    let (followers, following) =
        tokio::try_join!(storage.followers(user_id), storage.following(user_id))?;
    Ok(FollowStats {
        followers_count: followers.len(),
        following_count: following.len(),
    })
}

async fn build_profile(state: &AppState, target: User, viewer: &str) -> AppResult<Json<ProfileResponse>> {
    let storage = state.storage.as_ref();
    let follow_stats = follow_stats_for(storage, &target.id).await?;
    let is_following = target.id != viewer && storage.is_following(viewer, &target.id).await?;

    Ok(Json(ProfileResponse {
        user: target,
        follow_stats,
        is_following,
    }))
}

pub async fn own_profile(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<ProfileResponse>> {
    let me = user.ensure(state.storage.as_ref()).await?;
    build_profile(&state, me, &user.id).await
}

pub async fn profile_by_username(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(username): Path<String>,
) -> AppResult<Json<ProfileResponse>> {
    let target = state
        .storage
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    build_profile(&state, target, &user.id).await
}

pub async fn user_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<String>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<PostWithRefs>>> {
    let posts = state.storage.posts_by_user(&user_id, params.or(20)).await?;
    Ok(Json(feed::attach_refs(state.storage.clone(), posts).await))
}

pub async fn follow_stats(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<FollowStats>> {
    Ok(Json(follow_stats_for(state.storage.as_ref(), &user_id).await?))
}

/// 201 for a new edge, 200 when the caller already follows the target
pub async fn follow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(target_id): Path<String>,
) -> AppResult<(StatusCode, Json<Follow>)> {
    user.ensure(state.storage.as_ref()).await?;

    if target_id != user.id && state.storage.get_user(&target_id).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let already = state.storage.is_following(&user.id, &target_id).await?;
    let edge = state.storage.create_follow(&user.id, &target_id).await?;

    if already {
        return Ok((StatusCode::OK, Json(edge)));
    }
    tracing::info!(follower_id = %user.id, following_id = %target_id, "Follow created");
    Ok((StatusCode::CREATED, Json(edge)))
}

pub async fn unfollow(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(target_id): Path<String>,
) -> AppResult<Json<Value>> {
    if !state.storage.delete_follow(&user.id, &target_id).await? {
        return Err(AppError::InvalidInput("Not following this user".to_string()));
    }
    Ok(message("Unfollowed"))
}

pub async fn suggested(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<User>>> {
    let users = state.storage.suggested_users(&user.id, params.or(5)).await?;
    Ok(Json(users))
}
