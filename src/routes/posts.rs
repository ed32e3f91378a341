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
    models::{
        CreateCommentRequest, CreatePostRequest, Interaction, InteractionType, NewInteraction,
        Post, PostWithRefs,
    },
    services::feed,
};

use super::{message, LimitQuery};

pub async fn create_post(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> AppResult<(StatusCode, Json<Post>)> {
    user.ensure(state.storage.as_ref()).await?;

    if state.storage.get_title(request.title_id).await?.is_none() {
        return Err(AppError::NotFound("Title not found".to_string()));
    }

    let post = state
        .storage
        .create_post(request.into_new_post(user.id.clone()))
        .await?;

    tracing::info!(post_id = %post.id, author_id = %post.author_id, "Post created");
    Ok((StatusCode::CREATED, Json(post)))
}

pub async fn get_post(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PostWithRefs>> {
    let post = visible_post(&state, id).await?;
    feed::attach_refs(state.storage.clone(), vec![post])
        .await
        .pop()
        .map(Json)
        .ok_or_else(|| AppError::Internal("post lost while attaching refs".to_string()))
}

async fn visible_post(state: &AppState, id: Uuid) -> AppResult<Post> {
    state
        .storage
        .get_post(id)
        .await?
        .filter(|post| !post.is_hidden)
        .ok_or_else(|| AppError::NotFound("Post not found".to_string()))
}

fn past_tense(kind: InteractionType) -> &'static str {
    match kind {
        InteractionType::Like => "liked",
        InteractionType::Save => "saved",
        InteractionType::Repost => "reposted",
        InteractionType::Comment => "commented on",
    }
}

async fn add_interaction(
    state: &AppState,
    user: &CurrentUser,
    post_id: Uuid,
    kind: InteractionType,
) -> AppResult<Json<Value>> {
    user.ensure(state.storage.as_ref()).await?;
    state
        .storage
        .create_interaction(NewInteraction::new(user.id.clone(), post_id, kind))
        .await?;

    tracing::debug!(user_id = %user.id, post_id = %post_id, kind = %kind, "Interaction added");
    Ok(message(format!("Post {}", past_tense(kind))))
}

async fn remove_interaction(
    state: &AppState,
    user: &CurrentUser,
    post_id: Uuid,
    kind: InteractionType,
) -> AppResult<Json<Value>> {
    let existing = state
        .storage
        .get_user_interaction(&user.id, post_id, kind)
        .await?
        .ok_or_else(|| AppError::InvalidInput(format!("Post not {}", past_tense(kind))))?;

    state.storage.delete_interaction(existing.id).await?;

    tracing::debug!(user_id = %user.id, post_id = %post_id, kind = %kind, "Interaction removed");
    Ok(message(format!("Post un{}", past_tense(kind))))
}

pub async fn like_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    add_interaction(&state, &user, id, InteractionType::Like).await
}

pub async fn unlike_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    remove_interaction(&state, &user, id, InteractionType::Like).await
}

pub async fn save_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    add_interaction(&state, &user, id, InteractionType::Save).await
}

pub async fn unsave_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    remove_interaction(&state, &user, id, InteractionType::Save).await
}

pub async fn repost_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    add_interaction(&state, &user, id, InteractionType::Repost).await
}

pub async fn unrepost_post(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    remove_interaction(&state, &user, id, InteractionType::Repost).await
}

pub async fn list_comments(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Interaction>>> {
    visible_post(&state, id).await?;
    let comments = state.storage.post_comments(id, params.or(50)).await?;
    Ok(Json(comments))
}

pub async fn create_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> AppResult<(StatusCode, Json<Interaction>)> {
    user.ensure(state.storage.as_ref()).await?;

    let comment = state
        .storage
        .create_interaction(NewInteraction::comment(user.id.clone(), id, request.content))
        .await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// Only the comment's author may delete it
pub async fn delete_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let comment = state
        .storage
        .get_interaction(id)
        .await?
        .filter(|i| i.interaction_type == InteractionType::Comment)
        .ok_or_else(|| AppError::NotFound("Comment not found".to_string()))?;

    if comment.user_id != user.id {
        return Err(AppError::Forbidden(
            "Only the author can delete this comment".to_string(),
        ));
    }

    state.storage.delete_interaction(comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
