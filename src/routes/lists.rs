use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    api::{AppState, ValidatedJson},
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateListRequest, List, ListUpdate, NewList, SystemList},
};

use super::titles::existing_title;

/// Loads a list the caller owns: 404 if missing, 403 otherwise
async fn owned_list(state: &AppState, user: &CurrentUser, id: Uuid) -> AppResult<List> {
    let list = state
        .storage
        .get_list(id)
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".to_string()))?;

    if list.owner_id != user.id {
        return Err(AppError::Forbidden("You do not own this list".to_string()));
    }
    Ok(list)
}

/// The caller's own Watchlist or Favorites, creating the user if needed
async fn own_system_list(state: &AppState, user: &CurrentUser, which: SystemList) -> AppResult<List> {
    user.ensure(state.storage.as_ref()).await?;
    state
        .storage
        .system_list(&user.id, which)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} not found", which.name())))
}

pub async fn user_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<List>> {
    if user_id == user.id {
        user.ensure(state.storage.as_ref()).await?;
    }
    state
        .storage
        .user_watchlist(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Watchlist not found".to_string()))
}

pub async fn user_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<List>> {
    if user_id == user.id {
        user.ensure(state.storage.as_ref()).await?;
    }
    state
        .storage
        .user_favorites(&user_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Favorites not found".to_string()))
}

/// All of the caller's lists, or only the public ones of another user
pub async fn user_lists(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(user_id): Path<String>,
) -> AppResult<Json<Vec<List>>> {
    let lists = state.storage.user_lists(&user_id).await?;
    if user_id == user.id {
        return Ok(Json(lists));
    }
    Ok(Json(lists.into_iter().filter(|l| l.is_public).collect()))
}

pub async fn create_list(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateListRequest>,
) -> AppResult<(StatusCode, Json<List>)> {
    user.ensure(state.storage.as_ref()).await?;

    let list = state
        .storage
        .create_list(NewList {
            owner_id: user.id.clone(),
            name: request.name,
            description: request.description,
            is_public: request.is_public,
            is_system: false,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(list)))
}

pub async fn get_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<List>> {
    let list = state
        .storage
        .get_list(id)
        .await?
        .ok_or_else(|| AppError::NotFound("List not found".to_string()))?;

    if !list.is_public && list.owner_id != user.id {
        return Err(AppError::Forbidden("This list is private".to_string()));
    }
    Ok(Json(list))
}

pub async fn update_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    ValidatedJson(update): ValidatedJson<ListUpdate>,
) -> AppResult<Json<List>> {
    let list = owned_list(&state, &user, id).await?;

    if list.is_system && update.name.as_ref().is_some_and(|name| *name != list.name) {
        return Err(AppError::InvalidInput(
            "System lists cannot be renamed".to_string(),
        ));
    }

    let updated = state.storage.update_list(id, update).await?;
    Ok(Json(updated))
}

pub async fn delete_list(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let list = owned_list(&state, &user, id).await?;

    if list.is_system {
        return Err(AppError::InvalidInput(
            "System lists cannot be deleted".to_string(),
        ));
    }

    state.storage.delete_list(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_list_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, title_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<List>> {
    owned_list(&state, &user, id).await?;
    existing_title(&state, title_id).await?;
    Ok(Json(state.storage.add_to_list(id, title_id).await?))
}

pub async fn remove_list_title(
    State(state): State<AppState>,
    user: CurrentUser,
    Path((id, title_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<List>> {
    owned_list(&state, &user, id).await?;
    Ok(Json(state.storage.remove_from_list(id, title_id).await?))
}

async fn system_contains(
    state: &AppState,
    user: &CurrentUser,
    which: SystemList,
    title_id: Uuid,
) -> AppResult<Json<Value>> {
    let list = own_system_list(state, user, which).await?;
    Ok(Json(json!({ "inList": list.contains(title_id) })))
}

async fn system_add(
    state: &AppState,
    user: &CurrentUser,
    which: SystemList,
    title_id: Uuid,
) -> AppResult<Json<List>> {
    let list = own_system_list(state, user, which).await?;
    existing_title(state, title_id).await?;
    Ok(Json(state.storage.add_to_list(list.id, title_id).await?))
}

async fn system_remove(
    state: &AppState,
    user: &CurrentUser,
    which: SystemList,
    title_id: Uuid,
) -> AppResult<Json<List>> {
    let list = own_system_list(state, user, which).await?;
    Ok(Json(state.storage.remove_from_list(list.id, title_id).await?))
}

pub async fn watchlist_contains(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    system_contains(&state, &user, SystemList::Watchlist, title_id).await
}

pub async fn add_to_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<List>> {
    system_add(&state, &user, SystemList::Watchlist, title_id).await
}

pub async fn remove_from_watchlist(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<List>> {
    system_remove(&state, &user, SystemList::Watchlist, title_id).await
}

pub async fn favorites_contains(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<Value>> {
    system_contains(&state, &user, SystemList::Favorites, title_id).await
}

pub async fn add_to_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<List>> {
    system_add(&state, &user, SystemList::Favorites, title_id).await
}

pub async fn remove_from_favorites(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(title_id): Path<Uuid>,
) -> AppResult<Json<List>> {
    system_remove(&state, &user, SystemList::Favorites, title_id).await
}
