use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{AppState, ValidatedJson},
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateTitleRequest, PostWithRefs, Title},
    services::{enrichment, feed, providers::TimeWindow},
};

use super::{clamp_limit, LimitQuery};

#[derive(Debug, Deserialize)]
pub struct TrendingQuery {
    limit: Option<usize>,
    #[serde(default)]
    window: TimeWindow,
}

/// Stored titles by rating. An empty store is seeded from the catalog's
/// trending list.
pub async fn trending(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<TrendingQuery>,
) -> AppResult<Json<Vec<Title>>> {
    let limit = clamp_limit(params.limit, 10);

    let stored = state.storage.trending_titles(limit).await?;
    if !stored.is_empty() {
        return Ok(Json(stored));
    }

    let Some(catalog) = &state.catalog else {
        return Ok(Json(stored));
    };

    match catalog.trending(params.window).await {
        Ok(hits) => {
            let hits: Vec<Title> = hits.into_iter().take(limit).collect();
            tracing::info!(count = hits.len(), window = params.window.as_str(), "Seeding trending titles from catalog");
            Ok(Json(enrichment::reconcile(state.storage.clone(), hits).await))
        }
        Err(e) => {
            tracing::warn!(error = %e, provider = catalog.name(), "Catalog trending failed");
            Ok(Json(stored))
        }
    }
}

pub async fn get_title(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Title>> {
    existing_title(&state, id).await.map(Json)
}

pub(crate) async fn existing_title(state: &AppState, id: Uuid) -> AppResult<Title> {
    state
        .storage
        .get_title(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Title not found".to_string()))
}

pub async fn title_posts(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<PostWithRefs>>> {
    let posts = state.storage.posts_by_title(id, params.or(20)).await?;
    Ok(Json(feed::attach_refs(state.storage.clone(), posts).await))
}

/// Stored titles sharing a genre; falls back to the catalog's similar list
/// for catalog-sourced titles with no local neighbours
pub async fn related(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    Query(params): Query<LimitQuery>,
) -> AppResult<Json<Vec<Title>>> {
    let limit = params.or(5);
    let title = existing_title(&state, id).await?;

    let local = state.storage.related_titles(id, limit).await?;
    if !local.is_empty() {
        return Ok(Json(local));
    }

    let (Some(catalog), Some(external_id)) = (&state.catalog, &title.external_id) else {
        return Ok(Json(local));
    };

    match catalog.similar(external_id, title.title_type).await {
        Ok(hits) => {
            let hits = hits.into_iter().take(limit).collect();
            Ok(Json(enrichment::reconcile(state.storage.clone(), hits).await))
        }
        Err(e) => {
            tracing::warn!(error = %e, title_id = %id, "Catalog similar lookup failed");
            Ok(Json(local))
        }
    }
}

pub async fn create_title(
    State(state): State<AppState>,
    _user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateTitleRequest>,
) -> AppResult<(StatusCode, Json<Title>)> {
    let title = state.storage.create_title(Title::from(request)).await?;
    tracing::info!(title_id = %title.id, name = %title.name, "Title created");
    Ok((StatusCode::CREATED, Json(title)))
}
