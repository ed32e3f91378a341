//! Catalog browsing. Every title returned is stored first so its id can be
//! used with the rest of the API.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{Title, TitleType},
    services::enrichment,
};

#[derive(Debug, Deserialize)]
pub struct KindQuery {
    #[serde(rename = "type", default)]
    kind: TitleType,
}

fn parse_kind(kind: &str) -> AppResult<TitleType> {
    kind.parse::<TitleType>()
        .map_err(|e| AppError::InvalidInput(e.to_string()))
}

async fn stored(state: &AppState, result: AppResult<Vec<Title>>, what: &str) -> Json<Vec<Title>> {
    match result {
        Ok(hits) => Json(enrichment::reconcile(state.storage.clone(), hits).await),
        Err(e) => {
            tracing::warn!(error = %e, list = what, "Catalog request failed");
            Json(Vec::new())
        }
    }
}

pub async fn popular(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<KindQuery>,
) -> Json<Vec<Title>> {
    let Some(catalog) = state.catalog.clone() else {
        return Json(Vec::new());
    };
    stored(&state, catalog.popular(params.kind).await, "popular").await
}

pub async fn top_rated(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<KindQuery>,
) -> Json<Vec<Title>> {
    let Some(catalog) = state.catalog.clone() else {
        return Json(Vec::new());
    };
    stored(&state, catalog.top_rated(params.kind).await, "top_rated").await
}

/// Full catalog record for `/api/catalog/:type/:externalId`
pub async fn details(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((kind, external_id)): Path<(String, String)>,
) -> AppResult<Json<Title>> {
    let kind = parse_kind(&kind)?;
    let not_found = || AppError::NotFound("Title not found".to_string());

    let catalog = state.catalog.clone().ok_or_else(not_found)?;
    let title = catalog
        .details(&external_id, kind)
        .await?
        .ok_or_else(not_found)?;

    let title = enrichment::store_if_absent(state.storage.as_ref(), title).await?;
    Ok(Json(title))
}

pub async fn similar(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path((kind, external_id)): Path<(String, String)>,
) -> AppResult<Json<Vec<Title>>> {
    let kind = parse_kind(&kind)?;
    let Some(catalog) = state.catalog.clone() else {
        return Ok(Json(Vec::new()));
    };
    Ok(stored(&state, catalog.similar(&external_id, kind).await, "similar").await)
}
