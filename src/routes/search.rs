use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    api::AppState,
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::Title,
    services::enrichment,
};

use super::clamp_limit;

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    q: Option<String>,
    limit: Option<usize>,
}

/// Catalog-first title search. Catalog hits are stored so their ids are
/// stable; without a catalog, or when it fails or finds nothing, storage
/// answers. Lookup failures never fail the request.
pub async fn search(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<SearchQuery>,
) -> AppResult<Json<Vec<Title>>> {
    let query = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| AppError::InvalidInput("Search query required".to_string()))?;
    let limit = clamp_limit(params.limit, 20);

    if let Some(catalog) = &state.catalog {
        match catalog.search(query).await {
            Ok(hits) if !hits.is_empty() => {
                let hits = hits.into_iter().take(limit).collect();
                return Ok(Json(enrichment::reconcile(state.storage.clone(), hits).await));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(error = %e, query = %query, provider = catalog.name(), "Catalog search failed, using storage");
            }
        }
    }

    let titles = state
        .storage
        .search_titles(query, limit)
        .await
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, query = %query, "Storage search failed");
            Vec::new()
        });
    Ok(Json(titles))
}
