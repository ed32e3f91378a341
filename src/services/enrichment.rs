//! Resolves free-text suggestions into concrete titles
//!
//! Each stub is matched against storage first (persistent backends only), then
//! against the catalog, and otherwise echoed back unresolved. Stubs resolve
//! concurrently; the output keeps the input order and length. No lookup
//! failure ever escapes this module.

use std::sync::Arc;

use crate::{
    error::AppError,
    models::{EnrichedRecommendation, SuggestionStub, Title},
    services::providers::CatalogProvider,
    storage::Storage,
};

/// Resolves every stub, preserving order. Always returns `stubs.len()` entries.
pub async fn enrich(
    stubs: Vec<SuggestionStub>,
    storage: Arc<dyn Storage>,
    catalog: Option<Arc<dyn CatalogProvider>>,
) -> Vec<EnrichedRecommendation> {
    let mut tasks = Vec::with_capacity(stubs.len());

    for stub in &stubs {
        let stub = stub.clone();
        let storage = storage.clone();
        let catalog = catalog.clone();
        let task = tokio::spawn(async move { resolve(&stub, storage, catalog).await });
        tasks.push(task);
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (stub, task) in stubs.iter().zip(tasks) {
        match task.await {
            Ok(enriched) => results.push(enriched),
            Err(e) => {
                tracing::error!(error = %e, stub = %stub.title, "Task join error");
                results.push(EnrichedRecommendation::unresolved(stub));
            }
        }
    }

    let resolved = results.iter().filter(|r| r.is_resolved()).count();
    tracing::info!(
        total = results.len(),
        resolved = resolved,
        "Suggestions enriched"
    );

    results
}

async fn resolve(
    stub: &SuggestionStub,
    storage: Arc<dyn Storage>,
    catalog: Option<Arc<dyn CatalogProvider>>,
) -> EnrichedRecommendation {
    if storage.is_persistent() {
        match storage.search_titles(&stub.title, 1).await {
            Ok(titles) => {
                if let Some(title) = titles.into_iter().next() {
                    return EnrichedRecommendation::resolved(title, stub);
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, stub = %stub.title, "Storage lookup failed, trying catalog");
            }
        }
    }

    if let Some(catalog) = catalog {
        match catalog.search(&stub.title).await {
            Ok(hits) => {
                if let Some(hit) = hits.into_iter().next() {
                    persist_in_background(storage, hit.clone());
                    return EnrichedRecommendation::resolved(hit, stub);
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    stub = %stub.title,
                    provider = catalog.name(),
                    "Catalog lookup failed"
                );
            }
        }
    }

    EnrichedRecommendation::unresolved(stub)
}

/// Stores a catalog title unless one with the same external id already
/// exists. Result discarded; failures are logged.
pub fn persist_in_background(storage: Arc<dyn Storage>, title: Title) {
    tokio::spawn(async move {
        if let Err(e) = store_if_absent(storage.as_ref(), title).await {
            tracing::warn!(error = %e, "Best-effort title persistence failed");
        }
    });
}

/// Swaps each catalog hit for its stored copy so returned ids are stable.
/// Runs concurrently and keeps order; a hit that cannot be stored is
/// returned as the catalog produced it.
pub async fn reconcile(storage: Arc<dyn Storage>, titles: Vec<Title>) -> Vec<Title> {
    let mut tasks = Vec::with_capacity(titles.len());
    for title in &titles {
        let storage = storage.clone();
        let title = title.clone();
        tasks.push(tokio::spawn(async move {
            store_if_absent(storage.as_ref(), title).await
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (title, task) in titles.into_iter().zip(tasks) {
        match task.await {
            Ok(Ok(stored)) => results.push(stored),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, title = %title.name, "Could not store catalog title");
                results.push(title);
            }
            Err(e) => {
                tracing::error!(error = %e, title = %title.name, "Task join error");
                results.push(title);
            }
        }
    }
    results
}

/// Returns the stored copy of a catalog title, inserting it first if needed
pub async fn store_if_absent(storage: &dyn Storage, title: Title) -> Result<Title, AppError> {
    if let Some(external_id) = &title.external_id {
        if let Some(existing) = storage.get_title_by_external_id(external_id).await? {
            return Ok(existing);
        }
    }

    let external_id = title.external_id.clone();
    match storage.create_title(title).await {
        Ok(created) => Ok(created),
        // lost a race with a concurrent insert of the same title
        Err(AppError::Conflict(msg)) => {
            let existing = match &external_id {
                Some(id) => storage.get_title_by_external_id(id).await?,
                None => None,
            };
            existing.ok_or(AppError::Conflict(msg))
        }
        Err(e) => Err(e),
    }
}
