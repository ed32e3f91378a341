use std::sync::Arc;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    services::{providers::CatalogProvider, recommender::Recommender},
    storage::Storage,
};

/// Shared application state
///
/// The catalog and recommender are optional; routes degrade when they are absent.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<dyn Storage>,
    pub catalog: Option<Arc<dyn CatalogProvider>>,
    pub recommender: Option<Arc<dyn Recommender>>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            storage,
            catalog: None,
            recommender: None,
            config: Arc::new(config),
        }
    }

    pub fn with_catalog(mut self, catalog: Arc<dyn CatalogProvider>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn with_recommender(mut self, recommender: Arc<dyn Recommender>) -> Self {
        self.recommender = Some(recommender);
        self
    }

    /// The recommender, or 503 when AI features are not configured
    pub fn require_recommender(&self) -> AppResult<Arc<dyn Recommender>> {
        self.recommender.clone().ok_or_else(|| {
            AppError::ServiceUnavailable(
                "AI recommendations are disabled (missing OPENAI_API_KEY)".to_string(),
            )
        })
    }
}
