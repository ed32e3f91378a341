/// Catalog data provider abstraction
///
/// A catalog provider turns a third-party movie/TV metadata API into internal
/// [`Title`] records. Titles returned here carry fresh internal ids; callers
/// reconcile them with storage by `external_id`.
use serde::Deserialize;

use crate::{
    error::AppResult,
    models::{Title, TitleType},
};

pub mod tmdb;

pub use tmdb::TmdbProvider;

/// Period a trending list covers
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeWindow {
    #[default]
    Day,
    Week,
}

impl TimeWindow {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeWindow::Day => "day",
            TimeWindow::Week => "week",
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Multi-type search, movies and series only, best match first
    async fn search(&self, query: &str) -> AppResult<Vec<Title>>;

    async fn trending(&self, window: TimeWindow) -> AppResult<Vec<Title>>;

    async fn popular(&self, kind: TitleType) -> AppResult<Vec<Title>>;

    async fn top_rated(&self, kind: TitleType) -> AppResult<Vec<Title>>;

    /// Full record for one catalog entry, `None` when the catalog has no such id
    async fn details(&self, external_id: &str, kind: TitleType) -> AppResult<Option<Title>>;

    async fn similar(&self, external_id: &str, kind: TitleType) -> AppResult<Vec<Title>>;

    /// Provider name for logging and debugging
    fn name(&self) -> &'static str;
}
