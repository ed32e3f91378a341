//! Persistence capability set
//!
//! One trait, two backends: an in-memory map store used when no database is
//! configured, and a Postgres store. The backend is chosen once at startup.
//! Every write that touches a post counter happens inside the same logical
//! operation as the interaction write that caused it.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
    config::Config,
    db,
    error::AppResult,
    models::{
        Follow, Interaction, InteractionType, List, ListUpdate, NewInteraction, NewList, NewPost,
        Post, Recommendation, Report, ReportStatus, SystemList, Title, UpsertUser, User,
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStorage;
pub use postgres::PostgresStorage;

#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// Backend name for logging
    fn name(&self) -> &'static str;

    /// Whether data survives a restart
    fn is_persistent(&self) -> bool;

    // Users

    async fn get_user(&self, id: &str) -> AppResult<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>>;

    /// Creates or refreshes a user and makes sure both system lists exist
    async fn upsert_user(&self, user: UpsertUser) -> AppResult<User>;

    /// Users the given user does not follow yet, excluding themselves
    async fn suggested_users(&self, user_id: &str, limit: usize) -> AppResult<Vec<User>>;

    // Titles

    async fn get_title(&self, id: Uuid) -> AppResult<Option<Title>>;

    async fn get_title_by_external_id(&self, external_id: &str) -> AppResult<Option<Title>>;

    /// Inserts a title. A duplicate external id is a `Conflict`.
    async fn create_title(&self, title: Title) -> AppResult<Title>;

    /// Case-insensitive substring match on the name, best rated first
    async fn search_titles(&self, query: &str, limit: usize) -> AppResult<Vec<Title>>;

    async fn trending_titles(&self, limit: usize) -> AppResult<Vec<Title>>;

    /// Other titles sharing at least one genre
    async fn related_titles(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Title>>;

    // Posts

    async fn get_post(&self, id: Uuid) -> AppResult<Option<Post>>;

    async fn create_post(&self, post: NewPost) -> AppResult<Post>;

    /// Visible posts by the user and everyone they follow, newest first
    async fn feed_posts(&self, user_id: &str, limit: usize, offset: usize)
        -> AppResult<Vec<Post>>;

    async fn posts_by_title(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Post>>;

    async fn posts_by_user(&self, user_id: &str, limit: usize) -> AppResult<Vec<Post>>;

    // Interactions

    /// Records an interaction and bumps the matching post counter.
    /// A second like/save/repost by the same user is `InvalidInput`.
    async fn create_interaction(&self, interaction: NewInteraction) -> AppResult<Interaction>;

    async fn get_interaction(&self, id: Uuid) -> AppResult<Option<Interaction>>;

    async fn get_user_interaction(
        &self,
        user_id: &str,
        post_id: Uuid,
        interaction_type: InteractionType,
    ) -> AppResult<Option<Interaction>>;

    /// Removes an interaction and decrements the matching counter, floored at zero.
    /// Returns whether anything was deleted.
    async fn delete_interaction(&self, id: Uuid) -> AppResult<bool>;

    async fn post_comments(&self, post_id: Uuid, limit: usize) -> AppResult<Vec<Interaction>>;

    // Follows

    /// Self-follows are rejected; following twice returns the existing edge
    async fn create_follow(&self, follower_id: &str, following_id: &str) -> AppResult<Follow>;

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool>;

    /// Edges where the user is the follower
    async fn following(&self, user_id: &str) -> AppResult<Vec<Follow>>;

    /// Edges where the user is followed
    async fn followers(&self, user_id: &str) -> AppResult<Vec<Follow>>;

    async fn is_following(&self, follower_id: &str, following_id: &str) -> AppResult<bool>;

    // Lists

    async fn create_list(&self, list: NewList) -> AppResult<List>;

    async fn get_list(&self, id: Uuid) -> AppResult<Option<List>>;

    async fn user_lists(&self, user_id: &str) -> AppResult<Vec<List>>;

    async fn update_list(&self, id: Uuid, update: ListUpdate) -> AppResult<List>;

    async fn delete_list(&self, id: Uuid) -> AppResult<bool>;

    async fn add_to_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List>;

    async fn remove_from_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List>;

    async fn system_list(&self, user_id: &str, which: SystemList) -> AppResult<Option<List>>;

    async fn user_watchlist(&self, user_id: &str) -> AppResult<Option<List>> {
        self.system_list(user_id, SystemList::Watchlist).await
    }

    async fn user_favorites(&self, user_id: &str) -> AppResult<Option<List>> {
        self.system_list(user_id, SystemList::Favorites).await
    }

    // Recommendations

    async fn create_recommendation(&self, recommendation: Recommendation)
        -> AppResult<Recommendation>;

    /// Unshown recommendations, highest score first
    async fn user_recommendations(&self, user_id: &str, limit: usize)
        -> AppResult<Vec<Recommendation>>;

    /// False when the recommendation is missing or belongs to someone else
    async fn mark_recommendation_shown(&self, id: Uuid, user_id: &str) -> AppResult<bool>;

    // Reports

    async fn create_report(&self, report: Report) -> AppResult<Report>;

    async fn reports(&self, status: Option<ReportStatus>) -> AppResult<Vec<Report>>;

    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<bool>;
}

/// Picks the backend from configuration: Postgres when a database URL is
/// present, otherwise the in-memory store with sample titles
pub async fn create_storage(config: &Config) -> AppResult<Arc<dyn Storage>> {
    match &config.database_url {
        Some(url) => {
            let pool = db::create_pool(url).await?;
            db::run_migrations(&pool).await?;
            Ok(Arc::new(PostgresStorage::new(pool)))
        }
        None => {
            tracing::warn!("DATABASE_URL is not set, using in-memory storage");
            Ok(Arc::new(MemoryStorage::with_sample_titles()))
        }
    }
}
