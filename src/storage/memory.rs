use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Storage;
use crate::{
    error::{AppError, AppResult},
    models::{
        Follow, Interaction, InteractionType, List, ListUpdate, NewInteraction, NewList, NewPost,
        Post, Recommendation, Report, ReportStatus, SystemList, Title, TitleType, UpsertUser, User,
    },
};

/// Map-backed storage used when no database is configured.
///
/// All maps sit behind one lock so every read-modify-write (interaction plus
/// counter, list membership) completes without interleaving.
#[derive(Default)]
pub struct MemoryStorage {
    inner: RwLock<MemoryState>,
}

#[derive(Default)]
struct MemoryState {
    users: HashMap<String, User>,
    titles: HashMap<Uuid, Title>,
    posts: HashMap<Uuid, Post>,
    interactions: HashMap<Uuid, Interaction>,
    follows: HashMap<Uuid, Follow>,
    lists: HashMap<Uuid, List>,
    recommendations: HashMap<Uuid, Recommendation>,
    reports: HashMap<Uuid, Report>,
}

fn by_rating_then_name(a: &Title, b: &Title) -> Ordering {
    let ra = a.rating.unwrap_or(0.0);
    let rb = b.rating.unwrap_or(0.0);
    rb.partial_cmp(&ra)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.name.cmp(&b.name))
}

fn newest_first(a: &Post, b: &Post) -> Ordering {
    b.created_at
        .cmp(&a.created_at)
        .then_with(|| b.id.cmp(&a.id))
}

impl MemoryState {
    fn system_list(&self, user_id: &str, which: SystemList) -> Option<&List> {
        self.lists
            .values()
            .find(|list| list.owner_id == user_id && list.is(which))
    }

    fn ensure_system_lists(&mut self, user_id: &str) {
        for which in SystemList::ALL {
            if self.system_list(user_id, which).is_none() {
                let list = which.new_list(user_id).into_list();
                self.lists.insert(list.id, list);
            }
        }
    }

    fn following_ids(&self, user_id: &str) -> HashSet<&str> {
        self.follows
            .values()
            .filter(|f| f.follower_id == user_id)
            .map(|f| f.following_id.as_str())
            .collect()
    }

    fn visible_posts<'a>(&'a self, keep: impl Fn(&Post) -> bool + 'a) -> Vec<&'a Post> {
        let mut posts: Vec<&Post> = self
            .posts
            .values()
            .filter(|post| !post.is_hidden && keep(post))
            .collect();
        posts.sort_by(|a, b| newest_first(a, b));
        posts
    }

    fn list_mut(&mut self, id: Uuid) -> AppResult<&mut List> {
        self.lists
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("List not found".to_string()))
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with a few well-known titles so an unconfigured
    /// instance still has something to show
    pub fn with_sample_titles() -> Self {
        let mut state = MemoryState::default();
        for title in sample_titles() {
            state.titles.insert(title.id, title);
        }
        Self {
            inner: RwLock::new(state),
        }
    }
}

fn sample_titles() -> Vec<Title> {
    let names = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

    vec![
        Title {
            external_id: Some("438631".to_string()),
            year: Some(2021),
            genres: names(&["Sci-Fi", "Adventure", "Drama"]),
            synopsis: Some(
                "Paul Atreides must travel to the most dangerous planet in the universe \
                 to ensure the future of his family and his people."
                    .to_string(),
            ),
            runtime: Some(155),
            cast: names(&["Timothée Chalamet", "Rebecca Ferguson", "Oscar Isaac", "Josh Brolin"]),
            crew: names(&["Denis Villeneuve"]),
            rating: Some(4.2),
            ..Title::new("Dune", TitleType::Movie)
        },
        Title {
            external_id: Some("136315".to_string()),
            year: Some(2022),
            genres: names(&["Comedy", "Drama"]),
            synopsis: Some(
                "A young chef from the fine dining world comes home to Chicago to run \
                 his family sandwich shop."
                    .to_string(),
            ),
            runtime: Some(30),
            cast: names(&["Jeremy Allen White", "Ebon Moss-Bachrach", "Ayo Edebiri"]),
            crew: names(&["Christopher Storer"]),
            rating: Some(4.7),
            ..Title::new("The Bear", TitleType::Series)
        },
        Title {
            external_id: Some("335984".to_string()),
            year: Some(2017),
            genres: names(&["Sci-Fi", "Thriller"]),
            synopsis: Some(
                "Young Blade Runner K's discovery of a long-buried secret leads him to \
                 track down former Blade Runner Rick Deckard."
                    .to_string(),
            ),
            runtime: Some(164),
            cast: names(&["Ryan Gosling", "Harrison Ford", "Ana de Armas"]),
            crew: names(&["Denis Villeneuve"]),
            rating: Some(4.4),
            ..Title::new("Blade Runner 2049", TitleType::Movie)
        },
    ]
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn is_persistent(&self) -> bool {
        false
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let state = self.inner.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn upsert_user(&self, upsert: UpsertUser) -> AppResult<User> {
        let mut state = self.inner.write().await;
        let id = upsert.id.clone();

        let user = match state.users.get_mut(&id) {
            Some(existing) => {
                upsert.apply_to(existing);
                existing.clone()
            }
            None => {
                let user = upsert.into_user();
                state.users.insert(id.clone(), user.clone());
                user
            }
        };

        state.ensure_system_lists(&id);
        Ok(user)
    }

    async fn suggested_users(&self, user_id: &str, limit: usize) -> AppResult<Vec<User>> {
        let state = self.inner.read().await;
        let following = state.following_ids(user_id);

        let mut users: Vec<User> = state
            .users
            .values()
            .filter(|u| u.id != user_id && !following.contains(u.id.as_str()))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        users.truncate(limit);
        Ok(users)
    }

    async fn get_title(&self, id: Uuid) -> AppResult<Option<Title>> {
        Ok(self.inner.read().await.titles.get(&id).cloned())
    }

    async fn get_title_by_external_id(&self, external_id: &str) -> AppResult<Option<Title>> {
        let state = self.inner.read().await;
        Ok(state
            .titles
            .values()
            .find(|t| t.external_id.as_deref() == Some(external_id))
            .cloned())
    }

    async fn create_title(&self, title: Title) -> AppResult<Title> {
        let mut state = self.inner.write().await;

        if let Some(external_id) = &title.external_id {
            let duplicate = state
                .titles
                .values()
                .any(|t| t.external_id.as_ref() == Some(external_id));
            if duplicate {
                return Err(AppError::Conflict(format!(
                    "Title with external id {} already exists",
                    external_id
                )));
            }
        }

        state.titles.insert(title.id, title.clone());
        Ok(title)
    }

    async fn search_titles(&self, query: &str, limit: usize) -> AppResult<Vec<Title>> {
        let state = self.inner.read().await;
        let mut titles: Vec<Title> = state
            .titles
            .values()
            .filter(|t| t.name_matches(query))
            .cloned()
            .collect();
        titles.sort_by(by_rating_then_name);
        titles.truncate(limit);
        Ok(titles)
    }

    async fn trending_titles(&self, limit: usize) -> AppResult<Vec<Title>> {
        let state = self.inner.read().await;
        let mut titles: Vec<Title> = state.titles.values().cloned().collect();
        titles.sort_by(by_rating_then_name);
        titles.truncate(limit);
        Ok(titles)
    }

    async fn related_titles(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Title>> {
        let state = self.inner.read().await;
        let Some(title) = state.titles.get(&title_id) else {
            return Ok(Vec::new());
        };

        let mut related: Vec<Title> = state
            .titles
            .values()
            .filter(|t| t.id != title_id && t.shares_genre_with(title))
            .cloned()
            .collect();
        related.sort_by(by_rating_then_name);
        related.truncate(limit);
        Ok(related)
    }

    async fn get_post(&self, id: Uuid) -> AppResult<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let post = post.into_post();
        self.inner.write().await.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn feed_posts(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Post>> {
        let state = self.inner.read().await;
        let mut authors = state.following_ids(user_id);
        authors.insert(user_id);

        Ok(state
            .visible_posts(|post| authors.contains(post.author_id.as_str()))
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn posts_by_title(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Post>> {
        let state = self.inner.read().await;
        Ok(state
            .visible_posts(|post| post.title_id == title_id)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn posts_by_user(&self, user_id: &str, limit: usize) -> AppResult<Vec<Post>> {
        let state = self.inner.read().await;
        Ok(state
            .visible_posts(|post| post.author_id == user_id)
            .into_iter()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn create_interaction(&self, new: NewInteraction) -> AppResult<Interaction> {
        let mut state = self.inner.write().await;

        if !state.posts.contains_key(&new.post_id) {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        if new.interaction_type.is_unique_per_user() {
            let duplicate = state.interactions.values().any(|i| {
                i.user_id == new.user_id
                    && i.post_id == new.post_id
                    && i.interaction_type == new.interaction_type
            });
            if duplicate {
                return Err(AppError::InvalidInput(format!(
                    "Post already has a {} from this user",
                    new.interaction_type
                )));
            }
        }

        let interaction = new.into_interaction();
        if let Some(post) = state.posts.get_mut(&interaction.post_id) {
            post.adjust_counter(interaction.interaction_type, true);
        }
        state.interactions.insert(interaction.id, interaction.clone());
        Ok(interaction)
    }

    async fn get_interaction(&self, id: Uuid) -> AppResult<Option<Interaction>> {
        Ok(self.inner.read().await.interactions.get(&id).cloned())
    }

    async fn get_user_interaction(
        &self,
        user_id: &str,
        post_id: Uuid,
        interaction_type: InteractionType,
    ) -> AppResult<Option<Interaction>> {
        let state = self.inner.read().await;
        Ok(state
            .interactions
            .values()
            .find(|i| {
                i.user_id == user_id && i.post_id == post_id && i.interaction_type == interaction_type
            })
            .cloned())
    }

    async fn delete_interaction(&self, id: Uuid) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        let Some(interaction) = state.interactions.remove(&id) else {
            return Ok(false);
        };
        if let Some(post) = state.posts.get_mut(&interaction.post_id) {
            post.adjust_counter(interaction.interaction_type, false);
        }
        Ok(true)
    }

    async fn post_comments(&self, post_id: Uuid, limit: usize) -> AppResult<Vec<Interaction>> {
        let state = self.inner.read().await;
        let mut comments: Vec<Interaction> = state
            .interactions
            .values()
            .filter(|i| i.post_id == post_id && i.interaction_type == InteractionType::Comment)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        comments.truncate(limit);
        Ok(comments)
    }

    async fn create_follow(&self, follower_id: &str, following_id: &str) -> AppResult<Follow> {
        if follower_id == following_id {
            return Err(AppError::InvalidInput("Users cannot follow themselves".to_string()));
        }

        let mut state = self.inner.write().await;
        if let Some(existing) = state
            .follows
            .values()
            .find(|f| f.follower_id == follower_id && f.following_id == following_id)
        {
            return Ok(existing.clone());
        }

        let follow = Follow::new(follower_id, following_id);
        state.follows.insert(follow.id, follow.clone());
        Ok(follow)
    }

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        let before = state.follows.len();
        state
            .follows
            .retain(|_, f| !(f.follower_id == follower_id && f.following_id == following_id));
        Ok(state.follows.len() != before)
    }

    async fn following(&self, user_id: &str) -> AppResult<Vec<Follow>> {
        let state = self.inner.read().await;
        Ok(state
            .follows
            .values()
            .filter(|f| f.follower_id == user_id)
            .cloned()
            .collect())
    }

    async fn followers(&self, user_id: &str) -> AppResult<Vec<Follow>> {
        let state = self.inner.read().await;
        Ok(state
            .follows
            .values()
            .filter(|f| f.following_id == user_id)
            .cloned()
            .collect())
    }

    async fn is_following(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let state = self.inner.read().await;
        Ok(state
            .follows
            .values()
            .any(|f| f.follower_id == follower_id && f.following_id == following_id))
    }

    async fn create_list(&self, list: NewList) -> AppResult<List> {
        let list = list.into_list();
        self.inner.write().await.lists.insert(list.id, list.clone());
        Ok(list)
    }

    async fn get_list(&self, id: Uuid) -> AppResult<Option<List>> {
        Ok(self.inner.read().await.lists.get(&id).cloned())
    }

    async fn user_lists(&self, user_id: &str) -> AppResult<Vec<List>> {
        let state = self.inner.read().await;
        let mut lists: Vec<List> = state
            .lists
            .values()
            .filter(|l| l.owner_id == user_id)
            .cloned()
            .collect();
        // system lists first, then oldest first
        lists.sort_by(|a, b| {
            b.is_system
                .cmp(&a.is_system)
                .then_with(|| a.created_at.cmp(&b.created_at))
        });
        Ok(lists)
    }

    async fn update_list(&self, id: Uuid, update: ListUpdate) -> AppResult<List> {
        let mut state = self.inner.write().await;
        let list = state.list_mut(id)?;
        list.apply(update);
        Ok(list.clone())
    }

    async fn delete_list(&self, id: Uuid) -> AppResult<bool> {
        Ok(self.inner.write().await.lists.remove(&id).is_some())
    }

    async fn add_to_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List> {
        let mut state = self.inner.write().await;
        let list = state.list_mut(list_id)?;
        list.insert_title(title_id);
        Ok(list.clone())
    }

    async fn remove_from_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List> {
        let mut state = self.inner.write().await;
        let list = state.list_mut(list_id)?;
        list.remove_title(title_id);
        Ok(list.clone())
    }

    async fn system_list(&self, user_id: &str, which: SystemList) -> AppResult<Option<List>> {
        Ok(self.inner.read().await.system_list(user_id, which).cloned())
    }

    async fn create_recommendation(
        &self,
        recommendation: Recommendation,
    ) -> AppResult<Recommendation> {
        self.inner
            .write()
            .await
            .recommendations
            .insert(recommendation.id, recommendation.clone());
        Ok(recommendation)
    }

    async fn user_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let state = self.inner.read().await;
        let mut recommendations: Vec<Recommendation> = state
            .recommendations
            .values()
            .filter(|r| r.user_id == user_id && !r.is_shown)
            .cloned()
            .collect();
        recommendations.sort_by(|a, b| {
            b.score
                .unwrap_or(0.0)
                .partial_cmp(&a.score.unwrap_or(0.0))
                .unwrap_or(Ordering::Equal)
        });
        recommendations.truncate(limit);
        Ok(recommendations)
    }

    async fn mark_recommendation_shown(&self, id: Uuid, user_id: &str) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        match state
            .recommendations
            .get_mut(&id)
            .filter(|recommendation| recommendation.user_id == user_id)
        {
            Some(recommendation) => {
                recommendation.is_shown = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_report(&self, report: Report) -> AppResult<Report> {
        let mut state = self.inner.write().await;
        if let Some(post) = report.post_id.and_then(|id| state.posts.get_mut(&id)) {
            post.is_reported = true;
        }
        state.reports.insert(report.id, report.clone());
        Ok(report)
    }

    async fn reports(&self, status: Option<ReportStatus>) -> AppResult<Vec<Report>> {
        let state = self.inner.read().await;
        let mut reports: Vec<Report> = state
            .reports
            .values()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .cloned()
            .collect();
        reports.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(reports)
    }

    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<bool> {
        let mut state = self.inner.write().await;
        match state.reports.get_mut(&id) {
            Some(report) => {
                report.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl MemoryStorage {
    /// Flips the hidden flag on a post. Moderation tooling only.
    pub async fn set_post_hidden(&self, post_id: Uuid, hidden: bool) -> bool {
        match self.inner.write().await.posts.get_mut(&post_id) {
            Some(post) => {
                post.is_hidden = hidden;
                true
            }
            None => false,
        }
    }

    /// Overrides a post's creation time so ordering can be pinned
    pub async fn set_post_created_at(&self, post_id: Uuid, at: chrono::DateTime<Utc>) -> bool {
        match self.inner.write().await.posts.get_mut(&post_id) {
            Some(post) => {
                post.created_at = at;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn storage_with_post(author: &str) -> (MemoryStorage, Post) {
        let storage = MemoryStorage::new();
        storage.upsert_user(UpsertUser::new(author)).await.unwrap();
        let title = storage
            .create_title(Title::new("Heat", TitleType::Movie))
            .await
            .unwrap();
        let post = storage
            .create_post(NewPost {
                author_id: author.to_string(),
                title_id: title.id,
                caption: Some("classic".to_string()),
                media_url: None,
                media_type: None,
                user_rating: Some(5.0),
                mood_tags: vec![],
            })
            .await
            .unwrap();
        (storage, post)
    }

    async fn post_at(storage: &MemoryStorage, author: &str, title_id: Uuid, minutes_ago: i64) -> Post {
        let post = storage
            .create_post(NewPost {
                author_id: author.to_string(),
                title_id,
                caption: None,
                media_url: None,
                media_type: None,
                user_rating: None,
                mood_tags: vec![],
            })
            .await
            .unwrap();
        storage
            .set_post_created_at(post.id, Utc::now() - Duration::minutes(minutes_ago))
            .await;
        storage.get_post(post.id).await.unwrap().unwrap()
    }

    #[tokio::test]
    async fn test_upsert_creates_system_lists_once() {
        let storage = MemoryStorage::new();
        storage.upsert_user(UpsertUser::new("u1")).await.unwrap();
        storage
            .upsert_user(UpsertUser {
                bio: Some("hi".to_string()),
                ..UpsertUser::new("u1")
            })
            .await
            .unwrap();

        let lists = storage.user_lists("u1").await.unwrap();
        assert_eq!(lists.len(), 2);
        assert!(storage
            .system_list("u1", SystemList::Watchlist)
            .await
            .unwrap()
            .is_some());
        assert!(storage
            .system_list("u1", SystemList::Favorites)
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_like_adjusts_counter_once() {
        let (storage, post) = storage_with_post("u1").await;

        let like = storage
            .create_interaction(NewInteraction::new("u1", post.id, InteractionType::Like))
            .await
            .unwrap();
        let duplicate = storage
            .create_interaction(NewInteraction::new("u1", post.id, InteractionType::Like))
            .await;
        assert!(matches!(duplicate, Err(AppError::InvalidInput(_))));
        assert_eq!(storage.get_post(post.id).await.unwrap().unwrap().likes_count, 1);

        assert!(storage.delete_interaction(like.id).await.unwrap());
        assert!(!storage.delete_interaction(like.id).await.unwrap());
        assert_eq!(storage.get_post(post.id).await.unwrap().unwrap().likes_count, 0);
    }

    #[tokio::test]
    async fn test_comments_are_unbounded() {
        let (storage, post) = storage_with_post("u1").await;
        for text in ["first", "second"] {
            storage
                .create_interaction(NewInteraction::comment("u1", post.id, text.to_string()))
                .await
                .unwrap();
        }

        assert_eq!(storage.get_post(post.id).await.unwrap().unwrap().comments_count, 2);
        assert_eq!(storage.post_comments(post.id, 10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_interaction_on_missing_post_is_not_found() {
        let storage = MemoryStorage::new();
        let result = storage
            .create_interaction(NewInteraction::new("u1", Uuid::new_v4(), InteractionType::Save))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_feed_includes_self_and_followed_newest_first() {
        let storage = MemoryStorage::new();
        let title = storage
            .create_title(Title::new("Alien", TitleType::Movie))
            .await
            .unwrap();

        let own = post_at(&storage, "a", title.id, 30).await;
        let followed = post_at(&storage, "b", title.id, 10).await;
        let stranger = post_at(&storage, "c", title.id, 5).await;
        let hidden = post_at(&storage, "b", title.id, 1).await;
        storage.set_post_hidden(hidden.id, true).await;

        storage.create_follow("a", "b").await.unwrap();

        let feed = storage.feed_posts("a", 10, 0).await.unwrap();
        let ids: Vec<Uuid> = feed.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![followed.id, own.id]);
        assert!(!ids.contains(&stranger.id));
    }

    #[tokio::test]
    async fn test_feed_pages_are_disjoint_and_ordered() {
        let storage = MemoryStorage::new();
        let title = storage
            .create_title(Title::new("Alien", TitleType::Movie))
            .await
            .unwrap();
        for minutes in 1..=5 {
            post_at(&storage, "a", title.id, minutes).await;
        }

        let whole = storage.feed_posts("a", 4, 0).await.unwrap();
        let first = storage.feed_posts("a", 2, 0).await.unwrap();
        let second = storage.feed_posts("a", 2, 2).await.unwrap();

        assert_eq!(first, whole[..2].to_vec());
        assert_eq!(second, whole[2..].to_vec());
    }

    #[tokio::test]
    async fn test_follow_rules() {
        let storage = MemoryStorage::new();
        assert!(matches!(
            storage.create_follow("a", "a").await,
            Err(AppError::InvalidInput(_))
        ));

        let first = storage.create_follow("a", "b").await.unwrap();
        let second = storage.create_follow("a", "b").await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(storage.followers("b").await.unwrap().len(), 1);

        assert!(storage.delete_follow("a", "b").await.unwrap());
        assert!(!storage.is_following("a", "b").await.unwrap());
    }

    #[tokio::test]
    async fn test_search_matches_name_only() {
        let storage = MemoryStorage::with_sample_titles();

        let hits = storage.search_titles("BLADE", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Blade Runner 2049");

        // genre text is not part of the match
        assert!(storage.search_titles("Sci-Fi", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_external_id_conflicts() {
        let storage = MemoryStorage::with_sample_titles();
        let title = Title {
            external_id: Some("438631".to_string()),
            ..Title::new("Dune again", TitleType::Movie)
        };
        assert!(matches!(
            storage.create_title(title).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_trending_and_related() {
        let storage = MemoryStorage::with_sample_titles();
        let trending = storage.trending_titles(2).await.unwrap();
        assert_eq!(trending[0].name, "The Bear");
        assert_eq!(trending[1].name, "Blade Runner 2049");

        let dune = storage.search_titles("dune", 1).await.unwrap().remove(0);
        let related = storage.related_titles(dune.id, 5).await.unwrap();
        let names: Vec<&str> = related.iter().map(|t| t.name.as_str()).collect();
        assert!(names.contains(&"Blade Runner 2049"));
        assert!(names.contains(&"The Bear"));
        assert!(!names.contains(&"Dune"));
    }

    #[tokio::test]
    async fn test_list_membership() {
        let storage = MemoryStorage::new();
        storage.upsert_user(UpsertUser::new("u1")).await.unwrap();
        let watchlist = storage
            .system_list("u1", SystemList::Watchlist)
            .await
            .unwrap()
            .unwrap();
        let title_id = Uuid::new_v4();

        storage.add_to_list(watchlist.id, title_id).await.unwrap();
        let list = storage.add_to_list(watchlist.id, title_id).await.unwrap();
        assert_eq!(list.title_ids, vec![title_id]);

        let list = storage.remove_from_list(watchlist.id, title_id).await.unwrap();
        assert!(list.title_ids.is_empty());

        assert!(matches!(
            storage.add_to_list(Uuid::new_v4(), title_id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_recommendations_and_reports() {
        let storage = MemoryStorage::new();
        let make = |score| Recommendation {
            id: Uuid::new_v4(),
            user_id: "u1".to_string(),
            title_id: Uuid::new_v4(),
            reason: None,
            badges: vec![],
            score: Some(score),
            is_shown: false,
            created_at: Utc::now(),
        };
        let low = storage.create_recommendation(make(0.2)).await.unwrap();
        let high = storage.create_recommendation(make(0.9)).await.unwrap();

        let recs = storage.user_recommendations("u1", 10).await.unwrap();
        assert_eq!(recs[0].id, high.id);

        assert!(!storage.mark_recommendation_shown(high.id, "u2").await.unwrap());
        assert!(storage.mark_recommendation_shown(high.id, "u1").await.unwrap());
        let recs = storage.user_recommendations("u1", 10).await.unwrap();
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].id, low.id);

        let report = storage
            .create_report(Report {
                id: Uuid::new_v4(),
                reporter_id: "u1".to_string(),
                post_id: None,
                user_id: Some("u2".to_string()),
                reason: "spam".to_string(),
                description: None,
                status: ReportStatus::Pending,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        assert!(storage
            .update_report_status(report.id, ReportStatus::Resolved)
            .await
            .unwrap());
        assert!(storage
            .reports(Some(ReportStatus::Pending))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            storage.reports(Some(ReportStatus::Resolved)).await.unwrap().len(),
            1
        );
    }
}
