use sqlx::PgPool;
use uuid::Uuid;

use super::Storage;
use crate::{
    error::{AppError, AppResult},
    models::{
        Follow, Interaction, InteractionType, List, ListUpdate, NewInteraction, NewList, NewPost,
        Post, Recommendation, Report, ReportStatus, SystemList, Title, UpsertUser, User,
    },
};

/// Postgres-backed storage. Schema lives in `migrations/`.
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Escapes LIKE metacharacters so user input only ever matches literally
fn escape_like(query: &str) -> String {
    query
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// LIMIT/OFFSET bind value; saturates instead of wrapping negative
fn sql_count(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    matches!(error, sqlx::Error::Database(db) if db.is_unique_violation())
}

const INSERT_LIST: &str = r#"
    INSERT INTO lists (id, owner_id, name, description, is_public, is_system, title_ids, created_at, updated_at)
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
"#;

#[async_trait::async_trait]
impl Storage for PostgresStorage {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn is_persistent(&self) -> bool {
        true
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn upsert_user(&self, upsert: UpsertUser) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;
        let fresh = upsert.into_user();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, first_name, last_name, profile_image_url, username, display_name, bio, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = COALESCE(EXCLUDED.email, users.email),
                first_name = COALESCE(EXCLUDED.first_name, users.first_name),
                last_name = COALESCE(EXCLUDED.last_name, users.last_name),
                profile_image_url = COALESCE(EXCLUDED.profile_image_url, users.profile_image_url),
                username = COALESCE(EXCLUDED.username, users.username),
                display_name = COALESCE(EXCLUDED.display_name, users.display_name),
                bio = COALESCE(EXCLUDED.bio, users.bio),
                updated_at = now()
            RETURNING *
            "#,
        )
        .bind(&fresh.id)
        .bind(&fresh.email)
        .bind(&fresh.first_name)
        .bind(&fresh.last_name)
        .bind(&fresh.profile_image_url)
        .bind(&fresh.username)
        .bind(&fresh.display_name)
        .bind(&fresh.bio)
        .bind(fresh.created_at)
        .fetch_one(&mut *tx)
        .await?;

        for which in SystemList::ALL {
            let list = which.new_list(&user.id).into_list();
            sqlx::query(&format!(
                "{} ON CONFLICT (owner_id, name) WHERE is_system DO NOTHING",
                INSERT_LIST
            ))
            .bind(list.id)
            .bind(&list.owner_id)
            .bind(&list.name)
            .bind(&list.description)
            .bind(list.is_public)
            .bind(list.is_system)
            .bind(&list.title_ids)
            .bind(list.created_at)
            .bind(list.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(user)
    }

    async fn suggested_users(&self, user_id: &str, limit: usize) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT * FROM users
            WHERE id <> $1
              AND id NOT IN (SELECT following_id FROM follows WHERE follower_id = $1)
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn get_title(&self, id: Uuid) -> AppResult<Option<Title>> {
        let title = sqlx::query_as::<_, Title>("SELECT * FROM titles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(title)
    }

    async fn get_title_by_external_id(&self, external_id: &str) -> AppResult<Option<Title>> {
        let title = sqlx::query_as::<_, Title>("SELECT * FROM titles WHERE external_id = $1")
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(title)
    }

    async fn create_title(&self, title: Title) -> AppResult<Title> {
        let result = sqlx::query_as::<_, Title>(
            r#"
            INSERT INTO titles (id, external_id, name, title_type, year, genres, synopsis, poster_url, backdrop_url, runtime, "cast", crew, rating, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *
            "#,
        )
        .bind(title.id)
        .bind(&title.external_id)
        .bind(&title.name)
        .bind(title.title_type.as_str())
        .bind(title.year)
        .bind(&title.genres)
        .bind(&title.synopsis)
        .bind(&title.poster_url)
        .bind(&title.backdrop_url)
        .bind(title.runtime)
        .bind(&title.cast)
        .bind(&title.crew)
        .bind(title.rating)
        .bind(title.created_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_unique_violation(&e) => Err(AppError::Conflict(format!(
                "Title with external id {} already exists",
                title.external_id.as_deref().unwrap_or_default()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    async fn search_titles(&self, query: &str, limit: usize) -> AppResult<Vec<Title>> {
        let titles = sqlx::query_as::<_, Title>(
            r#"
            SELECT * FROM titles
            WHERE name ILIKE '%' || $1 || '%'
            ORDER BY rating DESC NULLS LAST, name
            LIMIT $2
            "#,
        )
        .bind(escape_like(query))
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn trending_titles(&self, limit: usize) -> AppResult<Vec<Title>> {
        let titles = sqlx::query_as::<_, Title>(
            "SELECT * FROM titles ORDER BY rating DESC NULLS LAST, name LIMIT $1",
        )
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn related_titles(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Title>> {
        let titles = sqlx::query_as::<_, Title>(
            r#"
            SELECT * FROM titles
            WHERE id <> $1
              AND genres && (SELECT genres FROM titles WHERE id = $1)
            ORDER BY rating DESC NULLS LAST, name
            LIMIT $2
            "#,
        )
        .bind(title_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(titles)
    }

    async fn get_post(&self, id: Uuid) -> AppResult<Option<Post>> {
        let post = sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(post)
    }

    async fn create_post(&self, post: NewPost) -> AppResult<Post> {
        let post = post.into_post();
        let created = sqlx::query_as::<_, Post>(
            r#"
            INSERT INTO posts (id, author_id, title_id, caption, media_url, media_type, user_rating, mood_tags, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(post.id)
        .bind(&post.author_id)
        .bind(post.title_id)
        .bind(&post.caption)
        .bind(&post.media_url)
        .bind(&post.media_type)
        .bind(post.user_rating)
        .bind(&post.mood_tags)
        .bind(post.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn feed_posts(
        &self,
        user_id: &str,
        limit: usize,
        offset: usize,
    ) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE NOT is_hidden
              AND (author_id = $1
                   OR author_id IN (SELECT following_id FROM follows WHERE follower_id = $1))
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(sql_count(limit))
        .bind(sql_count(offset))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn posts_by_title(&self, title_id: Uuid, limit: usize) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE title_id = $1 AND NOT is_hidden
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(title_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn posts_by_user(&self, user_id: &str, limit: usize) -> AppResult<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT * FROM posts
            WHERE author_id = $1 AND NOT is_hidden
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(posts)
    }

    async fn create_interaction(&self, new: NewInteraction) -> AppResult<Interaction> {
        let mut tx = self.pool.begin().await?;

        let post_exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM posts WHERE id = $1 FOR UPDATE")
                .bind(new.post_id)
                .fetch_optional(&mut *tx)
                .await?;
        if post_exists.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let interaction = new.into_interaction();
        let inserted = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO interactions (id, user_id, post_id, interaction_type, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (user_id, post_id, interaction_type) WHERE interaction_type <> 'comment'
            DO NOTHING
            RETURNING *
            "#,
        )
        .bind(interaction.id)
        .bind(&interaction.user_id)
        .bind(interaction.post_id)
        .bind(interaction.interaction_type.as_str())
        .bind(&interaction.content)
        .bind(interaction.created_at)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(inserted) = inserted else {
            return Err(AppError::InvalidInput(format!(
                "Post already has a {} from this user",
                interaction.interaction_type
            )));
        };

        let column = inserted.interaction_type.counter_column();
        sqlx::query(&format!(
            "UPDATE posts SET {column} = {column} + 1 WHERE id = $1"
        ))
        .bind(inserted.post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(inserted)
    }

    async fn get_interaction(&self, id: Uuid) -> AppResult<Option<Interaction>> {
        let interaction =
            sqlx::query_as::<_, Interaction>("SELECT * FROM interactions WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(interaction)
    }

    async fn get_user_interaction(
        &self,
        user_id: &str,
        post_id: Uuid,
        interaction_type: InteractionType,
    ) -> AppResult<Option<Interaction>> {
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT * FROM interactions
            WHERE user_id = $1 AND post_id = $2 AND interaction_type = $3
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(post_id)
        .bind(interaction_type.as_str())
        .fetch_optional(&self.pool)
        .await?;
        Ok(interaction)
    }

    async fn delete_interaction(&self, id: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query_as::<_, Interaction>(
            "DELETE FROM interactions WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(deleted) = deleted else {
            return Ok(false);
        };

        let column = deleted.interaction_type.counter_column();
        sqlx::query(&format!(
            "UPDATE posts SET {column} = GREATEST({column} - 1, 0) WHERE id = $1"
        ))
        .bind(deleted.post_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn post_comments(&self, post_id: Uuid, limit: usize) -> AppResult<Vec<Interaction>> {
        let comments = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT * FROM interactions
            WHERE post_id = $1 AND interaction_type = 'comment'
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(post_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(comments)
    }

    async fn create_follow(&self, follower_id: &str, following_id: &str) -> AppResult<Follow> {
        if follower_id == following_id {
            return Err(AppError::InvalidInput("Users cannot follow themselves".to_string()));
        }

        let follow = Follow::new(follower_id, following_id);
        sqlx::query(
            r#"
            INSERT INTO follows (id, follower_id, following_id, created_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (follower_id, following_id) DO NOTHING
            "#,
        )
        .bind(follow.id)
        .bind(&follow.follower_id)
        .bind(&follow.following_id)
        .bind(follow.created_at)
        .execute(&self.pool)
        .await?;

        let edge = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 AND following_id = $2",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(edge)
    }

    async fn delete_follow(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let result =
            sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND following_id = $2")
                .bind(follower_id)
                .bind(following_id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn following(&self, user_id: &str) -> AppResult<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE follower_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    async fn followers(&self, user_id: &str) -> AppResult<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            "SELECT * FROM follows WHERE following_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(follows)
    }

    async fn is_following(&self, follower_id: &str, following_id: &str) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM follows WHERE follower_id = $1 AND following_id = $2)",
        )
        .bind(follower_id)
        .bind(following_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn create_list(&self, list: NewList) -> AppResult<List> {
        let list = list.into_list();
        let created = sqlx::query_as::<_, List>(&format!("{} RETURNING *", INSERT_LIST))
            .bind(list.id)
            .bind(&list.owner_id)
            .bind(&list.name)
            .bind(&list.description)
            .bind(list.is_public)
            .bind(list.is_system)
            .bind(&list.title_ids)
            .bind(list.created_at)
            .bind(list.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    async fn get_list(&self, id: Uuid) -> AppResult<Option<List>> {
        let list = sqlx::query_as::<_, List>("SELECT * FROM lists WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(list)
    }

    async fn user_lists(&self, user_id: &str) -> AppResult<Vec<List>> {
        let lists = sqlx::query_as::<_, List>(
            "SELECT * FROM lists WHERE owner_id = $1 ORDER BY is_system DESC, created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(lists)
    }

    async fn update_list(&self, id: Uuid, update: ListUpdate) -> AppResult<List> {
        let list = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                is_public = COALESCE($4, is_public),
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name)
        .bind(update.description)
        .bind(update.is_public)
        .fetch_optional(&self.pool)
        .await?;

        list.ok_or_else(|| AppError::NotFound("List not found".to_string()))
    }

    async fn delete_list(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM lists WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn add_to_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List> {
        let list = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists SET
                title_ids = CASE WHEN $2 = ANY(title_ids) THEN title_ids
                                 ELSE array_append(title_ids, $2) END,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await?;

        list.ok_or_else(|| AppError::NotFound("List not found".to_string()))
    }

    async fn remove_from_list(&self, list_id: Uuid, title_id: Uuid) -> AppResult<List> {
        let list = sqlx::query_as::<_, List>(
            r#"
            UPDATE lists SET title_ids = array_remove(title_ids, $2), updated_at = now()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(list_id)
        .bind(title_id)
        .fetch_optional(&self.pool)
        .await?;

        list.ok_or_else(|| AppError::NotFound("List not found".to_string()))
    }

    async fn system_list(&self, user_id: &str, which: SystemList) -> AppResult<Option<List>> {
        let list = sqlx::query_as::<_, List>(
            "SELECT * FROM lists WHERE owner_id = $1 AND name = $2 AND is_system",
        )
        .bind(user_id)
        .bind(which.name())
        .fetch_optional(&self.pool)
        .await?;
        Ok(list)
    }

    async fn create_recommendation(
        &self,
        recommendation: Recommendation,
    ) -> AppResult<Recommendation> {
        let created = sqlx::query_as::<_, Recommendation>(
            r#"
            INSERT INTO recommendations (id, user_id, title_id, reason, badges, score, is_shown, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(recommendation.id)
        .bind(&recommendation.user_id)
        .bind(recommendation.title_id)
        .bind(&recommendation.reason)
        .bind(&recommendation.badges)
        .bind(recommendation.score)
        .bind(recommendation.is_shown)
        .bind(recommendation.created_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn user_recommendations(
        &self,
        user_id: &str,
        limit: usize,
    ) -> AppResult<Vec<Recommendation>> {
        let recommendations = sqlx::query_as::<_, Recommendation>(
            r#"
            SELECT * FROM recommendations
            WHERE user_id = $1 AND NOT is_shown
            ORDER BY score DESC NULLS LAST, created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(sql_count(limit))
        .fetch_all(&self.pool)
        .await?;
        Ok(recommendations)
    }

    async fn mark_recommendation_shown(&self, id: Uuid, user_id: &str) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE recommendations SET is_shown = true WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_report(&self, report: Report) -> AppResult<Report> {
        let created = sqlx::query_as::<_, Report>(
            r#"
            INSERT INTO reports (id, reporter_id, post_id, user_id, reason, description, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(report.id)
        .bind(&report.reporter_id)
        .bind(report.post_id)
        .bind(&report.user_id)
        .bind(&report.reason)
        .bind(&report.description)
        .bind(report.status.as_str())
        .bind(report.created_at)
        .fetch_one(&self.pool)
        .await?;

        if let Some(post_id) = created.post_id {
            sqlx::query("UPDATE posts SET is_reported = true WHERE id = $1")
                .bind(post_id)
                .execute(&self.pool)
                .await?;
        }

        Ok(created)
    }

    async fn reports(&self, status: Option<ReportStatus>) -> AppResult<Vec<Report>> {
        let reports = sqlx::query_as::<_, Report>(
            r#"
            SELECT * FROM reports
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await?;
        Ok(reports)
    }

    async fn update_report_status(&self, id: Uuid, status: ReportStatus) -> AppResult<bool> {
        let result = sqlx::query("UPDATE reports SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
