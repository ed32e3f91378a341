use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{EnrichedPost, InteractionType, Post, PostWithRefs, Title, User},
    storage::Storage,
};

/// A page of the user's feed: their own posts and those of everyone they
/// follow, newest first, with author, title and the viewer's like/save state.
///
/// Only the page query itself can fail. A dangling author or title, or a
/// failed lookup, leaves that field empty.
pub async fn get_feed(
    storage: Arc<dyn Storage>,
    user_id: &str,
    limit: usize,
    offset: usize,
) -> AppResult<Vec<EnrichedPost>> {
    let posts = storage.feed_posts(user_id, limit, offset).await?;

    let mut tasks = Vec::with_capacity(posts.len());
    for post in &posts {
        let storage = storage.clone();
        let post = post.clone();
        let viewer = user_id.to_string();
        tasks.push(tokio::spawn(async move {
            enrich_post(storage.as_ref(), post, &viewer).await
        }));
    }

    let mut feed = Vec::with_capacity(tasks.len());
    for (post, task) in posts.into_iter().zip(tasks) {
        match task.await {
            Ok(enriched) => feed.push(enriched),
            Err(e) => {
                tracing::error!(error = %e, post_id = %post.id, "Task join error");
                feed.push(EnrichedPost {
                    post,
                    author: None,
                    title: None,
                    is_liked: false,
                    is_saved: false,
                });
            }
        }
    }

    tracing::debug!(user_id = %user_id, posts = feed.len(), "Feed assembled");
    Ok(feed)
}

async fn enrich_post(storage: &dyn Storage, post: Post, viewer: &str) -> EnrichedPost {
    let (author, title, is_liked, is_saved) = tokio::join!(
        lookup_author(storage, &post.author_id),
        lookup_title(storage, post.title_id),
        has_interaction(storage, viewer, post.id, InteractionType::Like),
        has_interaction(storage, viewer, post.id, InteractionType::Save),
    );

    EnrichedPost {
        post,
        author,
        title,
        is_liked,
        is_saved,
    }
}

/// Attaches author and title to each post concurrently, keeping order
pub async fn attach_refs(storage: Arc<dyn Storage>, posts: Vec<Post>) -> Vec<PostWithRefs> {
    let mut tasks = Vec::with_capacity(posts.len());
    for post in &posts {
        let storage = storage.clone();
        let post = post.clone();
        tasks.push(tokio::spawn(async move {
            let (author, title) = tokio::join!(
                lookup_author(storage.as_ref(), &post.author_id),
                lookup_title(storage.as_ref(), post.title_id),
            );
            PostWithRefs {
                post,
                author,
                title,
            }
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for (post, task) in posts.into_iter().zip(tasks) {
        match task.await {
            Ok(with_refs) => results.push(with_refs),
            Err(e) => {
                tracing::error!(error = %e, post_id = %post.id, "Task join error");
                results.push(PostWithRefs {
                    post,
                    author: None,
                    title: None,
                });
            }
        }
    }
    results
}

async fn lookup_author(storage: &dyn Storage, author_id: &str) -> Option<User> {
    storage.get_user(author_id).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, author_id = %author_id, "Author lookup failed");
        None
    })
}

async fn lookup_title(storage: &dyn Storage, title_id: Uuid) -> Option<Title> {
    storage.get_title(title_id).await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, title_id = %title_id, "Title lookup failed");
        None
    })
}

async fn has_interaction(
    storage: &dyn Storage,
    user_id: &str,
    post_id: Uuid,
    kind: InteractionType,
) -> bool {
    match storage.get_user_interaction(user_id, post_id, kind).await {
        Ok(found) => found.is_some(),
        Err(e) => {
            tracing::warn!(error = %e, post_id = %post_id, kind = %kind, "Interaction lookup failed");
            false
        }
    }
}
