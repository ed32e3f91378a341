use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::{InteractionType, Title, User};

/// A user post about a title
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub author_id: String,
    pub title_id: Uuid,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub user_rating: Option<f32>,
    pub mood_tags: Vec<String>,
    pub likes_count: i32,
    pub comments_count: i32,
    pub reposts_count: i32,
    pub saves_count: i32,
    pub is_reported: bool,
    pub is_hidden: bool,
    pub created_at: DateTime<Utc>,
}

impl Post {
    pub fn counter(&self, kind: InteractionType) -> i32 {
        match kind {
            InteractionType::Like => self.likes_count,
            InteractionType::Comment => self.comments_count,
            InteractionType::Repost => self.reposts_count,
            InteractionType::Save => self.saves_count,
        }
    }

    /// Moves the counter matching `kind` by one, never below zero
    pub fn adjust_counter(&mut self, kind: InteractionType, increment: bool) {
        let counter = match kind {
            InteractionType::Like => &mut self.likes_count,
            InteractionType::Comment => &mut self.comments_count,
            InteractionType::Repost => &mut self.reposts_count,
            InteractionType::Save => &mut self.saves_count,
        };
        *counter = if increment {
            counter.saturating_add(1)
        } else {
            (*counter - 1).max(0)
        };
    }
}

/// Validated input for a new post
#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: String,
    pub title_id: Uuid,
    pub caption: Option<String>,
    pub media_url: Option<String>,
    pub media_type: Option<String>,
    pub user_rating: Option<f32>,
    pub mood_tags: Vec<String>,
}

impl NewPost {
    pub fn into_post(self) -> Post {
        Post {
            id: Uuid::new_v4(),
            author_id: self.author_id,
            title_id: self.title_id,
            caption: self.caption,
            media_url: self.media_url,
            media_type: self.media_type,
            user_rating: self.user_rating,
            mood_tags: self.mood_tags,
            likes_count: 0,
            comments_count: 0,
            reposts_count: 0,
            saves_count: 0,
            is_reported: false,
            is_hidden: false,
            created_at: Utc::now(),
        }
    }
}

fn validate_media_type(media_type: &str) -> Result<(), ValidationError> {
    match media_type {
        "image" | "video" => Ok(()),
        _ => {
            let mut error = ValidationError::new("media_type");
            error.message = Some("Media type must be 'image' or 'video'".into());
            Err(error)
        }
    }
}

/// Body of `POST /api/posts`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    pub title_id: Uuid,
    #[validate(length(max = 2000, message = "Caption must be at most 2000 characters"))]
    pub caption: Option<String>,
    #[validate(url(message = "Media URL must be a valid URL"))]
    pub media_url: Option<String>,
    #[validate(custom(function = "validate_media_type"))]
    pub media_type: Option<String>,
    #[validate(range(min = 1.0, max = 5.0, message = "Rating must be between 1 and 5"))]
    pub user_rating: Option<f32>,
    #[serde(default)]
    #[validate(length(max = 10, message = "At most 10 mood tags"))]
    pub mood_tags: Vec<String>,
}

impl CreatePostRequest {
    pub fn into_new_post(self, author_id: String) -> NewPost {
        NewPost {
            author_id,
            title_id: self.title_id,
            caption: self.caption,
            media_url: self.media_url,
            media_type: self.media_type,
            user_rating: self.user_rating,
            mood_tags: self.mood_tags,
        }
    }
}

/// A feed entry: the post plus author, title and the viewer's own state
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
    pub title: Option<Title>,
    pub is_liked: bool,
    pub is_saved: bool,
}

/// A post with its author and title attached
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostWithRefs {
    #[serde(flatten)]
    pub post: Post,
    pub author: Option<User>,
    pub title: Option<Title>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn post() -> Post {
        NewPost {
            author_id: "u1".to_string(),
            title_id: Uuid::new_v4(),
            caption: None,
            media_url: None,
            media_type: None,
            user_rating: None,
            mood_tags: vec![],
        }
        .into_post()
    }

    #[test]
    fn test_new_post_counters_start_at_zero() {
        let post = post();
        for kind in InteractionType::ALL {
            assert_eq!(post.counter(kind), 0);
        }
        assert!(!post.is_hidden);
    }

    #[test]
    fn test_adjust_counter_floors_at_zero() {
        let mut post = post();
        post.adjust_counter(InteractionType::Like, false);
        assert_eq!(post.likes_count, 0);

        post.adjust_counter(InteractionType::Like, true);
        post.adjust_counter(InteractionType::Save, true);
        assert_eq!(post.likes_count, 1);
        assert_eq!(post.saves_count, 1);

        post.adjust_counter(InteractionType::Like, false);
        assert_eq!(post.likes_count, 0);
        assert_eq!(post.saves_count, 1);
    }

    #[test]
    fn test_create_post_request_validation() {
        let request: CreatePostRequest = serde_json::from_value(serde_json::json!({
            "titleId": Uuid::new_v4(),
            "userRating": 7,
            "mediaType": "gif"
        }))
        .unwrap();

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("user_rating"));
        assert!(fields.contains_key("media_type"));
    }

    #[test]
    fn test_create_post_request_minimal_is_valid() {
        let request: CreatePostRequest = serde_json::from_value(serde_json::json!({
            "titleId": Uuid::new_v4(),
            "caption": "Rewatched it, still perfect",
            "userRating": 5,
            "moodTags": ["cozy"]
        }))
        .unwrap();

        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_enriched_post_flattens_post_fields() {
        let enriched = EnrichedPost {
            post: post(),
            author: None,
            title: None,
            is_liked: true,
            is_saved: false,
        };
        let json = serde_json::to_value(&enriched).unwrap();
        assert_eq!(json["likesCount"], 0);
        assert_eq!(json["isLiked"], true);
        assert!(json["author"].is_null());
    }
}
