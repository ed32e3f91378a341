use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::ParseEnumError;

/// Kind of engagement a user has with a post
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InteractionType {
    Like,
    Comment,
    Repost,
    Save,
}

impl InteractionType {
    pub const ALL: [InteractionType; 4] = [
        InteractionType::Like,
        InteractionType::Comment,
        InteractionType::Repost,
        InteractionType::Save,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionType::Like => "like",
            InteractionType::Comment => "comment",
            InteractionType::Repost => "repost",
            InteractionType::Save => "save",
        }
    }

    /// Comments are unbounded; every other kind is unique per (user, post)
    pub fn is_unique_per_user(&self) -> bool {
        !matches!(self, InteractionType::Comment)
    }

    /// Postgres column holding the counter for this kind
    pub fn counter_column(&self) -> &'static str {
        match self {
            InteractionType::Like => "likes_count",
            InteractionType::Comment => "comments_count",
            InteractionType::Repost => "reposts_count",
            InteractionType::Save => "saves_count",
        }
    }
}

impl std::fmt::Display for InteractionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InteractionType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(InteractionType::Like),
            "comment" => Ok(InteractionType::Comment),
            "repost" => Ok(InteractionType::Repost),
            "save" => Ok(InteractionType::Save),
            other => Err(ParseEnumError::new("interaction type", other)),
        }
    }
}

impl TryFrom<String> for InteractionType {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: Uuid,
    pub user_id: String,
    pub post_id: Uuid,
    #[serde(rename = "type")]
    #[sqlx(try_from = "String")]
    pub interaction_type: InteractionType,
    /// Comment body
    pub content: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewInteraction {
    pub user_id: String,
    pub post_id: Uuid,
    pub interaction_type: InteractionType,
    pub content: Option<String>,
}

impl NewInteraction {
    pub fn new(user_id: impl Into<String>, post_id: Uuid, interaction_type: InteractionType) -> Self {
        Self {
            user_id: user_id.into(),
            post_id,
            interaction_type,
            content: None,
        }
    }

    pub fn comment(user_id: impl Into<String>, post_id: Uuid, content: String) -> Self {
        Self {
            content: Some(content),
            ..Self::new(user_id, post_id, InteractionType::Comment)
        }
    }

    pub fn into_interaction(self) -> Interaction {
        Interaction {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            post_id: self.post_id,
            interaction_type: self.interaction_type,
            content: self.content,
            created_at: Utc::now(),
        }
    }
}

/// Body of `POST /api/posts/:id/comments`
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCommentRequest {
    #[validate(length(min = 1, max = 1000, message = "Comment must be 1-1000 characters"))]
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_type_round_trip_str() {
        for kind in InteractionType::ALL {
            assert_eq!(kind.as_str().parse::<InteractionType>().unwrap(), kind);
        }
        assert!("share".parse::<InteractionType>().is_err());
    }

    #[test]
    fn test_only_comments_are_unbounded() {
        assert!(!InteractionType::Comment.is_unique_per_user());
        assert!(InteractionType::Like.is_unique_per_user());
        assert!(InteractionType::Save.is_unique_per_user());
        assert!(InteractionType::Repost.is_unique_per_user());
    }

    #[test]
    fn test_comment_constructor() {
        let post_id = Uuid::new_v4();
        let new = NewInteraction::comment("u1", post_id, "Loved it".to_string());
        assert_eq!(new.interaction_type, InteractionType::Comment);
        assert_eq!(new.content.as_deref(), Some("Loved it"));

        let interaction = new.into_interaction();
        assert_eq!(interaction.post_id, post_id);
    }
}
