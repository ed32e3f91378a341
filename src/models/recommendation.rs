use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::Title;

/// A persisted recommendation shown to a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub id: Uuid,
    pub user_id: String,
    pub title_id: Uuid,
    pub reason: Option<String>,
    pub badges: Vec<String>,
    /// Confidence, higher first
    pub score: Option<f32>,
    pub is_shown: bool,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/recommendations`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRecommendationRequest {
    pub title_id: Uuid,
    #[validate(length(max = 1000, message = "Reason must be at most 1000 characters"))]
    pub reason: Option<String>,
    #[serde(default)]
    pub badges: Vec<String>,
    #[validate(range(min = 0.0, max = 1.0, message = "Score must be between 0 and 1"))]
    pub score: Option<f32>,
}

impl CreateRecommendationRequest {
    pub fn into_recommendation(self, user_id: String) -> Recommendation {
        Recommendation {
            id: Uuid::new_v4(),
            user_id,
            title_id: self.title_id,
            reason: self.reason,
            badges: self.badges,
            score: self.score,
            is_shown: false,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationWithTitle {
    #[serde(flatten)]
    pub recommendation: Recommendation,
    pub title: Option<Title>,
}
