use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A user account. Ids are asserted by the upstream identity proxy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields accepted when creating or refreshing a user
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertUser {
    pub id: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub username: Option<String>,
    pub display_name: Option<String>,
    pub bio: Option<String>,
}

impl UpsertUser {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Creates a fresh record from these fields
    pub fn into_user(self) -> User {
        let now = Utc::now();
        User {
            id: self.id,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            profile_image_url: self.profile_image_url,
            username: self.username,
            display_name: self.display_name,
            bio: self.bio,
            created_at: now,
            updated_at: now,
        }
    }

    /// Overlays the provided fields onto an existing record
    pub fn apply_to(self, user: &mut User) {
        if self.email.is_some() {
            user.email = self.email;
        }
        if self.first_name.is_some() {
            user.first_name = self.first_name;
        }
        if self.last_name.is_some() {
            user.last_name = self.last_name;
        }
        if self.profile_image_url.is_some() {
            user.profile_image_url = self.profile_image_url;
        }
        if self.username.is_some() {
            user.username = self.username;
        }
        if self.display_name.is_some() {
            user.display_name = self.display_name;
        }
        if self.bio.is_some() {
            user.bio = self.bio;
        }
        user.updated_at = Utc::now();
    }
}

/// Follower and following counts for a profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowStats {
    pub followers_count: usize,
    pub following_count: usize,
}
