use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// The two lists every user owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemList {
    Watchlist,
    Favorites,
}

impl SystemList {
    pub const ALL: [SystemList; 2] = [SystemList::Watchlist, SystemList::Favorites];

    pub fn name(&self) -> &'static str {
        match self {
            SystemList::Watchlist => "Watchlist",
            SystemList::Favorites => "Favorites",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SystemList::Watchlist => "Movies and TV shows I want to watch",
            SystemList::Favorites => "My favorite movies and TV shows",
        }
    }

    pub fn new_list(&self, owner_id: &str) -> NewList {
        NewList {
            owner_id: owner_id.to_string(),
            name: self.name().to_string(),
            description: Some(self.description().to_string()),
            is_public: false,
            is_system: true,
        }
    }
}

/// A user's list of titles (watchlist, favorites or custom)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub is_system: bool,
    pub title_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl List {
    pub fn is(&self, system: SystemList) -> bool {
        self.is_system && self.name == system.name()
    }

    pub fn contains(&self, title_id: Uuid) -> bool {
        self.title_ids.contains(&title_id)
    }

    /// Adds a title if absent. Returns whether the list changed.
    pub fn insert_title(&mut self, title_id: Uuid) -> bool {
        if self.contains(title_id) {
            return false;
        }
        self.title_ids.push(title_id);
        self.updated_at = Utc::now();
        true
    }

    /// Removes a title if present. Returns whether the list changed.
    pub fn remove_title(&mut self, title_id: Uuid) -> bool {
        let before = self.title_ids.len();
        self.title_ids.retain(|id| *id != title_id);
        let changed = self.title_ids.len() != before;
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    pub fn apply(&mut self, update: ListUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(is_public) = update.is_public {
            self.is_public = is_public;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone)]
pub struct NewList {
    pub owner_id: String,
    pub name: String,
    pub description: Option<String>,
    pub is_public: bool,
    pub is_system: bool,
}

impl NewList {
    pub fn into_list(self) -> List {
        let now = Utc::now();
        List {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            name: self.name,
            description: self.description,
            is_public: self.is_public,
            is_system: self.is_system,
            title_ids: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a list's metadata
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListUpdate {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    pub is_public: Option<bool>,
}

/// Body of `POST /api/lists`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateListRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
}
