//! Caller identity
//!
//! Authentication happens upstream; the proxy forwards the user id in a
//! trusted header. Outside production, or with `Authorization: Bearer DEV`,
//! requests without that header run as the development user.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};

use crate::{
    api::AppState,
    config::Config,
    error::{AppError, AppResult},
    models::{UpsertUser, User},
    storage::Storage,
};

const DEV_USER_NAME: &str = "dev";

/// The authenticated caller
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentUser {
    pub id: String,
    pub name: Option<String>,
}

impl CurrentUser {
    /// Resolves the caller from request headers
    pub fn from_headers(headers: &HeaderMap, config: &Config) -> AppResult<Self> {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        if let Some(id) = header(&config.identity_header) {
            return Ok(Self {
                id,
                name: header(&config.identity_name_header),
            });
        }

        if has_dev_bearer(headers) || !config.is_production() {
            return Ok(Self {
                id: config.dev_user_id.clone(),
                name: Some(DEV_USER_NAME.to_string()),
            });
        }

        Err(AppError::Unauthorized)
    }

    /// Returns the caller's user record, creating it with its system lists
    /// on first sight
    pub async fn ensure(&self, storage: &dyn Storage) -> AppResult<User> {
        if let Some(user) = storage.get_user(&self.id).await? {
            return Ok(user);
        }

        tracing::info!(user_id = %self.id, "Creating user on first request");
        storage
            .upsert_user(UpsertUser {
                username: self.name.clone(),
                display_name: self.name.clone(),
                ..UpsertUser::new(self.id.clone())
            })
            .await
    }
}

fn has_dev_bearer(headers: &HeaderMap) -> bool {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .is_some_and(|token| token.trim().eq_ignore_ascii_case("DEV"))
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Self::from_headers(&parts.headers, &state.config)
    }
}
