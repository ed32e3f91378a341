use axum::{extract::State, Json};

use crate::{api::AppState, error::AppResult, middleware::CurrentUser, models::User};

/// The caller's own record, created with its system lists on first request
pub async fn current_user(
    State(state): State<AppState>,
    user: CurrentUser,
) -> AppResult<Json<User>> {
    let record = user.ensure(state.storage.as_ref()).await?;
    Ok(Json(record))
}
