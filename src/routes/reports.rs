use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::{
    api::{AppJson, AppState, ValidatedJson},
    error::{AppError, AppResult},
    middleware::CurrentUser,
    models::{CreateReportRequest, Report, ReportStatus, UpdateReportRequest},
};

use super::message;

#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    status: Option<ReportStatus>,
}

pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    ValidatedJson(request): ValidatedJson<CreateReportRequest>,
) -> AppResult<(StatusCode, Json<Report>)> {
    user.ensure(state.storage.as_ref()).await?;

    if let Some(post_id) = request.post_id {
        if state.storage.get_post(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
    }

    let report = state
        .storage
        .create_report(request.into_report(user.id.clone()))
        .await?;

    tracing::info!(report_id = %report.id, reporter_id = %report.reporter_id, "Report filed");
    Ok((StatusCode::CREATED, Json(report)))
}

pub async fn list(
    State(state): State<AppState>,
    _user: CurrentUser,
    Query(params): Query<ReportsQuery>,
) -> AppResult<Json<Vec<Report>>> {
    Ok(Json(state.storage.reports(params.status).await?))
}

pub async fn update(
    State(state): State<AppState>,
    _user: CurrentUser,
    Path(id): Path<Uuid>,
    AppJson(request): AppJson<UpdateReportRequest>,
) -> AppResult<Json<Value>> {
    if !state.storage.update_report_status(id, request.status).await? {
        return Err(AppError::NotFound("Report not found".to_string()));
    }
    Ok(message(format!("Report marked {}", request.status.as_str())))
}
