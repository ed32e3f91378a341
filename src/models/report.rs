use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::ParseEnumError;

/// Moderation state of a report
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    #[default]
    Pending,
    Reviewed,
    Resolved,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(ParseEnumError::new("report status", other)),
        }
    }
}

impl TryFrom<String> for ReportStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A report against a post or a user
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: Uuid,
    pub reporter_id: String,
    pub post_id: Option<Uuid>,
    pub user_id: Option<String>,
    pub reason: String,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

fn validate_report_target(request: &CreateReportRequest) -> Result<(), ValidationError> {
    if request.post_id.is_none() && request.user_id.is_none() {
        let mut error = ValidationError::new("target");
        error.message = Some("Either postId or userId is required".into());
        return Err(error);
    }
    Ok(())
}

/// Body of `POST /api/reports`
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_report_target", skip_on_field_errors = false))]
pub struct CreateReportRequest {
    pub post_id: Option<Uuid>,
    pub user_id: Option<String>,
    #[validate(length(min = 1, max = 200, message = "Reason is required"))]
    pub reason: String,
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: Option<String>,
}

impl CreateReportRequest {
    pub fn into_report(self, reporter_id: String) -> Report {
        Report {
            id: Uuid::new_v4(),
            reporter_id,
            post_id: self.post_id,
            user_id: self.user_id,
            reason: self.reason,
            description: self.description,
            status: ReportStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

/// Body of `PATCH /api/reports/:id`
#[derive(Debug, Deserialize)]
pub struct UpdateReportRequest {
    pub status: ReportStatus,
}
