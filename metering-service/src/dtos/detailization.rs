use crate::models::{DetailizationRequest, DetailizationStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Dates are optional on the wire so a missing one is reported as a
/// validation failure rather than a body parse error.
#[derive(Debug, Deserialize)]
pub struct CreateDetailizationRequest {
    pub subject_id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct DetailizationListParams {
    pub subject_id: Option<String>,
    pub status: Option<String>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DetailizationResponse {
    pub request_id: Uuid,
    pub subject_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: DetailizationStatus,
    pub created_at: DateTime<Utc>,
}

impl From<DetailizationRequest> for DetailizationResponse {
    fn from(r: DetailizationRequest) -> Self {
        Self {
            request_id: r.request_id,
            subject_id: r.subject_id,
            start_date: r.start_date,
            end_date: r.end_date,
            status: r.status,
            created_at: r.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DetailizationListResponse {
    pub requests: Vec<DetailizationResponse>,
}
