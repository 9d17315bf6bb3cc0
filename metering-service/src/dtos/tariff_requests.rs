use super::tariffs::{TariffInput, TariffResponse};
use crate::models::{TariffChangeRequest, TariffRequestStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize)]
pub struct CreateTariffChangeRequest {
    /// Only admins may file on behalf of another subject.
    pub subject_id: Option<String>,
    pub description: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApproveTariffChangeRequest {
    #[validate(nested)]
    pub tariff: TariffInput,
    pub admin_response: String,
}

#[derive(Debug, Deserialize)]
pub struct RejectTariffChangeRequest {
    pub admin_response: String,
}

#[derive(Debug, Deserialize)]
pub struct TariffChangeListParams {
    pub subject_id: Option<String>,
    pub status: Option<String>,
    pub page_size: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TariffChangeResponse {
    pub request_id: Uuid,
    pub subject_id: String,
    pub description: String,
    pub status: TariffRequestStatus,
    pub admin_response: Option<String>,
    pub proposed_tariff: Option<TariffResponse>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl From<TariffChangeRequest> for TariffChangeResponse {
    fn from(r: TariffChangeRequest) -> Self {
        Self {
            request_id: r.request_id,
            subject_id: r.subject_id,
            description: r.description,
            status: r.status,
            admin_response: r.admin_response,
            proposed_tariff: r.proposed_tariff.map(Into::into),
            created_at: r.created_utc,
            resolved_at: r.resolved_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TariffChangeListResponse {
    pub requests: Vec<TariffChangeResponse>,
}
