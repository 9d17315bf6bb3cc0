//! Detailization (itemized usage report) request model.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Detailization request status.
///
/// Only `Pending` is ever written by this service; report generation is owned
/// elsewhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailizationStatus {
    Pending,
    Processing,
    Completed,
}

impl DetailizationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailizationStatus::Pending => "pending",
            DetailizationStatus::Processing => "processing",
            DetailizationStatus::Completed => "completed",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "processing" => DetailizationStatus::Processing,
            "completed" => DetailizationStatus::Completed,
            "pending" => DetailizationStatus::Pending,
            other => {
                warn!(status = %other, "Unknown detailization status in storage, reading as pending");
                DetailizationStatus::Pending
            }
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DetailizationStatus::Pending),
            "processing" => Some(DetailizationStatus::Processing),
            "completed" => Some(DetailizationStatus::Completed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailizationRequest {
    pub request_id: Uuid,
    pub subject_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: DetailizationStatus,
    pub created_utc: DateTime<Utc>,
}

/// Filter for listing detailization requests.
#[derive(Debug, Clone, Default)]
pub struct ListDetailizationFilter {
    pub subject_id: Option<String>,
    pub status: Option<DetailizationStatus>,
    pub page_size: i64,
}
