//! Tariff change request model.

use super::tariff::TariffPricing;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Lifecycle of a tariff change request. `Approved` and `Rejected` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TariffRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl TariffRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TariffRequestStatus::Pending => "pending",
            TariffRequestStatus::Approved => "approved",
            TariffRequestStatus::Rejected => "rejected",
        }
    }

    pub fn from_string(s: &str) -> Self {
        match s {
            "approved" => TariffRequestStatus::Approved,
            "rejected" => TariffRequestStatus::Rejected,
            "pending" => TariffRequestStatus::Pending,
            other => {
                warn!(status = %other, "Unknown tariff request status in storage, reading as pending");
                TariffRequestStatus::Pending
            }
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(TariffRequestStatus::Pending),
            "approved" => Some(TariffRequestStatus::Approved),
            "rejected" => Some(TariffRequestStatus::Rejected),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TariffRequestStatus::Pending)
    }
}

impl std::fmt::Display for TariffRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A subject's request for a different tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffChangeRequest {
    pub request_id: Uuid,
    pub subject_id: String,
    pub description: String,
    pub status: TariffRequestStatus,
    pub admin_response: Option<String>,
    /// Set only on approval.
    pub proposed_tariff: Option<TariffPricing>,
    pub created_utc: DateTime<Utc>,
    pub resolved_utc: Option<DateTime<Utc>>,
}

/// Input for recording a new request.
#[derive(Debug, Clone)]
pub struct NewTariffChangeRequest {
    pub request_id: Uuid,
    pub subject_id: String,
    pub description: String,
    pub created_utc: DateTime<Utc>,
}

impl NewTariffChangeRequest {
    pub fn into_pending(self) -> TariffChangeRequest {
        TariffChangeRequest {
            request_id: self.request_id,
            subject_id: self.subject_id,
            description: self.description,
            status: TariffRequestStatus::Pending,
            admin_response: None,
            proposed_tariff: None,
            created_utc: self.created_utc,
            resolved_utc: None,
        }
    }
}

/// Terminal decision applied to a pending request.
#[derive(Debug, Clone)]
pub enum Resolution {
    Approve {
        tariff: TariffPricing,
        admin_response: String,
    },
    Reject {
        admin_response: String,
    },
}

impl Resolution {
    pub fn status(&self) -> TariffRequestStatus {
        match self {
            Resolution::Approve { .. } => TariffRequestStatus::Approved,
            Resolution::Reject { .. } => TariffRequestStatus::Rejected,
        }
    }

    pub fn admin_response(&self) -> &str {
        match self {
            Resolution::Approve { admin_response, .. } => admin_response,
            Resolution::Reject { admin_response } => admin_response,
        }
    }

    pub fn tariff(&self) -> Option<&TariffPricing> {
        match self {
            Resolution::Approve { tariff, .. } => Some(tariff),
            Resolution::Reject { .. } => None,
        }
    }
}

/// Result of a compare-and-set on a request's status.
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied(TariffChangeRequest),
    NotPending(TariffRequestStatus),
    Missing,
}

/// Filter for listing tariff change requests.
#[derive(Debug, Clone, Default)]
pub struct ListTariffRequestsFilter {
    pub subject_id: Option<String>,
    pub status: Option<TariffRequestStatus>,
    pub page_size: i64,
}
