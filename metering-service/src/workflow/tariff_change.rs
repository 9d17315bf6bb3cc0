//! Tariff change request state machine.
//!
//! `pending -> approved` or `pending -> rejected`; terminal states never
//! change. The transition itself is a compare-and-set in the store, so racing
//! resolvers produce exactly one winner.

use crate::error::{BillingError, Result};
use crate::models::{
    validate_subject_id, CreateTariff, ListTariffRequestsFilter, NewTariffChangeRequest,
    Resolution, TariffChangeRequest, TransitionOutcome,
};
use crate::services::metrics::{record_error, record_tariff_request};
use crate::services::store::TariffRequestStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Longest description a subject may submit.
pub const MAX_DESCRIPTION_LEN: usize = 4000;

pub struct TariffChangeWorkflow {
    requests: Arc<dyn TariffRequestStore>,
}

impl TariffChangeWorkflow {
    pub fn new(requests: Arc<dyn TariffRequestStore>) -> Self {
        Self { requests }
    }

    /// Record a new pending request.
    #[instrument(skip(self, description))]
    pub async fn create(&self, subject_id: &str, description: &str) -> Result<TariffChangeRequest> {
        let result = self.create_inner(subject_id, description).await;
        record_outcome("create", &result);
        result
    }

    async fn create_inner(&self, subject_id: &str, description: &str) -> Result<TariffChangeRequest> {
        validate_subject_id(subject_id)?;

        let description = description.trim();
        if description.is_empty() {
            return Err(BillingError::validation("description must not be empty"));
        }
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(BillingError::validation(format!(
                "description exceeds {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let request = self
            .requests
            .insert_tariff_request(&NewTariffChangeRequest {
                request_id: Uuid::new_v4(),
                subject_id: subject_id.to_string(),
                description: description.to_string(),
                created_utc: Utc::now(),
            })
            .await?;

        info!(request_id = %request.request_id, subject_id = %subject_id, "Tariff change requested");
        Ok(request)
    }

    /// Approve a pending request with the tariff the administrator proposes.
    ///
    /// Input is validated before storage is touched, so a bad proposal leaves
    /// the request pending.
    #[instrument(skip(self, proposal, admin_response), fields(tariff_name = %proposal.name))]
    pub async fn approve(
        &self,
        request_id: Uuid,
        proposal: CreateTariff,
        admin_response: &str,
    ) -> Result<TariffChangeRequest> {
        let result = async {
            let admin_response = require_response(admin_response)?;
            let now = Utc::now();
            let tariff = proposal.into_tariff(now)?;
            self.resolve(
                request_id,
                Resolution::Approve {
                    tariff,
                    admin_response,
                },
            )
            .await
        }
        .await;

        record_outcome("approve", &result);
        result
    }

    /// Reject a pending request.
    #[instrument(skip(self, admin_response))]
    pub async fn reject(&self, request_id: Uuid, admin_response: &str) -> Result<TariffChangeRequest> {
        let result = async {
            let admin_response = require_response(admin_response)?;
            self.resolve(request_id, Resolution::Reject { admin_response })
                .await
        }
        .await;

        record_outcome("reject", &result);
        result
    }

    pub async fn get(&self, request_id: Uuid) -> Result<TariffChangeRequest> {
        self.requests
            .get_tariff_request(request_id)
            .await?
            .ok_or_else(|| not_found(request_id))
    }

    pub async fn list(&self, filter: &ListTariffRequestsFilter) -> Result<Vec<TariffChangeRequest>> {
        self.requests.list_tariff_requests(filter).await
    }

    async fn resolve(&self, request_id: Uuid, resolution: Resolution) -> Result<TariffChangeRequest> {
        match self
            .requests
            .resolve_pending(request_id, &resolution, Utc::now())
            .await?
        {
            TransitionOutcome::Applied(request) => {
                info!(
                    request_id = %request_id,
                    subject_id = %request.subject_id,
                    status = %request.status,
                    "Tariff change request resolved"
                );
                Ok(request)
            }
            TransitionOutcome::NotPending(status) => {
                warn!(request_id = %request_id, status = %status, "Tariff change request is not pending");
                Err(BillingError::Conflict(format!(
                    "tariff change request {} is already {}",
                    request_id, status
                )))
            }
            TransitionOutcome::Missing => Err(not_found(request_id)),
        }
    }
}

fn require_response(admin_response: &str) -> Result<String> {
    let trimmed = admin_response.trim();
    if trimmed.is_empty() {
        return Err(BillingError::validation("admin response must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn not_found(request_id: Uuid) -> BillingError {
    BillingError::NotFound(format!("tariff change request {} not found", request_id))
}

fn record_outcome<T>(action: &str, result: &Result<T>) {
    match result {
        Ok(_) => record_tariff_request(action, "ok"),
        Err(e) => {
            record_tariff_request(action, e.kind());
            record_error(e.kind(), action);
        }
    }
}
