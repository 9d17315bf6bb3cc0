//! Storage seams.
//!
//! Every engine component receives the handles it needs explicitly; there is
//! no ambient repository state.

use crate::error::Result;
use crate::models::{
    DetailizationRequest, FunctionUsageRow, ListDetailizationFilter, ListTariffRequestsFilter,
    NewTariffChangeRequest, Resolution, SampleBatch, TariffChangeRequest, TariffPricing,
    TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: i64 = 50;

/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: i64 = 200;

/// Clamp a requested page size into `1..=MAX_PAGE_SIZE`.
pub fn page_size(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE)
}

/// Hourly resource samples from the metering feed.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// A subject's functions with samples at or after `since`, ordered by
    /// function name, samples oldest first.
    async fn function_usage(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FunctionUsageRow>>;

    /// Same as [`SampleStore::function_usage`] across every subject.
    async fn all_function_usage(&self, since: DateTime<Utc>) -> Result<Vec<FunctionUsageRow>>;

    /// Append samples, ignoring hours already recorded. Returns how many were
    /// stored.
    async fn append_samples(&self, batch: &SampleBatch) -> Result<u64>;
}

/// Tariff catalog and per-subject assignments.
#[async_trait]
pub trait TariffStore: Send + Sync {
    async fn default_tariff(&self) -> Result<TariffPricing>;

    /// Assigned tariff, or the default one.
    async fn active_tariff(&self, subject_id: &str) -> Result<TariffPricing>;

    /// Every explicit assignment, keyed by subject.
    async fn active_assignments(&self) -> Result<HashMap<String, TariffPricing>>;

    async fn get_tariff(&self, tariff_id: Uuid) -> Result<Option<TariffPricing>>;

    async fn list_tariffs(&self) -> Result<Vec<TariffPricing>>;

    async fn insert_tariff(&self, tariff: &TariffPricing) -> Result<TariffPricing>;

    /// Point the subject at `tariff_id`. The tariff must exist.
    async fn assign_tariff(
        &self,
        subject_id: &str,
        tariff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<TariffPricing>;
}

/// External running balance (invoices minus payments).
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    /// Zero when the subject has no balance yet.
    async fn outstanding_balance(&self, subject_id: &str) -> Result<Decimal>;
}

#[async_trait]
pub trait TariffRequestStore: Send + Sync {
    async fn insert_tariff_request(
        &self,
        request: &NewTariffChangeRequest,
    ) -> Result<TariffChangeRequest>;

    async fn get_tariff_request(&self, request_id: Uuid) -> Result<Option<TariffChangeRequest>>;

    async fn list_tariff_requests(
        &self,
        filter: &ListTariffRequestsFilter,
    ) -> Result<Vec<TariffChangeRequest>>;

    /// Atomically move a pending request to its terminal state.
    ///
    /// On approval the proposed tariff is stored in the catalog within the
    /// same step. Nothing is written unless the request was pending.
    async fn resolve_pending(
        &self,
        request_id: Uuid,
        resolution: &Resolution,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome>;
}

#[async_trait]
pub trait DetailizationStore: Send + Sync {
    async fn insert_detailization(
        &self,
        request: &DetailizationRequest,
    ) -> Result<DetailizationRequest>;

    async fn list_detailizations(
        &self,
        filter: &ListDetailizationFilter,
    ) -> Result<Vec<DetailizationRequest>>;
}

#[async_trait]
pub trait HealthCheck: Send + Sync {
    async fn health_check(&self) -> Result<()>;
}

/// Handles to every store, cloned from one backend.
#[derive(Clone)]
pub struct Stores {
    pub samples: Arc<dyn SampleStore>,
    pub tariffs: Arc<dyn TariffStore>,
    pub ledger: Arc<dyn BalanceLedger>,
    pub tariff_requests: Arc<dyn TariffRequestStore>,
    pub detailizations: Arc<dyn DetailizationStore>,
    pub health: Arc<dyn HealthCheck>,
}

impl Stores {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: SampleStore
            + TariffStore
            + BalanceLedger
            + TariffRequestStore
            + DetailizationStore
            + HealthCheck
            + 'static,
    {
        Self {
            samples: backend.clone(),
            tariffs: backend.clone(),
            ledger: backend.clone(),
            tariff_requests: backend.clone(),
            detailizations: backend.clone(),
            health: backend,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_size_defaults_and_clamps() {
        assert_eq!(page_size(None), DEFAULT_PAGE_SIZE);
        assert_eq!(page_size(Some(0)), 1);
        assert_eq!(page_size(Some(10_000)), MAX_PAGE_SIZE);
        assert_eq!(page_size(Some(25)), 25);
    }
}
