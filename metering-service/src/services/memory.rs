//! In-memory storage backend.
//!
//! All state sits behind one lock, so each operation, including a workflow
//! transition together with its catalog insert, is atomic to readers.

use super::metrics::DB_QUERY_DURATION;
use super::store::{
    BalanceLedger, DetailizationStore, HealthCheck, SampleStore, TariffRequestStore, TariffStore,
};
use crate::error::{BillingError, Result};
use crate::models::{
    DetailizationRequest, FunctionUsageRow, ListDetailizationFilter, ListTariffRequestsFilter,
    NewTariffChangeRequest, Resolution, ResourceSample, SampleBatch, TariffChangeRequest,
    TariffPricing, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use uuid::Uuid;

struct FunctionSeries {
    plan: String,
    samples: BTreeMap<DateTime<Utc>, ResourceSample>,
}

#[derive(Default)]
struct MemoryState {
    tariffs: HashMap<Uuid, TariffPricing>,
    assignments: HashMap<String, Uuid>,
    series: BTreeMap<(String, String), FunctionSeries>,
    balances: HashMap<String, Decimal>,
    tariff_requests: Vec<TariffChangeRequest>,
    detailizations: Vec<DetailizationRequest>,
}

impl MemoryState {
    fn default_tariff(&self) -> Result<TariffPricing> {
        self.tariffs
            .values()
            .find(|t| t.is_default)
            .cloned()
            .ok_or_else(|| BillingError::NotFound("default tariff is not configured".to_string()))
    }

    fn rows_since(&self, subject: Option<&str>, since: DateTime<Utc>) -> Vec<FunctionUsageRow> {
        self.series
            .iter()
            .filter(|((s, _), _)| subject.map_or(true, |wanted| wanted == s))
            .filter_map(|((subject_id, function_name), series)| {
                let samples: Vec<ResourceSample> =
                    series.samples.range(since..).map(|(_, s)| *s).collect();
                if samples.is_empty() {
                    return None;
                }
                Some(FunctionUsageRow {
                    subject_id: subject_id.clone(),
                    function_name: function_name.clone(),
                    plan: series.plan.clone(),
                    samples,
                })
            })
            .collect()
    }
}

/// Storage backend for tests and single-process runs.
#[derive(Clone)]
pub struct InMemoryStorage {
    state: Arc<RwLock<MemoryState>>,
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStorage {
    /// Empty store seeded with the default tariff.
    pub fn new() -> Self {
        let default_tariff = TariffPricing::standard(Utc::now());
        let mut state = MemoryState::default();
        state
            .tariffs
            .insert(default_tariff.tariff_id, default_tariff);

        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Set a subject's outstanding balance, standing in for the invoicing ledger.
    pub async fn set_balance(&self, subject_id: &str, amount: Decimal) {
        self.state
            .write()
            .await
            .balances
            .insert(subject_id.to_string(), amount);
    }
}

#[async_trait]
impl SampleStore for InMemoryStorage {
    async fn function_usage(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FunctionUsageRow>> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["function_usage"])
            .start_timer();
        let rows = self.state.read().await.rows_since(Some(subject_id), since);
        timer.observe_duration();
        Ok(rows)
    }

    async fn all_function_usage(&self, since: DateTime<Utc>) -> Result<Vec<FunctionUsageRow>> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["all_function_usage"])
            .start_timer();
        let rows = self.state.read().await.rows_since(None, since);
        timer.observe_duration();
        Ok(rows)
    }

    #[instrument(skip(self, batch), fields(subject_id = %batch.subject_id, function = %batch.function_name))]
    async fn append_samples(&self, batch: &SampleBatch) -> Result<u64> {
        let mut state = self.state.write().await;
        let series = state
            .series
            .entry((batch.subject_id.clone(), batch.function_name.clone()))
            .or_insert_with(|| FunctionSeries {
                plan: batch.plan.clone(),
                samples: BTreeMap::new(),
            });
        series.plan = batch.plan.clone();

        let mut stored = 0;
        for sample in &batch.samples {
            let sample = sample.bucketed();
            if let std::collections::btree_map::Entry::Vacant(slot) =
                series.samples.entry(sample.timestamp)
            {
                slot.insert(sample);
                stored += 1;
            }
        }

        debug!(stored = stored, "Samples appended");
        Ok(stored)
    }
}

#[async_trait]
impl TariffStore for InMemoryStorage {
    async fn default_tariff(&self) -> Result<TariffPricing> {
        self.state.read().await.default_tariff()
    }

    async fn active_tariff(&self, subject_id: &str) -> Result<TariffPricing> {
        let state = self.state.read().await;
        match state
            .assignments
            .get(subject_id)
            .and_then(|id| state.tariffs.get(id))
        {
            Some(tariff) => Ok(tariff.clone()),
            None => state.default_tariff(),
        }
    }

    async fn active_assignments(&self) -> Result<HashMap<String, TariffPricing>> {
        let state = self.state.read().await;
        Ok(state
            .assignments
            .iter()
            .filter_map(|(subject, id)| {
                state
                    .tariffs
                    .get(id)
                    .map(|t| (subject.clone(), t.clone()))
            })
            .collect())
    }

    async fn get_tariff(&self, tariff_id: Uuid) -> Result<Option<TariffPricing>> {
        Ok(self.state.read().await.tariffs.get(&tariff_id).cloned())
    }

    async fn list_tariffs(&self) -> Result<Vec<TariffPricing>> {
        let mut tariffs: Vec<TariffPricing> =
            self.state.read().await.tariffs.values().cloned().collect();
        tariffs.sort_by(|a, b| {
            a.created_utc
                .cmp(&b.created_utc)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(tariffs)
    }

    async fn insert_tariff(&self, tariff: &TariffPricing) -> Result<TariffPricing> {
        let mut state = self.state.write().await;
        if state.tariffs.contains_key(&tariff.tariff_id) {
            return Err(BillingError::Conflict(format!(
                "tariff {} already exists",
                tariff.tariff_id
            )));
        }
        state.tariffs.insert(tariff.tariff_id, tariff.clone());
        Ok(tariff.clone())
    }

    async fn assign_tariff(
        &self,
        subject_id: &str,
        tariff_id: Uuid,
        _at: DateTime<Utc>,
    ) -> Result<TariffPricing> {
        let mut state = self.state.write().await;
        let tariff = state
            .tariffs
            .get(&tariff_id)
            .cloned()
            .ok_or_else(|| BillingError::NotFound(format!("tariff {} not found", tariff_id)))?;
        state
            .assignments
            .insert(subject_id.to_string(), tariff_id);
        Ok(tariff)
    }
}

#[async_trait]
impl BalanceLedger for InMemoryStorage {
    async fn outstanding_balance(&self, subject_id: &str) -> Result<Decimal> {
        Ok(self
            .state
            .read()
            .await
            .balances
            .get(subject_id)
            .copied()
            .unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl TariffRequestStore for InMemoryStorage {
    async fn insert_tariff_request(
        &self,
        request: &NewTariffChangeRequest,
    ) -> Result<TariffChangeRequest> {
        let record = request.clone().into_pending();
        self.state.write().await.tariff_requests.push(record.clone());
        Ok(record)
    }

    async fn get_tariff_request(&self, request_id: Uuid) -> Result<Option<TariffChangeRequest>> {
        Ok(self
            .state
            .read()
            .await
            .tariff_requests
            .iter()
            .find(|r| r.request_id == request_id)
            .cloned())
    }

    async fn list_tariff_requests(
        &self,
        filter: &ListTariffRequestsFilter,
    ) -> Result<Vec<TariffChangeRequest>> {
        let state = self.state.read().await;
        Ok(state
            .tariff_requests
            .iter()
            .rev()
            .filter(|r| filter.subject_id.as_ref().map_or(true, |s| *s == r.subject_id))
            .filter(|r| filter.status.map_or(true, |s| s == r.status))
            .take(filter.page_size.max(0) as usize)
            .cloned()
            .collect())
    }

    #[instrument(skip(self, resolution), fields(status = %resolution.status()))]
    async fn resolve_pending(
        &self,
        request_id: Uuid,
        resolution: &Resolution,
        at: DateTime<Utc>,
    ) -> Result<TransitionOutcome> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["resolve_tariff_request"])
            .start_timer();

        let mut state = self.state.write().await;
        let Some(idx) = state
            .tariff_requests
            .iter()
            .position(|r| r.request_id == request_id)
        else {
            return Ok(TransitionOutcome::Missing);
        };

        let current = state.tariff_requests[idx].status;
        if current.is_terminal() {
            return Ok(TransitionOutcome::NotPending(current));
        }

        if let Some(tariff) = resolution.tariff() {
            state.tariffs.insert(tariff.tariff_id, tariff.clone());
        }

        let record = &mut state.tariff_requests[idx];
        record.status = resolution.status();
        record.admin_response = Some(resolution.admin_response().to_string());
        record.proposed_tariff = resolution.tariff().cloned();
        record.resolved_utc = Some(at);
        let updated = record.clone();

        timer.observe_duration();
        Ok(TransitionOutcome::Applied(updated))
    }
}

#[async_trait]
impl DetailizationStore for InMemoryStorage {
    async fn insert_detailization(
        &self,
        request: &DetailizationRequest,
    ) -> Result<DetailizationRequest> {
        self.state
            .write()
            .await
            .detailizations
            .push(request.clone());
        Ok(request.clone())
    }

    async fn list_detailizations(
        &self,
        filter: &ListDetailizationFilter,
    ) -> Result<Vec<DetailizationRequest>> {
        let state = self.state.read().await;
        Ok(state
            .detailizations
            .iter()
            .rev()
            .filter(|r| filter.subject_id.as_ref().map_or(true, |s| *s == r.subject_id))
            .filter(|r| filter.status.map_or(true, |s| s == r.status))
            .take(filter.page_size.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl HealthCheck for InMemoryStorage {
    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
