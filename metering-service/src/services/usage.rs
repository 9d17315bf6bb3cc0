//! Usage reads and sample ingestion on top of the storage seams.

use super::metrics::{record_error, record_usage_summary};
use super::store::{BalanceLedger, SampleStore, Stores, TariffStore};
use crate::billing::report::{self, UsageInputs, HOURLY_POINTS};
use crate::billing::{ReportingDay, Window};
use crate::error::{BillingError, Result};
use crate::models::{
    hour_bucket, validate_subject_id, PlatformOverview, SampleBatch, TariffPricing, UsageSummary,
};
use chrono::{DateTime, Duration, FixedOffset, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Longest function name accepted from the metering feed.
pub const MAX_FUNCTION_NAME_LEN: usize = 256;

/// Computes usage views for subjects and operators.
pub struct UsageService {
    samples: Arc<dyn SampleStore>,
    tariffs: Arc<dyn TariffStore>,
    ledger: Arc<dyn BalanceLedger>,
    reporting_offset: FixedOffset,
    history: Duration,
}

impl UsageService {
    pub fn new(stores: &Stores, reporting_offset: FixedOffset, history_hours: i64) -> Self {
        Self {
            samples: stores.samples.clone(),
            tariffs: stores.tariffs.clone(),
            ledger: stores.ledger.clone(),
            reporting_offset,
            history: Duration::hours(history_hours),
        }
    }

    /// Build the usage dashboard for one subject.
    #[instrument(skip(self))]
    pub async fn usage_summary(
        &self,
        subject_id: &str,
        window: Window,
        now: DateTime<Utc>,
    ) -> Result<UsageSummary> {
        validate_subject_id(subject_id)?;

        let since = hour_bucket(now) - self.history;
        let (rows, tariff, outstanding) = tokio::try_join!(
            self.samples.function_usage(subject_id, since),
            self.tariffs.active_tariff(subject_id),
            self.ledger.outstanding_balance(subject_id),
        )
        .map_err(|e| log_failure(e, "usage_summary"))?;

        if outstanding < Decimal::ZERO {
            warn!(subject_id = %subject_id, outstanding = %outstanding, "Negative balance reported by ledger, showing zero debt");
        }

        let summary = report::usage_summary(UsageInputs {
            subject_id,
            rows: &rows,
            tariff: &tariff,
            outstanding,
            window,
            day: ReportingDay::at(now, self.reporting_offset),
        })
        .map_err(|e| log_failure(e, "usage_summary"))?;

        record_usage_summary(&window.to_string());
        info!(
            subject_id = %subject_id,
            window = %window,
            functions = rows.len(),
            "Usage summary computed"
        );

        Ok(summary)
    }

    /// The subject's active tariff (assigned, else default).
    #[instrument(skip(self))]
    pub async fn tariff_for(&self, subject_id: &str) -> Result<TariffPricing> {
        validate_subject_id(subject_id)?;
        self.tariffs
            .active_tariff(subject_id)
            .await
            .map_err(|e| log_failure(e, "get_tariff"))
    }

    /// Cost across every subject over the trailing day.
    #[instrument(skip(self))]
    pub async fn platform_overview(&self, now: DateTime<Utc>) -> Result<PlatformOverview> {
        let since = hour_bucket(now) - Duration::hours(HOURLY_POINTS as i64 - 1);
        let (rows, assignments, default_tariff) = tokio::try_join!(
            self.samples.all_function_usage(since),
            self.tariffs.active_assignments(),
            self.tariffs.default_tariff(),
        )
        .map_err(|e| log_failure(e, "platform_overview"))?;

        report::platform_overview(&rows, &assignments, &default_tariff, now)
            .map_err(|e| log_failure(e, "platform_overview"))
    }

    /// Append samples from the metering feed. Already recorded hours are
    /// left untouched.
    #[instrument(skip(self, batch), fields(subject_id = %batch.subject_id, function = %batch.function_name, count = batch.samples.len()))]
    pub async fn ingest(&self, batch: SampleBatch) -> Result<u64> {
        validate_subject_id(&batch.subject_id)?;

        let function_name = batch.function_name.trim();
        if function_name.is_empty() || function_name.len() > MAX_FUNCTION_NAME_LEN {
            return Err(BillingError::validation(format!(
                "function name must be 1..={} characters",
                MAX_FUNCTION_NAME_LEN
            )));
        }
        let plan = batch.plan.trim();
        if plan.is_empty() {
            return Err(BillingError::validation("plan must not be empty"));
        }

        let batch = SampleBatch {
            function_name: function_name.to_string(),
            plan: plan.to_string(),
            ..batch
        };

        let stored = self
            .samples
            .append_samples(&batch)
            .await
            .map_err(|e| log_failure(e, "ingest_samples"))?;

        info!(
            stored = stored,
            ignored = batch.samples.len() as u64 - stored.min(batch.samples.len() as u64),
            "Samples ingested"
        );
        Ok(stored)
    }
}

fn log_failure(err: BillingError, operation: &str) -> BillingError {
    if let BillingError::UpstreamUnavailable(ref msg) = err {
        error!(operation = operation, error = %msg, "Storage unavailable");
    }
    record_error(err.kind(), operation);
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ResourceSample;
    use crate::services::memory::InMemoryStorage;
    use chrono::TimeZone;

    fn service(store: Arc<InMemoryStorage>) -> UsageService {
        UsageService::new(
            &Stores::from_backend(store),
            FixedOffset::east_opt(0).unwrap(),
            48,
        )
    }

    fn sample(ts: DateTime<Utc>, invocations: u64) -> ResourceSample {
        ResourceSample {
            timestamp: ts,
            invocations,
            duration_p95_ms: 0,
            cold_starts: 0,
            cpu_core_ms: 0,
            ram_mb_sec: 0,
        }
    }

    #[tokio::test]
    async fn test_summary_for_unknown_subject_is_empty() {
        let usage = service(Arc::new(InMemoryStorage::new()));
        let summary = usage
            .usage_summary("ghost", Window::Last24h, Utc::now())
            .await
            .unwrap();

        assert!(summary.by_function.is_empty());
        assert_eq!(summary.summary.yesterday_cost, Decimal::ZERO);
        assert_eq!(summary.summary.today_cost, Decimal::ZERO);
        assert_eq!(summary.summary.total_debt, Decimal::ZERO);
        assert_eq!(summary.tariff_name, "default");
    }

    #[tokio::test]
    async fn test_summary_uses_ledger_and_samples() {
        let store = Arc::new(InMemoryStorage::new());
        store.set_balance("alice", Decimal::new(1250, 2)).await;
        let usage = service(store);

        let now = Utc.with_ymd_and_hms(2024, 5, 2, 12, 30, 0).unwrap();
        usage
            .ingest(SampleBatch {
                subject_id: "alice".to_string(),
                function_name: " resize ".to_string(),
                plan: "default".to_string(),
                samples: vec![
                    sample(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(), 100),
                    sample(Utc.with_ymd_and_hms(2024, 5, 2, 9, 0, 0).unwrap(), 200),
                ],
            })
            .await
            .unwrap();

        let summary = usage
            .usage_summary("alice", Window::LastHour, now)
            .await
            .unwrap();

        assert_eq!(summary.by_function[0].name, "resize");
        assert_eq!(summary.window.totals.invocations, 200);
        assert_eq!(summary.summary.yesterday_cost, Decimal::ONE);
        assert_eq!(summary.summary.today_cost, Decimal::from(2));
        assert_eq!(summary.summary.total_debt, Decimal::new(1250, 2));
    }

    #[tokio::test]
    async fn test_ingest_rejects_blank_function() {
        let usage = service(Arc::new(InMemoryStorage::new()));
        let result = usage
            .ingest(SampleBatch {
                subject_id: "alice".to_string(),
                function_name: "  ".to_string(),
                plan: "default".to_string(),
                samples: vec![],
            })
            .await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_malformed_subject_rejected() {
        let usage = service(Arc::new(InMemoryStorage::new()));
        let result = usage.usage_summary("a b", Window::Last24h, Utc::now()).await;
        assert!(matches!(result, Err(BillingError::Validation(_))));
    }
}
