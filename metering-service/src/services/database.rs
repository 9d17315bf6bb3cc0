//! Database service for metering-service.

use super::metrics::DB_QUERY_DURATION;
use super::store::{
    BalanceLedger, DetailizationStore, HealthCheck, SampleStore, TariffRequestStore, TariffStore,
};
use crate::error::{BillingError, Result};
use crate::models::{
    DetailizationRequest, DetailizationStatus, FunctionUsageRow, ListDetailizationFilter,
    ListTariffRequestsFilter, NewTariffChangeRequest, Resolution, ResourceSample, SampleBatch,
    TariffChangeRequest, TariffPricing, TariffRequestStatus, TransitionOutcome,
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

const TARIFF_COLUMNS: &str = "tariff_id, name, invocation_price, duration_price, cpu_price, \
     ram_price, cold_start_price, is_default, created_utc";

const TARIFF_REQUEST_SELECT: &str = r#"
    SELECT r.request_id, r.subject_id, r.description, r.status, r.admin_response,
           r.created_utc, r.resolved_utc,
           t.tariff_id AS pt_tariff_id, t.name AS pt_name,
           t.invocation_price AS pt_invocation_price, t.duration_price AS pt_duration_price,
           t.cpu_price AS pt_cpu_price, t.ram_price AS pt_ram_price,
           t.cold_start_price AS pt_cold_start_price, t.is_default AS pt_is_default,
           t.created_utc AS pt_created_utc
    FROM tariff_change_requests r
    LEFT JOIN tariffs t ON t.tariff_id = r.proposed_tariff_id
"#;

#[derive(Debug, FromRow)]
struct SampleRow {
    subject_id: String,
    function_name: String,
    plan: String,
    bucket_utc: DateTime<Utc>,
    invocations: i64,
    duration_p95_ms: i64,
    cold_starts: i64,
    cpu_core_ms: i64,
    ram_mb_sec: i64,
}

impl SampleRow {
    fn sample(&self) -> ResourceSample {
        ResourceSample {
            timestamp: self.bucket_utc,
            invocations: self.invocations.max(0) as u64,
            duration_p95_ms: self.duration_p95_ms.max(0) as u64,
            cold_starts: self.cold_starts.max(0) as u64,
            cpu_core_ms: self.cpu_core_ms.max(0) as u64,
            ram_mb_sec: self.ram_mb_sec.max(0) as u64,
        }
    }
}

/// Group rows ordered by (subject, function, hour) into per-function series.
/// The newest sample's plan labels the function.
fn group_samples(rows: Vec<SampleRow>) -> Vec<FunctionUsageRow> {
    let mut out: Vec<FunctionUsageRow> = Vec::new();
    for row in rows {
        let sample = row.sample();
        match out.last_mut() {
            Some(last)
                if last.subject_id == row.subject_id && last.function_name == row.function_name =>
            {
                last.plan = row.plan;
                last.samples.push(sample);
            }
            _ => out.push(FunctionUsageRow {
                subject_id: row.subject_id,
                function_name: row.function_name,
                plan: row.plan,
                samples: vec![sample],
            }),
        }
    }
    out
}

#[derive(Debug, FromRow)]
struct AssignmentRow {
    subject_id: String,
    #[sqlx(flatten)]
    tariff: TariffPricing,
}

#[derive(Debug, FromRow)]
struct TariffRequestRow {
    request_id: Uuid,
    subject_id: String,
    description: String,
    status: String,
    admin_response: Option<String>,
    created_utc: DateTime<Utc>,
    resolved_utc: Option<DateTime<Utc>>,
    pt_tariff_id: Option<Uuid>,
    pt_name: Option<String>,
    pt_invocation_price: Option<Decimal>,
    pt_duration_price: Option<Decimal>,
    pt_cpu_price: Option<Decimal>,
    pt_ram_price: Option<Decimal>,
    pt_cold_start_price: Option<Decimal>,
    pt_is_default: Option<bool>,
    pt_created_utc: Option<DateTime<Utc>>,
}

impl From<TariffRequestRow> for TariffChangeRequest {
    fn from(row: TariffRequestRow) -> Self {
        let proposed_tariff = match (
            row.pt_tariff_id,
            row.pt_name,
            row.pt_invocation_price,
            row.pt_duration_price,
            row.pt_cpu_price,
            row.pt_ram_price,
            row.pt_cold_start_price,
            row.pt_is_default,
            row.pt_created_utc,
        ) {
            (
                Some(tariff_id),
                Some(name),
                Some(invocation_price),
                Some(duration_price),
                Some(cpu_price),
                Some(ram_price),
                Some(cold_start_price),
                Some(is_default),
                Some(created_utc),
            ) => Some(TariffPricing {
                tariff_id,
                name,
                invocation_price,
                duration_price,
                cpu_price,
                ram_price,
                cold_start_price,
                is_default,
                created_utc,
            }),
            _ => None,
        };

        TariffChangeRequest {
            request_id: row.request_id,
            subject_id: row.subject_id,
            description: row.description,
            status: TariffRequestStatus::from_string(&row.status),
            admin_response: row.admin_response,
            proposed_tariff,
            created_utc: row.created_utc,
            resolved_utc: row.resolved_utc,
        }
    }
}

#[derive(Debug, FromRow)]
struct DetailizationRow {
    request_id: Uuid,
    subject_id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    status: String,
    created_utc: DateTime<Utc>,
}

impl From<DetailizationRow> for DetailizationRequest {
    fn from(row: DetailizationRow) -> Self {
        DetailizationRequest {
            request_id: row.request_id,
            subject_id: row.subject_id,
            start_date: row.start_date,
            end_date: row.end_date,
            status: DetailizationStatus::from_string(&row.status),
            created_utc: row.created_utc,
        }
    }
}

fn to_db_count(field: &str, value: u64) -> Result<i64> {
    i64::try_from(value)
        .map_err(|_| BillingError::validation(format!("{} is out of range: {}", field, value)))
}

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(database_url), fields(service = "metering-service"))]
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> std::result::Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect(database_url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> std::result::Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    async fn insert_tariff_in<'e, E>(executor: E, tariff: &TariffPricing) -> Result<TariffPricing>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query_as::<_, TariffPricing>(&format!(
            r#"
            INSERT INTO tariffs ({cols})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {cols}
            "#,
            cols = TARIFF_COLUMNS
        ))
        .bind(tariff.tariff_id)
        .bind(&tariff.name)
        .bind(tariff.invocation_price)
        .bind(tariff.duration_price)
        .bind(tariff.cpu_price)
        .bind(tariff.ram_price)
        .bind(tariff.cold_start_price)
        .bind(tariff.is_default)
        .bind(tariff.created_utc)
        .fetch_one(executor)
        .await
        .map_err(|e| BillingError::upstream("Failed to insert tariff", e))
    }
}

#[async_trait]
impl HealthCheck for Database {
    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<()> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| BillingError::upstream("Health check failed", e))?;

        timer.observe_duration();
        Ok(())
    }
}

#[async_trait]
impl SampleStore for Database {
    #[instrument(skip(self))]
    async fn function_usage(
        &self,
        subject_id: &str,
        since: DateTime<Utc>,
    ) -> Result<Vec<FunctionUsageRow>> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["function_usage"])
            .start_timer();

        let rows = sqlx::query_as::<_, SampleRow>(
            r#"
            SELECT subject_id, function_name, plan, bucket_utc, invocations, duration_p95_ms,
                   cold_starts, cpu_core_ms, ram_mb_sec
            FROM resource_samples
            WHERE subject_id = $1 AND bucket_utc >= $2
            ORDER BY function_name, bucket_utc
            "#,
        )
        .bind(subject_id)
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to load samples", e))?;

        timer.observe_duration();
        Ok(group_samples(rows))
    }

    #[instrument(skip(self))]
    async fn all_function_usage(&self, since: DateTime<Utc>) -> Result<Vec<FunctionUsageRow>> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["all_function_usage"])
            .start_timer();

        let rows = sqlx::query_as::<_, SampleRow>(
            r#"
            SELECT subject_id, function_name, plan, bucket_utc, invocations, duration_p95_ms,
                   cold_starts, cpu_core_ms, ram_mb_sec
            FROM resource_samples
            WHERE bucket_utc >= $1
            ORDER BY subject_id, function_name, bucket_utc
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to load samples", e))?;

        timer.observe_duration();
        Ok(group_samples(rows))
    }

    #[instrument(skip(self, batch), fields(subject_id = %batch.subject_id, function = %batch.function_name))]
    async fn append_samples(&self, batch: &SampleBatch) -> Result<u64> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["append_samples"])
            .start_timer();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BillingError::upstream("Failed to begin transaction", e))?;

        let mut stored = 0;
        for sample in &batch.samples {
            let sample = sample.bucketed();
            let result = sqlx::query(
                r#"
                INSERT INTO resource_samples (subject_id, function_name, plan, bucket_utc,
                    invocations, duration_p95_ms, cold_starts, cpu_core_ms, ram_mb_sec)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ON CONFLICT (subject_id, function_name, bucket_utc) DO NOTHING
                "#,
            )
            .bind(&batch.subject_id)
            .bind(&batch.function_name)
            .bind(&batch.plan)
            .bind(sample.timestamp)
            .bind(to_db_count("invocations", sample.invocations)?)
            .bind(to_db_count("duration_p95_ms", sample.duration_p95_ms)?)
            .bind(to_db_count("cold_starts", sample.cold_starts)?)
            .bind(to_db_count("cpu_core_ms", sample.cpu_core_ms)?)
            .bind(to_db_count("ram_mb_sec", sample.ram_mb_sec)?)
            .execute(&mut *tx)
            .await;

            match result {
                Ok(done) => stored += done.rows_affected(),
                Err(e) => {
                    tx.rollback().await.ok();
                    return Err(BillingError::upstream("Failed to insert sample", e));
                }
            }
        }

        tx.commit()
            .await
            .map_err(|e| BillingError::upstream("Failed to commit samples", e))?;

        timer.observe_duration();
        info!(stored = stored, "Samples appended");
        Ok(stored)
    }
}

#[async_trait]
impl TariffStore for Database {
    #[instrument(skip(self))]
    async fn default_tariff(&self) -> Result<TariffPricing> {
        sqlx::query_as::<_, TariffPricing>(&format!(
            "SELECT {} FROM tariffs WHERE is_default LIMIT 1",
            TARIFF_COLUMNS
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to load default tariff", e))?
        .ok_or_else(|| BillingError::NotFound("default tariff is not configured".to_string()))
    }

    #[instrument(skip(self))]
    async fn active_tariff(&self, subject_id: &str) -> Result<TariffPricing> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["active_tariff"])
            .start_timer();

        let assigned = sqlx::query_as::<_, TariffPricing>(
            r#"
            SELECT t.tariff_id, t.name, t.invocation_price, t.duration_price, t.cpu_price,
                   t.ram_price, t.cold_start_price, t.is_default, t.created_utc
            FROM subject_tariffs s
            JOIN tariffs t ON t.tariff_id = s.tariff_id
            WHERE s.subject_id = $1
            "#,
        )
        .bind(subject_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to load tariff assignment", e))?;

        timer.observe_duration();

        match assigned {
            Some(tariff) => Ok(tariff),
            None => self.default_tariff().await,
        }
    }

    #[instrument(skip(self))]
    async fn active_assignments(&self) -> Result<HashMap<String, TariffPricing>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT s.subject_id, t.tariff_id, t.name, t.invocation_price, t.duration_price,
                   t.cpu_price, t.ram_price, t.cold_start_price, t.is_default, t.created_utc
            FROM subject_tariffs s
            JOIN tariffs t ON t.tariff_id = s.tariff_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to load tariff assignments", e))?;

        Ok(rows.into_iter().map(|r| (r.subject_id, r.tariff)).collect())
    }

    #[instrument(skip(self))]
    async fn get_tariff(&self, tariff_id: Uuid) -> Result<Option<TariffPricing>> {
        sqlx::query_as::<_, TariffPricing>(&format!(
            "SELECT {} FROM tariffs WHERE tariff_id = $1",
            TARIFF_COLUMNS
        ))
        .bind(tariff_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to get tariff", e))
    }

    #[instrument(skip(self))]
    async fn list_tariffs(&self) -> Result<Vec<TariffPricing>> {
        sqlx::query_as::<_, TariffPricing>(&format!(
            "SELECT {} FROM tariffs ORDER BY created_utc, name",
            TARIFF_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to list tariffs", e))
    }

    #[instrument(skip(self, tariff), fields(tariff_id = %tariff.tariff_id))]
    async fn insert_tariff(&self, tariff: &TariffPricing) -> Result<TariffPricing> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_tariff"])
            .start_timer();

        let created = Self::insert_tariff_in(&self.pool, tariff).await?;

        timer.observe_duration();
        info!(tariff_id = %created.tariff_id, name = %created.name, "Tariff created");
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn assign_tariff(
        &self,
        subject_id: &str,
        tariff_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<TariffPricing> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["assign_tariff"])
            .start_timer();

        let tariff = self
            .get_tariff(tariff_id)
            .await?
            .ok_or_else(|| BillingError::NotFound(format!("tariff {} not found", tariff_id)))?;

        sqlx::query(
            r#"
            INSERT INTO subject_tariffs (subject_id, tariff_id, assigned_utc)
            VALUES ($1, $2, $3)
            ON CONFLICT (subject_id)
            DO UPDATE SET tariff_id = EXCLUDED.tariff_id, assigned_utc = EXCLUDED.assigned_utc
            "#,
        )
        .bind(subject_id)
        .bind(tariff_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to assign tariff", e))?;

        timer.observe_duration();
        info!(subject_id = %subject_id, tariff_id = %tariff_id, "Tariff assigned");
        Ok(tariff)
    }
}

#[async_trait]
impl BalanceLedger for Database {
    #[instrument(skip(self))]
    async fn outstanding_balance(&self, subject_id: &str) -> Result<Decimal> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT outstanding FROM account_balances WHERE subject_id = $1")
                .bind(subject_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| BillingError::upstream("Failed to load balance", e))?;

        Ok(row.map(|(amount,)| amount).unwrap_or(Decimal::ZERO))
    }
}

#[async_trait]
impl TariffRequestStore for Database {
    #[instrument(skip(self, request), fields(subject_id = %request.subject_id))]
    async fn insert_tariff_request(
        &self,
        request: &NewTariffChangeRequest,
    ) -> Result<TariffChangeRequest> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_tariff_request"])
            .start_timer();

        sqlx::query(
            r#"
            INSERT INTO tariff_change_requests (request_id, subject_id, description, status, created_utc)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(request.request_id)
        .bind(&request.subject_id)
        .bind(&request.description)
        .bind(TariffRequestStatus::Pending.as_str())
        .bind(request.created_utc)
        .execute(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to create tariff request", e))?;

        timer.observe_duration();
        Ok(request.clone().into_pending())
    }

    #[instrument(skip(self))]
    async fn get_tariff_request(&self, request_id: Uuid) -> Result<Option<TariffChangeRequest>> {
        let row = sqlx::query_as::<_, TariffRequestRow>(&format!(
            "{} WHERE r.request_id = $1",
            TARIFF_REQUEST_SELECT
        ))
        .bind(request_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to get tariff request", e))?;

        Ok(row.map(Into::into))
    }

    #[instrument(skip(self, filter))]
    async fn list_tariff_requests(
        &self,
        filter: &ListTariffRequestsFilter,
    ) -> Result<Vec<TariffChangeRequest>> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_tariff_requests"])
            .start_timer();

        let rows = sqlx::query_as::<_, TariffRequestRow>(&format!(
            r#"{}
            WHERE ($1::text IS NULL OR r.subject_id = $1)
              AND ($2::varchar IS NULL OR r.status = $2)
            ORDER BY r.created_utc DESC
            LIMIT $3
            "#,
            TARIFF_REQUEST_SELECT
        ))
        .bind(&filter.subject_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.page_size)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to list tariff requests", e))?;

        timer.observe_duration();
        Ok(rows.into_iter().map(Into::into).collect())
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

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| BillingError::upstream("Failed to begin transaction", e))?;

        if let Some(tariff) = resolution.tariff() {
            if let Err(e) = Self::insert_tariff_in(&mut *tx, tariff).await {
                tx.rollback().await.ok();
                return Err(e);
            }
        }

        // Compare-and-set: a concurrent resolver blocks on the row lock and
        // then sees a non-pending status.
        let updated: Option<(Uuid,)> = match sqlx::query_as(
            r#"
            UPDATE tariff_change_requests
            SET status = $2, admin_response = $3, proposed_tariff_id = $4, resolved_utc = $5
            WHERE request_id = $1 AND status = 'pending'
            RETURNING request_id
            "#,
        )
        .bind(request_id)
        .bind(resolution.status().as_str())
        .bind(resolution.admin_response())
        .bind(resolution.tariff().map(|t| t.tariff_id))
        .bind(at)
        .fetch_optional(&mut *tx)
        .await
        {
            Ok(row) => row,
            Err(e) => {
                tx.rollback().await.ok();
                return Err(BillingError::upstream("Failed to update tariff request", e));
            }
        };

        if updated.is_none() {
            let current: Option<(String,)> = sqlx::query_as(
                "SELECT status FROM tariff_change_requests WHERE request_id = $1",
            )
            .bind(request_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| BillingError::upstream("Failed to read tariff request", e))?;
            tx.rollback().await.ok();

            return Ok(match current {
                Some((status,)) => {
                    let status = TariffRequestStatus::from_string(&status);
                    warn!(request_id = %request_id, status = %status, "Tariff request already resolved");
                    TransitionOutcome::NotPending(status)
                }
                None => TransitionOutcome::Missing,
            });
        }

        let row = sqlx::query_as::<_, TariffRequestRow>(&format!(
            "{} WHERE r.request_id = $1",
            TARIFF_REQUEST_SELECT
        ))
        .bind(request_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| BillingError::upstream("Failed to reload tariff request", e))?;

        tx.commit()
            .await
            .map_err(|e| BillingError::upstream("Failed to commit transaction", e))?;

        timer.observe_duration();
        Ok(TransitionOutcome::Applied(row.into()))
    }
}

#[async_trait]
impl DetailizationStore for Database {
    #[instrument(skip(self, request), fields(subject_id = %request.subject_id))]
    async fn insert_detailization(
        &self,
        request: &DetailizationRequest,
    ) -> Result<DetailizationRequest> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["insert_detailization"])
            .start_timer();

        let row = sqlx::query_as::<_, DetailizationRow>(
            r#"
            INSERT INTO detailization_requests (request_id, subject_id, start_date, end_date, status, created_utc)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING request_id, subject_id, start_date, end_date, status, created_utc
            "#,
        )
        .bind(request.request_id)
        .bind(&request.subject_id)
        .bind(request.start_date)
        .bind(request.end_date)
        .bind(request.status.as_str())
        .bind(request.created_utc)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to create detailization request", e))?;

        timer.observe_duration();
        Ok(row.into())
    }

    #[instrument(skip(self, filter))]
    async fn list_detailizations(
        &self,
        filter: &ListDetailizationFilter,
    ) -> Result<Vec<DetailizationRequest>> {
        let rows = sqlx::query_as::<_, DetailizationRow>(
            r#"
            SELECT request_id, subject_id, start_date, end_date, status, created_utc
            FROM detailization_requests
            WHERE ($1::text IS NULL OR subject_id = $1)
              AND ($2::varchar IS NULL OR status = $2)
            ORDER BY created_utc DESC
            LIMIT $3
            "#,
        )
        .bind(&filter.subject_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.page_size)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| BillingError::upstream("Failed to list detailization requests", e))?;

        Ok(rows.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(subject: &str, function: &str, plan: &str, hour: u32) -> SampleRow {
        SampleRow {
            subject_id: subject.to_string(),
            function_name: function.to_string(),
            plan: plan.to_string(),
            bucket_utc: Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap(),
            invocations: 1,
            duration_p95_ms: 2,
            cold_starts: 3,
            cpu_core_ms: 4,
            ram_mb_sec: 5,
        }
    }

    #[test]
    fn test_group_samples_splits_on_function_and_subject() {
        let grouped = group_samples(vec![
            row("alice", "a", "default", 0),
            row("alice", "a", "bulk", 1),
            row("alice", "b", "default", 0),
            row("bob", "b", "default", 0),
        ]);

        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[0].samples.len(), 2);
        assert_eq!(grouped[0].plan, "bulk");
        assert_eq!(grouped[2].subject_id, "bob");
    }

    #[test]
    fn test_request_row_without_tariff() {
        let request: TariffChangeRequest = TariffRequestRow {
            request_id: Uuid::new_v4(),
            subject_id: "alice".to_string(),
            description: "cheaper please".to_string(),
            status: "rejected".to_string(),
            admin_response: Some("no".to_string()),
            created_utc: Utc::now(),
            resolved_utc: Some(Utc::now()),
            pt_tariff_id: None,
            pt_name: None,
            pt_invocation_price: None,
            pt_duration_price: None,
            pt_cpu_price: None,
            pt_ram_price: None,
            pt_cold_start_price: None,
            pt_is_default: None,
            pt_created_utc: None,
        }
        .into();

        assert_eq!(request.status, TariffRequestStatus::Rejected);
        assert!(request.proposed_tariff.is_none());
    }
}
