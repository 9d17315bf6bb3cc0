//! Usage aggregation and report models.

use super::sample::ResourceSample;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

/// Per-metric totals over a window of samples.
///
/// Counts are sums; `duration_p95_ms` is the arithmetic mean of the window's
/// p95 values (0 for an empty window).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct AggregateTotals {
    pub points: usize,
    pub invocations: u64,
    pub duration_p95_ms: Decimal,
    pub cold_starts: u64,
    pub cpu_core_ms: u64,
    pub ram_mb_sec: u64,
}

/// Totals and ledger cost of a window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillingSummary {
    pub window: String,
    pub totals: AggregateTotals,
    pub cost: Decimal,
}

/// Yesterday/today cost split and the outstanding debt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct DebtState {
    pub yesterday_cost: Decimal,
    pub today_cost: Decimal,
    pub total_debt: Decimal,
}

/// One hour bucket summed across every function of a subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourPoint {
    pub timestamp: DateTime<Utc>,
    pub invocations: u64,
    pub duration_p95_ms: Decimal,
    pub cold_starts: u64,
    pub cpu_core_ms: u64,
    pub ram_mb_sec: u64,
    pub cost: Decimal,
}

/// A function's totals for the requested window plus its recent series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionUsageSummary {
    pub name: String,
    pub plan: String,
    pub totals: AggregateTotals,
    pub estimated_cost: Decimal,
    pub series: Vec<ResourceSample>,
}

/// Hourly averages over the last day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct UsageAverages {
    pub invocations: Decimal,
    pub duration_p95_ms: Decimal,
    pub cold_starts: Decimal,
    pub cpu_core_ms: Decimal,
    pub ram_mb_sec: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageDigest {
    pub averages: UsageAverages,
    pub yesterday_cost: Decimal,
    pub today_cost: Decimal,
    pub total_debt: Decimal,
}

/// Everything the usage dashboard shows for one subject.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub subject_id: String,
    pub tariff_name: String,
    pub generated_utc: DateTime<Utc>,
    pub window: BillingSummary,
    pub hourly: Vec<HourPoint>,
    pub by_function: Vec<FunctionUsageSummary>,
    pub summary: UsageDigest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopFunction {
    pub subject_id: String,
    pub name: String,
    pub invocations: u64,
    pub cost: Decimal,
}

/// Platform-wide cost view for operators.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformOverview {
    pub generated_utc: DateTime<Utc>,
    pub total_cost: Decimal,
    pub subjects: usize,
    pub top_functions: Vec<TopFunction>,
    pub hourly: Vec<HourPoint>,
}
