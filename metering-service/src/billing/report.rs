//! Assembly of the usage dashboard and the platform overview.
//!
//! Everything is computed unrounded and rounded once when copied into the
//! returned models.

use super::aggregator::{self, Window};
use super::debt::{self, ReportingDay};
use super::pricing::{self, round_currency};
use crate::error::Result;
use crate::models::{
    AggregateTotals, BillingSummary, FunctionUsageRow, FunctionUsageSummary, HourPoint,
    PlatformOverview, ResourceSample, TariffPricing, TopFunction, UsageAverages, UsageDigest,
    UsageSummary,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Hour buckets in the combined series.
pub const HOURLY_POINTS: usize = 24;

/// Samples returned per function.
pub const SERIES_POINTS: usize = 24;

/// Rows in the overview's top-functions table.
pub const TOP_FUNCTIONS: usize = 10;

/// Inputs for one subject's usage summary.
pub struct UsageInputs<'a> {
    pub subject_id: &'a str,
    pub rows: &'a [FunctionUsageRow],
    pub tariff: &'a TariffPricing,
    pub outstanding: Decimal,
    pub window: Window,
    pub day: ReportingDay,
}

pub fn usage_summary(input: UsageInputs<'_>) -> Result<UsageSummary> {
    let tariff = input.tariff;
    let hourly = hourly_points(input.rows, |_| tariff)?;

    let mut window_samples: Vec<ResourceSample> = Vec::new();
    let mut window_cost = Decimal::ZERO;
    let mut by_function = Vec::with_capacity(input.rows.len());

    for row in input.rows {
        let selected = aggregator::select(&row.samples, input.window);
        let totals = aggregator::totals(selected);

        window_cost = pricing::add(window_cost, pricing::cost_of_totals(&totals, tariff)?)?;
        window_samples.extend_from_slice(selected);

        by_function.push(FunctionUsageSummary {
            name: row.function_name.clone(),
            plan: row.plan.clone(),
            estimated_cost: round_currency(pricing::estimate_function_cost(&totals, tariff)?),
            totals: display_totals(totals),
            series: aggregator::select(&row.samples, Window::LastN(SERIES_POINTS)).to_vec(),
        });
    }

    let debt = debt::debt(input.rows, tariff, input.outstanding, &input.day)?;

    Ok(UsageSummary {
        subject_id: input.subject_id.to_string(),
        tariff_name: tariff.name.clone(),
        generated_utc: input.day.now,
        window: BillingSummary {
            window: input.window.to_string(),
            totals: display_totals(aggregator::totals(&window_samples)),
            cost: round_currency(window_cost),
        },
        summary: UsageDigest {
            averages: averages(&hourly),
            yesterday_cost: debt.yesterday_cost,
            today_cost: debt.today_cost,
            total_debt: debt.total_debt,
        },
        hourly: hourly.into_iter().map(display_point).collect(),
        by_function,
    })
}

/// Cost view across every subject.
///
/// `rows` should already be limited to the reporting period; each function is
/// priced with its owner's assigned tariff, or `default_tariff`.
pub fn platform_overview(
    rows: &[FunctionUsageRow],
    assignments: &HashMap<String, TariffPricing>,
    default_tariff: &TariffPricing,
    now: DateTime<Utc>,
) -> Result<PlatformOverview> {
    let tariff_for = |subject: &str| assignments.get(subject).unwrap_or(default_tariff);

    let mut total = Decimal::ZERO;
    let mut functions: Vec<(TopFunction, Decimal)> = Vec::with_capacity(rows.len());

    for row in rows {
        let cost = pricing::cost(&row.samples, tariff_for(&row.subject_id))?;
        let invocations = aggregator::totals(&row.samples).invocations;
        total = pricing::add(total, cost)?;
        functions.push((
            TopFunction {
                subject_id: row.subject_id.clone(),
                name: row.function_name.clone(),
                invocations,
                cost: round_currency(cost),
            },
            cost,
        ));
    }

    functions.sort_by(|(a, a_cost), (b, b_cost)| {
        b_cost
            .cmp(a_cost)
            .then_with(|| a.subject_id.cmp(&b.subject_id))
            .then_with(|| a.name.cmp(&b.name))
    });

    let subjects: BTreeSet<&str> = rows.iter().map(|r| r.subject_id.as_str()).collect();

    Ok(PlatformOverview {
        generated_utc: now,
        total_cost: round_currency(total),
        subjects: subjects.len(),
        top_functions: functions
            .into_iter()
            .take(TOP_FUNCTIONS)
            .map(|(f, _)| f)
            .collect(),
        hourly: hourly_points(rows, tariff_for)?
            .into_iter()
            .map(display_point)
            .collect(),
    })
}

/// Combine functions into hour buckets, newest `HOURLY_POINTS` kept.
///
/// A bucket's cost is each function's cost for that hour, summed. Values are
/// left unrounded.
fn hourly_points<'t>(
    rows: &[FunctionUsageRow],
    tariff_for: impl Fn(&str) -> &'t TariffPricing,
) -> Result<Vec<HourPoint>> {
    let mut buckets: BTreeMap<DateTime<Utc>, (Vec<ResourceSample>, Decimal)> = BTreeMap::new();

    for row in rows {
        let tariff = tariff_for(&row.subject_id);
        for sample in &row.samples {
            let entry = buckets
                .entry(sample.timestamp)
                .or_insert_with(|| (Vec::new(), Decimal::ZERO));
            entry.0.push(*sample);
            entry.1 = pricing::add(entry.1, pricing::cost(std::slice::from_ref(sample), tariff)?)?;
        }
    }

    let skip = buckets.len().saturating_sub(HOURLY_POINTS);
    Ok(buckets
        .into_iter()
        .skip(skip)
        .map(|(timestamp, (samples, cost))| {
            let totals = aggregator::totals(&samples);
            HourPoint {
                timestamp,
                invocations: totals.invocations,
                duration_p95_ms: totals.duration_p95_ms,
                cold_starts: totals.cold_starts,
                cpu_core_ms: totals.cpu_core_ms,
                ram_mb_sec: totals.ram_mb_sec,
                cost,
            }
        })
        .collect())
}

fn averages(hourly: &[HourPoint]) -> UsageAverages {
    let n = hourly.len();
    let sum = |f: fn(&HourPoint) -> Decimal| hourly.iter().map(f).sum::<Decimal>();

    UsageAverages {
        invocations: round_currency(aggregator::mean(sum(|p| Decimal::from(p.invocations)), n)),
        duration_p95_ms: round_currency(aggregator::mean(sum(|p| p.duration_p95_ms), n)),
        cold_starts: round_currency(aggregator::mean(sum(|p| Decimal::from(p.cold_starts)), n)),
        cpu_core_ms: round_currency(aggregator::mean(sum(|p| Decimal::from(p.cpu_core_ms)), n)),
        ram_mb_sec: round_currency(aggregator::mean(sum(|p| Decimal::from(p.ram_mb_sec)), n)),
    }
}

fn display_totals(mut totals: AggregateTotals) -> AggregateTotals {
    totals.duration_p95_ms = round_currency(totals.duration_p95_ms);
    totals
}

fn display_point(mut point: HourPoint) -> HourPoint {
    point.duration_p95_ms = round_currency(point.duration_p95_ms);
    point.cost = round_currency(point.cost);
    point
}
