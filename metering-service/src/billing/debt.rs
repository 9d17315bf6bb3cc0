//! Debt ledger: yesterday/today cost split in the reporting timezone.

use super::pricing;
use crate::error::Result;
use crate::models::{DebtState, FunctionUsageRow, ResourceSample, TariffPricing};
use chrono::{DateTime, Days, FixedOffset, NaiveTime, Utc};
use rust_decimal::Decimal;

/// Midnight boundaries of the reporting day containing `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportingDay {
    pub yesterday_start: DateTime<Utc>,
    pub today_start: DateTime<Utc>,
    pub now: DateTime<Utc>,
}

impl ReportingDay {
    pub fn at(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local_date = now.with_timezone(&offset).date_naive();
        let today_start = local_midnight_utc(local_date, offset);
        let yesterday_start = local_date
            .checked_sub_days(Days::new(1))
            .map(|d| local_midnight_utc(d, offset))
            .unwrap_or(today_start - chrono::Duration::days(1));

        Self {
            yesterday_start,
            today_start,
            now,
        }
    }

    fn is_yesterday(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.yesterday_start && ts < self.today_start
    }

    fn is_today(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.today_start && ts <= self.now
    }
}

fn local_midnight_utc(date: chrono::NaiveDate, offset: FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    // A fixed offset has no gaps, so the shift is always defined.
    DateTime::<Utc>::from_naive_utc_and_offset(local, Utc)
        - chrono::Duration::seconds(i64::from(offset.local_minus_utc()))
}

/// Derive the debt state of a subject.
///
/// Each function is priced on its own partition and the per-function costs
/// are summed. `outstanding` comes from the external balance ledger and is
/// clamped at zero. Returned amounts are rounded to cents.
pub fn debt(
    rows: &[FunctionUsageRow],
    tariff: &TariffPricing,
    outstanding: Decimal,
    day: &ReportingDay,
) -> Result<DebtState> {
    let mut yesterday = Decimal::ZERO;
    let mut today = Decimal::ZERO;

    for row in rows {
        let y: Vec<ResourceSample> = row
            .samples
            .iter()
            .copied()
            .filter(|s| day.is_yesterday(s.timestamp))
            .collect();
        let t: Vec<ResourceSample> = row
            .samples
            .iter()
            .copied()
            .filter(|s| day.is_today(s.timestamp))
            .collect();

        yesterday = pricing::add(yesterday, pricing::cost(&y, tariff)?)?;
        today = pricing::add(today, pricing::cost(&t, tariff)?)?;
    }

    Ok(DebtState {
        yesterday_cost: pricing::round_currency(yesterday),
        today_cost: pricing::round_currency(today),
        total_debt: pricing::round_currency(outstanding.max(Decimal::ZERO)),
    })
}
