//! Pricing model: resource samples and a tariff in, currency out.
//!
//! Nothing here rounds. Callers round once with [`round_currency`] when the
//! value leaves the engine.

use super::aggregator;
use crate::error::{BillingError, Result};
use crate::models::{AggregateTotals, ResourceSample, TariffPricing};
use rust_decimal::{Decimal, RoundingStrategy};

/// Ledger cost of a window of samples.
pub fn cost(samples: &[ResourceSample], tariff: &TariffPricing) -> Result<Decimal> {
    cost_of_totals(&aggregator::totals(samples), tariff)
}

/// Ledger cost of already aggregated totals.
///
/// The p95 duration is averaged over the window, never summed.
pub fn cost_of_totals(totals: &AggregateTotals, tariff: &TariffPricing) -> Result<Decimal> {
    sum(&[
        term(Decimal::from(totals.invocations), tariff.invocation_price)?,
        term(totals.duration_p95_ms, tariff.duration_price)?,
        term(Decimal::from(totals.ram_mb_sec), tariff.ram_price)?,
        term(Decimal::from(totals.cold_starts), tariff.cold_start_price)?,
        term(Decimal::from(totals.cpu_core_ms), tariff.cpu_price)?,
    ])
}

/// Cost estimate shown in the per-function table.
///
/// Scales the averaged p95 by the invocation count (at least 1) as a proxy for
/// total execution time, and leaves CPU out. This is an approximation and is
/// intentionally not the ledger figure.
pub fn estimate_function_cost(totals: &AggregateTotals, tariff: &TariffPricing) -> Result<Decimal> {
    let invocations = Decimal::from(totals.invocations);
    let scale = invocations.max(Decimal::ONE);

    sum(&[
        term(invocations, tariff.invocation_price)?,
        term(term(totals.duration_p95_ms, tariff.duration_price)?, scale)?,
        term(Decimal::from(totals.ram_mb_sec), tariff.ram_price)?,
        term(Decimal::from(totals.cold_starts), tariff.cold_start_price)?,
    ])
}

/// Add two amounts, failing instead of overflowing.
pub fn add(a: Decimal, b: Decimal) -> Result<Decimal> {
    a.checked_add(b).ok_or_else(out_of_range)
}

/// Sum amounts, failing instead of overflowing.
pub fn sum(amounts: &[Decimal]) -> Result<Decimal> {
    amounts.iter().try_fold(Decimal::ZERO, |acc, a| add(acc, *a))
}

fn term(quantity: Decimal, price: Decimal) -> Result<Decimal> {
    quantity.checked_mul(price).ok_or_else(out_of_range)
}

fn out_of_range() -> BillingError {
    BillingError::validation("usage cost exceeds the representable range")
}

/// Round a currency amount to cents, half away from zero.
pub fn round_currency(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}
