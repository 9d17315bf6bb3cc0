//! Window selection and per-metric reduction of sample sequences.

use crate::error::BillingError;
use crate::models::{AggregateTotals, ResourceSample};
use rust_decimal::Decimal;
use std::fmt;
use std::str::FromStr;

/// A trailing window over an hourly sample sequence.
///
/// Windows count points, not wall-clock time: `LastHour` is the newest sample
/// and `Last24h` the newest 24, whatever their timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Window {
    LastN(usize),
    LastHour,
    #[default]
    Last24h,
}

impl Window {
    pub fn points(&self) -> usize {
        match self {
            Window::LastN(n) => *n,
            Window::LastHour => 1,
            Window::Last24h => 24,
        }
    }
}

impl fmt::Display for Window {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Window::LastN(n) => write!(f, "last{}", n),
            Window::LastHour => f.write_str("1h"),
            Window::Last24h => f.write_str("24h"),
        }
    }
}

impl FromStr for Window {
    type Err = BillingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1h" => Ok(Window::LastHour),
            "24h" => Ok(Window::Last24h),
            other => other
                .strip_prefix("last")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(Window::LastN)
                .ok_or_else(|| {
                    BillingError::validation(format!(
                        "unknown window '{}' (expected 1h, 24h or last<N>)",
                        s
                    ))
                }),
        }
    }
}

/// The trailing sub-slice a window selects, clamped to what exists.
pub fn select(samples: &[ResourceSample], window: Window) -> &[ResourceSample] {
    let take = window.points().min(samples.len());
    &samples[samples.len() - take..]
}

/// Reduce a window of samples to per-metric totals.
pub fn aggregate(samples: &[ResourceSample], window: Window) -> AggregateTotals {
    totals(select(samples, window))
}

/// Sum every count metric and average the p95 duration.
pub fn totals(samples: &[ResourceSample]) -> AggregateTotals {
    let mut out = AggregateTotals {
        points: samples.len(),
        ..AggregateTotals::default()
    };
    let mut p95_sum = Decimal::ZERO;

    for s in samples {
        out.invocations = out.invocations.saturating_add(s.invocations);
        out.cold_starts = out.cold_starts.saturating_add(s.cold_starts);
        out.cpu_core_ms = out.cpu_core_ms.saturating_add(s.cpu_core_ms);
        out.ram_mb_sec = out.ram_mb_sec.saturating_add(s.ram_mb_sec);
        p95_sum += Decimal::from(s.duration_p95_ms);
    }

    out.duration_p95_ms = mean(p95_sum, samples.len());
    out
}

/// Arithmetic mean, zero for an empty set.
pub fn mean(sum: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        sum / Decimal::from(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::billing::pricing;
    use crate::models::{TariffPrices, TariffPricing};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn series(invocations: &[u64]) -> Vec<ResourceSample> {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        invocations
            .iter()
            .enumerate()
            .map(|(i, inv)| ResourceSample {
                timestamp: start + Duration::hours(i as i64),
                invocations: *inv,
                duration_p95_ms: 100 + i as u64 * 10,
                cold_starts: i as u64,
                cpu_core_ms: 500,
                ram_mb_sec: 1_000,
            })
            .collect()
    }

    #[test]
    fn test_last_n_sums_only_trailing_points() {
        let samples = series(&[10, 20, 5]);
        let totals = aggregate(&samples, Window::LastN(2));
        assert_eq!(totals.points, 2);
        assert_eq!(totals.invocations, 25);

        let tariff = TariffPricing::from_prices(
            Uuid::new_v4(),
            "inv".to_string(),
            TariffPrices {
                invocation_price: Decimal::new(1, 2),
                duration_price: Decimal::ZERO,
                cpu_price: Decimal::ZERO,
                ram_price: Decimal::ZERO,
                cold_start_price: Decimal::ZERO,
            },
            false,
            Utc::now(),
        );
        assert_eq!(
            pricing::cost_of_totals(&totals, &tariff).unwrap(),
            Decimal::new(25, 2)
        );
    }

    #[test]
    fn test_oversized_window_clamps() {
        let samples = series(&[1, 2, 3, 4]);
        assert_eq!(
            aggregate(&samples, Window::LastN(100)),
            aggregate(&samples, Window::LastN(samples.len()))
        );
        assert_eq!(aggregate(&samples, Window::Last24h).points, 4);
    }

    #[test]
    fn test_aggregate_is_repeatable() {
        let samples = series(&[3, 1, 4, 1, 5, 9, 2, 6]);
        assert_eq!(
            aggregate(&samples, Window::LastN(5)),
            aggregate(&samples, Window::LastN(5))
        );
    }

    #[test]
    fn test_last_hour_is_newest_point() {
        let samples = series(&[7, 8, 9]);
        let totals = aggregate(&samples, Window::LastHour);
        assert_eq!(totals.invocations, 9);
        assert_eq!(totals.duration_p95_ms, Decimal::from(120));
    }

    #[test]
    fn test_p95_is_averaged() {
        let samples = series(&[1, 1]);
        // 100 and 110
        assert_eq!(totals(&samples).duration_p95_ms, Decimal::from(105));
    }

    #[test]
    fn test_empty_input_yields_zeroes() {
        let totals = aggregate(&[], Window::Last24h);
        assert_eq!(totals, AggregateTotals::default());
    }

    #[test]
    fn test_window_parsing() {
        assert_eq!("1h".parse::<Window>().unwrap(), Window::LastHour);
        assert_eq!("24h".parse::<Window>().unwrap(), Window::Last24h);
        assert_eq!("last5".parse::<Window>().unwrap(), Window::LastN(5));
        assert!(matches!(
            "last0".parse::<Window>(),
            Err(BillingError::Validation(_))
        ));
        assert!(matches!(
            "week".parse::<Window>(),
            Err(BillingError::Validation(_))
        ));
    }

    #[test]
    fn test_window_display_round_trips() {
        for w in [Window::LastHour, Window::Last24h, Window::LastN(7)] {
            assert_eq!(w.to_string().parse::<Window>().unwrap(), w);
        }
    }
}
