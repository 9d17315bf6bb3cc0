//! Billing computation: pricing, window aggregation, debt and report assembly.
//!
//! Pure functions only. Storage access lives in `services`.

pub mod aggregator;
pub mod debt;
pub mod pricing;
pub mod report;

pub use aggregator::Window;
pub use debt::ReportingDay;
