//! Domain models for metering-service.

mod detailization;
mod sample;
mod subject;
mod tariff;
mod tariff_request;
mod usage;

pub use detailization::{DetailizationRequest, DetailizationStatus, ListDetailizationFilter};
pub use sample::{hour_bucket, FunctionUsageRow, ResourceSample, SampleBatch};
pub use subject::{validate_subject_id, MAX_SUBJECT_ID_LEN};
pub use tariff::{
    CreateTariff, TariffPrices, TariffPricing, DEFAULT_TARIFF_ID, DEFAULT_TARIFF_NAME,
};
pub use tariff_request::{
    ListTariffRequestsFilter, NewTariffChangeRequest, Resolution, TariffChangeRequest,
    TariffRequestStatus, TransitionOutcome,
};
pub use usage::{
    AggregateTotals, BillingSummary, DebtState, FunctionUsageSummary, HourPoint,
    PlatformOverview, TopFunction, UsageAverages, UsageDigest, UsageSummary,
};
