//! Administrative workflows: tariff catalog, tariff change requests and
//! detailization requests.

pub mod catalog;
pub mod detailization;
pub mod tariff_change;

pub use catalog::TariffCatalog;
pub use detailization::DetailizationTracker;
pub use tariff_change::TariffChangeWorkflow;
