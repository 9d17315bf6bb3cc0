pub mod detailization;
pub mod tariff_requests;
pub mod tariffs;
pub mod usage;

pub use detailization::{
    CreateDetailizationRequest, DetailizationListParams, DetailizationListResponse,
    DetailizationResponse,
};
pub use tariff_requests::{
    ApproveTariffChangeRequest, CreateTariffChangeRequest, RejectTariffChangeRequest,
    TariffChangeListParams, TariffChangeListResponse, TariffChangeResponse,
};
pub use tariffs::{ActivateTariffRequest, TariffInput, TariffListResponse, TariffResponse};
pub use usage::{IngestSamplesRequest, IngestSamplesResponse, UsageParams};
