//! HTTP handlers for metering-service.

pub mod admin;
pub mod detailization;
pub mod health;
pub mod samples;
pub mod tariff_requests;
pub mod tariffs;
pub mod usage;

use service_core::error::AppError;
use uuid::Uuid;

/// Parse an id taken from the path. Malformed ids are a validation failure,
/// not a routing miss.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw)
        .map_err(|_| AppError::ValidationError(format!("Invalid id: {}", raw)))
}
