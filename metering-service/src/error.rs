//! Engine error taxonomy.

use service_core::error::AppError;
use thiserror::Error;

/// Errors produced by the billing engine and the workflow components.
///
/// Storage failures are reported as `UpstreamUnavailable`; the engine never
/// retries them itself.
#[derive(Debug, Error)]
pub enum BillingError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    UpstreamUnavailable(String),
}

impl BillingError {
    pub fn validation(msg: impl Into<String>) -> Self {
        BillingError::Validation(msg.into())
    }

    pub fn upstream(context: &str, err: impl std::fmt::Display) -> Self {
        BillingError::UpstreamUnavailable(format!("{}: {}", context, err))
    }

    /// Label used for error metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BillingError::Validation(_) => "validation",
            BillingError::Conflict(_) => "conflict",
            BillingError::NotFound(_) => "not_found",
            BillingError::UpstreamUnavailable(_) => "upstream_unavailable",
        }
    }
}

impl From<sqlx::Error> for BillingError {
    fn from(err: sqlx::Error) -> Self {
        BillingError::UpstreamUnavailable(format!("storage: {}", err))
    }
}

impl From<BillingError> for AppError {
    fn from(err: BillingError) -> Self {
        match err {
            BillingError::Validation(msg) => AppError::ValidationError(msg),
            BillingError::Conflict(msg) => AppError::Conflict(anyhow::anyhow!(msg)),
            BillingError::NotFound(msg) => AppError::NotFound(anyhow::anyhow!(msg)),
            BillingError::UpstreamUnavailable(msg) => {
                AppError::UpstreamUnavailable(anyhow::anyhow!(msg))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
