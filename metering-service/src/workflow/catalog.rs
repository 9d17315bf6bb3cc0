//! Tariff catalog administration and subject activation.

use crate::error::{BillingError, Result};
use crate::models::{validate_subject_id, CreateTariff, TariffPricing};
use crate::services::metrics::record_error;
use crate::services::store::TariffStore;
use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct TariffCatalog {
    tariffs: Arc<dyn TariffStore>,
}

impl TariffCatalog {
    pub fn new(tariffs: Arc<dyn TariffStore>) -> Self {
        Self { tariffs }
    }

    /// Validate and store a new tariff.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: CreateTariff) -> Result<TariffPricing> {
        let tariff = input.into_tariff(Utc::now())?;
        self.tariffs.insert_tariff(&tariff).await.map_err(|e| {
            record_error(e.kind(), "create_tariff");
            e
        })
    }

    pub async fn list(&self) -> Result<Vec<TariffPricing>> {
        self.tariffs.list_tariffs().await
    }

    /// Make `tariff_id` the subject's active tariff from now on.
    ///
    /// Past usage is not re-billed; reports price history with whatever tariff
    /// is active when they are computed.
    #[instrument(skip(self))]
    pub async fn activate(&self, subject_id: &str, tariff_id: Uuid) -> Result<TariffPricing> {
        validate_subject_id(subject_id)?;

        let tariff = self
            .tariffs
            .get_tariff(tariff_id)
            .await?
            .ok_or_else(|| BillingError::NotFound(format!("tariff {} not found", tariff_id)))?;
        // Stored rows may predate the non-negative rule.
        tariff.prices().validate()?;

        let activated = self
            .tariffs
            .assign_tariff(subject_id, tariff_id, Utc::now())
            .await?;

        info!(subject_id = %subject_id, tariff_id = %tariff_id, name = %activated.name, "Tariff activated");
        Ok(activated)
    }
}
