use crate::models::{CreateTariff, TariffPrices, TariffPricing};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TariffInput {
    #[validate(length(min = 1, max = 128, message = "Tariff name must be 1-128 characters"))]
    pub name: String,
    pub invocation_price: Decimal,
    pub duration_price: Decimal,
    pub cpu_price: Decimal,
    pub ram_price: Decimal,
    pub cold_start_price: Decimal,
}

impl From<TariffInput> for CreateTariff {
    fn from(input: TariffInput) -> Self {
        CreateTariff {
            name: input.name,
            prices: TariffPrices {
                invocation_price: input.invocation_price,
                duration_price: input.duration_price,
                cpu_price: input.cpu_price,
                ram_price: input.ram_price,
                cold_start_price: input.cold_start_price,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ActivateTariffRequest {
    pub tariff_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TariffResponse {
    pub tariff_id: Uuid,
    pub name: String,
    pub invocation_price: Decimal,
    pub duration_price: Decimal,
    pub cpu_price: Decimal,
    pub ram_price: Decimal,
    pub cold_start_price: Decimal,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<TariffPricing> for TariffResponse {
    fn from(t: TariffPricing) -> Self {
        Self {
            tariff_id: t.tariff_id,
            name: t.name,
            invocation_price: t.invocation_price.normalize(),
            duration_price: t.duration_price.normalize(),
            cpu_price: t.cpu_price.normalize(),
            ram_price: t.ram_price.normalize(),
            cold_start_price: t.cold_start_price.normalize(),
            is_default: t.is_default,
            created_at: t.created_utc,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TariffListResponse {
    pub tariffs: Vec<TariffResponse>,
}
