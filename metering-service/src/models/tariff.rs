//! Tariff pricing model.

use crate::error::{BillingError, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Id of the seeded default tariff.
pub const DEFAULT_TARIFF_ID: Uuid = Uuid::from_u128(1);

/// Name of the seeded default tariff.
pub const DEFAULT_TARIFF_NAME: &str = "default";

/// Decimal places a price may carry. Matches the `NUMERIC(24, 12)` columns.
pub const MAX_PRICE_SCALE: u32 = 12;

/// Exclusive upper bound on a unit price.
pub const MAX_PRICE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Named price vector applied to resource metrics.
///
/// Immutable once stored: a subject changes tariff by being reassigned to a
/// different row, never by editing prices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TariffPricing {
    pub tariff_id: Uuid,
    pub name: String,
    pub invocation_price: Decimal,
    pub duration_price: Decimal,
    pub cpu_price: Decimal,
    pub ram_price: Decimal,
    pub cold_start_price: Decimal,
    pub is_default: bool,
    pub created_utc: DateTime<Utc>,
}

/// Per-unit prices of a tariff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TariffPrices {
    pub invocation_price: Decimal,
    pub duration_price: Decimal,
    pub cpu_price: Decimal,
    pub ram_price: Decimal,
    pub cold_start_price: Decimal,
}

impl TariffPrices {
    /// Prices of the platform default tariff.
    pub fn standard() -> Self {
        Self {
            invocation_price: Decimal::new(1, 2),
            duration_price: Decimal::new(1, 5),
            cpu_price: Decimal::new(1, 7),
            ram_price: Decimal::new(1, 6),
            cold_start_price: Decimal::new(1, 1),
        }
    }

    /// Every price must be non-negative, below [`MAX_PRICE`] and carry at
    /// most [`MAX_PRICE_SCALE`] decimal places.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("invocation_price", self.invocation_price),
            ("duration_price", self.duration_price),
            ("cpu_price", self.cpu_price),
            ("ram_price", self.ram_price),
            ("cold_start_price", self.cold_start_price),
        ];

        for (name, value) in fields {
            if value.is_sign_negative() && !value.is_zero() {
                return Err(BillingError::validation(format!(
                    "{} must not be negative (got {})",
                    name, value
                )));
            }
            if value >= MAX_PRICE {
                return Err(BillingError::validation(format!(
                    "{} must be below {} (got {})",
                    name, MAX_PRICE, value
                )));
            }
            if value.normalize().scale() > MAX_PRICE_SCALE {
                return Err(BillingError::validation(format!(
                    "{} allows at most {} decimal places (got {})",
                    name, MAX_PRICE_SCALE, value
                )));
            }
        }

        Ok(())
    }
}

/// Input for creating a tariff.
#[derive(Debug, Clone)]
pub struct CreateTariff {
    pub name: String,
    pub prices: TariffPrices,
}

impl CreateTariff {
    /// Check name and prices, returning the trimmed name.
    pub fn validate(&self) -> Result<String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(BillingError::validation("tariff name must not be empty"));
        }
        self.prices.validate()?;
        Ok(name.to_string())
    }

    /// Validate and build a new, non-default tariff record.
    pub fn into_tariff(self, created_utc: DateTime<Utc>) -> Result<TariffPricing> {
        let name = self.validate()?;
        Ok(TariffPricing::from_prices(
            Uuid::new_v4(),
            name,
            self.prices,
            false,
            created_utc,
        ))
    }
}

impl TariffPricing {
    pub fn from_prices(
        tariff_id: Uuid,
        name: String,
        prices: TariffPrices,
        is_default: bool,
        created_utc: DateTime<Utc>,
    ) -> Self {
        Self {
            tariff_id,
            name,
            invocation_price: prices.invocation_price,
            duration_price: prices.duration_price,
            cpu_price: prices.cpu_price,
            ram_price: prices.ram_price,
            cold_start_price: prices.cold_start_price,
            is_default,
            created_utc,
        }
    }

    /// The seeded default tariff.
    pub fn standard(created_utc: DateTime<Utc>) -> Self {
        Self::from_prices(
            DEFAULT_TARIFF_ID,
            DEFAULT_TARIFF_NAME.to_string(),
            TariffPrices::standard(),
            true,
            created_utc,
        )
    }

    pub fn prices(&self) -> TariffPrices {
        TariffPrices {
            invocation_price: self.invocation_price,
            duration_price: self.duration_price,
            cpu_price: self.cpu_price,
            ram_price: self.ram_price,
            cold_start_price: self.cold_start_price,
        }
    }
}
