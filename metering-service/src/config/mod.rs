//! Configuration module for metering-service.

use chrono::FixedOffset;
use service_core::config::{self as core_config, get_env, get_env_parsed, is_production};
use service_core::error::AppError;
use std::env;

/// History must cover all of yesterday whatever the time of day.
pub const MIN_HISTORY_HOURS: i64 = 48;

#[derive(Debug, Clone)]
pub struct MeteringConfig {
    pub common: core_config::Config,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl std::str::FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            _ => Err(format!("Invalid storage backend: {}", s)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

#[derive(Debug, Clone)]
pub struct ReportingConfig {
    /// Offset of the reporting timezone from UTC, in minutes.
    pub utc_offset_minutes: i32,
    /// Hours of sample history loaded for a usage summary.
    pub history_hours: i64,
}

impl ReportingConfig {
    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "REPORTING_UTC_OFFSET_MINUTES out of range: {}",
                    self.utc_offset_minutes
                ))
            })
    }
}

impl MeteringConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = is_production();

        let backend: StorageBackend = get_env("STORAGE_BACKEND", Some("postgres"), false)?
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let database_url = match backend {
            StorageBackend::Postgres => get_env("DATABASE_URL", None, is_prod)?,
            StorageBackend::Memory => env::var("DATABASE_URL").unwrap_or_default(),
        };

        let config = Self {
            common,
            service_name: env::var("SERVICE_NAME")
                .unwrap_or_else(|_| "metering-service".to_string()),
            service_version: env::var("SERVICE_VERSION")
                .unwrap_or_else(|_| env!("CARGO_PKG_VERSION").to_string()),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            otlp_endpoint: env::var("OTLP_ENDPOINT").ok().filter(|s| !s.is_empty()),
            storage: StorageConfig { backend },
            database: DatabaseConfig {
                url: database_url,
                max_connections: get_env_parsed("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: get_env_parsed("DATABASE_MIN_CONNECTIONS", 2)?,
            },
            reporting: ReportingConfig {
                utc_offset_minutes: get_env_parsed("REPORTING_UTC_OFFSET_MINUTES", 0)?,
                history_hours: get_env_parsed("USAGE_HISTORY_HOURS", MIN_HISTORY_HOURS)?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        self.reporting.offset()?;

        if self.reporting.history_hours < MIN_HISTORY_HOURS {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "USAGE_HISTORY_HOURS must be at least {} (got {})",
                MIN_HISTORY_HOURS,
                self.reporting.history_hours
            )));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "DATABASE_MIN_CONNECTIONS exceeds DATABASE_MAX_CONNECTIONS"
            )));
        }

        Ok(())
    }

    /// Configuration for an in-memory instance, used by tests and local runs.
    pub fn in_memory(port: u16) -> Self {
        Self {
            common: core_config::Config { port },
            service_name: "metering-service".to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            log_level: "info".to_string(),
            otlp_endpoint: None,
            storage: StorageConfig {
                backend: StorageBackend::Memory,
            },
            database: DatabaseConfig {
                url: String::new(),
                max_connections: 1,
                min_connections: 0,
            },
            reporting: ReportingConfig {
                utc_offset_minutes: 0,
                history_hours: MIN_HISTORY_HOURS,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_parsing() {
        assert_eq!("Postgres".parse::<StorageBackend>(), Ok(StorageBackend::Postgres));
        assert_eq!("memory".parse::<StorageBackend>(), Ok(StorageBackend::Memory));
        assert!("mongo".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_short_history_rejected() {
        let mut config = MeteringConfig::in_memory(0);
        config.reporting.history_hours = 24;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_offset_bounds() {
        let mut config = MeteringConfig::in_memory(0);
        config.reporting.utc_offset_minutes = 180;
        assert_eq!(
            config.reporting.offset().unwrap(),
            FixedOffset::east_opt(3 * 3600).unwrap()
        );

        config.reporting.utc_offset_minutes = 24 * 60;
        assert!(config.validate().is_err());

        config.reporting.utc_offset_minutes = i32::MAX;
        assert!(config.validate().is_err());
    }
}
