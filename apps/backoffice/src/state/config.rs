//! # Application Configuration
//!
//! Loaded once at startup, read-only afterwards.
//!
//! ## Sources (later wins)
//! 1. Defaults (this file)
//! 2. Config file (`tienda.toml`, optional)
//! 3. Environment variables (`TIENDA_*`, e.g. `TIENDA_TAX_RATE_BPS=1600`)
//!
//! ```toml
//! # tienda.toml
//! database_path = "/var/lib/tienda/tienda.db"
//! max_connections = 8
//! exchange_rate_hundredths = 696
//! ```

use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tienda_core::validation::validate_tax_rate_bps;
use tienda_core::{ExchangeRate, TaxRate};
use tienda_db::DbConfig;

/// Config file looked up in the working directory.
pub const CONFIG_FILE: &str = "tienda.toml";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "TIENDA";

const DEFAULT_LOG_FILTER: &str = "info,tienda=debug,sqlx=warn";

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// SQLite database file.
    /// Default: `<data dir>/tienda.db`
    pub database_path: PathBuf,

    /// Pool size.
    pub max_connections: u32,

    /// Seconds a writer waits for SQLite's lock.
    pub busy_timeout_secs: u64,

    /// Sales tax in basis points (1800 = 18%).
    pub tax_rate_bps: u32,

    /// Local currency units per price currency unit, in hundredths.
    /// e.g. 696 = 6.96
    pub exchange_rate_hundredths: u32,

    /// Currency prices are stored in (ISO 4217).
    pub currency_code: String,

    /// Currency cart totals are also shown in.
    pub local_currency_code: String,

    /// Where the trained forecast model is persisted.
    /// Default: `<data dir>/forecast_model.json`
    pub forecast_model_path: PathBuf,

    /// How many days of sales history retraining reads.
    pub forecast_history_days: u32,

    /// `tracing` filter used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for AppConfig {
    /// Defaults without any file or environment applied.
    fn default() -> Self {
        let data_dir = default_data_dir();
        AppConfig {
            database_path: data_dir.join("tienda.db"),
            max_connections: 5,
            busy_timeout_secs: 5,
            tax_rate_bps: TaxRate::IGV.bps(),
            exchange_rate_hundredths: 696,
            currency_code: "USD".to_string(),
            local_currency_code: "BOB".to_string(),
            forecast_model_path: data_dir.join("forecast_model.json"),
            forecast_history_days: 730,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads `tienda.toml` from the working directory plus `TIENDA_*`.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Loads the given config file (if it exists) plus `TIENDA_*`.
    pub fn load_from(file: &Path) -> Result<Self, ConfigError> {
        let settings = Self::defaults()?
            .add_source(File::from(file).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: AppConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let d = AppConfig::default();
        let builder = config::Config::builder()
            .set_default("database_path", d.database_path.to_string_lossy().into_owned())?
            .set_default("max_connections", i64::from(d.max_connections))?
            .set_default("busy_timeout_secs", d.busy_timeout_secs as i64)?
            .set_default("tax_rate_bps", i64::from(d.tax_rate_bps))?
            .set_default("exchange_rate_hundredths", i64::from(d.exchange_rate_hundredths))?
            .set_default("currency_code", d.currency_code)?
            .set_default("local_currency_code", d.local_currency_code)?
            .set_default(
                "forecast_model_path",
                d.forecast_model_path.to_string_lossy().into_owned(),
            )?
            .set_default("forecast_history_days", i64::from(d.forecast_history_days))?
            .set_default("log_filter", d.log_filter)?;
        Ok(builder)
    }

    /// Rejects values the rest of the app can't work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tax_rate_bps(self.tax_rate_bps).map_err(|e| ConfigError::InvalidValue {
            field: "tax_rate_bps".to_string(),
            reason: e.to_string(),
        })?;

        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_connections".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }

        if self.exchange_rate_hundredths == 0 {
            return Err(ConfigError::InvalidValue {
                field: "exchange_rate_hundredths".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        if self.forecast_history_days == 0 {
            return Err(ConfigError::InvalidValue {
                field: "forecast_history_days".to_string(),
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }

    pub fn tax_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.tax_rate_bps)
    }

    pub fn exchange_rate(&self) -> ExchangeRate {
        ExchangeRate::from_hundredths(self.exchange_rate_hundredths)
    }

    /// Database settings derived from this configuration.
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database_path)
            .max_connections(self.max_connections)
            .busy_timeout(Duration::from_secs(self.busy_timeout_secs))
    }
}

/// Platform data directory, or the working directory when there is none.
///
/// - **Linux**: `~/.local/share/tienda-backoffice`
/// - **macOS**: `~/Library/Application Support/com.tienda.backoffice`
/// - **Windows**: `%APPDATA%\tienda\backoffice\data`
fn default_data_dir() -> PathBuf {
    ProjectDirs::from("com", "tienda", "backoffice")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
}
