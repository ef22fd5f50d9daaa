//! # State Module
//!
//! Everything a handler needs, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    AppState                                             │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   Database   │  │ Arc<AppConfig>   │  │ Arc<ForecastService>     │  │
//! │  │              │  │                  │  │                          │  │
//! │  │  SQLite pool │  │  tax rate        │  │  RwLock<Arc<SalesModel>> │  │
//! │  │  repositories│  │  exchange rate   │  │  model file path         │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool, cheap to clone                  │
//! │  • AppConfig: read-only after startup                                  │
//! │  • ForecastService: readers clone the Arc, retrain swaps it            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod forecast;

use std::sync::Arc;

pub use self::config::{AppConfig, ConfigError, CONFIG_FILE, ENV_PREFIX};
pub use self::forecast::{ForecastError, ForecastService};

use tienda_core::{ExchangeRate, TaxRate};
use tienda_db::{CheckoutProcessor, Database};

/// Shared application state. Clone it freely; clones share everything.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
    pub forecast: Arc<ForecastService>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig, forecast: ForecastService) -> Self {
        AppState {
            db,
            config: Arc::new(config),
            forecast: Arc::new(forecast),
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.config.tax_rate()
    }

    pub fn exchange_rate(&self) -> ExchangeRate {
        self.config.exchange_rate()
    }

    /// Checkout processor using the configured tax rate.
    pub fn checkout(&self) -> CheckoutProcessor {
        self.db.checkout(self.tax_rate())
    }
}
