//! # Tienda Backoffice Library
//!
//! Application layer of the store backoffice: loads configuration, sets up
//! logging, opens the database, loads the forecast model, and exposes
//! transport-agnostic handlers over the resulting [`AppState`].
//!
//! ## Module Organization
//! ```text
//! tienda_backoffice/
//! ├── lib.rs            ◄─── You are here (tracing & bootstrap)
//! ├── state/
//! │   ├── mod.rs        ◄─── AppState
//! │   ├── config.rs     ◄─── AppConfig (defaults, tienda.toml, TIENDA_*)
//! │   └── forecast.rs   ◄─── ForecastService (shared model, retrain)
//! ├── commands/         ◄─── Handlers: cart, sale, product, client, ...
//! └── error.rs          ◄─── ApiError returned by every handler
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Application Startup                               │
//! │                                                                         │
//! │  1. AppConfig::load() ─── defaults → tienda.toml → TIENDA_* env         │
//! │                                                                         │
//! │  2. init_tracing(&config.log_filter) ─── RUST_LOG wins when set         │
//! │                                                                         │
//! │  3. bootstrap(config)                                                   │
//! │     • create the data directory                                         │
//! │     • connect to SQLite (WAL), run migrations                           │
//! │     • load the forecast model, or train and save one                    │
//! │                                                                         │
//! │  4. Hand AppState to the transport, which calls commands::*             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod state;

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub use error::{ApiError, ErrorCode};
pub use state::{AppConfig, AppState, ConfigError, ForecastError, ForecastService};

use tienda_db::{Database, DbError};

/// Errors that stop the application from starting.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database unavailable: {0}")]
    Database(#[from] DbError),

    #[error("Forecast model unavailable: {0}")]
    Forecast(#[from] ForecastError),

    #[error("Cannot create data directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=tienda=trace` - Show trace for tienda crates only
/// - Default: `filter` (from `AppConfig::log_filter`)
pub fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builds the application state from a loaded configuration.
pub async fn bootstrap(config: AppConfig) -> Result<AppState, BootstrapError> {
    info!(
        database = %config.database_path.display(),
        tax_rate_bps = config.tax_rate_bps,
        "Starting Tienda backoffice"
    );

    if let Some(dir) = config.database_path.parent() {
        tokio::fs::create_dir_all(dir).await?;
    }

    let db = Database::new(config.db_config()).await?;
    info!("Database connected and migrations applied");

    let forecast = ForecastService::load_or_train(
        &db,
        Some(config.forecast_model_path.clone()),
        config.forecast_history_days,
        Utc::now().date_naive(),
    )
    .await?;

    info!("State initialized");
    Ok(AppState::new(db, config, forecast))
}
