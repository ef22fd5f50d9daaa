//! # Tienda Backoffice Maintenance CLI
//!
//! Runs a single backoffice operation against the configured database and
//! prints the result as JSON.
//!
//! ## Usage
//! ```bash
//! # Today's and this month's sales
//! cargo run -p tienda-backoffice -- stats
//!
//! # Products at or below minimum stock
//! cargo run -p tienda-backoffice -- critical
//!
//! # Next 14 days of predicted sales, using another config file
//! cargo run -p tienda-backoffice -- --config ./prod.toml forecast --days 14
//!
//! # Last 50 audit entries by one user
//! cargo run -p tienda-backoffice -- audit --user ana -n 50
//!
//! # Retrain the forecast model on recent sales
//! cargo run -p tienda-backoffice -- retrain
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tienda_backoffice::commands::{self, Actor};
use tienda_backoffice::{bootstrap, init_tracing, AppConfig};

/// Username recorded in the audit log for CLI changes.
const CLI_USER: &str = "cli";

#[derive(Debug, Parser)]
#[command(name = "tienda-backoffice", about = "Tienda backoffice maintenance CLI")]
struct Cli {
    /// Config file (default: ./tienda.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand, PartialEq, Eq)]
enum Command {
    /// Today's and this month's sales.
    Stats,
    /// Products at or below minimum stock.
    Critical,
    /// Most recent sales.
    Sales {
        /// Rows to list (default: 20).
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Most recent audit log entries.
    Audit {
        /// Only entries by this username.
        #[arg(short, long)]
        user: Option<String>,
        /// Rows to list (default: 20).
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u32).range(1..))]
        limit: Option<u32>,
    },
    /// Daily sales forecast.
    Forecast {
        /// Days to forecast.
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Monthly sales forecast.
    ForecastMonthly {
        /// Months to forecast.
        #[arg(long, default_value_t = 6)]
        months: u32,
    },
    /// Retrain the forecast model on recent sales.
    Retrain,
    /// Show tax and currency settings.
    Config,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => AppConfig::load_from(&path)?,
        None => AppConfig::load()?,
    };
    init_tracing(&config.log_filter);

    let state = bootstrap(config).await?;
    let actor = Actor::new(CLI_USER);

    match cli.command {
        Command::Stats => print_json(&commands::sale::get_sales_stats(&state).await?)?,
        Command::Critical => print_json(&commands::product::list_critical_inventory(&state).await?)?,
        Command::Sales { limit } => print_json(&commands::sale::list_recent_sales(&state, limit).await?)?,
        Command::Audit { user, limit } => print_json(
            &commands::audit::list_audit_log(&state, user.as_deref(), limit).await?,
        )?,
        Command::Forecast { days } => print_json(
            &commands::forecast::daily_forecast(
                &state,
                commands::forecast::DailyForecastQuery { start: None, days },
            )
            .await?,
        )?,
        Command::ForecastMonthly { months } => print_json(
            &commands::forecast::monthly_forecast(
                &state,
                commands::forecast::MonthlyForecastQuery { start: None, months },
            )
            .await?,
        )?,
        Command::Retrain => print_json(&commands::forecast::retrain_forecast(&state, &actor).await?)?,
        Command::Config => print_json(&commands::config::get_config(&state))?,
    }

    state.db.close().await;
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    fn parse(args: &[&str]) -> Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("tienda-backoffice").chain(args.iter().copied()))
    }

    #[test]
    fn test_parses_subcommands_and_options() {
        let cli = parse(&["--config", "./prod.toml", "forecast", "--days", "14"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("./prod.toml")));
        assert_eq!(cli.command, Command::Forecast { days: 14 });

        let cli = parse(&["forecast-monthly"]).unwrap();
        assert_eq!(cli.command, Command::ForecastMonthly { months: 6 });

        let cli = parse(&["audit", "-n", "5", "--user", "ana"]).unwrap();
        assert_eq!(
            cli.command,
            Command::Audit {
                user: Some("ana".to_string()),
                limit: Some(5)
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = parse(&["forecast", "--days", "abc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = parse(&["sales", "--limit", "0"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);

        let err = parse(&["forecast-monthly", "--months"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }

    #[test]
    fn test_rejects_unknown_input() {
        let err = parse(&["stats", "--verbose"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let err = parse(&["restock"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);

        let err = parse(&[]).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand | ErrorKind::MissingSubcommand
        ));
    }
}
