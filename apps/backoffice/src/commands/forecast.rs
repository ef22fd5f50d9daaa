//! # Forecast Commands
//!
//! Predictions read the active model without blocking retraining; a
//! retrain swaps in the new model once it is fitted and saved.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{record_audit, Actor};
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::forecast::{DailyForecast, MonthlyForecast, TrainingMetrics};
use tienda_db::audit_actions as actions;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastQuery {
    /// First day to predict. Default: today (UTC).
    pub start: Option<NaiveDate>,
    pub days: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecastQuery {
    /// Any day in the first month to predict. Default: today (UTC).
    pub start: Option<NaiveDate>,
    pub months: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyForecastResponse {
    pub metrics: TrainingMetrics,
    pub forecasts: Vec<DailyForecast>,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyForecastResponse {
    pub metrics: TrainingMetrics,
    pub forecasts: Vec<MonthlyForecast>,
    pub total_cents: i64,
}

pub async fn daily_forecast(
    state: &AppState,
    query: DailyForecastQuery,
) -> Result<DailyForecastResponse, ApiError> {
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());
    debug!(start = %start, days = query.days, "daily_forecast command");

    let model = state.forecast.current().await;
    let forecasts = model.predict_daily(start, query.days)?;

    Ok(DailyForecastResponse {
        metrics: model.metrics().clone(),
        total_cents: forecasts.iter().map(|f| f.predicted_cents).sum(),
        forecasts,
    })
}

pub async fn monthly_forecast(
    state: &AppState,
    query: MonthlyForecastQuery,
) -> Result<MonthlyForecastResponse, ApiError> {
    let start = query.start.unwrap_or_else(|| Utc::now().date_naive());
    debug!(start = %start, months = query.months, "monthly_forecast command");

    let model = state.forecast.current().await;
    let forecasts = model.predict_monthly(start, query.months)?;

    Ok(MonthlyForecastResponse {
        metrics: model.metrics().clone(),
        total_cents: forecasts.iter().map(|f| f.predicted_cents).sum(),
        forecasts,
    })
}

/// Fit quality of the active model.
pub async fn forecast_metrics(state: &AppState) -> Result<TrainingMetrics, ApiError> {
    Ok(state.forecast.current().await.metrics().clone())
}

/// Retrains on recent sales and activates the new model.
pub async fn retrain_forecast(state: &AppState, actor: &Actor) -> Result<TrainingMetrics, ApiError> {
    let metrics = state
        .forecast
        .retrain(&state.db, Utc::now().date_naive())
        .await?;

    record_audit(
        state,
        actor,
        actions::FORECAST_RETRAINED,
        format!(
            "Forecast retrained on {} days ({:?}), r2 {:.3}",
            metrics.samples, metrics.source, metrics.r2
        ),
    )
    .await;

    Ok(metrics)
}
