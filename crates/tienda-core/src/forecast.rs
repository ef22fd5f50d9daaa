//! # Sales Forecasting
//!
//! A small, explicit model of daily sales totals.
//!
//! ## Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  prediction(date) = trend(date) × weekday_factor × month_factor        │
//! │                                                                         │
//! │  trend          least-squares line over the day index                  │
//! │  weekday_factor mean of actual / trend per weekday (mean = 1.0)        │
//! │  month_factor   mean of actual / (trend × weekday) per calendar month  │
//! │                                                                         │
//! │  Predictions are clamped at zero.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Training Data
//! With fewer than [`MIN_HISTORY_DAYS`] days of real sales, the model is
//! fitted to a deterministic synthetic year instead:
//! base 2,000.00 per day, +50% linear growth over the year,
//! Nov/Dec ×1.3, Jan/Feb ×0.8, weekends ×1.2, ±10% ripple.
//!
//! Everything here is pure: callers pass in "today" and the training time.

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::validation::validate_horizon;

/// Minimum number of distinct days of real sales needed to train on them.
pub const MIN_HISTORY_DAYS: usize = 30;

/// Length of the synthetic fallback series.
pub const SYNTHETIC_HISTORY_DAYS: u32 = 365;

pub const MAX_DAILY_HORIZON: u32 = 365;
pub const MAX_MONTHLY_HORIZON: u32 = 24;

const SYNTHETIC_BASE_CENTS: f64 = 200_000.0;

// =============================================================================
// Inputs & Outputs
// =============================================================================

/// Total sales for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailySales {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TrainingSource {
    Historical,
    Synthetic,
}

/// In-sample fit quality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TrainingMetrics {
    pub samples: usize,
    /// Root mean squared error, in cents.
    pub rmse_cents: f64,
    pub r2: f64,
    pub source: TrainingSource,
    #[ts(as = "String")]
    pub trained_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyForecast {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub weekday: String,
    pub predicted_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyForecast {
    pub year: i32,
    pub month: u32,
    /// `YYYY-MM`.
    pub label: String,
    pub predicted_cents: i64,
}

// =============================================================================
// Model
// =============================================================================

/// A fitted sales model. Immutable once trained; retraining builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesModel {
    origin: NaiveDate,
    intercept: f64,
    slope: f64,
    /// Indexed by days from Monday.
    weekday_factors: [f64; 7],
    /// Indexed by month0.
    month_factors: [f64; 12],
    metrics: TrainingMetrics,
}

impl SalesModel {
    /// Fits a model, falling back to synthetic data when history is short.
    ///
    /// `history` may be unsorted and may repeat dates; totals for the same
    /// day are summed.
    pub fn fit(
        history: &[DailySales],
        today: NaiveDate,
        trained_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        let daily = collapse_by_day(history);

        if daily.len() >= MIN_HISTORY_DAYS {
            Self::train(&daily, TrainingSource::Historical, trained_at)
        } else {
            let synthetic = synthetic_history(today, SYNTHETIC_HISTORY_DAYS);
            Self::train(&synthetic, TrainingSource::Synthetic, trained_at)
        }
    }

    /// Fits a model to exactly the given series (sorted by date).
    pub fn train(
        data: &[DailySales],
        source: TrainingSource,
        trained_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if data.len() < 2 {
            return Err(CoreError::ForecastUnavailable {
                reason: format!("need at least 2 days of sales, got {}", data.len()),
            });
        }

        let origin = data[0].date;
        let xs: Vec<f64> = data.iter().map(|d| day_index(origin, d.date)).collect();
        let ys: Vec<f64> = data.iter().map(|d| d.total_cents as f64).collect();

        // Linear trend
        let n = xs.len() as f64;
        let mean_x = xs.iter().sum::<f64>() / n;
        let mean_y = ys.iter().sum::<f64>() / n;
        let sxx: f64 = xs.iter().map(|x| (x - mean_x).powi(2)).sum();
        let sxy: f64 = xs
            .iter()
            .zip(&ys)
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum();
        let slope = if sxx > 0.0 { sxy / sxx } else { 0.0 };
        let intercept = mean_y - slope * mean_x;
        let trend = |x: f64| intercept + slope * x;

        // Weekday factors
        let mut sums = [0.0_f64; 7];
        let mut counts = [0_u32; 7];
        for (d, (x, y)) in data.iter().zip(xs.iter().zip(&ys)) {
            let t = trend(*x);
            if t > 0.0 {
                let wd = d.date.weekday().num_days_from_monday() as usize;
                sums[wd] += y / t;
                counts[wd] += 1;
            }
        }
        let mut weekday_factors = mean_factors(&sums, &counts);
        let weekday_mean = weekday_factors.iter().sum::<f64>() / 7.0;
        if weekday_mean > 0.0 {
            for f in weekday_factors.iter_mut() {
                *f /= weekday_mean;
            }
        }

        // Month factors on what the trend and weekday leave unexplained
        let mut sums = [0.0_f64; 12];
        let mut counts = [0_u32; 12];
        for (d, (x, y)) in data.iter().zip(xs.iter().zip(&ys)) {
            let wd = d.date.weekday().num_days_from_monday() as usize;
            let base = trend(*x) * weekday_factors[wd];
            if base > 0.0 {
                let m = d.date.month0() as usize;
                sums[m] += y / base;
                counts[m] += 1;
            }
        }
        let month_factors = mean_factors(&sums, &counts);

        let mut model = SalesModel {
            origin,
            intercept,
            slope,
            weekday_factors,
            month_factors,
            metrics: TrainingMetrics {
                samples: data.len(),
                rmse_cents: 0.0,
                r2: 0.0,
                source,
                trained_at,
            },
        };

        let ss_res: f64 = data
            .iter()
            .zip(&ys)
            .map(|(d, y)| (y - model.predict_value(d.date)).powi(2))
            .sum();
        let ss_tot: f64 = ys.iter().map(|y| (y - mean_y).powi(2)).sum();

        model.metrics.rmse_cents = (ss_res / n).sqrt();
        model.metrics.r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(model)
    }

    pub fn metrics(&self) -> &TrainingMetrics {
        &self.metrics
    }

    /// Raw (unrounded) prediction for one day.
    fn predict_value(&self, date: NaiveDate) -> f64 {
        let x = day_index(self.origin, date);
        let wd = date.weekday().num_days_from_monday() as usize;
        let m = date.month0() as usize;
        let value = (self.intercept + self.slope * x) * self.weekday_factors[wd] * self.month_factors[m];
        value.max(0.0)
    }

    /// Predicted total for one day, in cents.
    pub fn predict_day(&self, date: NaiveDate) -> i64 {
        self.predict_value(date).round() as i64
    }

    /// Predictions for `days` consecutive days starting at `start`.
    pub fn predict_daily(&self, start: NaiveDate, days: u32) -> CoreResult<Vec<DailyForecast>> {
        validate_horizon("days", days, MAX_DAILY_HORIZON)?;

        Ok((0..days as i64)
            .map(|offset| {
                let date = start + Duration::days(offset);
                DailyForecast {
                    date,
                    weekday: weekday_name(date.weekday()).to_string(),
                    predicted_cents: self.predict_day(date),
                }
            })
            .collect())
    }

    /// Monthly totals for `months` calendar months, starting with the month
    /// that contains `start`. Every day of each month is counted.
    pub fn predict_monthly(
        &self,
        start: NaiveDate,
        months: u32,
    ) -> CoreResult<Vec<MonthlyForecast>> {
        validate_horizon("months", months, MAX_MONTHLY_HORIZON)?;

        let first_index = start.year() * 12 + start.month0() as i32;
        let mut forecasts = Vec::with_capacity(months as usize);

        for i in 0..months as i32 {
            let first = month_start(first_index + i)?;
            let next = month_start(first_index + i + 1)?;

            let mut total = 0.0;
            let mut day = first;
            while day < next {
                total += self.predict_value(day);
                day = day + Duration::days(1);
            }

            forecasts.push(MonthlyForecast {
                year: first.year(),
                month: first.month(),
                label: first.format("%Y-%m").to_string(),
                predicted_cents: total.round() as i64,
            });
        }

        Ok(forecasts)
    }
}

// =============================================================================
// Synthetic Data
// =============================================================================

/// Deterministic synthetic daily sales ending at `end` (inclusive).
///
/// The same `end` and `days` always produce the same series.
pub fn synthetic_history(end: NaiveDate, days: u32) -> Vec<DailySales> {
    let mut state: u64 = 42;
    let mut series = Vec::with_capacity(days as usize);

    for i in 0..days {
        let date = end - Duration::days((days - 1 - i) as i64);

        let mut value = SYNTHETIC_BASE_CENTS * (1.0 + i as f64 / days as f64 * 0.5);
        match date.month() {
            11 | 12 => value *= 1.3,
            1 | 2 => value *= 0.8,
            _ => {}
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            value *= 1.2;
        }

        // 64-bit LCG; top 53 bits give a uniform value in [0, 1)
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let unit = (state >> 11) as f64 / (1u64 << 53) as f64;
        value *= 0.9 + 0.2 * unit;

        series.push(DailySales {
            date,
            total_cents: value.round() as i64,
        });
    }

    series
}

// =============================================================================
// Helpers
// =============================================================================

fn day_index(origin: NaiveDate, date: NaiveDate) -> f64 {
    date.signed_duration_since(origin).num_days() as f64
}

fn mean_factors<const N: usize>(sums: &[f64; N], counts: &[u32; N]) -> [f64; N] {
    let mut factors = [1.0_f64; N];
    for i in 0..N {
        if counts[i] > 0 {
            factors[i] = sums[i] / counts[i] as f64;
        }
    }
    factors
}

/// Sorts by date and sums totals that share a day.
fn collapse_by_day(history: &[DailySales]) -> Vec<DailySales> {
    let mut sorted = history.to_vec();
    sorted.sort_by_key(|d| d.date);

    let mut daily: Vec<DailySales> = Vec::with_capacity(sorted.len());
    for entry in sorted {
        match daily.last_mut() {
            Some(last) if last.date == entry.date => last.total_cents += entry.total_cents,
            _ => daily.push(entry),
        }
    }
    daily
}

fn month_start(month_index: i32) -> CoreResult<NaiveDate> {
    let year = month_index.div_euclid(12);
    let month = month_index.rem_euclid(12) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(|| CoreError::ForecastUnavailable {
        reason: format!("month {}-{:02} is out of range", year, month),
    })
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn linear_history(start: NaiveDate, days: i64) -> Vec<DailySales> {
        (0..days)
            .map(|i| DailySales {
                date: start + Duration::days(i),
                total_cents: 1000 + 10 * i,
            })
            .collect()
    }

    #[test]
    fn test_synthetic_history_is_deterministic() {
        let end = date(2025, 6, 30);
        let a = synthetic_history(end, 120);
        let b = synthetic_history(end, 120);
        assert_eq!(a, b);
        assert_eq!(a.len(), 120);
        assert_eq!(a.last().unwrap().date, end);
        assert!(a.iter().all(|d| d.total_cents > 0));
    }

    #[test]
    fn test_synthetic_weekends_sell_more() {
        let series = synthetic_history(date(2025, 6, 30), 365);
        let (mut weekend, mut weekend_n, mut weekday, mut weekday_n) = (0i64, 0i64, 0i64, 0i64);
        for d in &series {
            if matches!(d.date.weekday(), Weekday::Sat | Weekday::Sun) {
                weekend += d.total_cents;
                weekend_n += 1;
            } else {
                weekday += d.total_cents;
                weekday_n += 1;
            }
        }
        assert!(weekend / weekend_n > weekday / weekday_n);
    }

    #[test]
    fn test_fit_uses_synthetic_when_history_short() {
        let history = linear_history(date(2025, 1, 1), 10);
        let model = SalesModel::fit(&history, date(2025, 1, 10), Utc::now()).unwrap();
        assert_eq!(model.metrics().source, TrainingSource::Synthetic);
        assert_eq!(model.metrics().samples, SYNTHETIC_HISTORY_DAYS as usize);
    }

    #[test]
    fn test_fit_uses_history_when_long_enough() {
        let history = linear_history(date(2025, 1, 1), 60);
        let model = SalesModel::fit(&history, date(2025, 3, 1), Utc::now()).unwrap();
        assert_eq!(model.metrics().source, TrainingSource::Historical);
        assert_eq!(model.metrics().samples, 60);
    }

    #[test]
    fn test_fit_collapses_repeated_days() {
        let mut history = linear_history(date(2025, 1, 1), 40);
        history.push(DailySales {
            date: date(2025, 1, 1),
            total_cents: 500,
        });
        let model = SalesModel::fit(&history, date(2025, 2, 10), Utc::now()).unwrap();
        assert_eq!(model.metrics().samples, 40);
    }

    #[test]
    fn test_linear_history_is_recovered() {
        let start = date(2025, 3, 1);
        let history = linear_history(start, 60);
        let model = SalesModel::train(&history, TrainingSource::Historical, Utc::now()).unwrap();

        assert!(model.metrics().r2 > 0.999);
        assert!(model.metrics().rmse_cents < 1.0);

        let next = model.predict_day(start + Duration::days(60));
        assert!((next - 1600).abs() <= 1, "predicted {}", next);
    }

    #[test]
    fn test_synthetic_fit_quality() {
        let series = synthetic_history(date(2025, 12, 31), 365);
        let model = SalesModel::train(&series, TrainingSource::Synthetic, Utc::now()).unwrap();
        assert!(model.metrics().r2 > 0.7, "r2 = {}", model.metrics().r2);
    }

    #[test]
    fn test_train_needs_two_days() {
        let one = linear_history(date(2025, 1, 1), 1);
        let err = SalesModel::train(&one, TrainingSource::Historical, Utc::now()).unwrap_err();
        assert!(matches!(err, CoreError::ForecastUnavailable { .. }));
    }

    #[test]
    fn test_predictions_never_negative() {
        let history: Vec<DailySales> = (0..40)
            .map(|i| DailySales {
                date: date(2025, 1, 1) + Duration::days(i),
                total_cents: 4000 - 100 * i,
            })
            .collect();
        let model = SalesModel::train(&history, TrainingSource::Historical, Utc::now()).unwrap();
        let forecast = model.predict_daily(date(2025, 3, 1), 30).unwrap();
        assert!(forecast.iter().all(|f| f.predicted_cents >= 0));
        assert_eq!(forecast.last().unwrap().predicted_cents, 0);
    }

    #[test]
    fn test_predict_daily_dates() {
        let model = SalesModel::fit(&[], date(2025, 6, 1), Utc::now()).unwrap();
        let forecast = model.predict_daily(date(2025, 6, 1), 7).unwrap();
        assert_eq!(forecast.len(), 7);
        assert_eq!(forecast[0].date, date(2025, 6, 1));
        assert_eq!(forecast[0].weekday, "Sunday");
        assert_eq!(forecast[6].date, date(2025, 6, 7));
    }

    #[test]
    fn test_horizon_limits() {
        let model = SalesModel::fit(&[], date(2025, 6, 1), Utc::now()).unwrap();
        assert!(model.predict_daily(date(2025, 6, 1), 0).is_err());
        assert!(model.predict_daily(date(2025, 6, 1), MAX_DAILY_HORIZON + 1).is_err());
        assert!(model.predict_monthly(date(2025, 6, 1), MAX_MONTHLY_HORIZON + 1).is_err());
    }

    #[test]
    fn test_monthly_rolls_over_year() {
        let model = SalesModel::fit(&[], date(2025, 11, 15), Utc::now()).unwrap();
        let forecast = model.predict_monthly(date(2025, 11, 15), 3).unwrap();
        let labels: Vec<&str> = forecast.iter().map(|f| f.label.as_str()).collect();
        assert_eq!(labels, vec!["2025-11", "2025-12", "2026-01"]);
    }

    #[test]
    fn test_monthly_total_covers_every_day() {
        let model = SalesModel::fit(&[], date(2025, 2, 1), Utc::now()).unwrap();
        let monthly = model.predict_monthly(date(2025, 2, 20), 1).unwrap();
        let expected: f64 = (0..28)
            .map(|i| model.predict_value(date(2025, 2, 1) + Duration::days(i)))
            .sum();
        assert_eq!(monthly[0].predicted_cents, expected.round() as i64);
    }

    #[test]
    fn test_model_persists_as_json() {
        let model = SalesModel::fit(&[], date(2025, 6, 1), Utc::now()).unwrap();
        let json = serde_json::to_string(&model).unwrap();
        let restored: SalesModel = serde_json::from_str(&json).unwrap();
        assert_eq!(
            restored.predict_day(date(2025, 7, 1)),
            model.predict_day(date(2025, 7, 1))
        );
    }
}
