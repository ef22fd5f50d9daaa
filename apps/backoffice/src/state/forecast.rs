//! # Forecast Service
//!
//! Owns the active [`SalesModel`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Forecast Model Lifecycle                             │
//! │                                                                         │
//! │  startup ──► model file present and readable? ──yes──► use it          │
//! │                         │                                               │
//! │                         no                                              │
//! │                         ▼                                               │
//! │              train from sales history (synthetic if < 30 days)          │
//! │                                                                         │
//! │  readers:  model.read() ──► clone Arc ──► predict without the lock      │
//! │  retrain:  fit new model ──► save file ──► model.write() = Arc::new     │
//! │            (one retrain at a time, so file and active model agree)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Duration, NaiveDate, Utc};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use tienda_core::forecast::{SalesModel, TrainingMetrics};
use tienda_core::CoreError;
use tienda_db::{Database, DbError};

/// Failures while training, loading or saving a model.
#[derive(Debug, thiserror::Error)]
pub enum ForecastError {
    #[error(transparent)]
    Model(#[from] CoreError),

    #[error(transparent)]
    Storage(#[from] DbError),

    #[error("Model file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Model encoding error: {0}")]
    Format(#[from] serde_json::Error),
}

/// The shared forecast model plus where it is persisted.
#[derive(Debug)]
pub struct ForecastService {
    model: RwLock<Arc<SalesModel>>,
    /// Held for a whole retrain: fit, save, swap.
    retrain_lock: Mutex<()>,
    /// `None` keeps the model in memory only.
    model_path: Option<PathBuf>,
    history_days: u32,
}

impl ForecastService {
    pub fn new(model: SalesModel, model_path: Option<PathBuf>, history_days: u32) -> Self {
        ForecastService {
            model: RwLock::new(Arc::new(model)),
            retrain_lock: Mutex::new(()),
            model_path,
            history_days,
        }
    }

    /// Loads the persisted model, training (and saving) a fresh one when
    /// the file is missing or unreadable.
    pub async fn load_or_train(
        db: &Database,
        model_path: Option<PathBuf>,
        history_days: u32,
        today: NaiveDate,
    ) -> Result<Self, ForecastError> {
        if let Some(path) = model_path.as_deref() {
            match read_model(path).await {
                Ok(Some(model)) => {
                    info!(path = %path.display(), "Loaded forecast model");
                    return Ok(ForecastService::new(model, model_path, history_days));
                }
                Ok(None) => debug!(path = %path.display(), "No forecast model file"),
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring unreadable forecast model"),
            }
        }

        let model = train(db, today, history_days).await?;
        if let Some(path) = model_path.as_deref() {
            write_model(path, &model).await?;
        }

        Ok(ForecastService::new(model, model_path, history_days))
    }

    /// The active model. Cheap: clones an `Arc`.
    pub async fn current(&self) -> Arc<SalesModel> {
        self.model.read().await.clone()
    }

    /// Trains a new model from recent sales and makes it the active one.
    ///
    /// The new model is saved before the swap; if saving fails the
    /// previous model stays active.
    pub async fn retrain(&self, db: &Database, today: NaiveDate) -> Result<TrainingMetrics, ForecastError> {
        let _guard = self.retrain_lock.lock().await;

        let model = train(db, today, self.history_days).await?;
        if let Some(path) = self.model_path.as_deref() {
            write_model(path, &model).await?;
        }

        let metrics = model.metrics().clone();
        *self.model.write().await = Arc::new(model);

        info!(
            samples = metrics.samples,
            rmse_cents = metrics.rmse_cents,
            r2 = metrics.r2,
            source = ?metrics.source,
            "Forecast model retrained"
        );
        Ok(metrics)
    }
}

async fn train(db: &Database, today: NaiveDate, history_days: u32) -> Result<SalesModel, ForecastError> {
    let since = today - Duration::days(i64::from(history_days));
    let history = db.sales().daily_totals(since).await?;
    debug!(days = history.len(), since = %since, "Training forecast model");

    Ok(SalesModel::fit(&history, today, Utc::now())?)
}

async fn read_model(path: &Path) -> Result<Option<SalesModel>, ForecastError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_model(path: &Path, model: &SalesModel) -> Result<(), ForecastError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec_pretty(model)?;
    tokio::fs::write(path, json).await?;
    debug!(path = %path.display(), "Forecast model saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tienda_core::forecast::TrainingSource;
    use tienda_db::DbConfig;

    fn temp_model_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("tienda-forecast-{}", uuid::Uuid::new_v4()))
            .join("model.json")
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    #[tokio::test]
    async fn test_trains_synthetic_without_history() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = ForecastService::load_or_train(&db, None, 365, today())
            .await
            .unwrap();

        let model = service.current().await;
        assert_eq!(model.metrics().source, TrainingSource::Synthetic);
        assert!(model.predict_day(today()) > 0);
    }

    #[tokio::test]
    async fn test_persisted_model_is_reloaded() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let path = temp_model_path();

        let first = ForecastService::load_or_train(&db, Some(path.clone()), 365, today())
            .await
            .unwrap();
        assert!(path.exists());

        let second = ForecastService::load_or_train(&db, Some(path.clone()), 365, today())
            .await
            .unwrap();
        let (first, second) = (first.current().await, second.current().await);
        assert_eq!(first.metrics().trained_at, second.metrics().trained_at);
        assert_eq!(first.metrics().samples, second.metrics().samples);

        if let Some(dir) = path.parent() {
            std::fs::remove_dir_all(dir).ok();
        }
    }

    #[tokio::test]
    async fn test_unreadable_file_is_replaced() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let path = temp_model_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"not a model").unwrap();

        let service = ForecastService::load_or_train(&db, Some(path.clone()), 365, today())
            .await
            .unwrap();
        let saved: SalesModel = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            saved.metrics().trained_at,
            service.current().await.metrics().trained_at
        );

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }

    #[tokio::test]
    async fn test_retrain_swaps_model_for_readers() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let service = ForecastService::load_or_train(&db, None, 365, today())
            .await
            .unwrap();

        let before = service.current().await;
        let metrics = service.retrain(&db, today()).await.unwrap();
        let after = service.current().await;

        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.metrics(), &metrics);
        // Readers holding the old model keep a usable copy
        assert_eq!(before.metrics().source, TrainingSource::Synthetic);
    }

    #[tokio::test]
    async fn test_concurrent_retrains_leave_file_and_model_in_step() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let path = temp_model_path();
        let service = Arc::new(
            ForecastService::load_or_train(&db, Some(path.clone()), 365, today())
                .await
                .unwrap(),
        );

        let tasks: Vec<_> = (0..4)
            .map(|_| {
                let service = Arc::clone(&service);
                let db = db.clone();
                tokio::spawn(async move { service.retrain(&db, today()).await })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let saved: SalesModel = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            saved.metrics().trained_at,
            service.current().await.metrics().trained_at
        );

        std::fs::remove_dir_all(path.parent().unwrap()).ok();
    }
}
