//! # Notification Repository
//!
//! Messages addressed to a user, with a read flag.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use tienda_core::validation::validate_notification;
use tienda_core::{CoreError, Notification};

/// Repository for notification database operations.
#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: SqlitePool,
}

impl NotificationRepository {
    /// Creates a new NotificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        NotificationRepository { pool }
    }

    /// Sends a notification to a user.
    pub async fn create(&self, user_id: &str, title: &str, message: &str) -> StoreResult<Notification> {
        let title = title.trim();
        let message = message.trim();
        validate_notification(title, message)?;

        let notification = Notification {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            message: message.to_string(),
            read: false,
            sent_at: Utc::now(),
        };

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (id, user_id, title, message, read, sent_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&notification.id)
        .bind(&notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.read)
        .bind(notification.sent_at)
        .execute(&self.pool)
        .await;

        match result.map_err(DbError::from) {
            Ok(_) => {}
            Err(DbError::ForeignKeyViolation { .. }) => {
                return Err(CoreError::not_found("User", user_id).into());
            }
            Err(e) => return Err(e.into()),
        }

        debug!(id = %notification.id, user_id = %user_id, "Notification created");
        Ok(notification)
    }

    /// A user's notifications, newest first.
    pub async fn list_for_user(
        &self,
        user_id: &str,
        unread_only: bool,
        limit: u32,
    ) -> DbResult<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, title, message, read, sent_at
            FROM notifications
            WHERE user_id = ?1 AND (?2 = 0 OR read = 0)
            ORDER BY sent_at DESC, rowid DESC
            LIMIT ?3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    /// Marks a notification as read. Marking twice is harmless.
    pub async fn mark_read(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("UPDATE notifications SET read = 1 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Notification", id));
        }

        Ok(())
    }

    /// Number of unread notifications for a user.
    pub async fn unread_count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}
