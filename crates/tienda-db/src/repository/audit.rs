//! # Audit Repository
//!
//! Append-only trail of who did what. Entries can be written on their own
//! or inside another operation's transaction, so the entry commits (or
//! rolls back) together with the change it describes.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use tienda_core::{AuditEntry, ANONYMOUS_USER};

/// Well-known audit actions.
pub mod actions {
    pub const CHECKOUT: &str = "CHECKOUT";
    pub const DIRECT_SALE: &str = "DIRECT_SALE";
    pub const PRODUCT_CREATED: &str = "PRODUCT_CREATED";
    pub const PRODUCT_UPDATED: &str = "PRODUCT_UPDATED";
    pub const PRODUCT_DEACTIVATED: &str = "PRODUCT_DEACTIVATED";
    pub const PRODUCT_RESTORED: &str = "PRODUCT_RESTORED";
    pub const STOCK_ADJUSTED: &str = "STOCK_ADJUSTED";
    pub const CLIENT_CREATED: &str = "CLIENT_CREATED";
    pub const CLIENT_UPDATED: &str = "CLIENT_UPDATED";
    pub const CLIENT_DEACTIVATED: &str = "CLIENT_DEACTIVATED";
    pub const CLIENT_RESTORED: &str = "CLIENT_RESTORED";
    pub const FORECAST_RETRAINED: &str = "FORECAST_RETRAINED";
}

/// Builds an entry stamped now. A blank username is recorded as anonymous.
pub fn new_entry(
    username: &str,
    ip: Option<&str>,
    action: &str,
    description: impl Into<String>,
) -> AuditEntry {
    let username = username.trim();
    AuditEntry {
        id: Uuid::new_v4().to_string(),
        username: if username.is_empty() {
            ANONYMOUS_USER.to_string()
        } else {
            username.to_string()
        },
        ip: ip.map(str::to_string),
        action: action.to_string(),
        description: description.into(),
        created_at: Utc::now(),
    }
}

/// Writes an entry through any executor (pool, connection or transaction).
pub async fn record_in<'c, E>(executor: E, entry: &AuditEntry) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_log (id, username, ip, action, description, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.username)
    .bind(&entry.ip)
    .bind(&entry.action)
    .bind(&entry.description)
    .bind(entry.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Repository for the audit log.
#[derive(Debug, Clone)]
pub struct AuditRepository {
    pool: SqlitePool,
}

impl AuditRepository {
    /// Creates a new AuditRepository.
    pub fn new(pool: SqlitePool) -> Self {
        AuditRepository { pool }
    }

    /// Records an entry outside any transaction.
    pub async fn record(
        &self,
        username: &str,
        ip: Option<&str>,
        action: &str,
        description: impl Into<String>,
    ) -> DbResult<AuditEntry> {
        let entry = new_entry(username, ip, action, description);
        debug!(username = %entry.username, action = %entry.action, "Recording audit entry");

        record_in(&self.pool, &entry).await?;
        Ok(entry)
    }

    /// Newest entries first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, username, ip, action, description, created_at
            FROM audit_log
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }

    /// Newest entries for one username first.
    pub async fn list_for_username(&self, username: &str, limit: u32) -> DbResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, username, ip, action, description, created_at
            FROM audit_log
            WHERE username = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(username)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(entries)
    }
}
