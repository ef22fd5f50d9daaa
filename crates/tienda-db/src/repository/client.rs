//! # Client Repository
//!
//! Database operations for clients. Phone and document id are unique.

use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult, StoreResult};
use crate::repository::map_duplicate;
use tienda_core::{Client, ClientPatch, CoreError, RecordStatus};

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a validated client.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, full_name, phone, address, document_id, status, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.full_name)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.document_id)
        .bind(client.status)
        .bind(client.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_client(e, client))?;

        Ok(())
    }

    /// Gets a client by ID, whatever its status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, full_name, phone, address, document_id, status, created_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    /// Lists clients with the given status, sorted by name.
    pub async fn list(&self, status: RecordStatus) -> DbResult<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, full_name, phone, address, document_id, status, created_at
            FROM clients
            WHERE status = ?1
            ORDER BY full_name
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(clients)
    }

    /// Applies a partial update and returns the merged client.
    pub async fn apply_patch(&self, id: &str, patch: &ClientPatch) -> StoreResult<Client> {
        let mut client = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", id))?;

        if patch.is_empty() {
            return Ok(client);
        }

        patch.apply(&mut client)?;

        sqlx::query(
            r#"
            UPDATE clients SET full_name = ?2, phone = ?3, address = ?4, document_id = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.full_name)
        .bind(&client.phone)
        .bind(&client.address)
        .bind(&client.document_id)
        .execute(&self.pool)
        .await
        .map_err(|e| duplicate_client(e, &client))?;

        info!(id = %client.id, "Client updated");
        Ok(client)
    }

    /// Marks a client inactive; they can no longer be sold to.
    pub async fn deactivate(&self, id: &str) -> StoreResult<Client> {
        self.set_status(id, RecordStatus::Inactive).await
    }

    /// Reactivates a client.
    pub async fn restore(&self, id: &str) -> StoreResult<Client> {
        self.set_status(id, RecordStatus::Active).await
    }

    async fn set_status(&self, id: &str, status: RecordStatus) -> StoreResult<Client> {
        let mut client = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Client", id))?;

        match status {
            RecordStatus::Active => client.restore(),
            RecordStatus::Inactive => client.deactivate(),
        }

        sqlx::query("UPDATE clients SET status = ?2 WHERE id = ?1")
            .bind(&client.id)
            .bind(client.status)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        info!(id = %client.id, status = status.as_str(), "Client status changed");
        Ok(client)
    }
}

fn duplicate_client(err: sqlx::Error, client: &Client) -> DbError {
    match map_duplicate(err, "phone", &client.phone) {
        DbError::UniqueViolation { field, .. } if field.ends_with("document_id") => {
            DbError::duplicate("document_id", &client.document_id)
        }
        other => other,
    }
}
