//! # Product Repository
//!
//! Database operations for the catalog and its stock movements.
//!
//! ## Stock Changes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    How stock changes are recorded                       │
//! │                                                                         │
//! │  adjust_stock(product, Exit, 3, "merma")                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                 │
//! │    UPDATE products SET updated_at  ← takes the write lock first        │
//! │    SELECT stock                     ← 10                               │
//! │    MovementKind::Exit.apply(10, 3)  ← 7 (or InvalidStockMovement)      │
//! │    UPDATE products SET stock = 7                                       │
//! │    INSERT inventory_movements (before 10, after 7)                     │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Checkout decrements go through their own guarded UPDATE.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use crate::repository::map_duplicate;
use tienda_core::{
    CoreError, InventoryMovement, MovementKind, Product, ProductPatch, RecordStatus,
};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
///
/// let product = repo.get_by_sku("ARZ-5KG").await?;
/// let low = repo.critical_inventory().await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Inserts a validated product.
    ///
    /// ## Errors
    /// * `DbError::UniqueViolation` - SKU already in use
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description,
                price_cents, stock, min_stock, status,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(product.min_stock)
        .bind(product.status)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "sku", &product.sku))?;

        Ok(())
    }

    /// Gets a product by its ID, whatever its status.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, description, price_cents, stock, min_stock,
                   status, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Gets a product by its SKU, whatever its status.
    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, description, price_cents, stock, min_stock,
                   status, created_at, updated_at
            FROM products
            WHERE sku = ?1
            "#,
        )
        .bind(sku.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(product)
    }

    /// Lists products with the given status, sorted by name.
    pub async fn list(&self, status: RecordStatus) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, description, price_cents, stock, min_stock,
                   status, created_at, updated_at
            FROM products
            WHERE status = ?1
            ORDER BY name
            "#,
        )
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        debug!(status = status.as_str(), count = products.len(), "Listed products");
        Ok(products)
    }

    /// Active products at or below their minimum stock, emptiest first.
    pub async fn critical_inventory(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, sku, name, description, price_cents, stock, min_stock,
                   status, created_at, updated_at
            FROM products
            WHERE status = 'active' AND stock <= min_stock
            ORDER BY stock, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Applies a partial update and returns the merged product.
    ///
    /// The merged record is validated before anything is written.
    pub async fn apply_patch(&self, id: &str, patch: &ProductPatch) -> StoreResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?;

        if patch.is_empty() {
            return Ok(product);
        }

        patch.apply(&mut product, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                min_stock = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.min_stock)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_duplicate(e, "sku", &product.sku))?;

        info!(id = %product.id, sku = %product.sku, "Product updated");
        Ok(product)
    }

    /// Marks a product inactive. It stays in sale history but can't be sold.
    pub async fn deactivate(&self, id: &str) -> StoreResult<Product> {
        self.set_status(id, RecordStatus::Inactive).await
    }

    /// Makes an inactive product sellable again.
    pub async fn restore(&self, id: &str) -> StoreResult<Product> {
        self.set_status(id, RecordStatus::Active).await
    }

    async fn set_status(&self, id: &str, status: RecordStatus) -> StoreResult<Product> {
        let mut product = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?;

        let now = Utc::now();
        match status {
            RecordStatus::Active => product.restore(now),
            RecordStatus::Inactive => product.deactivate(now),
        }

        sqlx::query("UPDATE products SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&product.id)
            .bind(product.status)
            .bind(product.updated_at)
            .execute(&self.pool)
            .await
            .map_err(DbError::from)?;

        info!(id = %product.id, status = status.as_str(), "Product status changed");
        Ok(product)
    }

    /// Changes stock and records the movement in one transaction.
    ///
    /// ## Arguments
    /// * `kind` - Entry adds, Exit subtracts, Adjustment sets an absolute value
    /// * `quantity` - Units moved (or the new level for Adjustment)
    /// * `reason` - Free text shown in the movement history
    /// * `user_id` - Who made the change, if known
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        kind: MovementKind,
        quantity: i64,
        reason: Option<&str>,
        user_id: Option<&str>,
    ) -> StoreResult<InventoryMovement> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        // Write first so concurrent adjustments queue behind each other
        let touched = sqlx::query("UPDATE products SET updated_at = ?2 WHERE id = ?1")
            .bind(product_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        if touched.rows_affected() == 0 {
            return Err(CoreError::not_found("Product", product_id).into());
        }

        let stock_before: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(product_id)
            .fetch_one(&mut *tx)
            .await?;

        let stock_after = kind.apply(stock_before, quantity)?;

        sqlx::query("UPDATE products SET stock = ?2 WHERE id = ?1")
            .bind(product_id)
            .bind(stock_after)
            .execute(&mut *tx)
            .await?;

        let movement = InventoryMovement {
            id: Uuid::new_v4().to_string(),
            product_id: product_id.to_string(),
            kind,
            quantity,
            stock_before,
            stock_after,
            reason: reason.map(|r| r.trim().to_string()).filter(|r| !r.is_empty()),
            user_id: user_id.map(str::to_string),
            created_at: now,
        };

        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id, product_id, kind, quantity,
                stock_before, stock_after, reason, user_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&movement.id)
        .bind(&movement.product_id)
        .bind(movement.kind)
        .bind(movement.quantity)
        .bind(movement.stock_before)
        .bind(movement.stock_after)
        .bind(&movement.reason)
        .bind(&movement.user_id)
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            product_id = %product_id,
            stock_before,
            stock_after,
            "Stock adjusted"
        );
        Ok(movement)
    }

    /// Movement history for a product, newest first.
    pub async fn movements_for(
        &self,
        product_id: &str,
        limit: u32,
    ) -> DbResult<Vec<InventoryMovement>> {
        let movements = sqlx::query_as::<_, InventoryMovement>(
            r#"
            SELECT id, product_id, kind, quantity, stock_before, stock_after,
                   reason, user_id, created_at
            FROM inventory_movements
            WHERE product_id = ?1
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?2
            "#,
        )
        .bind(product_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movements)
    }

    /// Counts products with the given status.
    pub async fn count(&self, status: RecordStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
