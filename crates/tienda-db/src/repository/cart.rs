//! # Cart Repository
//!
//! Each user has at most one cart, created lazily. The cart row survives
//! checkout; only its items are removed.
//!
//! ## Line Limits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item(user, product, qty)                                          │
//! │    qty < 1                         → ValidationError                   │
//! │    product missing / inactive      → NotFound / ProductInactive        │
//! │    new line and 100 lines present  → CartTooLarge                      │
//! │    existing + qty > 999            → QuantityTooLarge                  │
//! │    otherwise                       → upsert (quantities add up)        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is not reserved here; checkout re-reads it.

use chrono::Utc;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult, StoreResult};
use tienda_core::validation::validate_quantity;
use tienda_core::{
    Cart, CartLine, CartSummary, CoreError, ExchangeRate, RecordStatus, TaxRate,
    MAX_CART_ITEMS, MAX_ITEM_QUANTITY,
};

/// Repository for cart database operations.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    /// Creates a new CartRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Returns the user's cart, creating it on first use.
    pub async fn get_or_create(&self, user_id: &str) -> DbResult<Cart> {
        let cart = touch_cart(&self.pool, user_id).await?;
        Ok(cart)
    }

    /// Returns the user's cart if one exists.
    pub async fn get_for_user(&self, user_id: &str) -> DbResult<Option<Cart>> {
        let cart = sqlx::query_as::<_, Cart>(
            "SELECT id, user_id, created_at, updated_at FROM carts WHERE user_id = ?1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(cart)
    }

    /// Cart lines joined with live product data, in the order added.
    pub async fn lines(&self, user_id: &str) -> DbResult<Vec<CartLine>> {
        let lines = fetch_lines(&self.pool, user_id).await?;
        Ok(lines)
    }

    /// Priced view of the cart, including the total in local currency.
    pub async fn summary(
        &self,
        user_id: &str,
        tax_rate: TaxRate,
        exchange_rate: ExchangeRate,
    ) -> DbResult<CartSummary> {
        let cart = self.get_or_create(user_id).await?;
        let lines = self.lines(user_id).await?;

        Ok(CartSummary::build(&cart.id, &lines, tax_rate, exchange_rate))
    }

    /// Adds `quantity` units of a product, merging with an existing line.
    ///
    /// ## Returns
    /// The line's quantity after the addition.
    pub async fn add_item(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<i64> {
        validate_quantity(quantity)?;

        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;
        let cart = touch_cart(&mut *tx, user_id).await?;

        let product: Option<(String, RecordStatus)> =
            sqlx::query_as("SELECT name, status FROM products WHERE id = ?1")
                .bind(product_id)
                .fetch_optional(&mut *tx)
                .await?;

        let (product_name, status) =
            product.ok_or_else(|| CoreError::not_found("Product", product_id))?;

        if !status.is_active() {
            return Err(CoreError::ProductInactive {
                product_id: product_id.to_string(),
                product_name,
            }
            .into());
        }

        let existing: Option<i64> = sqlx::query_scalar(
            "SELECT quantity FROM cart_items WHERE cart_id = ?1 AND product_id = ?2",
        )
        .bind(&cart.id)
        .bind(product_id)
        .fetch_optional(&mut *tx)
        .await?;

        if existing.is_none() {
            let line_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?1")
                    .bind(&cart.id)
                    .fetch_one(&mut *tx)
                    .await?;

            if line_count as usize >= MAX_CART_ITEMS {
                return Err(CoreError::CartTooLarge {
                    max: MAX_CART_ITEMS,
                }
                .into());
            }
        }

        let new_quantity = existing.unwrap_or(0) + quantity;
        if new_quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: new_quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }

        sqlx::query(
            r#"
            INSERT INTO cart_items (id, cart_id, product_id, quantity, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = excluded.quantity
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&cart.id)
        .bind(product_id)
        .bind(new_quantity)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        debug!(user_id = %user_id, product_id = %product_id, quantity = new_quantity, "Cart line set");
        Ok(new_quantity)
    }

    /// Sets a line's quantity. Zero removes the line.
    pub async fn set_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> StoreResult<()> {
        if quantity == 0 {
            self.remove_item(user_id, product_id).await?;
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }
        validate_quantity(quantity)?;

        let result = sqlx::query(
            r#"
            UPDATE cart_items SET quantity = ?3
            WHERE product_id = ?2
              AND cart_id = (SELECT id FROM carts WHERE user_id = ?1)
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .bind(quantity)
        .execute(&self.pool)
        .await
        .map_err(DbError::from)?;

        if result.rows_affected() == 0 {
            return Err(CoreError::not_found("Cart item", product_id).into());
        }

        Ok(())
    }

    /// Removes a product from the cart. Returns whether a line was removed.
    pub async fn remove_item(&self, user_id: &str, product_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            DELETE FROM cart_items
            WHERE product_id = ?2
              AND cart_id = (SELECT id FROM carts WHERE user_id = ?1)
            "#,
        )
        .bind(user_id)
        .bind(product_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Empties the cart. Returns the number of lines removed.
    pub async fn clear(&self, user_id: &str) -> DbResult<u64> {
        let removed = clear_items(&self.pool, user_id).await?;
        info!(user_id = %user_id, removed, "Cart cleared");
        Ok(removed)
    }
}

// =============================================================================
// Executor-generic helpers (shared with the checkout transaction)
// =============================================================================

/// Creates the cart if missing and bumps `updated_at`.
///
/// Being a write, running this first in a transaction takes SQLite's write
/// lock before anything is read.
pub(crate) async fn touch_cart<'c, E>(executor: E, user_id: &str) -> Result<Cart, sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    let now = Utc::now();

    sqlx::query_as::<_, Cart>(
        r#"
        INSERT INTO carts (id, user_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?3)
        ON CONFLICT (user_id) DO UPDATE SET updated_at = excluded.updated_at
        RETURNING id, user_id, created_at, updated_at
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub(crate) async fn fetch_lines<'c, E>(executor: E, user_id: &str) -> Result<Vec<CartLine>, sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query_as::<_, CartLine>(
        r#"
        SELECT
            p.id          AS product_id,
            p.sku         AS sku,
            p.name        AS name,
            p.price_cents AS unit_price_cents,
            ci.quantity   AS quantity,
            p.stock       AS available_stock,
            p.status      AS product_status
        FROM carts c
        INNER JOIN cart_items ci ON ci.cart_id = c.id
        INNER JOIN products p ON p.id = ci.product_id
        WHERE c.user_id = ?1
        ORDER BY ci.added_at, ci.rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
}

pub(crate) async fn clear_items<'c, E>(executor: E, user_id: &str) -> Result<u64, sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    let result = sqlx::query(
        "DELETE FROM cart_items WHERE cart_id = (SELECT id FROM carts WHERE user_id = ?1)",
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
