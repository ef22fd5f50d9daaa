//! # Sale Repository
//!
//! Read side of sales plus the inserts used by the checkout transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  CheckoutProcessor (one transaction)                                   │
//! │     ├── insert_sale()       → Sale { status: Completed }               │
//! │     └── insert_item() × N   → SaleItem (price/name snapshot)           │
//! │                                                                         │
//! │  Afterwards sales are immutable:                                       │
//! │     get_by_id / get_items / list_recent / stats / daily_totals         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use tienda_core::forecast::DailySales;
use tienda_core::{Sale, SaleItem, SalesStats};

/// A sale together with its line items.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDetail {
    pub sale: Sale,
    pub items: Vec<SaleItem>,
}

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, salesperson_id,
                   subtotal_cents, tax_cents, total_cents,
                   payment_method, payment_reference, status, created_at
            FROM sales
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets all items for a sale, in the order they were written.
    pub async fn get_items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT id, sale_id, product_id, name_snapshot,
                   unit_price_cents, quantity, subtotal_cents, created_at
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(sale_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a sale with its items.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        let Some(sale) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&sale.id).await?;

        Ok(Some(SaleDetail { sale, items }))
    }

    /// The most recent `limit` sales, newest first.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Sale>> {
        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, client_id, salesperson_id,
                   subtotal_cents, tax_cents, total_cents,
                   payment_method, payment_reference, status, created_at
            FROM sales
            ORDER BY created_at DESC, rowid DESC
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sales)
    }

    /// Totals and counts for `today` and the month containing it.
    pub async fn stats(&self, today: NaiveDate) -> DbResult<SalesStats> {
        let (today_total_cents, today_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE date(created_at) = ?1
            "#,
        )
        .bind(today)
        .fetch_one(&self.pool)
        .await?;

        let month = format!("{:04}-{:02}", today.year(), today.month());
        let (month_total_cents, month_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT COALESCE(SUM(total_cents), 0), COUNT(*)
            FROM sales
            WHERE strftime('%Y-%m', created_at) = ?1
            "#,
        )
        .bind(&month)
        .fetch_one(&self.pool)
        .await?;

        debug!(%today, today_count, month_count, "Computed sales stats");

        Ok(SalesStats {
            today_total_cents,
            today_count,
            month_total_cents,
            month_count,
        })
    }

    /// Sum of sale totals per day from `since` on. Days without sales are absent.
    pub async fn daily_totals(&self, since: NaiveDate) -> DbResult<Vec<DailySales>> {
        let totals = sqlx::query_as::<_, DailySales>(
            r#"
            SELECT date(created_at) AS date, COALESCE(SUM(total_cents), 0) AS total_cents
            FROM sales
            WHERE date(created_at) >= ?1
            GROUP BY date(created_at)
            ORDER BY date(created_at)
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        Ok(totals)
    }
}

// =============================================================================
// Transaction-side inserts
// =============================================================================

pub(crate) async fn insert_sale<'c, E>(executor: E, sale: &Sale) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO sales (
            id, client_id, salesperson_id,
            subtotal_cents, tax_cents, total_cents,
            payment_method, payment_reference, status, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.client_id)
    .bind(&sale.salesperson_id)
    .bind(sale.subtotal_cents)
    .bind(sale.tax_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(&sale.payment_reference)
    .bind(sale.status)
    .bind(sale.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn insert_item<'c, E>(executor: E, item: &SaleItem) -> Result<(), sqlx::Error>
where
    E: SqliteExecutor<'c>,
{
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, name_snapshot,
            unit_price_cents, quantity, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.name_snapshot)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(executor)
    .await?;

    Ok(())
}
