//! # Checkout Transaction
//!
//! Turns a user's cart (or an explicit list of lines) into a completed sale.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    checkout(request)                                    │
//! │                                                                         │
//! │  BEGIN                                                                 │
//! │    UPDATE carts SET updated_at      ← first statement is a write, so   │
//! │                                        concurrent checkouts queue on   │
//! │                                        SQLite's writer lock here       │
//! │    SELECT cart lines + live stock                                      │
//! │    plan_checkout()                  ← EmptyCart / ProductInactive /    │
//! │                                        InsufficientStock /             │
//! │                                        InvalidPaymentMethod            │
//! │    client active? salesperson?      ← NotFound                         │
//! │    INSERT sales                                                        │
//! │    for each line:                                                      │
//! │       UPDATE products SET stock = stock - q                            │
//! │              WHERE id = ? AND stock >= q   ← 0 rows → InsufficientStock│
//! │       INSERT sale_items (snapshot)                                     │
//! │    DELETE cart_items                                                   │
//! │    INSERT audit_log ('CHECKOUT')                                       │
//! │  COMMIT                                                                │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction, which rolls back.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{DbError, StoreError, StoreResult};
use crate::repository::audit::{actions, new_entry, record_in};
use crate::repository::cart::{clear_items, fetch_lines};
use crate::repository::sale::{insert_item, insert_sale, SaleDetail};
use tienda_core::checkout::merge_lines;
use tienda_core::validation::{validate_payment_reference, validate_quantity};
use tienda_core::{
    plan_checkout, CartLine, CheckoutPlan, CoreError, RecordStatus, Sale, SaleItem, SaleStatus,
    TaxRate, ValidationError, ANONYMOUS_USER, MAX_ITEM_QUANTITY,
};

/// Input to [`CheckoutProcessor::checkout`].
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    /// Owner of the cart being checked out.
    pub user_id: String,
    pub client_id: String,
    pub salesperson_id: Option<String>,
    /// Accepted spellings: see `PaymentMethod`'s `FromStr`.
    pub payment_method: String,
    pub payment_reference: Option<String>,
    /// Caller address, recorded in the audit entry.
    #[serde(default)]
    pub ip: Option<String>,
}

/// One requested line of a direct sale.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Input to [`CheckoutProcessor::record_direct_sale`].
///
/// Prices always come from the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSaleRequest {
    pub client_id: String,
    pub salesperson_id: Option<String>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub lines: Vec<SaleLineRequest>,
    /// Who is recording the sale, for the audit log.
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
}

/// Runs checkouts and direct sales as single transactions.
#[derive(Debug, Clone)]
pub struct CheckoutProcessor {
    pool: SqlitePool,
    tax_rate: TaxRate,
}

impl CheckoutProcessor {
    /// Creates a processor applying `tax_rate` to every sale.
    pub fn new(pool: SqlitePool, tax_rate: TaxRate) -> Self {
        CheckoutProcessor { pool, tax_rate }
    }

    /// Converts the user's cart into a completed sale.
    ///
    /// On success the cart is empty and every product's stock has dropped by
    /// its line quantity. On any error nothing has changed.
    ///
    /// ## Errors
    /// * `Rejected(EmptyCart)` - no cart or no lines
    /// * `Rejected(ProductInactive)` - a line's product was deactivated
    /// * `Rejected(InsufficientStock)` - first line asking for more than is in stock
    /// * `Rejected(InvalidPaymentMethod)` - unknown payment method
    /// * `Rejected(NotFound)` - client missing or inactive, or salesperson missing
    /// * `Storage(_)` - the database failed; the transaction was rolled back
    pub async fn checkout(&self, request: &CheckoutRequest) -> StoreResult<SaleDetail> {
        let result = self.run_checkout(request).await;
        log_outcome("checkout", &request.user_id, &result);
        result
    }

    async fn run_checkout(&self, request: &CheckoutRequest) -> StoreResult<SaleDetail> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        sqlx::query("UPDATE carts SET updated_at = ?2 WHERE user_id = ?1")
            .bind(&request.user_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;

        let lines = fetch_lines(&mut *tx, &request.user_id).await?;
        let plan = plan_checkout(&lines, &request.payment_method, self.tax_rate)?;
        validate_payment_reference(request.payment_reference.as_deref())?;

        verify_parties(&mut tx, &request.client_id, request.salesperson_id.as_deref()).await?;

        let detail = write_sale(
            &mut tx,
            Uuid::new_v4().to_string(),
            &plan,
            &request.client_id,
            request.salesperson_id.as_deref(),
            request.payment_reference.as_deref(),
            now,
        )
        .await?;

        clear_items(&mut *tx, &request.user_id).await?;

        let username: Option<String> =
            sqlx::query_scalar("SELECT username FROM users WHERE id = ?1")
                .bind(&request.user_id)
                .fetch_optional(&mut *tx)
                .await?;
        let entry = new_entry(
            username.as_deref().unwrap_or(ANONYMOUS_USER),
            request.ip.as_deref(),
            actions::CHECKOUT,
            format!(
                "Sale {} for client {}: {} lines, total {} ({})",
                detail.sale.id,
                detail.sale.client_id,
                detail.items.len(),
                plan.total,
                plan.payment_method
            ),
        );
        record_in(&mut *tx, &entry).await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            sale_id = %detail.sale.id,
            user_id = %request.user_id,
            total_cents = detail.sale.total_cents,
            "Checkout completed"
        );
        Ok(detail)
    }

    /// Records a sale from explicit lines, with the same pricing, checks and
    /// atomicity as a checkout. Repeated products are merged.
    pub async fn record_direct_sale(&self, request: &DirectSaleRequest) -> StoreResult<SaleDetail> {
        let actor = request.username.as_deref().unwrap_or(ANONYMOUS_USER);
        let result = self.run_direct_sale(request, actor).await;
        log_outcome("direct sale", actor, &result);
        result
    }

    async fn run_direct_sale(&self, request: &DirectSaleRequest, actor: &str) -> StoreResult<SaleDetail> {
        if request.lines.is_empty() {
            return Err(ValidationError::Required {
                field: "lines".to_string(),
            }
            .into());
        }
        for line in &request.lines {
            validate_quantity(line.quantity)?;
        }

        let requested: Vec<(String, i64)> = request
            .lines
            .iter()
            .map(|l| (l.product_id.clone(), l.quantity))
            .collect();
        let merged = merge_lines(&requested);

        if let Some((_, quantity)) = merged.iter().find(|(_, q)| *q > MAX_ITEM_QUANTITY) {
            return Err(CoreError::QuantityTooLarge {
                requested: *quantity,
                max: MAX_ITEM_QUANTITY,
            }
            .into());
        }

        let now = Utc::now();
        let sale_id = Uuid::new_v4().to_string();
        let mut tx = self.pool.begin().await.map_err(DbError::transaction)?;

        // First write takes the writer lock before stock is read
        let entry = new_entry(
            actor,
            request.ip.as_deref(),
            actions::DIRECT_SALE,
            format!(
                "Sale {} for client {}: {} lines ({})",
                sale_id,
                request.client_id,
                merged.len(),
                request.payment_method.trim()
            ),
        );
        record_in(&mut *tx, &entry).await?;

        let mut lines = Vec::with_capacity(merged.len());
        for (product_id, quantity) in &merged {
            let line = sqlx::query_as::<_, CartLine>(
                r#"
                SELECT id AS product_id, sku, name,
                       price_cents AS unit_price_cents,
                       ?2 AS quantity,
                       stock AS available_stock,
                       status AS product_status
                FROM products
                WHERE id = ?1
                "#,
            )
            .bind(product_id)
            .bind(quantity)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id.as_str()))?;
            lines.push(line);
        }

        let plan = plan_checkout(&lines, &request.payment_method, self.tax_rate)?;
        validate_payment_reference(request.payment_reference.as_deref())?;

        verify_parties(&mut tx, &request.client_id, request.salesperson_id.as_deref()).await?;

        let detail = write_sale(
            &mut tx,
            sale_id,
            &plan,
            &request.client_id,
            request.salesperson_id.as_deref(),
            request.payment_reference.as_deref(),
            now,
        )
        .await?;

        tx.commit().await.map_err(DbError::transaction)?;

        info!(
            sale_id = %detail.sale.id,
            total_cents = detail.sale.total_cents,
            "Direct sale recorded"
        );
        Ok(detail)
    }
}

fn log_outcome(operation: &str, actor: &str, result: &StoreResult<SaleDetail>) {
    match result {
        Ok(_) => {}
        Err(StoreError::Rejected(reason)) => {
            warn!(actor = %actor, %reason, "{} rejected", operation);
        }
        Err(StoreError::Storage(e)) => {
            error!(actor = %actor, error = %e, "{} failed", operation);
        }
    }
}

/// The client must exist and be active; the salesperson, if any, must exist.
async fn verify_parties(
    conn: &mut SqliteConnection,
    client_id: &str,
    salesperson_id: Option<&str>,
) -> StoreResult<()> {
    let client_status: Option<RecordStatus> =
        sqlx::query_scalar("SELECT status FROM clients WHERE id = ?1")
            .bind(client_id)
            .fetch_optional(&mut *conn)
            .await?;

    if !client_status.is_some_and(|s| s.is_active()) {
        return Err(CoreError::not_found("Client", client_id).into());
    }

    if let Some(salesperson_id) = salesperson_id {
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM employees WHERE id = ?1")
            .bind(salesperson_id)
            .fetch_optional(&mut *conn)
            .await?;

        if exists.is_none() {
            return Err(CoreError::not_found("Employee", salesperson_id).into());
        }
    }

    Ok(())
}

/// Inserts the sale and its items and takes the stock, inside the caller's
/// transaction.
async fn write_sale(
    conn: &mut SqliteConnection,
    sale_id: String,
    plan: &CheckoutPlan,
    client_id: &str,
    salesperson_id: Option<&str>,
    payment_reference: Option<&str>,
    now: DateTime<Utc>,
) -> StoreResult<SaleDetail> {
    let sale = Sale {
        id: sale_id,
        client_id: client_id.to_string(),
        salesperson_id: salesperson_id.map(str::to_string),
        subtotal_cents: plan.subtotal.cents(),
        tax_cents: plan.tax.cents(),
        total_cents: plan.total.cents(),
        payment_method: plan.payment_method,
        payment_reference: payment_reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty()),
        status: SaleStatus::Completed,
        created_at: now,
    };
    insert_sale(&mut *conn, &sale).await?;

    let mut items = Vec::with_capacity(plan.lines.len());
    for line in &plan.lines {
        take_stock(&mut *conn, line, now).await?;

        let item = SaleItem {
            id: Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            product_id: line.product_id.clone(),
            name_snapshot: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            subtotal_cents: line.subtotal().cents(),
            created_at: now,
        };
        insert_item(&mut *conn, &item).await?;
        items.push(item);
    }

    Ok(SaleDetail { sale, items })
}

/// Guarded decrement: never takes stock below zero.
async fn take_stock(conn: &mut SqliteConnection, line: &CartLine, now: DateTime<Utc>) -> StoreResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET stock = stock - ?2, updated_at = ?3
        WHERE id = ?1 AND stock >= ?2 AND status = 'active'
        "#,
    )
    .bind(&line.product_id)
    .bind(line.quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available: i64 = sqlx::query_scalar("SELECT stock FROM products WHERE id = ?1")
            .bind(&line.product_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", &line.product_id))?;

        return Err(CoreError::InsufficientStock {
            product_id: line.product_id.clone(),
            product_name: line.name.clone(),
            available,
            requested: line.quantity,
        }
        .into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::test_support::{seed_client, seed_product, seed_user, test_db};
    use tienda_core::{Employee, Money, PaymentMethod};

    fn request(user_id: &str, client_id: &str, method: &str) -> CheckoutRequest {
        CheckoutRequest {
            user_id: user_id.to_string(),
            client_id: client_id.to_string(),
            salesperson_id: None,
            payment_method: method.to_string(),
            payment_reference: None,
            ip: Some("127.0.0.1".to_string()),
        }
    }

    async fn sale_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(db.pool())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_checkout_scenario() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "ACEITE", 1000, 5).await;

        db.carts().add_item(&user.id, &product.id, 3).await.unwrap();

        let detail = db
            .checkout(TaxRate::IGV)
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap();

        assert_eq!(detail.sale.subtotal_cents, 3000);
        assert_eq!(detail.sale.tax_cents, 540);
        assert_eq!(detail.sale.total_cents, 3540);
        assert_eq!(detail.sale.total().to_string(), "35.40");
        assert_eq!(detail.sale.payment_method, PaymentMethod::Cash);
        assert_eq!(detail.sale.status, SaleStatus::Completed);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 3);
        assert_eq!(detail.items[0].unit_price_cents, 1000);

        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);
        assert!(db.carts().lines(&user.id).await.unwrap().is_empty());
        assert!(db.carts().get_for_user(&user.id).await.unwrap().is_some());

        let stored = db.sales().get_detail(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 1);

        let audit = db.audit().list_for_username("cajero", 10).await.unwrap();
        assert_eq!(audit.len(), 1);
        assert_eq!(audit[0].action, actions::CHECKOUT);
        assert_eq!(audit[0].ip.as_deref(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_totals_follow_tax_rule() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let a = seed_product(&db, "A", 333, 50).await;
        let b = seed_product(&db, "B", 1299, 50).await;
        let c = seed_product(&db, "C", 5, 50).await;

        db.carts().add_item(&user.id, &a.id, 7).await.unwrap();
        db.carts().add_item(&user.id, &b.id, 2).await.unwrap();
        db.carts().add_item(&user.id, &c.id, 11).await.unwrap();

        let detail = db
            .checkout(TaxRate::IGV)
            .checkout(&request(&user.id, &client.id, "Tarjeta"))
            .await
            .unwrap();

        let subtotal: i64 = detail
            .items
            .iter()
            .map(|i| i.unit_price_cents * i.quantity)
            .sum();
        assert_eq!(subtotal, detail.sale.subtotal_cents);
        assert_eq!(
            detail.sale.tax_cents,
            Money::from_cents(subtotal).calculate_tax(TaxRate::IGV).cents()
        );
        assert_eq!(detail.sale.total_cents, (subtotal * 118 + 50) / 100);
        assert_eq!(detail.sale.payment_method, PaymentMethod::Card);
    }

    #[tokio::test]
    async fn test_insufficient_stock_changes_nothing() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let plenty = seed_product(&db, "OK", 100, 50).await;
        let scarce = seed_product(&db, "POCO", 100, 2).await;

        db.carts().add_item(&user.id, &plenty.id, 5).await.unwrap();
        db.carts().add_item(&user.id, &scarce.id, 3).await.unwrap();

        let processor = db.checkout(TaxRate::IGV);
        let req = request(&user.id, &client.id, "cash");

        // Failing twice leaves the same state both times
        for _ in 0..2 {
            let err = processor.checkout(&req).await.unwrap_err();
            match err {
                StoreError::Rejected(CoreError::InsufficientStock {
                    product_id,
                    available,
                    requested,
                    ..
                }) => {
                    assert_eq!(product_id, scarce.id);
                    assert_eq!(available, 2);
                    assert_eq!(requested, 3);
                }
                other => panic!("expected InsufficientStock, got {:?}", other),
            }

            assert_eq!(db.carts().lines(&user.id).await.unwrap().len(), 2);
            let p = db.products().get_by_id(&plenty.id).await.unwrap().unwrap();
            let s = db.products().get_by_id(&scarce.id).await.unwrap().unwrap();
            assert_eq!((p.stock, s.stock), (50, 2));
            assert_eq!(sale_count(&db).await, 0);
        }

        assert!(db.audit().list_recent(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_cart() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let processor = db.checkout(TaxRate::IGV);

        // No cart at all
        let err = processor
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::EmptyCart)));

        // Cart exists but holds nothing
        db.carts().get_or_create(&user.id).await.unwrap();
        let err = processor
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::EmptyCart)));
        assert_eq!(sale_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_invalid_payment_method() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "P", 100, 5).await;
        db.carts().add_item(&user.id, &product.id, 1).await.unwrap();

        let err = db
            .checkout(TaxRate::IGV)
            .checkout(&request(&user.id, &client.id, "bitcoin"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(CoreError::InvalidPaymentMethod(ref m)) if m == "bitcoin"
        ));
        assert_eq!(db.carts().lines(&user.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_inactive_product_in_cart() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "P", 100, 5).await;
        db.carts().add_item(&user.id, &product.id, 1).await.unwrap();
        db.products().deactivate(&product.id).await.unwrap();

        let err = db
            .checkout(TaxRate::IGV)
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::ProductInactive { .. })));
    }

    #[tokio::test]
    async fn test_unknown_or_inactive_parties() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "P", 100, 5).await;
        db.carts().add_item(&user.id, &product.id, 1).await.unwrap();
        let processor = db.checkout(TaxRate::IGV);

        let err = processor
            .checkout(&request(&user.id, "ghost", "cash"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(CoreError::NotFound { ref entity, .. }) if entity == "Client"
        ));

        let mut req = request(&user.id, &client.id, "cash");
        req.salesperson_id = Some("nobody".to_string());
        let err = processor.checkout(&req).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(CoreError::NotFound { ref entity, .. }) if entity == "Employee"
        ));

        db.clients().deactivate(&client.id).await.unwrap();
        let err = processor
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::NotFound { .. })));

        assert_eq!(db.products().get_by_id(&product.id).await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn test_salesperson_and_reference_recorded() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "P", 100, 5).await;
        let employee = Employee {
            id: "emp-1".to_string(),
            user_id: Some(user.id.clone()),
            full_name: "Luis Mamani".to_string(),
            phone: None,
            document_id: "4455667".to_string(),
            position: "Vendedor".to_string(),
            status: RecordStatus::Active,
            created_at: Utc::now(),
        };
        db.employees().insert(&employee).await.unwrap();
        db.carts().add_item(&user.id, &product.id, 1).await.unwrap();

        let mut req = request(&user.id, &client.id, "yape");
        req.salesperson_id = Some("emp-1".to_string());
        req.payment_reference = Some(" OP-123 ".to_string());

        let detail = db.checkout(TaxRate::IGV).checkout(&req).await.unwrap();
        assert_eq!(detail.sale.salesperson_id.as_deref(), Some("emp-1"));
        assert_eq!(detail.sale.payment_reference.as_deref(), Some("OP-123"));
        assert_eq!(detail.sale.payment_method, PaymentMethod::Yape);
    }

    #[tokio::test]
    async fn test_direct_sale_merges_lines_and_uses_catalog_prices() {
        let db = test_db().await;
        let client = seed_client(&db, "999888777").await;
        let a = seed_product(&db, "A", 1000, 10).await;
        let b = seed_product(&db, "B", 250, 10).await;

        let req = DirectSaleRequest {
            client_id: client.id.clone(),
            salesperson_id: None,
            payment_method: "efectivo".to_string(),
            payment_reference: None,
            lines: vec![
                SaleLineRequest { product_id: a.id.clone(), quantity: 1 },
                SaleLineRequest { product_id: b.id.clone(), quantity: 2 },
                SaleLineRequest { product_id: a.id.clone(), quantity: 2 },
            ],
            username: Some("admin".to_string()),
            ip: None,
        };

        let detail = db.checkout(TaxRate::IGV).record_direct_sale(&req).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.items[0].product_id, a.id);
        assert_eq!(detail.items[0].quantity, 3);
        assert_eq!(detail.sale.subtotal_cents, 3500);
        assert_eq!(detail.sale.total_cents, 4130);

        assert_eq!(db.products().get_by_id(&a.id).await.unwrap().unwrap().stock, 7);
        assert_eq!(db.products().get_by_id(&b.id).await.unwrap().unwrap().stock, 8);

        let audit = db.audit().list_for_username("admin", 10).await.unwrap();
        assert_eq!(audit[0].action, actions::DIRECT_SALE);
    }

    #[tokio::test]
    async fn test_direct_sale_rejections_roll_back() {
        let db = test_db().await;
        let client = seed_client(&db, "999888777").await;
        let a = seed_product(&db, "A", 1000, 2).await;
        let processor = db.checkout(TaxRate::IGV);

        let mut req = DirectSaleRequest {
            client_id: client.id.clone(),
            salesperson_id: None,
            payment_method: "cash".to_string(),
            payment_reference: None,
            lines: vec![],
            username: None,
            ip: None,
        };
        let err = processor.record_direct_sale(&req).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(CoreError::Validation(ValidationError::Required { .. }))
        ));

        req.lines = vec![SaleLineRequest { product_id: "ghost".to_string(), quantity: 1 }];
        let err = processor.record_direct_sale(&req).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::NotFound { .. })));

        req.lines = vec![SaleLineRequest { product_id: a.id.clone(), quantity: 3 }];
        let err = processor.record_direct_sale(&req).await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(CoreError::InsufficientStock { .. })));

        // The audit entry written first was rolled back too
        assert!(db.audit().list_recent(10).await.unwrap().is_empty());
        assert_eq!(sale_count(&db).await, 0);
        assert_eq!(db.products().get_by_id(&a.id).await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_checkouts_never_oversell() {
        let path = std::env::temp_dir().join(format!("tienda-checkout-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path).max_connections(4))
            .await
            .unwrap();

        let first = seed_user(&db, "caja1").await;
        let second = seed_user(&db, "caja2").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "ULTIMO", 1000, 5).await;

        db.carts().add_item(&first.id, &product.id, 4).await.unwrap();
        db.carts().add_item(&second.id, &product.id, 4).await.unwrap();

        let processor = db.checkout(TaxRate::IGV);
        let handles: Vec<_> = [first.id.clone(), second.id.clone()]
            .into_iter()
            .map(|user_id| {
                let processor = processor.clone();
                let req = request(&user_id, &client.id, "cash");
                tokio::spawn(async move { processor.checkout(&req).await })
            })
            .collect();

        let mut successes = 0;
        let mut shortages = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => successes += 1,
                Err(StoreError::Rejected(CoreError::InsufficientStock { available, .. })) => {
                    assert_eq!(available, 1);
                    shortages += 1;
                }
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!((successes, shortages), (1, 1));
        let stock = db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 1);
        assert_eq!(sale_count(&db).await, 1);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    #[tokio::test]
    async fn test_take_stock_on_missing_product() {
        let db = test_db().await;
        let mut conn = db.pool().acquire().await.unwrap();
        let line = CartLine {
            product_id: "gone".to_string(),
            sku: "GONE".to_string(),
            name: "Producto GONE".to_string(),
            unit_price_cents: 100,
            quantity: 1,
            available_stock: 1,
            product_status: RecordStatus::Active,
        };

        let err = take_stock(&mut conn, &line, Utc::now()).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected(CoreError::NotFound { ref entity, .. }) if entity == "Product"
        ));
    }

    #[tokio::test]
    async fn test_checkout_at_price_and_quantity_limits() {
        let db = test_db().await;
        let user = seed_user(&db, "cajero").await;
        let client = seed_client(&db, "999888777").await;
        let product = seed_product(&db, "CARO", tienda_core::MAX_PRICE_CENTS, 1000).await;

        db.carts()
            .add_item(&user.id, &product.id, tienda_core::MAX_ITEM_QUANTITY)
            .await
            .unwrap();

        let detail = db
            .checkout(TaxRate::IGV)
            .checkout(&request(&user.id, &client.id, "cash"))
            .await
            .unwrap();

        let subtotal = tienda_core::MAX_PRICE_CENTS * tienda_core::MAX_ITEM_QUANTITY;
        assert_eq!(detail.sale.subtotal_cents, subtotal);
        assert_eq!(detail.sale.total_cents, subtotal + (subtotal * 1800 + 5000) / 10000);
        assert_eq!(
            db.products().get_by_id(&product.id).await.unwrap().unwrap().stock,
            1
        );
    }

    #[tokio::test]
    async fn test_schema_rejects_out_of_range_price() {
        let db = test_db().await;
        let mut product = tienda_core::NewProduct {
            sku: "BIG".to_string(),
            name: "Big".to_string(),
            description: None,
            price_cents: 100,
            stock: 1000,
            min_stock: None,
        }
        .into_product(Utc::now())
        .unwrap();
        product.price_cents = i64::MAX / 100;

        let err = db.products().insert(&product).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
