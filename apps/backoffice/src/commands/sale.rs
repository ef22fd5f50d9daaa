//! # Sale Commands
//!
//! Checkout, direct sales, and read access to recorded sales.
//!
//! ## Checkout Flow
//! ```text
//! checkout(state, actor, request)
//!      │
//!      ▼
//! CheckoutProcessor::checkout ── one SQLite transaction ──┐
//!      │                                                   │
//!      │  cart lines ─► stock/payment/client checks        │
//!      │  sale + items ─► stock decrements ─► cart cleared │
//!      │  CHECKOUT audit entry                             │
//!      ▼                                                   │
//! SaleDto { id, totals, items } ◄──── commit ──────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{list_limit, Actor};
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::{ExchangeRate, Money, PaymentMethod, Sale, SaleItem, SalesStats};
use tienda_db::{CheckoutRequest, DirectSaleRequest, SaleDetail, SaleLineRequest};

/// A completed sale as returned to the caller.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleDto {
    pub id: String,
    pub client_id: String,
    pub salesperson_id: Option<String>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// `total_cents` in the local currency.
    pub local_total_cents: i64,
    /// Decimal rendering of the total, e.g. "35.40".
    pub total_display: String,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemDto>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaleItemDto {
    pub product_id: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
}

impl From<SaleItem> for SaleItemDto {
    fn from(item: SaleItem) -> Self {
        SaleItemDto {
            product_id: item.product_id,
            name: item.name_snapshot,
            unit_price_cents: item.unit_price_cents,
            quantity: item.quantity,
            subtotal_cents: item.subtotal_cents,
        }
    }
}

impl SaleDto {
    fn from_detail(detail: SaleDetail, exchange_rate: ExchangeRate) -> Self {
        let SaleDetail { sale, items } = detail;
        let total = sale.total();
        SaleDto {
            id: sale.id,
            client_id: sale.client_id,
            salesperson_id: sale.salesperson_id,
            payment_method: sale.payment_method,
            payment_reference: sale.payment_reference,
            subtotal_cents: sale.subtotal_cents,
            tax_cents: sale.tax_cents,
            total_cents: sale.total_cents,
            local_total_cents: total.convert(exchange_rate).cents(),
            total_display: total.to_string(),
            created_at: sale.created_at,
            items: items.into_iter().map(SaleItemDto::from).collect(),
        }
    }
}

/// Checkout of the actor's cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutInput {
    pub client_id: String,
    pub salesperson_id: Option<String>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
}

/// A sale recorded from explicit lines.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectSaleInput {
    pub client_id: String,
    pub salesperson_id: Option<String>,
    pub payment_method: String,
    pub payment_reference: Option<String>,
    pub lines: Vec<SaleLineRequest>,
}

/// Dashboard figures with the totals also rendered for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesStatsDto {
    #[serde(flatten)]
    pub stats: SalesStats,
    pub today_total_display: String,
    pub month_total_display: String,
}

/// Converts the actor's cart into a sale.
///
/// The actor must carry a user id: carts belong to users.
pub async fn checkout(state: &AppState, actor: &Actor, input: CheckoutInput) -> Result<SaleDto, ApiError> {
    let user_id = actor
        .user_id
        .clone()
        .ok_or_else(|| ApiError::validation("user_id is required"))?;
    debug!(user_id = %user_id, method = %input.payment_method, "checkout command");

    let request = CheckoutRequest {
        user_id,
        client_id: input.client_id,
        salesperson_id: input.salesperson_id,
        payment_method: input.payment_method,
        payment_reference: input.payment_reference,
        ip: actor.ip.clone(),
    };

    let detail = state.checkout().checkout(&request).await?;
    Ok(SaleDto::from_detail(detail, state.exchange_rate()))
}

/// Records a sale without going through a cart. Prices come from the catalog.
pub async fn create_direct_sale(
    state: &AppState,
    actor: &Actor,
    input: DirectSaleInput,
) -> Result<SaleDto, ApiError> {
    debug!(lines = input.lines.len(), "create_direct_sale command");

    let request = DirectSaleRequest {
        client_id: input.client_id,
        salesperson_id: input.salesperson_id,
        payment_method: input.payment_method,
        payment_reference: input.payment_reference,
        lines: input.lines,
        username: Some(actor.username.clone()),
        ip: actor.ip.clone(),
    };

    let detail = state.checkout().record_direct_sale(&request).await?;
    Ok(SaleDto::from_detail(detail, state.exchange_rate()))
}

pub async fn get_sale(state: &AppState, id: &str) -> Result<SaleDto, ApiError> {
    let detail = state
        .db
        .sales()
        .get_detail(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", id))?;

    Ok(SaleDto::from_detail(detail, state.exchange_rate()))
}

/// Most recent sales first, without line items.
pub async fn list_recent_sales(state: &AppState, limit: Option<u32>) -> Result<Vec<Sale>, ApiError> {
    let sales = state.db.sales().list_recent(list_limit(limit)).await?;
    Ok(sales)
}

/// Today's and this month's totals (UTC calendar).
pub async fn get_sales_stats(state: &AppState) -> Result<SalesStatsDto, ApiError> {
    let stats = state.db.sales().stats(Utc::now().date_naive()).await?;

    Ok(SalesStatsDto {
        today_total_display: Money::from_cents(stats.today_total_cents).to_string(),
        month_total_display: Money::from_cents(stats.month_total_cents).to_string(),
        stats,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::cart::{add_to_cart, get_cart, AddToCartRequest};
    use crate::error::ErrorCode;
    use crate::state::test_support::{seed_client, seed_product, seed_user, test_state};

    fn actor_for(user: &tienda_core::User) -> Actor {
        Actor {
            user_id: Some(user.id.clone()),
            username: user.username.clone(),
            ip: Some("192.168.1.20".to_string()),
        }
    }

    fn cash(client_id: &str) -> CheckoutInput {
        CheckoutInput {
            client_id: client_id.to_string(),
            salesperson_id: None,
            payment_method: "efectivo".to_string(),
            payment_reference: None,
        }
    }

    #[tokio::test]
    async fn test_checkout_returns_sale_and_empties_cart() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;
        let client = seed_client(&state, "987654321").await;
        let product = seed_product(&state, "ARZ-1", 1000, 5).await;

        add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
                quantity: 3,
            },
        )
        .await
        .unwrap();

        let sale = checkout(&state, &actor_for(&user), cash(&client.id))
            .await
            .unwrap();

        assert_eq!(sale.subtotal_cents, 3000);
        assert_eq!(sale.tax_cents, 540);
        assert_eq!(sale.total_cents, 3540);
        assert_eq!(sale.total_display, "35.40");
        assert_eq!(sale.local_total_cents, 24638);
        assert_eq!(sale.payment_method, PaymentMethod::Cash);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].name, "Producto ARZ-1");

        assert_eq!(get_cart(&state, &user.id).await.unwrap().item_count, 0);
        let stock = state.db.products().get_by_id(&product.id).await.unwrap().unwrap().stock;
        assert_eq!(stock, 2);

        let fetched = get_sale(&state, &sale.id).await.unwrap();
        assert_eq!(fetched.total_cents, 3540);
    }

    #[tokio::test]
    async fn test_checkout_rejections() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;
        let client = seed_client(&state, "987654321").await;
        let product = seed_product(&state, "ARZ-1", 1000, 2).await;

        let err = checkout(&state, &actor_for(&user), cash(&client.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::CartError);

        add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
                quantity: 3,
            },
        )
        .await
        .unwrap();

        let err = checkout(&state, &actor_for(&user), cash(&client.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InsufficientStock);

        let err = checkout(&state, &Actor::new("ana"), cash(&client.id))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        assert_eq!(get_cart(&state, &user.id).await.unwrap().item_count, 1);
    }

    #[tokio::test]
    async fn test_direct_sale_is_audited_as_actor() {
        let state = test_state().await;
        let client = seed_client(&state, "987654321").await;
        let product = seed_product(&state, "ARZ-1", 250, 10).await;

        let sale = create_direct_sale(
            &state,
            &Actor::new("luis"),
            DirectSaleInput {
                client_id: client.id.clone(),
                salesperson_id: None,
                payment_method: "tarjeta".to_string(),
                payment_reference: Some("VISA-0042".to_string()),
                lines: vec![SaleLineRequest {
                    product_id: product.id.clone(),
                    quantity: 4,
                }],
            },
        )
        .await
        .unwrap();

        assert_eq!(sale.total_cents, 1180);
        assert_eq!(sale.payment_reference.as_deref(), Some("VISA-0042"));

        let entries = state.db.audit().list_for_username("luis", 10).await.unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_queries() {
        let state = test_state().await;
        let client = seed_client(&state, "987654321").await;
        let product = seed_product(&state, "ARZ-1", 1000, 10).await;

        for _ in 0..2 {
            create_direct_sale(
                &state,
                &Actor::new("luis"),
                DirectSaleInput {
                    client_id: client.id.clone(),
                    salesperson_id: None,
                    payment_method: "cash".to_string(),
                    payment_reference: None,
                    lines: vec![SaleLineRequest {
                        product_id: product.id.clone(),
                        quantity: 1,
                    }],
                },
            )
            .await
            .unwrap();
        }

        assert_eq!(list_recent_sales(&state, None).await.unwrap().len(), 2);
        assert_eq!(list_recent_sales(&state, Some(1)).await.unwrap().len(), 1);

        let stats = get_sales_stats(&state).await.unwrap();
        assert_eq!(stats.stats.today_count, 2);
        assert_eq!(stats.stats.today_total_cents, 2360);
        assert_eq!(stats.today_total_display, "23.60");

        let err = get_sale(&state, "missing").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
