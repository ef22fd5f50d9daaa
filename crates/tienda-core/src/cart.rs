//! # Cart
//!
//! Shopping cart types and the cart summary calculation.
//!
//! ## Live Pricing
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  CartItem stores only (product, quantity).                             │
//! │                                                                         │
//! │  Reading the cart joins the product row, so every CartLine carries     │
//! │  the product's CURRENT price and stock:                                │
//! │                                                                         │
//! │    cart_items ──JOIN── products ──► CartLine { unit_price, stock, .. } │
//! │                                         │                               │
//! │                                         ▼                               │
//! │                                   CartSummary (subtotal, tax, total)   │
//! │                                                                         │
//! │  Prices are frozen only when a checkout turns lines into SaleItems.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{ExchangeRate, Money};
use crate::types::{RecordStatus, TaxRate};

/// A user's cart. Exactly one per user, created lazily.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Cart {
    pub id: String,
    pub user_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A stored cart row: one product and a positive quantity.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartItem {
    pub id: String,
    pub cart_id: String,
    pub product_id: String,
    pub quantity: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

/// A cart item joined with its product's current state.
///
/// This is also the input to checkout planning; direct sales build the
/// same lines straight from the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    /// Current catalog price.
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// Current stock of the product.
    pub available_stock: i64,
    pub product_status: RecordStatus,
}

impl CartLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// quantity × current price.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    pub fn has_enough_stock(&self) -> bool {
        self.available_stock >= self.quantity
    }
}

/// A cart line as shown to the user.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLineView {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub subtotal_cents: i64,
    pub available_stock: i64,
    /// False when the line would fail checkout as it stands.
    pub purchasable: bool,
}

/// Cart totals computed with the canonical tax rule.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartSummary {
    pub cart_id: String,
    pub lines: Vec<CartLineView>,
    /// Number of distinct products.
    pub item_count: usize,
    /// Sum of quantities.
    pub total_quantity: i64,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    /// `total_cents` converted to the local currency.
    pub local_total_cents: i64,
}

impl CartSummary {
    /// Builds the summary for a cart's lines.
    ///
    /// ## Example
    /// ```rust
    /// use tienda_core::cart::{CartLine, CartSummary};
    /// use tienda_core::money::ExchangeRate;
    /// use tienda_core::types::{RecordStatus, TaxRate};
    ///
    /// let line = CartLine {
    ///     product_id: "p1".into(),
    ///     sku: "ARZ".into(),
    ///     name: "Arroz".into(),
    ///     unit_price_cents: 1000,
    ///     quantity: 3,
    ///     available_stock: 5,
    ///     product_status: RecordStatus::Active,
    /// };
    /// let summary = CartSummary::build(
    ///     "cart-1",
    ///     &[line],
    ///     TaxRate::IGV,
    ///     ExchangeRate::from_hundredths(696),
    /// );
    /// assert_eq!(summary.total_cents, 3540);
    /// ```
    pub fn build(
        cart_id: &str,
        lines: &[CartLine],
        tax_rate: TaxRate,
        exchange_rate: ExchangeRate,
    ) -> Self {
        let subtotal: Money = lines.iter().map(CartLine::subtotal).sum();
        let tax = subtotal.calculate_tax(tax_rate);
        let total = subtotal + tax;

        CartSummary {
            cart_id: cart_id.to_string(),
            lines: lines
                .iter()
                .map(|line| CartLineView {
                    product_id: line.product_id.clone(),
                    sku: line.sku.clone(),
                    name: line.name.clone(),
                    unit_price_cents: line.unit_price_cents,
                    quantity: line.quantity,
                    subtotal_cents: line.subtotal().cents(),
                    available_stock: line.available_stock,
                    purchasable: line.product_status.is_active() && line.has_enough_stock(),
                })
                .collect(),
            item_count: lines.len(),
            total_quantity: lines.iter().map(|l| l.quantity).sum(),
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
            local_total_cents: total.convert(exchange_rate).cents(),
        }
    }
}
