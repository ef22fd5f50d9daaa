//! # Domain Types
//!
//! Shared domain types for the store backoffice.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      User       │   │    Employee     │   │      Sale       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  user_id?       │◄──│  salesperson_id?│       │
//! │  │  username       │   │  position       │   │  client_id      │       │
//! │  │  status         │   │  status         │   │  total_cents    │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ 1..n           │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────▼────────┐       │
//! │  │    TaxRate      │   │ PaymentMethod   │   │    SaleItem     │       │
//! │  │  bps (u32)      │   │  cash, card,    │   │  snapshots of   │       │
//! │  │  1800 = 18%     │   │  yape, plin,    │   │  name + price   │       │
//! │  └─────────────────┘   │  bank_transfer  │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Catalog types live in [`crate::catalog`], clients in [`crate::client`]
//! and cart types in [`crate::cart`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1800 bps = 18%.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TaxRate(u32);

impl TaxRate {
    /// The 18% sales tax applied to every sale.
    pub const IGV: TaxRate = TaxRate(1800);

    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::IGV
    }
}

// =============================================================================
// Record Status
// =============================================================================

/// Lifecycle status shared by every soft-deletable record.
///
/// ## Lifecycle
/// ```text
///            deactivate()
///   Active ───────────────► Inactive
///     ▲                        │
///     └────────────────────────┘
///             restore()
/// ```
/// List queries always name the status they want; nothing is filtered
/// implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Active,
    Inactive,
}

impl RecordStatus {
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, RecordStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordStatus::Active => "active",
            RecordStatus::Inactive => "inactive",
        }
    }
}

impl Default for RecordStatus {
    fn default() -> Self {
        RecordStatus::Active
    }
}

// =============================================================================
// Sale Status
// =============================================================================

/// Status of a recorded sale.
///
/// Sales are only ever written by a successful checkout, so the only
/// persisted state is `Completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
}

impl Default for SaleStatus {
    fn default() -> Self {
        SaleStatus::Completed
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// Accepted payment methods.
///
/// ## Parsing
/// Request payloads carry the method as free text. Parsing trims, ignores
/// case and accepts the Spanish names used by the storefront:
///
/// | Input                                   | Method         |
/// |-----------------------------------------|----------------|
/// | `cash`, `efectivo`                      | `Cash`         |
/// | `card`, `tarjeta`                       | `Card`         |
/// | `yape`                                  | `Yape`         |
/// | `plin`                                  | `Plin`         |
/// | `bank_transfer`, `transfer`, `transferencia` | `BankTransfer` |
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    /// Mobile wallet (Yape).
    Yape,
    /// Mobile wallet (Plin).
    Plin,
    BankTransfer,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 5] = [
        PaymentMethod::Cash,
        PaymentMethod::Card,
        PaymentMethod::Yape,
        PaymentMethod::Plin,
        PaymentMethod::BankTransfer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::Yape => "yape",
            PaymentMethod::Plin => "plin",
            PaymentMethod::BankTransfer => "bank_transfer",
        }
    }

    /// Whether the storefront asks the customer for an operation reference.
    pub fn expects_reference(&self) -> bool {
        !matches!(self, PaymentMethod::Cash)
    }
}

impl FromStr for PaymentMethod {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" | "efectivo" => Ok(PaymentMethod::Cash),
            "card" | "tarjeta" => Ok(PaymentMethod::Card),
            "yape" => Ok(PaymentMethod::Yape),
            "plin" => Ok(PaymentMethod::Plin),
            "bank_transfer" | "transfer" | "transferencia" => Ok(PaymentMethod::BankTransfer),
            _ => Err(CoreError::InvalidPaymentMethod(s.to_string())),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Sale
// =============================================================================

/// An immutable sale record.
///
/// `total_cents == subtotal_cents + tax_cents`, and `subtotal_cents` is the
/// sum of the sale's item subtotals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub client_id: String,
    /// Employee credited with the sale, if any.
    pub salesperson_id: Option<String>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Operation number for non-cash payments.
    pub payment_reference: Option<String>,
    pub status: SaleStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze product data at time of sale.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name_snapshot: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    pub quantity: i64,
    /// unit_price × quantity.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

/// Aggregate sales figures for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SalesStats {
    pub today_total_cents: i64,
    pub today_count: i64,
    pub month_total_cents: i64,
    pub month_count: i64,
}

// =============================================================================
// Users & Employees
// =============================================================================

/// A login account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: Option<String>,
    pub full_name: String,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Staff member. May be linked to a login account.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub id: String,
    pub user_id: Option<String>,
    pub full_name: String,
    pub phone: Option<String>,
    /// National identity document number.
    pub document_id: String,
    /// Job title ("vendedor", "cajero", ...).
    pub position: String,
    pub status: RecordStatus,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Audit Log
// =============================================================================

/// One row of the audit log (bitácora).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct AuditEntry {
    pub id: String,
    /// Acting username, `"anonymous"` when the caller is unknown.
    pub username: String,
    pub ip: Option<String>,
    /// Short verb such as `CHECKOUT` or `PRODUCT_CREATED`.
    pub action: String,
    pub description: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Notifications
// =============================================================================

/// A stored in-app notification. Delivery is out of scope.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub message: String,
    pub read: bool,
    #[ts(as = "String")]
    pub sent_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
