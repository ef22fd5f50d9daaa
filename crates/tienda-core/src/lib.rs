//! # tienda-core: Pure Business Logic for the Store Backoffice
//!
//! All business rules live here as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Tienda Backoffice Architecture                    │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               apps/backoffice (request handlers)                │   │
//! │  │   cart, checkout, products, clients, sales, forecast, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tienda-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │ catalog │ │  cart   │ │ checkout │ │forecast │ │   │
//! │  │   │  Money  │ │ Product │ │CartLine │ │  plan_   │ │ Sales-  │ │   │
//! │  │   │ TaxRate │ │  Patch  │ │ Summary │ │ checkout │ │  Model  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  tienda-db (Database Layer)                     │   │
//! │  │        SQLite repositories, checkout transaction, migrations    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Shared domain types (Sale, PaymentMethod, TaxRate, ...)
//! - [`money`] - Money type with integer arithmetic
//! - [`catalog`] - Products, patches and inventory movements
//! - [`client`] - Client records
//! - [`cart`] - Cart lines and summaries
//! - [`checkout`] - Checkout preconditions and totals
//! - [`forecast`] - Sales forecasting model
//! - [`error`] - Domain error types
//! - [`validation`] - Field validation rules
//!
//! ## Example Usage
//!
//! ```rust
//! use tienda_core::money::Money;
//! use tienda_core::types::TaxRate;
//!
//! let subtotal = Money::from_cents(3000);
//! let tax = subtotal.calculate_tax(TaxRate::IGV);
//! assert_eq!((subtotal + tax).cents(), 3540);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod client;
pub mod error;
pub mod forecast;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem, CartLine, CartSummary};
pub use catalog::{InventoryMovement, MovementKind, NewProduct, Product, ProductPatch};
pub use checkout::{plan_checkout, CheckoutPlan};
pub use client::{Client, ClientPatch, NewClient};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{ExchangeRate, Money};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single cart line.
///
/// Catches typing 1000 instead of 10.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest unit price a product may carry, in cents (10,000,000.00).
///
/// Keeps a full cart (`MAX_CART_ITEMS` lines of `MAX_ITEM_QUANTITY` units)
/// and its tax well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000;

/// Highest stock level a product may hold.
pub const MAX_STOCK: i64 = 1_000_000_000;

/// Username recorded in the audit log when the caller is unknown.
pub const ANONYMOUS_USER: &str = "anonymous";
