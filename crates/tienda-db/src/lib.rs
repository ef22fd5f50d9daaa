//! # tienda-db: Database Layer for the Store Backoffice
//!
//! SQLite storage for the backoffice, using sqlx for async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Backoffice Data Flow                             │
//! │                                                                         │
//! │  commands::checkout::checkout(&state, request)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     tienda-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│ product, cart │    │  (embedded)  │  │   │
//! │  │   │               │    │ sale, client  │    │ 001_init.sql │  │   │
//! │  │   │ SqlitePool    │    │ audit, ...    │    │              │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │                                                     │   │
//! │  │   ┌───────▼───────────────────────────┐                         │   │
//! │  │   │ CheckoutProcessor (checkout.rs)   │ one transaction per sale│   │
//! │  │   └───────────────────────────────────┘                         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - `DbError` and `StoreError`
//! - [`repository`] - Repository implementations
//! - [`checkout`] - The checkout and direct-sale transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tienda_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/tienda.db")).await?;
//!
//! db.carts().add_item(&user_id, &product_id, 2).await?;
//! let sale = db.checkout(TaxRate::IGV).checkout(&request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::{CheckoutProcessor, CheckoutRequest, DirectSaleRequest, SaleLineRequest};
pub use error::{DbError, DbResult, StoreError, StoreResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::audit::{actions as audit_actions, AuditRepository};
pub use repository::cart::CartRepository;
pub use repository::client::ClientRepository;
pub use repository::employee::EmployeeRepository;
pub use repository::notification::NotificationRepository;
pub use repository::product::ProductRepository;
pub use repository::sale::{SaleDetail, SaleRepository};
pub use repository::user::UserRepository;
