//! # Repository Module
//!
//! Database repository implementations for the backoffice.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Command handler                                                       │
//! │       │                                                                 │
//! │       │  db.products().critical_inventory()                            │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── insert / get_by_id / get_by_sku / list(status)                    │
//! │  ├── apply_patch / deactivate / restore                                │
//! │  └── adjust_stock (+ InventoryMovement, one transaction)               │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Reads and single-statement writes return DbResult.                    │
//! │  Operations that check business rules against stored rows return      │
//! │  StoreResult so a rejection is distinguishable from a storage fault.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog and stock movements
//! - [`ClientRepository`](client::ClientRepository) - Client records
//! - [`UserRepository`](user::UserRepository) - Accounts
//! - [`EmployeeRepository`](employee::EmployeeRepository) - Staff records
//! - [`CartRepository`](cart::CartRepository) - Per-user carts
//! - [`SaleRepository`](sale::SaleRepository) - Sale history and statistics
//! - [`AuditRepository`](audit::AuditRepository) - Audit trail
//! - [`NotificationRepository`](notification::NotificationRepository) - User notifications

pub mod audit;
pub mod cart;
pub mod client;
pub mod employee;
pub mod notification;
pub mod product;
pub mod sale;
pub mod user;

use crate::error::DbError;

/// Maps a unique-constraint failure to a duplicate error naming the value.
///
/// SQLite only reports the column, so callers supply the offending value.
pub(crate) fn map_duplicate(err: sqlx::Error, field: &str, value: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field: column, .. } => {
            let field = if column.ends_with(field) {
                field.to_string()
            } else {
                column
            };
            DbError::duplicate(field, value)
        }
        other => other,
    }
}
