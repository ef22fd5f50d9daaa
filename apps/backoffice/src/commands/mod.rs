//! # Request Handlers
//!
//! Transport-agnostic handlers for the backoffice.
//!
//! ## Organization
//! ```text
//! commands/
//! ├── mod.rs           ◄─── You are here (Actor, shared helpers)
//! ├── cart.rs          ◄─── Cart view and manipulation
//! ├── sale.rs          ◄─── Checkout, direct sales, sale queries
//! ├── product.rs       ◄─── Catalog CRUD and inventory movements
//! ├── client.rs        ◄─── Client CRUD
//! ├── forecast.rs      ◄─── Sales forecasts and retraining
//! ├── notification.rs  ◄─── In-app notifications
//! ├── audit.rs         ◄─── Audit log queries
//! └── config.rs        ◄─── Public configuration
//! ```
//!
//! ## Shape of a Handler
//! ```rust,ignore
//! pub async fn add_to_cart(
//!     state: &AppState,           // ◄── shared state
//!     request: AddToCartRequest,  // ◄── camelCase JSON from the caller
//! ) -> Result<CartSummary, ApiError>
//! ```
//!
//! Mutations that change the catalog or clients also take the [`Actor`] so
//! they can be written to the audit log. Authentication happens before a
//! handler is called.

pub mod audit;
pub mod cart;
pub mod client;
pub mod config;
pub mod forecast;
pub mod notification;
pub mod product;
pub mod sale;

use serde::Deserialize;
use tracing::error;

use crate::state::AppState;

/// Default page size for list handlers.
pub const DEFAULT_LIST_LIMIT: u32 = 20;

/// Largest page a list handler returns.
pub const MAX_LIST_LIMIT: u32 = 100;

/// The authenticated caller, as resolved by the transport.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub user_id: Option<String>,
    /// Empty when unknown; audited as anonymous.
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub ip: Option<String>,
}

impl Actor {
    pub fn new(username: impl Into<String>) -> Self {
        Actor {
            user_id: None,
            username: username.into(),
            ip: None,
        }
    }
}

/// Clamps an optional page size to `1..=MAX_LIST_LIMIT`.
pub(crate) fn list_limit(limit: Option<u32>) -> u32 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

/// Records an audit entry for a change that already committed.
///
/// A failure here is logged, not returned: the change itself succeeded.
pub(crate) async fn record_audit(state: &AppState, actor: &Actor, action: &str, description: String) {
    if let Err(e) = state
        .db
        .audit()
        .record(&actor.username, actor.ip.as_deref(), action, description)
        .await
    {
        error!(action = %action, error = %e, "Failed to record audit entry");
    }
}
