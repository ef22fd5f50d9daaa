//! # Product Commands
//!
//! Catalog maintenance and inventory movements. Every change is written to
//! the audit log under the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{record_audit, list_limit, Actor};
use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::{InventoryMovement, MovementKind, NewProduct, Product, ProductPatch, RecordStatus};
use tienda_db::audit_actions as actions;

/// Product as shown in the backoffice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDto {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub price_display: String,
    pub stock: i64,
    pub min_stock: i64,
    /// At or below minimum stock while active.
    pub critical: bool,
    pub status: RecordStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<Product> for ProductDto {
    fn from(p: Product) -> Self {
        ProductDto {
            critical: p.is_active() && p.is_critical(),
            price_display: p.price().to_string(),
            id: p.id,
            sku: p.sku,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            stock: p.stock,
            min_stock: p.min_stock,
            status: p.status,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdjustStockRequest {
    pub product_id: String,
    pub kind: MovementKind,
    /// Units moved, or the new stock level for an adjustment.
    pub quantity: i64,
    pub reason: Option<String>,
}

pub async fn create_product(
    state: &AppState,
    actor: &Actor,
    input: NewProduct,
) -> Result<ProductDto, ApiError> {
    debug!(sku = %input.sku, "create_product command");

    let product = input.into_product(Utc::now())?;
    state.db.products().insert(&product).await?;

    record_audit(
        state,
        actor,
        actions::PRODUCT_CREATED,
        format!("Product {} ({}) created", product.sku, product.name),
    )
    .await;

    Ok(product.into())
}

pub async fn get_product(state: &AppState, id: &str) -> Result<ProductDto, ApiError> {
    let product = state
        .db
        .products()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", id))?;
    Ok(product.into())
}

pub async fn get_product_by_sku(state: &AppState, sku: &str) -> Result<ProductDto, ApiError> {
    let product = state
        .db
        .products()
        .get_by_sku(sku)
        .await?
        .ok_or_else(|| ApiError::not_found("Product", sku.trim()))?;
    Ok(product.into())
}

/// Products with the given status (active when omitted), by name.
pub async fn list_products(
    state: &AppState,
    status: Option<RecordStatus>,
) -> Result<Vec<ProductDto>, ApiError> {
    let products = state
        .db
        .products()
        .list(status.unwrap_or(RecordStatus::Active))
        .await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

/// Active products at or below their minimum stock, lowest stock first.
pub async fn list_critical_inventory(state: &AppState) -> Result<Vec<ProductDto>, ApiError> {
    let products = state.db.products().critical_inventory().await?;
    Ok(products.into_iter().map(ProductDto::from).collect())
}

pub async fn update_product(
    state: &AppState,
    actor: &Actor,
    id: &str,
    patch: ProductPatch,
) -> Result<ProductDto, ApiError> {
    debug!(id = %id, "update_product command");

    if patch.is_empty() {
        return get_product(state, id).await;
    }

    let product = state.db.products().apply_patch(id, &patch).await?;
    record_audit(
        state,
        actor,
        actions::PRODUCT_UPDATED,
        format!("Product {} updated", product.sku),
    )
    .await;

    Ok(product.into())
}

pub async fn deactivate_product(state: &AppState, actor: &Actor, id: &str) -> Result<ProductDto, ApiError> {
    let product = state.db.products().deactivate(id).await?;
    record_audit(
        state,
        actor,
        actions::PRODUCT_DEACTIVATED,
        format!("Product {} deactivated", product.sku),
    )
    .await;
    Ok(product.into())
}

pub async fn restore_product(state: &AppState, actor: &Actor, id: &str) -> Result<ProductDto, ApiError> {
    let product = state.db.products().restore(id).await?;
    record_audit(
        state,
        actor,
        actions::PRODUCT_RESTORED,
        format!("Product {} restored", product.sku),
    )
    .await;
    Ok(product.into())
}

/// Records an inventory movement and applies it to stock.
pub async fn adjust_stock(
    state: &AppState,
    actor: &Actor,
    request: AdjustStockRequest,
) -> Result<InventoryMovement, ApiError> {
    debug!(
        product_id = %request.product_id,
        kind = ?request.kind,
        quantity = request.quantity,
        "adjust_stock command"
    );

    let movement = state
        .db
        .products()
        .adjust_stock(
            &request.product_id,
            request.kind,
            request.quantity,
            request.reason.as_deref(),
            actor.user_id.as_deref(),
        )
        .await?;

    record_audit(
        state,
        actor,
        actions::STOCK_ADJUSTED,
        format!(
            "Product {}: {:?} {} ({} -> {})",
            movement.product_id,
            movement.kind,
            movement.quantity,
            movement.stock_before,
            movement.stock_after
        ),
    )
    .await;

    Ok(movement)
}

pub async fn list_movements(
    state: &AppState,
    product_id: &str,
    limit: Option<u32>,
) -> Result<Vec<InventoryMovement>, ApiError> {
    let movements = state
        .db
        .products()
        .movements_for(product_id, list_limit(limit))
        .await?;
    Ok(movements)
}
