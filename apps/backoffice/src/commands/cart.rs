//! # Cart Commands
//!
//! Every handler returns the cart's fresh summary so the caller can
//! re-render without a second request.

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::AppState;
use tienda_core::CartSummary;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToCartRequest {
    pub user_id: String,
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCartItemRequest {
    pub user_id: String,
    pub product_id: String,
    /// New quantity; 0 removes the line.
    pub quantity: i64,
}

/// Current cart with live prices, tax and the local-currency total.
pub async fn get_cart(state: &AppState, user_id: &str) -> Result<CartSummary, ApiError> {
    debug!(user_id = %user_id, "get_cart command");
    summary(state, user_id).await
}

/// Adds units of a product, merging with an existing line.
pub async fn add_to_cart(state: &AppState, request: AddToCartRequest) -> Result<CartSummary, ApiError> {
    debug!(
        user_id = %request.user_id,
        product_id = %request.product_id,
        quantity = request.quantity,
        "add_to_cart command"
    );

    let quantity = state
        .db
        .carts()
        .add_item(&request.user_id, &request.product_id, request.quantity)
        .await?;

    info!(product_id = %request.product_id, quantity, "Cart line updated");
    summary(state, &request.user_id).await
}

pub async fn update_cart_item(
    state: &AppState,
    request: UpdateCartItemRequest,
) -> Result<CartSummary, ApiError> {
    debug!(
        user_id = %request.user_id,
        product_id = %request.product_id,
        quantity = request.quantity,
        "update_cart_item command"
    );

    state
        .db
        .carts()
        .set_quantity(&request.user_id, &request.product_id, request.quantity)
        .await?;

    summary(state, &request.user_id).await
}

pub async fn remove_from_cart(
    state: &AppState,
    user_id: &str,
    product_id: &str,
) -> Result<CartSummary, ApiError> {
    debug!(user_id = %user_id, product_id = %product_id, "remove_from_cart command");

    if !state.db.carts().remove_item(user_id, product_id).await? {
        return Err(ApiError::not_found("Cart item", product_id));
    }

    summary(state, user_id).await
}

pub async fn clear_cart(state: &AppState, user_id: &str) -> Result<CartSummary, ApiError> {
    let removed = state.db.carts().clear(user_id).await?;
    debug!(user_id = %user_id, removed, "clear_cart command");
    summary(state, user_id).await
}

async fn summary(state: &AppState, user_id: &str) -> Result<CartSummary, ApiError> {
    let summary = state
        .db
        .carts()
        .summary(user_id, state.tax_rate(), state.exchange_rate())
        .await?;
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::state::test_support::{seed_product, seed_user, test_state};

    #[tokio::test]
    async fn test_cart_flow() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;
        let arroz = seed_product(&state, "ARZ-1", 1000, 10).await;
        let leche = seed_product(&state, "LEC-1", 500, 10).await;

        let empty = get_cart(&state, &user.id).await.unwrap();
        assert_eq!(empty.item_count, 0);
        assert_eq!(empty.total_cents, 0);

        add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: arroz.id.clone(),
                quantity: 2,
            },
        )
        .await
        .unwrap();
        let cart = add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: leche.id.clone(),
                quantity: 3,
            },
        )
        .await
        .unwrap();

        // 2×10.00 + 3×5.00 = 35.00, tax 6.30, total 41.30 → 287.45 at 6.96
        assert_eq!(cart.item_count, 2);
        assert_eq!(cart.total_quantity, 5);
        assert_eq!(cart.subtotal_cents, 3500);
        assert_eq!(cart.tax_cents, 630);
        assert_eq!(cart.total_cents, 4130);
        assert_eq!(cart.local_total_cents, 28745);

        let cart = update_cart_item(
            &state,
            UpdateCartItemRequest {
                user_id: user.id.clone(),
                product_id: leche.id.clone(),
                quantity: 0,
            },
        )
        .await
        .unwrap();
        assert_eq!(cart.item_count, 1);

        let cart = remove_from_cart(&state, &user.id, &arroz.id).await.unwrap();
        assert_eq!(cart.item_count, 0);

        let err = remove_from_cart(&state, &user.id, &arroz.id).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_add_rejections_map_to_codes() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;
        let product = seed_product(&state, "ARZ-1", 1000, 10).await;

        let err = add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
                quantity: 0,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let err = add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: "missing".to_string(),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_clear_cart() {
        let state = test_state().await;
        let user = seed_user(&state, "ana").await;
        let product = seed_product(&state, "ARZ-1", 1000, 10).await;

        add_to_cart(
            &state,
            AddToCartRequest {
                user_id: user.id.clone(),
                product_id: product.id.clone(),
                quantity: 4,
            },
        )
        .await
        .unwrap();

        let cart = clear_cart(&state, &user.id).await.unwrap();
        assert_eq!(cart.item_count, 0);
        assert_eq!(cart.total_cents, 0);
    }
}
