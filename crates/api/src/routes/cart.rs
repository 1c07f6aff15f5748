//! Cart endpoints for the authenticated user.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use common::{Cart, ProductId};
use domain::{AddToCart, RemoveFromCart};
use serde::{Deserialize, Serialize};
use store::Store;

use super::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct CartItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}

#[derive(Serialize)]
pub struct CartItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: u32,
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Serialize)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    pub total_cents: i64,
    /// Major units with two decimals, e.g. `"12.34"`.
    pub total: String,
}

impl CartResponse {
    /// Builds the response, refusing carts whose total cannot be represented.
    fn from_cart(cart: Cart) -> Result<Self, ApiError> {
        let user_id = cart.user_id;
        let overflow = || ApiError::Internal(format!("cart total overflows for user {user_id}"));
        let total = cart.total().ok_or_else(overflow)?;

        let items = cart
            .items
            .iter()
            .map(|item| {
                Ok(CartItemResponse {
                    product_id: item.product_id.to_string(),
                    product_name: item.product_name.clone(),
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price.cents(),
                    line_total_cents: item.total_price().ok_or_else(overflow)?.cents(),
                })
            })
            .collect::<Result<Vec<_>, ApiError>>()?;

        Ok(Self {
            items,
            total_cents: total.cents(),
            total: total.to_string(),
        })
    }
}

/// GET /api/cart — view the caller's cart.
#[tracing::instrument(skip(state))]
pub async fn view<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state.carts.view_cart(caller.user_id).await?;
    Ok(Json(CartResponse::from_cart(cart)?))
}

/// POST /api/cart/add — add units of a product to the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn add<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .add_to_cart(AddToCart::new(caller.user_id, req.product_id, req.quantity))
        .await?;
    Ok(Json(CartResponse::from_cart(cart)?))
}

/// POST /api/cart/remove — take units of a product out of the caller's cart.
#[tracing::instrument(skip(state, req))]
pub async fn remove<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
    Json(req): Json<CartItemRequest>,
) -> Result<Json<CartResponse>, ApiError> {
    let cart = state
        .carts
        .remove_from_cart(RemoveFromCart::new(
            caller.user_id,
            req.product_id,
            req.quantity,
        ))
        .await?;
    Ok(Json(CartResponse::from_cart(cart)?))
}
