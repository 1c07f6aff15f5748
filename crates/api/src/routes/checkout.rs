//! Checkout endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use store::Store;

use super::AppState;
use crate::auth::Caller;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct CheckoutResponse {
    pub message: &'static str,
    pub total_paid_cents: i64,
    pub payment_intent_id: String,
    pub client_secret: String,
}

/// POST /api/checkout — reserve the caller's cart and create a payment intent.
#[tracing::instrument(skip(state))]
pub async fn checkout<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    caller: Caller,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let result = state.checkout.checkout(caller.user_id).await?;

    Ok(Json(CheckoutResponse {
        message: "Checkout successful. Payment initiated.",
        total_paid_cents: result.total.cents(),
        payment_intent_id: result.payment_intent_id,
        client_secret: result.client_secret,
    }))
}
