//! Checkout error types.

use std::time::Duration;

use common::{ProductId, UserId};
use store::StoreError;
use thiserror::Error;

/// Errors returned by a payment gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// The gateway answered with a non-success status.
    #[error("payment gateway rejected the request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The request never got an answer.
    #[error("payment gateway transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// No answer within the allowed time.
    #[error("payment gateway timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors that can occur during checkout.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The user has no cart record at all.
    #[error("cart not found for user {0}")]
    CartNotFound(UserId),

    /// The cart exists but has no line items.
    #[error("cart is empty")]
    CartEmpty,

    /// A line could not be reserved.
    #[error("insufficient inventory for product {product_id}: requested {requested}")]
    InsufficientInventory {
        product_id: ProductId,
        requested: u32,
    },

    /// The cart total does not fit in the money type.
    #[error("checkout amount is too large")]
    AmountOverflow,

    /// Creating the payment intent failed.
    #[error("payment gateway failure: {0}")]
    PaymentGateway(#[from] GatewayError),

    /// A persistence call failed.
    #[error("store failure: {0}")]
    Store(#[from] StoreError),
}

impl CheckoutError {
    /// Short label for the `checkout_failed` metric.
    pub fn reason(&self) -> &'static str {
        match self {
            CheckoutError::CartNotFound(_) => "cart_not_found",
            CheckoutError::CartEmpty => "cart_empty",
            CheckoutError::InsufficientInventory { .. } => "insufficient_inventory",
            CheckoutError::AmountOverflow => "amount_overflow",
            CheckoutError::PaymentGateway(_) => "payment_gateway",
            CheckoutError::Store(_) => "store",
        }
    }
}

/// Convenience type alias for checkout results.
pub type Result<T> = std::result::Result<T, CheckoutError>;
