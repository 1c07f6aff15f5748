//! Cart mutations: add, remove, view.

mod commands;
mod service;

pub use commands::{AddToCart, RemoveFromCart};
pub use service::CartService;

use common::ProductId;
use thiserror::Error;

/// Errors that can occur during cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Quantity must be positive.
    #[error("invalid quantity: {quantity} (must be greater than 0)")]
    InvalidQuantity { quantity: u32 },

    /// Merged quantity does not fit.
    #[error("quantity for product {product_id} is too large")]
    QuantityTooLarge { product_id: ProductId },

    /// Cart total would not fit in the money type.
    #[error("cart total is too large")]
    TotalTooLarge,

    /// Product does not exist or is no longer sold.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// Requested more than is currently available.
    #[error("insufficient product inventory for {product_id}: requested {requested}, available {available}")]
    InsufficientInventory {
        product_id: ProductId,
        requested: u32,
        available: u32,
    },

    /// Removal of a product that has no line in the cart.
    #[error("product not found in cart: {0}")]
    ItemNotInCart(ProductId),
}
