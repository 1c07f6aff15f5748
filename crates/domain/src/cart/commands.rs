//! Cart commands.

use common::{ProductId, UserId};

/// Command to add units of a product to a user's cart.
#[derive(Debug, Clone, Copy)]
pub struct AddToCart {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl AddToCart {
    pub fn new(user_id: UserId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
        }
    }
}

/// Command to take units of a product out of a user's cart.
#[derive(Debug, Clone, Copy)]
pub struct RemoveFromCart {
    pub user_id: UserId,
    pub product_id: ProductId,
    pub quantity: u32,
}

impl RemoveFromCart {
    pub fn new(user_id: UserId, product_id: ProductId, quantity: u32) -> Self {
        Self {
            user_id,
            product_id,
            quantity,
        }
    }
}
