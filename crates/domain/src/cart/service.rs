//! Cart service providing add/remove/view over the cart and product stores.

use common::{Cart, CartLineItem, Product, UserId};
use store::{CartStore, ProductStore};

use crate::error::DomainError;
use crate::locks::UserLocks;

use super::{AddToCart, CartError, RemoveFromCart};

/// Service for mutating users' carts.
///
/// Every mutation runs under the user's lock from [`UserLocks`], the same lock
/// checkout holds, so a cart never changes underneath an in-flight checkout.
pub struct CartService<S> {
    store: S,
    locks: UserLocks,
}

impl<S: CartStore + ProductStore> CartService<S> {
    /// Creates a new cart service.
    pub fn new(store: S, locks: UserLocks) -> Self {
        Self { store, locks }
    }

    /// Adds units of a product, merging into an existing line for that product.
    ///
    /// The inventory check here is advisory and reserves nothing; checkout
    /// re-checks atomically.
    #[tracing::instrument(skip(self))]
    pub async fn add_to_cart(&self, cmd: AddToCart) -> Result<Cart, DomainError> {
        if cmd.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: cmd.quantity,
            }
            .into());
        }

        let product = self
            .store
            .find_product(cmd.product_id)
            .await?
            .filter(|p| p.active)
            .ok_or(CartError::ProductNotFound(cmd.product_id))?;

        if cmd.quantity > product.inventory {
            return Err(CartError::InsufficientInventory {
                product_id: product.id,
                requested: cmd.quantity,
                available: product.inventory,
            }
            .into());
        }

        let _guard = self.locks.acquire(cmd.user_id).await;
        let mut cart = self.store.find_by_user(cmd.user_id).await?;
        merge_line(&mut cart, &product, cmd.quantity)?;
        self.store.save(&cart).await?;

        metrics::counter!("cart_mutations_total", "op" => "add").increment(1);
        tracing::debug!(items = cart.items.len(), "cart updated");
        Ok(cart)
    }

    /// Takes units of a product out of the cart.
    ///
    /// Removing at least the line's quantity drops the line entirely.
    #[tracing::instrument(skip(self))]
    pub async fn remove_from_cart(&self, cmd: RemoveFromCart) -> Result<Cart, DomainError> {
        if cmd.quantity == 0 {
            return Err(CartError::InvalidQuantity {
                quantity: cmd.quantity,
            }
            .into());
        }

        let _guard = self.locks.acquire(cmd.user_id).await;
        let mut cart = self.store.find_by_user(cmd.user_id).await?;
        take_quantity(&mut cart, &cmd)?;
        self.store.save(&cart).await?;

        metrics::counter!("cart_mutations_total", "op" => "remove").increment(1);
        Ok(cart)
    }

    /// Returns the cart as stored, creating an empty one on first access.
    #[tracing::instrument(skip(self))]
    pub async fn view_cart(&self, user_id: UserId) -> Result<Cart, DomainError> {
        Ok(self.store.find_by_user(user_id).await?)
    }
}

/// Sums into the existing line for the product, or appends a snapshot line.
///
/// The merged cart must still have a representable total.
fn merge_line(cart: &mut Cart, product: &Product, quantity: u32) -> Result<(), CartError> {
    match cart
        .items
        .iter_mut()
        .find(|item| item.product_id == product.id)
    {
        Some(item) => {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or(CartError::QuantityTooLarge {
                    product_id: product.id,
                })?;
        }
        None => cart.items.push(CartLineItem::snapshot(product, quantity)),
    }

    if cart.total().is_none() {
        return Err(CartError::TotalTooLarge);
    }
    Ok(())
}

/// Decrements the matching line in place, or drops it when nothing would remain.
fn take_quantity(cart: &mut Cart, cmd: &RemoveFromCart) -> Result<(), CartError> {
    let index = cart
        .items
        .iter()
        .position(|item| item.product_id == cmd.product_id)
        .ok_or(CartError::ItemNotInCart(cmd.product_id))?;

    let item = &mut cart.items[index];
    if item.quantity > cmd.quantity {
        item.quantity -= cmd.quantity;
    } else {
        cart.items.remove(index);
    }
    Ok(())
}
