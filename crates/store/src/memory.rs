use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
    Cart, NewProduct, NewUser, Product, ProductId, Result, StoreError, User, UserId,
    store::{CartStore, InventoryStore, ProductStore, UserStore},
};

#[derive(Debug, Default)]
struct State {
    products: HashMap<ProductId, Product>,
    carts: HashMap<UserId, Cart>,
    users: HashMap<UserId, User>,
    fail_on_save: bool,
    fail_on_clear: bool,
    fail_on_release: bool,
}

/// In-memory store implementation.
///
/// Backs local development and tests with the same contracts as the
/// PostgreSQL implementation. A reservation holds the write guard across the
/// check and the decrement, which makes it atomic.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<State>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the available inventory of a product.
    pub async fn inventory(&self, product_id: ProductId) -> Option<u32> {
        self.state
            .read()
            .await
            .products
            .get(&product_id)
            .map(|p| p.inventory)
    }

    /// Marks a product inactive, hiding it from listings and cart adds.
    pub async fn deactivate_product(&self, product_id: ProductId) {
        if let Some(product) = self.state.write().await.products.get_mut(&product_id) {
            product.active = false;
        }
    }

    /// Configures cart saves to fail.
    pub async fn set_fail_on_save(&self, fail: bool) {
        self.state.write().await.fail_on_save = fail;
    }

    /// Configures cart clears to fail.
    pub async fn set_fail_on_clear(&self, fail: bool) {
        self.state.write().await.fail_on_clear = fail;
    }

    /// Configures inventory releases to fail.
    pub async fn set_fail_on_release(&self, fail: bool) {
        self.state.write().await.fail_on_release = fail;
    }

    /// Returns the number of cart records, empty ones included.
    pub async fn cart_count(&self) -> usize {
        self.state.read().await.carts.len()
    }
}

#[async_trait]
impl InventoryStore for InMemoryStore {
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;

        match state.products.get_mut(&product_id) {
            Some(product) if product.inventory >= quantity => {
                product.inventory -= quantity;
                metrics::counter!("inventory_reservations_total", "outcome" => "reserved")
                    .increment(1);
                Ok(())
            }
            _ => {
                metrics::counter!("inventory_reservations_total", "outcome" => "insufficient")
                    .increment(1);
                Err(StoreError::InsufficientInventory {
                    product_id,
                    requested: quantity,
                })
            }
        }
    }

    async fn release(&self, product_id: ProductId, quantity: u32) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_release {
            return Err(StoreError::Unavailable("inventory release rejected".to_string()));
        }

        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| StoreError::Unavailable(format!("product {product_id} is gone")))?;

        product.inventory = product.inventory.saturating_add(quantity);
        Ok(())
    }
}

#[async_trait]
impl CartStore for InMemoryStore {
    async fn find_by_user(&self, user_id: UserId) -> Result<Cart> {
        let mut state = self.state.write().await;
        Ok(state
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id))
            .clone())
    }

    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>> {
        Ok(self.state.read().await.carts.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_save {
            return Err(StoreError::Unavailable("cart save rejected".to_string()));
        }

        state.carts.insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn clear(&self, user_id: UserId) -> Result<()> {
        let mut state = self.state.write().await;
        if state.fail_on_clear {
            return Err(StoreError::Unavailable("cart clear rejected".to_string()));
        }

        state
            .carts
            .entry(user_id)
            .or_insert_with(|| Cart::new(user_id))
            .items
            .clear();
        Ok(())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn create_product(&self, product: NewProduct) -> Result<Product> {
        let product = Product {
            id: ProductId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            inventory: product.inventory,
            active: true,
            created_at: Utc::now(),
        };

        self.state
            .write()
            .await
            .products
            .insert(product.id, product.clone());
        Ok(product)
    }

    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>> {
        Ok(self.state.read().await.products.get(&product_id).cloned())
    }

    async fn list_products(&self, query: Option<&str>) -> Result<Vec<Product>> {
        let needle = query.map(str::to_lowercase);
        let state = self.state.read().await;

        let mut products: Vec<Product> = state
            .products
            .values()
            .filter(|p| p.active)
            .filter(|p| match &needle {
                Some(needle) => {
                    p.name.to_lowercase().contains(needle.as_str())
                        || p.description.to_lowercase().contains(needle.as_str())
                }
                None => true,
            })
            .cloned()
            .collect();
        products.sort_by_key(|p| (p.created_at, p.id));
        Ok(products)
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User> {
        let mut state = self.state.write().await;

        if state.users.values().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username {}", user.username)));
        }

        let user = User {
            id: UserId::new(),
            username: user.username,
            password_hash: user.password_hash,
            is_admin: user.is_admin,
            created_at: Utc::now(),
        };
        state.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .state
            .read()
            .await
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CartLineItem, Money};
    use futures_util::future::join_all;

    async fn seed_product(store: &InMemoryStore, inventory: u32) -> Product {
        store
            .create_product(NewProduct {
                name: "Widget".to_string(),
                description: "Blue widget".to_string(),
                price: Money::from_cents(1000),
                inventory,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn reserve_decrements_when_stock_suffices() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5).await;

        store.reserve(product.id, 3).await.unwrap();
        assert_eq!(store.inventory(product.id).await, Some(2));

        store.reserve(product.id, 2).await.unwrap();
        assert_eq!(store.inventory(product.id).await, Some(0));
    }

    #[tokio::test]
    async fn reserve_fails_without_touching_stock() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 2).await;

        let err = store.reserve(product.id, 3).await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::InsufficientInventory { requested: 3, .. }
        ));
        assert_eq!(store.inventory(product.id).await, Some(2));
    }

    #[tokio::test]
    async fn reserve_unknown_product_is_insufficient() {
        let store = InMemoryStore::new();
        let result = store.reserve(ProductId::new(), 1).await;
        assert!(matches!(
            result,
            Err(StoreError::InsufficientInventory { .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_reservations_never_oversell() {
        let store = InMemoryStore::new();
        let product_id = seed_product(&store, 10).await.id;

        let attempts = (0..25).map(|_| {
            let store = store.clone();
            tokio::spawn(async move { store.reserve(product_id, 1).await })
        });
        let results = join_all(attempts).await;

        let succeeded = results
            .into_iter()
            .filter(|r| matches!(r, Ok(Ok(()))))
            .count();
        assert_eq!(succeeded, 10);
        assert_eq!(store.inventory(product_id).await, Some(0));
    }

    #[tokio::test]
    async fn release_credits_stock_back() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 4).await;

        store.reserve(product.id, 4).await.unwrap();
        store.release(product.id, 3).await.unwrap();
        assert_eq!(store.inventory(product.id).await, Some(3));
    }

    #[tokio::test]
    async fn find_by_user_creates_cart_once() {
        let store = InMemoryStore::new();
        let user_id = UserId::new();

        assert!(store.get_by_user(user_id).await.unwrap().is_none());

        let cart = store.find_by_user(user_id).await.unwrap();
        assert!(cart.is_empty());
        assert_eq!(store.cart_count().await, 1);

        store.find_by_user(user_id).await.unwrap();
        assert_eq!(store.cart_count().await, 1);
    }

    #[tokio::test]
    async fn clear_keeps_cart_record() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5).await;
        let user_id = UserId::new();

        let mut cart = store.find_by_user(user_id).await.unwrap();
        cart.items.push(CartLineItem::snapshot(&product, 2));
        store.save(&cart).await.unwrap();

        store.clear(user_id).await.unwrap();

        let cart = store.get_by_user(user_id).await.unwrap().unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn fail_on_clear_leaves_items() {
        let store = InMemoryStore::new();
        let product = seed_product(&store, 5).await;
        let user_id = UserId::new();

        let mut cart = store.find_by_user(user_id).await.unwrap();
        cart.items.push(CartLineItem::snapshot(&product, 1));
        store.save(&cart).await.unwrap();

        store.set_fail_on_clear(true).await;
        assert!(store.clear(user_id).await.is_err());
        assert_eq!(store.get_by_user(user_id).await.unwrap().unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn list_products_filters_inactive_and_query() {
        let store = InMemoryStore::new();
        let widget = seed_product(&store, 1).await;
        let gadget = store
            .create_product(NewProduct {
                name: "Gadget".to_string(),
                description: "Shiny".to_string(),
                price: Money::from_cents(500),
                inventory: 1,
            })
            .await
            .unwrap();

        assert_eq!(store.list_products(None).await.unwrap().len(), 2);

        let found = store.list_products(Some("SHINY")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, gadget.id);

        store.deactivate_product(widget.id).await;
        let active = store.list_products(None).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, gadget.id);
    }

    #[tokio::test]
    async fn duplicate_username_is_rejected() {
        let store = InMemoryStore::new();
        let new_user = NewUser {
            username: "alice".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        };

        let user = store.create_user(new_user.clone()).await.unwrap();
        assert!(matches!(
            store.create_user(new_user).await,
            Err(StoreError::Duplicate(_))
        ));

        let by_name = store.find_user_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(store.find_user(user.id).await.unwrap(), Some(user));
    }
}
