use async_trait::async_trait;

use crate::{Cart, NewProduct, NewUser, Product, ProductId, Result, User, UserId};

/// Per-product available quantity.
///
/// All implementations must be thread-safe (Send + Sync) and must implement
/// `reserve` as one atomic operation against the persisted value, never as a
/// read followed by a separate write.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    /// Decrements available inventory by `quantity` only if at least
    /// `quantity` units are available.
    ///
    /// Fails with `InsufficientInventory` otherwise, leaving the stock
    /// untouched. An unknown product has no stock and fails the same way.
    async fn reserve(&self, product_id: ProductId, quantity: u32) -> Result<()>;

    /// Credits `quantity` units back to a product.
    ///
    /// Used to compensate reservations made by a checkout that later failed.
    async fn release(&self, product_id: ProductId, quantity: u32) -> Result<()>;
}

/// Per-user carts.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Returns the user's cart, creating an empty one if none exists.
    async fn find_by_user(&self, user_id: UserId) -> Result<Cart>;

    /// Returns the user's cart without creating it.
    async fn get_by_user(&self, user_id: UserId) -> Result<Option<Cart>>;

    /// Persists the cart's full item list, replacing what was stored.
    async fn save(&self, cart: &Cart) -> Result<()>;

    /// Removes every line item but keeps the cart record for reuse.
    async fn clear(&self, user_id: UserId) -> Result<()>;
}

/// The product catalog.
#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Inserts a new active product.
    async fn create_product(&self, product: NewProduct) -> Result<Product>;

    /// Loads a product by ID.
    async fn find_product(&self, product_id: ProductId) -> Result<Option<Product>>;

    /// Lists active products, optionally filtered by a case-insensitive
    /// substring of name or description.
    async fn list_products(&self, query: Option<&str>) -> Result<Vec<Product>>;
}

/// Registered accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Duplicate` if the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    async fn find_user(&self, user_id: UserId) -> Result<Option<User>>;
}

/// Everything a full backend provides.
pub trait Store: InventoryStore + CartStore + ProductStore + UserStore + Clone + 'static {}

impl<T> Store for T where T: InventoryStore + CartStore + ProductStore + UserStore + Clone + 'static {}
