//! Persistence for the store backend.
//!
//! Defines the contracts the cart and checkout layers depend on, plus an
//! in-memory backend and a PostgreSQL backend. The inventory contract is the
//! one that matters under concurrency: [`InventoryStore::reserve`] is a single
//! atomic check-and-decrement in every backend.

pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;

pub use common::{Cart, CartLineItem, Money, NewProduct, NewUser, Product, ProductId, User, UserId};
pub use error::{Result, StoreError};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::{CartStore, InventoryStore, ProductStore, Store, UserStore};
