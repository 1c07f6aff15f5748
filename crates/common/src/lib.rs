//! Shared types for the store backend.
//!
//! Identifiers, money in integer minor units, and the data model that the
//! store, domain, and checkout crates agree on.

pub mod ids;
pub mod model;
pub mod money;

pub use ids::{ProductId, UserId};
pub use model::{Cart, CartLineItem, NewProduct, NewUser, Product, User};
pub use money::Money;
