//! Domain layer for the store backend.
//!
//! This crate provides the services that sit between the HTTP layer and the
//! store:
//! - CartService for add/remove/view with line-item merging
//! - CatalogService for product creation and search
//! - AccountService for signup, login, and admin bootstrap
//! - UserLocks, the per-user single-writer lock shared with checkout

pub mod account;
pub mod cart;
pub mod catalog;
pub mod error;
pub mod locks;

pub use account::AccountService;
pub use cart::{AddToCart, CartError, CartService, RemoveFromCart};
pub use catalog::CatalogService;
pub use error::DomainError;
pub use locks::UserLocks;
