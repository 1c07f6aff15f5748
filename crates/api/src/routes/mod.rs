//! HTTP route handlers.

pub mod cart;
pub mod checkout;
pub mod health;
pub mod metrics;
pub mod products;
pub mod users;

use std::sync::Arc;

use ::checkout::{CheckoutOrchestrator, PaymentGateway};
use domain::{AccountService, CartService, CatalogService};
use store::Store;

use crate::auth::TokenService;

/// Shared application state accessible from all handlers.
pub struct AppState<S: Store> {
    pub accounts: AccountService<S>,
    pub catalog: CatalogService<S>,
    pub carts: CartService<S>,
    pub checkout: CheckoutOrchestrator<S, Arc<dyn PaymentGateway>>,
    pub tokens: TokenService,
}
