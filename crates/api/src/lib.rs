//! HTTP API server for the store backend.
//!
//! Exposes signup/login, the product catalog, per-user carts, and checkout
//! over REST, with structured logging (tracing) and Prometheus metrics.

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::{CheckoutOrchestrator, PaymentGateway};
use domain::{AccountService, CartService, CatalogService, UserLocks};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use auth::TokenService;
use config::Config;
use routes::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/api/signup", post(routes::users::signup::<S>))
        .route("/api/login", post(routes::users::login::<S>))
        .route("/api/products", get(routes::products::list::<S>))
        .route("/api/products/{id}", get(routes::products::get::<S>))
        .route("/api/admin/products", post(routes::products::create::<S>))
        .route("/api/cart", get(routes::cart::view::<S>))
        .route("/api/cart/add", post(routes::cart::add::<S>))
        .route("/api/cart/remove", post(routes::cart::remove::<S>))
        .route("/api/checkout", post(routes::checkout::checkout::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Wires the services over one store and one payment gateway.
///
/// The cart service and the checkout orchestrator share a single
/// [`UserLocks`] so a user's cart edits and checkout never interleave.
pub fn create_state<S: Store>(
    store: S,
    gateway: Arc<dyn PaymentGateway>,
    config: &Config,
) -> Arc<AppState<S>> {
    let locks = UserLocks::new();

    Arc::new(AppState {
        accounts: AccountService::new(store.clone()),
        catalog: CatalogService::new(store.clone()),
        carts: CartService::new(store.clone(), locks.clone()),
        checkout: CheckoutOrchestrator::new(store, gateway, locks, config.checkout_config()),
        tokens: TokenService::new(&config.jwt_secret, config.token_ttl()),
    })
}
