//! Checkout orchestration for the store backend.
//!
//! A checkout turns a user's cart into reserved inventory and a payment
//! intent:
//! 1. Reserve every line's quantity, in cart order
//! 2. Create a payment intent for the snapshot total
//! 3. Clear the cart
//!
//! If a reservation or the payment call fails, every reservation already
//! made by that checkout is released in reverse order before the error is
//! returned. A failed cart clear after payment is logged and swallowed.

pub mod compensation;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod state;

pub use compensation::ReservationLedger;
pub use error::{CheckoutError, GatewayError, Result};
pub use orchestrator::{CheckoutConfig, CheckoutOrchestrator, CheckoutResult};
pub use services::{
    HttpPaymentGateway, InMemoryPaymentGateway, IntentRequest, PaymentGateway, PaymentIntent,
};
pub use state::CheckoutState;
