//! Payment gateway contract and its implementations.

pub mod http;
pub mod payment;

pub use http::HttpPaymentGateway;
pub use payment::{InMemoryPaymentGateway, IntentRequest, PaymentGateway, PaymentIntent};
