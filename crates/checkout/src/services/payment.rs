//! Payment gateway trait and in-memory implementation.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use common::Money;
use serde::Deserialize;

use crate::error::GatewayError;

/// A request to create a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntentRequest {
    /// Amount in minor currency units.
    pub amount: Money,
    /// Lowercase ISO currency code, e.g. `usd`.
    pub currency: String,
    pub description: String,
    /// Unique per checkout attempt so the gateway can deduplicate a retried
    /// request.
    pub idempotency_key: String,
}

/// A payment intent created by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Token the client uses to confirm the payment.
    pub client_secret: String,
}

/// Trait for creating payment intents.
///
/// A successful call is irreversible from this system's side.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError>;
}

#[async_trait]
impl<T: PaymentGateway + ?Sized> PaymentGateway for Arc<T> {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        (**self).create_intent(request).await
    }
}

#[derive(Debug, Default)]
struct InMemoryPaymentState {
    calls: Vec<IntentRequest>,
    intents: Vec<PaymentIntent>,
    next_id: u32,
    fail_on_create: bool,
    delay: Option<Duration>,
}

/// In-memory payment gateway for local runs and tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPaymentGateway {
    state: Arc<Mutex<InMemoryPaymentState>>,
}

impl InMemoryPaymentGateway {
    /// Creates a new in-memory payment gateway.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, InMemoryPaymentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Configures every following call to fail.
    pub fn set_fail_on_create(&self, fail: bool) {
        self.state().fail_on_create = fail;
    }

    /// Makes every following call wait before answering.
    pub fn set_delay(&self, delay: Option<Duration>) {
        self.state().delay = delay;
    }

    /// Returns how many times `create_intent` was called, failed calls included.
    pub fn call_count(&self) -> usize {
        self.state().calls.len()
    }

    /// Returns every request received, in call order.
    pub fn calls(&self) -> Vec<IntentRequest> {
        self.state().calls.clone()
    }

    /// Returns the number of intents created.
    pub fn intent_count(&self) -> usize {
        self.state().intents.len()
    }
}

#[async_trait]
impl PaymentGateway for InMemoryPaymentGateway {
    async fn create_intent(&self, request: IntentRequest) -> Result<PaymentIntent, GatewayError> {
        let delay = {
            let mut state = self.state();
            state.calls.push(request);
            state.delay
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state();
        if state.fail_on_create {
            return Err(GatewayError::Rejected {
                status: 402,
                message: "card declined".to_string(),
            });
        }

        state.next_id += 1;
        let intent = PaymentIntent {
            id: format!("pi_{:06}", state.next_id),
            client_secret: format!("pi_{:06}_secret", state.next_id),
        };
        state.intents.push(intent.clone());
        Ok(intent)
    }
}
