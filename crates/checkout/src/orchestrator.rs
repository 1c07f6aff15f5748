//! Checkout orchestrator: reserve, pay, clear.

use std::time::{Duration, Instant};

use common::{Cart, Money, UserId};
use domain::UserLocks;
use store::{CartStore, InventoryStore, StoreError};
use uuid::Uuid;

use crate::compensation::ReservationLedger;
use crate::error::{CheckoutError, GatewayError, Result};
use crate::services::{IntentRequest, PaymentGateway, PaymentIntent};
use crate::state::CheckoutState;

/// Settings for payment intent creation.
#[derive(Debug, Clone)]
pub struct CheckoutConfig {
    /// Currency sent with every payment intent.
    pub currency: String,
    /// Upper bound for one gateway call.
    pub payment_timeout: Duration,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        Self {
            currency: "usd".to_string(),
            payment_timeout: Duration::from_secs(10),
        }
    }
}

/// Outcome of a successful checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutResult {
    /// Amount charged, computed from the cart's price snapshots.
    pub total: Money,
    pub payment_intent_id: String,
    pub client_secret: String,
}

/// Drives one checkout per call.
///
/// The user's lock from [`UserLocks`] is held from cart load through cart
/// clear, so at most one checkout per user is in flight and cart mutations
/// wait for it. Inventory is all-or-nothing: any failure after a partial
/// reservation releases what was reserved before the error is returned.
pub struct CheckoutOrchestrator<S, P> {
    store: S,
    gateway: P,
    locks: UserLocks,
    config: CheckoutConfig,
}

impl<S, P> CheckoutOrchestrator<S, P>
where
    S: InventoryStore + CartStore,
    P: PaymentGateway,
{
    /// Creates a new checkout orchestrator.
    pub fn new(store: S, gateway: P, locks: UserLocks, config: CheckoutConfig) -> Self {
        Self {
            store,
            gateway,
            locks,
            config,
        }
    }

    /// Checks out the user's cart.
    #[tracing::instrument(skip(self))]
    pub async fn checkout(&self, user_id: UserId) -> Result<CheckoutResult> {
        metrics::counter!("checkout_total").increment(1);
        let started = Instant::now();

        let result = self.run(user_id).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("checkout_duration_seconds").record(duration);
        match &result {
            Ok(outcome) => {
                metrics::counter!("checkout_completed").increment(1);
                tracing::info!(
                    total_cents = outcome.total.cents(),
                    payment_intent_id = %outcome.payment_intent_id,
                    duration,
                    "checkout completed"
                );
            }
            Err(e) => {
                metrics::counter!("checkout_failed", "reason" => e.reason()).increment(1);
                match e {
                    CheckoutError::PaymentGateway(_) | CheckoutError::Store(_) => {
                        tracing::error!(error = %e, "checkout failed");
                    }
                    _ => tracing::info!(error = %e, "checkout rejected"),
                }
            }
        }

        result
    }

    async fn run(&self, user_id: UserId) -> Result<CheckoutResult> {
        let _guard = self.locks.acquire(user_id).await;
        let mut state = CheckoutState::Started;

        let cart = self
            .store
            .get_by_user(user_id)
            .await?
            .ok_or(CheckoutError::CartNotFound(user_id))?;
        if cart.is_empty() {
            return Err(CheckoutError::CartEmpty);
        }

        transition(&mut state, CheckoutState::ReservingInventory);
        let mut ledger = ReservationLedger::new();
        let total = match self.reserve_lines(&cart, &mut ledger).await {
            Ok(total) => total,
            Err(e) => return Err(self.compensate(&mut state, &mut ledger, e).await),
        };

        transition(&mut state, CheckoutState::PaymentPending);
        let intent = match self.create_intent(user_id, total).await {
            Ok(intent) => intent,
            Err(e) => return Err(self.compensate(&mut state, &mut ledger, e.into()).await),
        };

        transition(&mut state, CheckoutState::Clearing);
        if let Err(e) = self.store.clear(user_id).await {
            // The payment is already taken; the cart shows stale items until
            // the next mutation.
            metrics::counter!("cart_clear_failures_total").increment(1);
            tracing::warn!(
                payment_intent_id = %intent.id,
                error = %e,
                "payment succeeded but cart could not be cleared"
            );
        }

        transition(&mut state, CheckoutState::Completed);
        Ok(CheckoutResult {
            total,
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
        })
    }

    /// Reserves every line in cart order and returns the snapshot total.
    async fn reserve_lines(&self, cart: &Cart, ledger: &mut ReservationLedger) -> Result<Money> {
        let mut total = Money::zero();

        for item in &cart.items {
            match self.store.reserve(item.product_id, item.quantity).await {
                Ok(()) => {
                    ledger.record(item.product_id, item.quantity);
                    total = item
                        .total_price()
                        .and_then(|line| total.checked_add(line))
                        .ok_or(CheckoutError::AmountOverflow)?;
                }
                Err(StoreError::InsufficientInventory {
                    product_id,
                    requested,
                }) => {
                    return Err(CheckoutError::InsufficientInventory {
                        product_id,
                        requested,
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(total)
    }

    async fn create_intent(
        &self,
        user_id: UserId,
        total: Money,
    ) -> std::result::Result<PaymentIntent, GatewayError> {
        let request = IntentRequest {
            amount: total,
            currency: self.config.currency.clone(),
            description: format!("E-commerce order from user {user_id}"),
            idempotency_key: format!("checkout-{user_id}-{}", Uuid::new_v4()),
        };

        let timeout = self.config.payment_timeout;
        tokio::time::timeout(timeout, self.gateway.create_intent(request))
            .await
            .map_err(|_| GatewayError::Timeout(timeout))?
    }

    /// Releases the ledger and hands back the error that caused it.
    async fn compensate(
        &self,
        state: &mut CheckoutState,
        ledger: &mut ReservationLedger,
        error: CheckoutError,
    ) -> CheckoutError {
        if state.can_compensate() && !ledger.is_empty() {
            tracing::warn!(
                failed_in = %state,
                reservations = ledger.len(),
                error = %error,
                "releasing reservations of failed checkout"
            );
            transition(state, CheckoutState::Compensating);

            let report = ledger.release_all(&self.store).await;
            if !report.is_clean() {
                tracing::error!(
                    released = report.released,
                    unreleased = report.failed.len(),
                    "inventory left reserved after failed checkout"
                );
            }
        }

        transition(state, CheckoutState::Failed);
        error
    }
}

fn transition(state: &mut CheckoutState, to: CheckoutState) {
    debug_assert!(
        state.can_transition_to(to),
        "illegal checkout transition {state} -> {to}"
    );
    tracing::debug!(from = %state, %to, "checkout state changed");
    *state = to;
}
