//! Checkout state machine.

/// The state of a single checkout run.
///
/// State transitions:
/// ```text
/// Started ──► ReservingInventory ──► PaymentPending ──► Clearing ──► Completed
///    │                │                    │
///    └──► Failed      └──► Compensating ◄──┘
///                              │
///                              └──► Failed
/// ```
///
/// `Started` fails directly (missing or empty cart) because nothing has been
/// reserved yet. `Clearing` never fails: the payment is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CheckoutState {
    /// Cart loaded, nothing mutated yet.
    #[default]
    Started,

    /// Reserving line quantities in cart order.
    ReservingInventory,

    /// All lines reserved, payment intent being created.
    PaymentPending,

    /// Payment intent created, cart being emptied.
    Clearing,

    /// Releasing reservations after a failure.
    Compensating,

    /// Checkout succeeded (terminal state).
    Completed,

    /// Checkout failed (terminal state).
    Failed,
}

impl CheckoutState {
    /// Returns the state a successful step moves to.
    pub fn next(&self) -> Option<CheckoutState> {
        match self {
            CheckoutState::Started => Some(CheckoutState::ReservingInventory),
            CheckoutState::ReservingInventory => Some(CheckoutState::PaymentPending),
            CheckoutState::PaymentPending => Some(CheckoutState::Clearing),
            CheckoutState::Clearing => Some(CheckoutState::Completed),
            CheckoutState::Compensating => Some(CheckoutState::Failed),
            CheckoutState::Completed | CheckoutState::Failed => None,
        }
    }

    /// Returns true if a failure in this state must release reservations.
    pub fn can_compensate(&self) -> bool {
        matches!(
            self,
            CheckoutState::ReservingInventory | CheckoutState::PaymentPending
        )
    }

    /// Returns true if a failure in this state ends the checkout.
    pub fn can_fail(&self) -> bool {
        matches!(
            self,
            CheckoutState::Started
                | CheckoutState::ReservingInventory
                | CheckoutState::PaymentPending
                | CheckoutState::Compensating
        )
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, CheckoutState::Completed | CheckoutState::Failed)
    }

    /// Returns true if the machine may move from this state to `to`.
    ///
    /// Allowed moves are the next step on success, `Compensating` from a
    /// state holding reservations, and `Failed` from any state that can fail.
    pub fn can_transition_to(&self, to: CheckoutState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match to {
            CheckoutState::Compensating => self.can_compensate(),
            CheckoutState::Failed => self.can_fail(),
            _ => self.next() == Some(to),
        }
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutState::Started => "Started",
            CheckoutState::ReservingInventory => "ReservingInventory",
            CheckoutState::PaymentPending => "PaymentPending",
            CheckoutState::Clearing => "Clearing",
            CheckoutState::Compensating => "Compensating",
            CheckoutState::Completed => "Completed",
            CheckoutState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for CheckoutState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
