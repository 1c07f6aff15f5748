//! Compensation ledger for inventory reservations.

use common::ProductId;
use store::InventoryStore;

/// One reservation that succeeded during a checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Reservations made by one checkout, kept so they can be undone.
///
/// Releases run newest first, the reverse of the order the reservations were
/// taken in.
#[derive(Debug, Default)]
pub struct ReservationLedger {
    entries: Vec<Reservation>,
}

/// What a compensation pass managed to undo.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CompensationReport {
    pub released: usize,
    pub failed: Vec<Reservation>,
}

impl CompensationReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

impl ReservationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reservation that has already been applied to the store.
    pub fn record(&mut self, product_id: ProductId, quantity: u32) {
        self.entries.push(Reservation {
            product_id,
            quantity,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    fn entries(&self) -> &[Reservation] {
        &self.entries
    }

    /// Releases every recorded reservation, newest first, and empties the ledger.
    ///
    /// A failed release does not stop the pass; it is logged and reported.
    pub async fn release_all<S: InventoryStore + ?Sized>(&mut self, store: &S) -> CompensationReport {
        let mut report = CompensationReport::default();

        while let Some(entry) = self.entries.pop() {
            match store.release(entry.product_id, entry.quantity).await {
                Ok(()) => {
                    metrics::counter!("checkout_compensations_total", "outcome" => "released")
                        .increment(1);
                    tracing::debug!(
                        product_id = %entry.product_id,
                        quantity = entry.quantity,
                        "reservation released"
                    );
                    report.released += 1;
                }
                Err(e) => {
                    metrics::counter!("checkout_compensations_total", "outcome" => "failed")
                        .increment(1);
                    tracing::error!(
                        product_id = %entry.product_id,
                        quantity = entry.quantity,
                        error = %e,
                        "failed to release reservation"
                    );
                    report.failed.push(entry);
                }
            }
        }

        report
    }
}
