//! Pure pipeline policy: which ledger effect each accrual outcome causes.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::error;

use super::client::Outcome;
use crate::models::{OrderStatus, OrderUpdate};
use crate::store::Ledger;

pub struct ProcessingService {
    ledger: Arc<dyn Ledger>,
    process_delay: Duration,
    max_attempts: u32,
}

impl ProcessingService {
    pub fn new(ledger: Arc<dyn Ledger>, process_delay: Duration, max_attempts: u32) -> Self {
        Self {
            ledger,
            process_delay,
            max_attempts,
        }
    }

    /// Claims the orders due for processing. A store failure is logged and
    /// yields an empty batch; the poller simply tries again next tick.
    pub async fn list_due(&self) -> Vec<String> {
        let statuses = [OrderStatus::New, OrderStatus::Processing];
        match self
            .ledger
            .claim_orders_for_processing(&statuses, self.process_delay)
            .await
        {
            Ok(numbers) => numbers,
            Err(err) => {
                error!(error = %err, "failed to claim orders for processing");
                Vec::new()
            }
        }
    }

    /// Applies the ledger effect for one outcome. Failures never abort the
    /// worker: they are logged and the order is revisited once its claim
    /// stamp ages out.
    pub async fn apply(&self, outcome: Outcome) {
        let result = match outcome {
            Outcome::Processed { number, accrual } => {
                self.ledger
                    .complete_order(&OrderUpdate {
                        number,
                        status: OrderStatus::Processed,
                        accrual,
                    })
                    .await
            }
            Outcome::InProgress { number } => {
                self.ledger
                    .complete_order(&OrderUpdate {
                        number,
                        status: OrderStatus::Processing,
                        accrual: Decimal::ZERO,
                    })
                    .await
            }
            Outcome::Invalid { number } => {
                self.ledger
                    .complete_order(&OrderUpdate {
                        number,
                        status: OrderStatus::Invalid,
                        accrual: Decimal::ZERO,
                    })
                    .await
            }
            Outcome::NotRegistered { number } | Outcome::Malformed { number } => {
                self.ledger
                    .demote_or_reject_order(
                        &number,
                        OrderStatus::New,
                        OrderStatus::Invalid,
                        self.max_attempts,
                    )
                    .await
            }
            // No ledger effect; the order keeps its stamped updated_at and
            // is redrawn after the configured delay.
            Outcome::RateLimited { .. } | Outcome::RemoteError | Outcome::Unexpected { .. } => {
                return;
            }
        };

        if let Err(err) = result {
            error!(error = %err, "failed to apply accrual outcome");
        }
    }
}
