//! Withdrawal flow: validation, debit and history.

use std::sync::Arc;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::error;

use super::{ServiceError, is_order_number_valid};
use crate::models::Withdrawal;
use crate::store::{Ledger, StoreError};

pub struct WithdrawalService {
    ledger: Arc<dyn Ledger>,
}

impl WithdrawalService {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    /// Debits `sum` points against `order_number`. The order number does not
    /// have to be one the user uploaded, only Luhn-valid.
    pub async fn withdraw(
        &self,
        user_id: i64,
        order_number: &str,
        sum: Decimal,
    ) -> Result<(), ServiceError> {
        if !is_order_number_valid(order_number) {
            return Err(ServiceError::InvalidOrderNumber);
        }
        if sum.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero) <= Decimal::ZERO {
            return Err(ServiceError::InvalidSum);
        }

        match self.ledger.withdraw(user_id, order_number, sum).await {
            Ok(()) => Ok(()),
            Err(StoreError::NoRowsUpdated) => Err(ServiceError::InsufficientFunds),
            Err(err) => {
                error!(error = %err, "failed to withdraw");
                Err(ServiceError::Unexpected)
            }
        }
    }

    pub async fn list(&self, user_id: i64) -> Result<Vec<Withdrawal>, ServiceError> {
        self.ledger
            .list_withdrawals_by_user(user_id)
            .await
            .map_err(|err| {
                error!(error = %err, "failed to list user withdrawals");
                ServiceError::Unexpected
            })
    }
}
