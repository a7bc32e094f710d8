//! Balance reads.

use std::sync::Arc;

use tracing::error;

use super::ServiceError;
use crate::models::Balance;
use crate::store::Ledger;

pub struct BalanceService {
    ledger: Arc<dyn Ledger>,
}

impl BalanceService {
    pub fn new(ledger: Arc<dyn Ledger>) -> Self {
        Self { ledger }
    }

    pub async fn user_balance(&self, user_id: i64) -> Result<Balance, ServiceError> {
        self.ledger.get_balance(user_id).await.map_err(|err| {
            error!(error = %err, user = user_id, "failed to get user balance");
            ServiceError::Unexpected
        })
    }
}
