use std::sync::Arc;

use crate::service::{AuthService, BalanceService, OrderService, WithdrawalService};
use crate::store::Ledger;

/// Shared application state for the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub orders: Arc<OrderService>,
    pub balance: Arc<BalanceService>,
    pub withdrawals: Arc<WithdrawalService>,
}

impl AppState {
    pub fn new(ledger: Arc<dyn Ledger>, jwt_secret: &str) -> Self {
        Self {
            auth: Arc::new(AuthService::new(ledger.clone(), jwt_secret)),
            orders: Arc::new(OrderService::new(ledger.clone())),
            balance: Arc::new(BalanceService::new(ledger.clone())),
            withdrawals: Arc::new(WithdrawalService::new(ledger)),
        }
    }
}
