//! In-memory [`Ledger`] used by unit tests. Mutations are recorded so tests
//! can assert which operations a service drove.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;

use super::{Ledger, StoreError};
use crate::models::{Balance, Order, OrderStatus, OrderUpdate, User, Withdrawal};

#[derive(Default)]
pub struct MockLedger {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    orders: Vec<Order>,
    balances: HashMap<i64, Balance>,
    withdrawals: Vec<Withdrawal>,
    due: Vec<String>,
    completed: Vec<OrderUpdate>,
    demoted: Vec<String>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Numbers the next `claim_orders_for_processing` call hands out.
    pub fn seed_due(&self, numbers: &[&str]) {
        let mut state = self.state.lock().unwrap();
        state.due = numbers.iter().map(|n| n.to_string()).collect();
    }

    pub fn seed_order(&self, number: &str, user_id: i64, status: OrderStatus, attempts: i32) {
        let now = Utc::now();
        self.state.lock().unwrap().orders.push(Order {
            number: number.to_string(),
            user_id,
            status,
            accrual: Decimal::ZERO,
            attempts,
            uploaded_at: now,
            updated_at: now,
        });
    }

    pub fn set_balance(&self, user_id: i64, current: Decimal) {
        let mut state = self.state.lock().unwrap();
        let entry = state.balances.entry(user_id).or_insert(Balance {
            user_id,
            current: Decimal::ZERO,
            debited: Decimal::ZERO,
        });
        entry.current = current;
    }

    pub fn completed(&self) -> Vec<OrderUpdate> {
        self.state.lock().unwrap().completed.clone()
    }

    pub fn demoted(&self) -> Vec<String> {
        self.state.lock().unwrap().demoted.clone()
    }

    pub fn order(&self, number: &str) -> Option<Order> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.number == number)
            .cloned()
    }
}

#[async_trait]
impl Ledger for MockLedger {
    async fn create_user(&self, login: &str, hash: &str) -> Result<User, StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.login == login) {
            return Err(StoreError::DuplicateKey);
        }

        let user = User {
            id: state.users.len() as i64 + 1,
            login: login.to_string(),
            hash: hash.to_string(),
            created_at: Utc::now(),
        };
        state.users.push(user.clone());
        state.balances.insert(
            user.id,
            Balance {
                user_id: user.id,
                current: Decimal::ZERO,
                debited: Decimal::ZERO,
            },
        );
        Ok(user)
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.login == login)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        self.state
            .lock()
            .unwrap()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn create_order(&self, number: &str, user_id: i64) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        if state.orders.iter().any(|o| o.number == number) {
            return Err(StoreError::DuplicateKey);
        }

        let now = Utc::now();
        state.orders.push(Order {
            number: number.to_string(),
            user_id,
            status: OrderStatus::New,
            accrual: Decimal::ZERO,
            attempts: 0,
            uploaded_at: now,
            updated_at: now,
        });
        Ok(())
    }

    async fn get_order(&self, number: &str) -> Result<Order, StoreError> {
        self.order(number).ok_or(StoreError::NotFound)
    }

    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn claim_orders_for_processing(
        &self,
        _statuses: &[OrderStatus],
        _delay: Duration,
    ) -> Result<Vec<String>, StoreError> {
        Ok(std::mem::take(&mut self.state.lock().unwrap().due))
    }

    async fn complete_order(&self, update: &OrderUpdate) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.completed.push(update.clone());

        let user_id = match state.orders.iter_mut().find(|o| o.number == update.number) {
            Some(order) => {
                order.status = update.status;
                order.accrual = update.accrual;
                order.attempts = 0;
                order.updated_at = Utc::now();
                order.user_id
            }
            None => return Err(StoreError::NotFound),
        };

        if update.status == OrderStatus::Processed {
            let balance = state
                .balances
                .get_mut(&user_id)
                .ok_or_else(|| StoreError::Corruption(format!("no balance for user {user_id}")))?;
            balance.current += update.accrual;
        }
        Ok(())
    }

    async fn demote_or_reject_order(
        &self,
        number: &str,
        retry: OrderStatus,
        terminal: OrderStatus,
        max_attempts: u32,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        state.demoted.push(number.to_string());

        let order = state
            .orders
            .iter_mut()
            .find(|o| o.number == number)
            .ok_or(StoreError::NoRowsUpdated)?;
        order.status = if order.attempts < max_attempts as i32 {
            retry
        } else {
            terminal
        };
        order.attempts += 1;
        order.updated_at = Utc::now();
        Ok(())
    }

    async fn withdraw(
        &self,
        user_id: i64,
        order_num: &str,
        sum: Decimal,
    ) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap();
        let next_id = state.withdrawals.len() as i64 + 1;

        let balance = state
            .balances
            .get_mut(&user_id)
            .ok_or(StoreError::NoRowsUpdated)?;
        if balance.current < sum {
            return Err(StoreError::NoRowsUpdated);
        }
        balance.current -= sum;
        balance.debited += sum;

        state.withdrawals.push(Withdrawal {
            id: next_id,
            user_id,
            order_number: order_num.to_string(),
            sum,
            processed_at: Utc::now(),
        });
        Ok(())
    }

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        self.state
            .lock()
            .unwrap()
            .balances
            .get(&user_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, StoreError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .withdrawals
            .iter()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect())
    }
}
