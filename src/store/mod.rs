//! Transactional persistence of users, orders, balances and withdrawals.
//!
//! The [`Ledger`] trait is the narrow contract the services and the accrual
//! pipeline are written against; [`pg::PgLedger`] is the PostgreSQL
//! implementation. Multi-statement operations are database transactions and
//! the concurrency discipline (row locks, conditional updates, claim-and-stamp)
//! lives entirely in this layer.

pub mod error;
pub mod pg;

#[cfg(test)]
pub(crate) mod mock;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::models::{Balance, Order, OrderStatus, OrderUpdate, User, Withdrawal};

pub use error::StoreError;
pub use pg::PgLedger;

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Inserts the user together with a zero balance, atomically.
    async fn create_user(&self, login: &str, hash: &str) -> Result<User, StoreError>;

    async fn find_user_by_login(&self, login: &str) -> Result<User, StoreError>;

    async fn get_user(&self, id: i64) -> Result<User, StoreError>;

    /// Inserts with status NEW and zero attempts. `DuplicateKey` regardless
    /// of which user owns the existing row.
    async fn create_order(&self, number: &str, user_id: i64) -> Result<(), StoreError>;

    async fn get_order(&self, number: &str) -> Result<Order, StoreError>;

    /// Orders of one user in upload order.
    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError>;

    /// Selects every order whose status is in `statuses` and whose last
    /// transition is older than `(attempts + 1) * delay`, stamping each
    /// selected row's `updated_at` in the same statement. The stamp is a
    /// lightweight reservation: concurrent callers receive disjoint sets.
    async fn claim_orders_for_processing(
        &self,
        statuses: &[OrderStatus],
        delay: Duration,
    ) -> Result<Vec<String>, StoreError>;

    /// Applies a pipeline transition and, for PROCESSED, credits the owner's
    /// balance under a row lock in the same transaction. A missing balance
    /// row aborts with `Corruption`.
    async fn complete_order(&self, update: &OrderUpdate) -> Result<(), StoreError>;

    /// Single statement: `status = retry if attempts < max_attempts else
    /// terminal`, `attempts += 1`. Exactly one row must be affected.
    async fn demote_or_reject_order(
        &self,
        number: &str,
        retry: OrderStatus,
        terminal: OrderStatus,
        max_attempts: u32,
    ) -> Result<(), StoreError>;

    /// Conditionally debits the balance and records the withdrawal in one
    /// transaction. `NoRowsUpdated` when the balance does not cover `sum`.
    async fn withdraw(
        &self,
        user_id: i64,
        order_num: &str,
        sum: Decimal,
    ) -> Result<(), StoreError>;

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError>;

    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, StoreError>;
}
