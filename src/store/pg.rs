//! PostgreSQL implementation of the [`Ledger`] contract.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::prelude::FromRow;

use super::{Ledger, StoreError};
use crate::models::{Balance, Order, OrderStatus, OrderUpdate, User, Withdrawal};

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

/// Opens the shared connection pool. Sizing must cover the worker pool's
/// concurrent completions plus API traffic.
pub async fn connect(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await?;

    tracing::info!("ledger connection pool established");
    Ok(pool)
}

/// Applies the embedded migrations. Already-applied migrations are skipped.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn create_user(&self, login: &str, hash: &str) -> Result<User, StoreError> {
        let mut tx = self.pool.begin().await?;

        let (id, created_at): (i64, DateTime<Utc>) =
            sqlx::query_as("INSERT INTO users (login, hash) VALUES ($1, $2) RETURNING id, created_at")
                .bind(login)
                .bind(hash)
                .fetch_one(&mut *tx)
                .await?;

        sqlx::query("INSERT INTO balances (user_id) VALUES ($1)")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(User {
            id,
            login: login.to_owned(),
            hash: hash.to_owned(),
            created_at,
        })
    }

    async fn find_user_by_login(&self, login: &str) -> Result<User, StoreError> {
        let row: UserRow =
            sqlx::query_as("SELECT id, login, hash, created_at FROM users WHERE login = $1")
                .bind(login)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    async fn get_user(&self, id: i64) -> Result<User, StoreError> {
        let row: UserRow =
            sqlx::query_as("SELECT id, login, hash, created_at FROM users WHERE id = $1")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    async fn create_order(&self, number: &str, user_id: i64) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO orders (number, user_id, status) VALUES ($1, $2, $3)")
            .bind(number)
            .bind(user_id)
            .bind(OrderStatus::New.as_str())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_order(&self, number: &str) -> Result<Order, StoreError> {
        let row: OrderRow = sqlx::query_as(
            "SELECT number, user_id, status, accrual, attempts, uploaded_at, updated_at \
             FROM orders WHERE number = $1",
        )
        .bind(number)
        .fetch_one(&self.pool)
        .await?;

        row.try_into()
    }

    async fn list_orders_by_user(&self, user_id: i64) -> Result<Vec<Order>, StoreError> {
        let rows: Vec<OrderRow> = sqlx::query_as(
            "SELECT number, user_id, status, accrual, attempts, uploaded_at, updated_at \
             FROM orders WHERE user_id = $1 ORDER BY uploaded_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Order::try_from).collect()
    }

    async fn claim_orders_for_processing(
        &self,
        statuses: &[OrderStatus],
        delay: Duration,
    ) -> Result<Vec<String>, StoreError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_owned()).collect();

        // Selection and reservation are one statement, so concurrent claims
        // partition the due set instead of racing for it.
        let numbers: Vec<String> = sqlx::query_scalar(
            "UPDATE orders SET updated_at = NOW() \
             WHERE status = ANY($1) \
               AND updated_at < NOW() - (attempts + 1) * ($2 * INTERVAL '1 second') \
             RETURNING number",
        )
        .bind(&statuses)
        .bind(delay.as_secs_f64())
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    async fn complete_order(&self, update: &OrderUpdate) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let user_id: i64 = sqlx::query_scalar(
            "UPDATE orders SET status = $1, accrual = $2, updated_at = NOW(), attempts = 0 \
             WHERE number = $3 RETURNING user_id",
        )
        .bind(update.status.as_str())
        .bind(update.accrual)
        .bind(&update.number)
        .fetch_one(&mut *tx)
        .await?;

        if update.status == OrderStatus::Processed {
            // Lock the balance row before touching it; completes and
            // withdrawals for the same user serialise on this lock.
            sqlx::query_scalar::<_, i64>("SELECT user_id FROM balances WHERE user_id = $1 FOR UPDATE")
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    StoreError::Corruption(format!("balance row missing for user {user_id}"))
                })?;

            let credited = sqlx::query("UPDATE balances SET amount = amount + $1 WHERE user_id = $2")
                .bind(update.accrual)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;

            if credited.rows_affected() == 0 {
                return Err(StoreError::Corruption(format!(
                    "failed to credit balance for user {user_id}"
                )));
            }
        }

        tx.commit().await?;
        Ok(())
    }

    async fn demote_or_reject_order(
        &self,
        number: &str,
        retry: OrderStatus,
        terminal: OrderStatus,
        max_attempts: u32,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE orders \
             SET status = CASE WHEN attempts < $1 THEN $2 ELSE $3 END, \
                 attempts = attempts + 1, \
                 updated_at = NOW() \
             WHERE number = $4",
        )
        .bind(max_attempts as i32)
        .bind(retry.as_str())
        .bind(terminal.as_str())
        .bind(number)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() != 1 {
            return Err(StoreError::NoRowsUpdated);
        }

        Ok(())
    }

    async fn withdraw(
        &self,
        user_id: i64,
        order_num: &str,
        sum: Decimal,
    ) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // The conditional update is the atomicity point: it debits only when
        // the balance covers the sum, so the non-negative invariant holds
        // without a separate read.
        let debited = sqlx::query(
            "UPDATE balances SET amount = amount - $2, debited = debited + $2 \
             WHERE user_id = $1 AND amount >= $2",
        )
        .bind(user_id)
        .bind(sum)
        .execute(&mut *tx)
        .await?;

        if debited.rows_affected() == 0 {
            return Err(StoreError::NoRowsUpdated);
        }

        sqlx::query("INSERT INTO withdrawals (user_id, order_num, sum) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(order_num)
            .bind(sum)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn get_balance(&self, user_id: i64) -> Result<Balance, StoreError> {
        let row: BalanceRow =
            sqlx::query_as("SELECT user_id, amount, debited FROM balances WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(row.into())
    }

    async fn list_withdrawals_by_user(&self, user_id: i64) -> Result<Vec<Withdrawal>, StoreError> {
        let rows: Vec<WithdrawalRow> = sqlx::query_as(
            "SELECT id, user_id, order_num, sum, processed_at \
             FROM withdrawals WHERE user_id = $1 ORDER BY processed_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Withdrawal::from).collect())
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    login: String,
    hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            login: row.login,
            hash: row.hash,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    number: String,
    user_id: i64,
    status: String,
    accrual: Decimal,
    attempts: i32,
    uploaded_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = StoreError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let status = OrderStatus::from_str(&row.status).ok_or_else(|| {
            StoreError::Corruption(format!("order {} has unknown status {}", row.number, row.status))
        })?;

        Ok(Order {
            number: row.number,
            user_id: row.user_id,
            status,
            accrual: row.accrual,
            attempts: row.attempts,
            uploaded_at: row.uploaded_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct BalanceRow {
    user_id: i64,
    amount: Decimal,
    debited: Decimal,
}

impl From<BalanceRow> for Balance {
    fn from(row: BalanceRow) -> Self {
        Balance {
            user_id: row.user_id,
            current: row.amount,
            debited: row.debited,
        }
    }
}

#[derive(Debug, FromRow)]
struct WithdrawalRow {
    id: i64,
    user_id: i64,
    order_num: String,
    sum: Decimal,
    processed_at: DateTime<Utc>,
}

impl From<WithdrawalRow> for Withdrawal {
    fn from(row: WithdrawalRow) -> Self {
        Withdrawal {
            id: row.id,
            user_id: row.user_id,
            order_number: row.order_num,
            sum: row.sum,
            processed_at: row.processed_at,
        }
    }
}
