//! Wire shapes of the user-facing API.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Balance, Order, OrderStatus, Withdrawal};

#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct OrderItem {
    pub number: String,
    pub status: OrderStatus,
    /// Present only when the recorded accrual is strictly positive.
    #[serde(skip_serializing_if = "Option::is_none", with = "rust_decimal::serde::float_option")]
    pub accrual: Option<Decimal>,
    pub uploaded_at: DateTime<Utc>,
}

impl From<Order> for OrderItem {
    fn from(order: Order) -> Self {
        OrderItem {
            number: order.number,
            status: order.status,
            accrual: (order.accrual > Decimal::ZERO).then_some(order.accrual),
            uploaded_at: order.uploaded_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    #[serde(with = "rust_decimal::serde::float")]
    pub current: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub withdrawn: Decimal,
}

impl From<Balance> for BalanceResponse {
    fn from(balance: Balance) -> Self {
        BalanceResponse {
            current: balance.current,
            withdrawn: balance.debited,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WithdrawRequest {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
}

#[derive(Debug, Serialize)]
pub struct WithdrawalItem {
    pub order: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}

impl From<Withdrawal> for WithdrawalItem {
    fn from(withdrawal: Withdrawal) -> Self {
        WithdrawalItem {
            order: withdrawal.order_number,
            sum: withdrawal.sum,
            processed_at: withdrawal.processed_at,
        }
    }
}
