//! Ledger entities shared by the API, the services and the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

pub const MAX_LOGIN_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub login: String,
    pub hash: String,
    pub created_at: DateTime<Utc>,
}

/// Order lifecycle. NEW and PROCESSING are retryable; INVALID and PROCESSED
/// are terminal and never re-enter the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    New,
    Processing,
    Invalid,
    Processed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::New => "NEW",
            OrderStatus::Processing => "PROCESSING",
            OrderStatus::Invalid => "INVALID",
            OrderStatus::Processed => "PROCESSED",
        }
    }

    pub fn from_str(status: &str) -> Option<Self> {
        match status {
            "NEW" => Some(OrderStatus::New),
            "PROCESSING" => Some(OrderStatus::Processing),
            "INVALID" => Some(OrderStatus::Invalid),
            "PROCESSED" => Some(OrderStatus::Processed),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Invalid | OrderStatus::Processed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct Order {
    pub number: String,
    pub user_id: i64,
    pub status: OrderStatus,
    pub accrual: Decimal,
    /// Consecutive "not yet registered" responses from the accrual service.
    pub attempts: i32,
    pub uploaded_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Transition applied to an order by the processing pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderUpdate {
    pub number: String,
    pub status: OrderStatus,
    pub accrual: Decimal,
}

#[derive(Debug, Clone)]
pub struct Balance {
    pub user_id: i64,
    pub current: Decimal,
    pub debited: Decimal,
}

#[derive(Debug, Clone)]
pub struct Withdrawal {
    pub id: i64,
    pub user_id: i64,
    pub order_number: String,
    pub sum: Decimal,
    pub processed_at: DateTime<Utc>,
}
