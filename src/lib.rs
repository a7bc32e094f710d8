//! Server side of a loyalty-points accrual service.
//!
//! Users upload sales-order numbers; an external accrual service decides
//! whether each order earns points and how many; users withdraw points
//! against future order numbers.
//!
//! # Modules
//!
//! - [`models`] - Ledger entities (users, orders, balances, withdrawals)
//! - [`store`] - Transactional PostgreSQL ledger
//! - [`service`] - User-facing domain services
//! - [`accrual`] - Background pipeline polling the accrual service
//! - [`api`] - HTTP surface (axum)
//! - [`config`] - Flag / env / default configuration
//! - [`logging`] - tracing subscriber setup

pub mod accrual;
pub mod api;
pub mod config;
pub mod logging;
pub mod models;
pub mod service;
pub mod store;

pub use config::Config;
pub use models::{Balance, Order, OrderStatus, User, Withdrawal};
pub use store::{Ledger, PgLedger, StoreError};
