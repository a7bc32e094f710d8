//! Background accrual pipeline.
//!
//! A poller claims due orders from the ledger and feeds a bounded queue; a
//! fixed pool of workers drains the queue, asks the external accrual service
//! about each order and applies the outcome to the ledger. All workers share
//! one monotonic back-off instant that a 429 response advances. The
//! supervisor owns startup and the drain/escalate shutdown protocol.

pub mod backoff;
pub mod client;
pub mod poller;
pub mod service;
pub mod supervisor;
pub mod worker;

use std::time::Duration;

use tokio::sync::watch;

pub use backoff::Backoff;
pub use client::{AccrualClient, Lookup, Outcome};
pub use service::ProcessingService;
pub use supervisor::{PipelineState, Supervisor};

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Base URL of the accrual service.
    pub accrual_address: String,
    /// Worker count; also the queue capacity.
    pub rate_limit: usize,
    /// Period between polls of the orders table.
    pub poll_interval: Duration,
    /// Minimum delay between attempts on one order.
    pub process_delay: Duration,
    /// 204 responses tolerated before an order is rejected as INVALID.
    pub retry_count: u32,
}

/// Resolves once the shutdown signal is raised. Dropping the sender counts
/// as a signal, so tasks never outlive the supervisor.
pub(crate) async fn halted(shutdown: &mut watch::Receiver<bool>) {
    while !*shutdown.borrow_and_update() {
        if shutdown.changed().await.is_err() {
            break;
        }
    }
}
