//! Poller: periodically claims due orders and feeds the worker queue.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tracing::debug;

use super::halted;
use super::service::ProcessingService;

pub(crate) async fn run_poller(
    service: Arc<ProcessingService>,
    queue: mpsc::Sender<String>,
    poll_interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    'poll: loop {
        tokio::select! {
            _ = halted(&mut shutdown) => break 'poll,
            _ = tokio::time::sleep(poll_interval) => {}
        }

        for number in service.list_due().await {
            // A full queue blocks the send; that is the backpressure that
            // keeps the read-ahead bounded by the worker pool.
            tokio::select! {
                _ = halted(&mut shutdown) => break 'poll,
                sent = queue.send(number) => {
                    if sent.is_err() {
                        break 'poll;
                    }
                }
            }
        }

        // Shutdown stays observable between batches even under saturation.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    debug!("poller exited");
}
