//! Worker loop: drain the queue, honour the shared back-off, look the order
//! up and hand the outcome to the processing service.

use std::sync::Arc;

use tokio::sync::{Mutex, mpsc, watch};
use tracing::debug;

use super::client::{Lookup, Outcome};
use super::service::ProcessingService;
use super::{Backoff, halted};

pub(crate) async fn run_worker(
    id: usize,
    queue: Arc<Mutex<mpsc::Receiver<String>>>,
    backoff: Arc<Backoff>,
    client: Arc<dyn Lookup>,
    service: Arc<ProcessingService>,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let number = tokio::select! {
            _ = halted(&mut shutdown) => break,
            number = next_number(&queue) => match number {
                Some(number) => number,
                // The poller is gone and the queue is drained.
                None => break,
            },
        };

        if !wait_for_backoff(&backoff, &mut shutdown).await {
            break;
        }

        let outcome = client.lookup(&number).await;
        if let Outcome::RateLimited { retry_after } = &outcome {
            backoff.advance(*retry_after);
        }
        service.apply(outcome).await;
    }

    debug!(worker = id, "accrual worker exited");
}

/// The receiver is shared by the whole pool; the lock is held only while one
/// worker waits for the next message.
async fn next_number(queue: &Mutex<mpsc::Receiver<String>>) -> Option<String> {
    queue.lock().await.recv().await
}

/// Sleeps until the shared back-off instant elapses, re-reading it after
/// every wake-up since a peer may have advanced it further. Returns false
/// when shutdown interrupted the wait.
async fn wait_for_backoff(backoff: &Backoff, shutdown: &mut watch::Receiver<bool>) -> bool {
    while let Some(delay) = backoff.remaining() {
        tokio::select! {
            _ = halted(shutdown) => return false,
            _ = tokio::time::sleep(delay) => {}
        }
    }
    true
}
