//! Pipeline lifecycle: startup, cooperative drain, forced cancellation.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinSet;
use tracing::{info, warn};

use super::client::Lookup;
use super::poller::run_poller;
use super::service::ProcessingService;
use super::worker::run_worker;
use super::{Backoff, PipelineConfig};

/// How long a drain may take before in-flight work is cancelled.
const GRACEFUL_WINDOW: Duration = Duration::from_secs(5);

/// A supervisor that has not been started yet is implicitly idle; `start`
/// is the Idle → Running transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Running,
    Draining,
    Stopped,
}

/// Owns the worker pool and the poller. `start` moves the pipeline to
/// Running; `stop` drains it and, failing that, cancels it.
pub struct Supervisor {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
    state: PipelineState,
}

impl Supervisor {
    pub fn start(
        client: Arc<dyn Lookup>,
        service: Arc<ProcessingService>,
        config: &PipelineConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (queue_tx, queue_rx) = mpsc::channel(config.rate_limit);
        let queue_rx = Arc::new(Mutex::new(queue_rx));
        let backoff = Arc::new(Backoff::new());

        let mut tasks = JoinSet::new();
        for id in 0..config.rate_limit {
            tasks.spawn(run_worker(
                id,
                queue_rx.clone(),
                backoff.clone(),
                client.clone(),
                service.clone(),
                shutdown_rx.clone(),
            ));
        }
        tasks.spawn(run_poller(
            service,
            queue_tx,
            config.poll_interval,
            shutdown_rx,
        ));

        info!(workers = config.rate_limit, "accrual pipeline running");
        Self {
            shutdown: shutdown_tx,
            tasks,
            state: PipelineState::Running,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Raises the shutdown signal and blocks until every task has exited.
    /// Workers finish their in-flight lookup; once the graceful window
    /// expires, whatever is still blocked is cancelled outright.
    pub async fn stop(&mut self) {
        if self.state != PipelineState::Running {
            return;
        }

        self.state = PipelineState::Draining;
        info!("accrual pipeline draining");
        let _ = self.shutdown.send(true);

        let tasks = &mut self.tasks;
        let drained = tokio::time::timeout(GRACEFUL_WINDOW, async move {
            while tasks.join_next().await.is_some() {}
        })
        .await;

        if drained.is_err() {
            warn!("graceful window expired, cancelling in-flight pipeline work");
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }

        self.state = PipelineState::Stopped;
        info!("accrual pipeline stopped");
    }
}
