//! Process entry point: configuration, migrations, the accrual pipeline and
//! the HTTP server, wired for coordinated graceful shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::sync::watch;
use tracing::{info, warn};

use bonusd::accrual::{AccrualClient, ProcessingService, Supervisor};
use bonusd::api::{self, AppState};
use bonusd::config::Config;
use bonusd::logging;
use bonusd::store::{Ledger, PgLedger, pg};

/// How long the HTTP server may spend draining open connections once the
/// shutdown signal fires; mirrors the pipeline supervisor's window.
const GRACEFUL_WINDOW: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    let _log_guard = logging::init();

    let pool = pg::connect(&config.database_uri)
        .await
        .context("failed to connect to the ledger database")?;
    pg::run_migrations(&pool)
        .await
        .context("failed to apply migrations")?;

    let ledger: Arc<dyn Ledger> = Arc::new(PgLedger::new(pool));

    let pipeline_config = config.pipeline();
    let client = Arc::new(
        AccrualClient::new(&pipeline_config.accrual_address)
            .context("failed to build accrual client")?,
    );
    let processing = Arc::new(ProcessingService::new(
        ledger.clone(),
        pipeline_config.process_delay,
        pipeline_config.retry_count,
    ));
    let mut supervisor = Supervisor::start(client, processing, &pipeline_config);

    let state = AppState::new(ledger, &config.jwt_secret);
    let app = api::router(state);

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");

    // One trigger for both drains: the HTTP server and the accrual pipeline
    // observe the same signal and wind down side by side, each bounded by
    // its own graceful window.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn({
        let shutdown_tx = shutdown_tx.clone();
        async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        }
    });

    let server = {
        let mut halt = shutdown_rx.clone();
        axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = halt.wait_for(|stop| *stop).await;
        })
    };

    let mut http_deadline = shutdown_rx.clone();
    let http = async move {
        let result = tokio::select! {
            result = server => result.context("http server failed"),
            _ = async {
                let _ = http_deadline.wait_for(|stop| *stop).await;
                tokio::time::sleep(GRACEFUL_WINDOW).await;
            } => {
                warn!("graceful window expired, abandoning open http connections");
                Ok(())
            }
        };
        // However the server ends, the pipeline must still drain.
        let _ = shutdown_tx.send(true);
        result
    };

    let mut pipeline_halt = shutdown_rx;
    let pipeline = async move {
        let _ = pipeline_halt.wait_for(|stop| *stop).await;
        supervisor.stop().await;
    };

    let (served, ()) = tokio::join!(http, pipeline);
    served?;
    Ok(())
}

/// Resolves on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("shutdown signal received");
}
