//! Serve mode: opens the log, starts the prober loop and the API server.

use std::net::SocketAddr;
use std::sync::Arc;

use pulse_api::ApiState;
use pulse_core::PulseConfig;
use pulse_health::{HealthLog, Prober, Recorder};
use pulse_state::StateStore;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::DB_FILE;

pub async fn run_serve(config: PulseConfig) -> anyhow::Result<()> {
    info!("PulseGrid daemon starting");

    // Ensure data directory exists.
    let data_dir = config.data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let db_path = data_dir.join(DB_FILE);

    let store = StateStore::open(&db_path)?;
    info!(path = ?db_path, "health-check log opened");
    let log: Arc<dyn HealthLog> = Arc::new(store);

    let mut api_state =
        ApiState::new(log.clone()).with_metrics_window(config.uptime_window());

    // ── Shutdown signal ────────────────────────────────────────

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Prober loop ────────────────────────────────────────────

    let prober_handle = match config.probe_target() {
        Some(target) => {
            let prober = Prober::new(
                target,
                config.probe_path(),
                config.probe_timeout(),
                Recorder::new(log),
            );
            api_state = api_state.with_prober(prober.clone());
            let interval = config.probe_interval();
            let prober_shutdown = shutdown_rx.clone();
            Some(tokio::spawn(async move {
                prober.run(interval, prober_shutdown).await;
            }))
        }
        None => {
            warn!("no probe target configured; only accepting externally recorded checks");
            None
        }
    };

    // ── Start API server ───────────────────────────────────────

    let router = pulse_api::build_router(api_state);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port()));

    info!(%addr, "API server starting");

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Graceful shutdown on Ctrl-C.
    let server = axum::serve(listener, router).with_graceful_shutdown(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for ctrl-c");
        }
        info!("shutdown signal received");
        let _ = shutdown_tx.send(true);
    });

    server.await?;

    if let Some(handle) = prober_handle {
        let _ = handle.await;
    }

    info!("PulseGrid daemon stopped");
    Ok(())
}
