use anyhow::Result;
use minerdash::*;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;
    let ranges = app_config.range_set()?;
    if ranges.is_empty() {
        tracing::warn!("No locations configured; snapshots will be empty until ranges are reset");
    }

    let http_scanner = Arc::new(device::http::HttpScanner::new(app_config.scanner_config())?);
    let poller = poller::BatchPoller::new(
        scanner::RangeScanner::new(http_scanner),
        app_config.poller_config(),
    );
    let coordinator = Arc::new(coordinator::Coordinator::new(
        poller,
        ranges,
        app_config.polling.broadcast_capacity,
    ));

    let ws_fleet_connections = Arc::new(AtomicUsize::new(0));
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let worker_handle = worker::spawn(
        worker::WorkerDeps {
            coordinator: coordinator.clone(),
            ws_fleet_connections: ws_fleet_connections.clone(),
            shutdown_rx,
        },
        worker::WorkerConfig {
            interval_secs: app_config.polling.interval_secs,
            stats_log_interval_secs: app_config.polling.stats_log_interval_secs,
        },
    );

    let app = routes::app(coordinator, ws_fleet_connections, app_config.clone());
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = async {
            #[cfg(unix)]
            {
                let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                    Ok(s) => s,
                    Err(_) => {
                        let _ = tokio::signal::ctrl_c().await;
                        return;
                    }
                };
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            #[cfg(not(unix))]
            {
                let _ = tokio::signal::ctrl_c().await;
            }
        } => {
            tracing::info!("Received shutdown signal");
            let _ = shutdown_tx.send(());
            let _ = worker_handle.await;
        }
    }

    Ok(())
}
