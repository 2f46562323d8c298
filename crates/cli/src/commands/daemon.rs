//! `groupwarden daemon` — Poll and reconcile until interrupted.

use groupwarden_config::AppConfig;
use groupwarden_scheduler::{PollScheduler, shutdown_channel};
use tracing::{error, info};

pub async fn run(config: AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let reconciler = super::build_reconciler(&config)?;
    let scheduler = PollScheduler::new(config.poll.interval())?.fail_fast(config.poll.fail_fast);

    info!(
        server = %config.mealie.base_url,
        interval_ms = config.poll.interval_ms,
        isolation_check = %config.reconcile.isolation_check,
        on_user_error = %config.reconcile.on_user_error,
        "GroupWarden daemon starting"
    );

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let stats = scheduler.run(&reconciler, shutdown_rx).await?;

    info!(
        ticks = stats.ticks,
        succeeded = stats.succeeded,
        failed = stats.failed,
        "Exiting..."
    );
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, stopping after the current tick"),
        _ = terminate => info!("Received SIGTERM, stopping after the current tick"),
    }
}
