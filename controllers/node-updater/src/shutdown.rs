//! Shutdown signalling.
//!
//! After an upgrade is issued the process stays up until it is told to
//! stop. The wait is a `watch` channel so tests can fire it directly.

use tokio::sync::watch;
use tracing::{error, info};

/// Create a shutdown channel; sending `true` releases every waiter
pub fn channel() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// Block until shutdown is signalled
///
/// Also returns if every sender is dropped, since no signal can arrive after
/// that.
pub async fn wait_for_shutdown(mut shutdown_rx: watch::Receiver<bool>) {
    // wait_for checks the current value first, so a signal sent before the
    // wait started is not missed
    if shutdown_rx.wait_for(|stop| *stop).await.is_err() {
        info!("Shutdown channel closed");
    }
}

/// Resolve once shutdown is signalled
///
/// Unlike [`wait_for_shutdown`] this never resolves on a closed channel, so
/// it can be raced against work that should only stop on a real signal.
pub async fn cancelled(mut shutdown_rx: watch::Receiver<bool>) {
    if shutdown_rx.wait_for(|stop| *stop).await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// Forward SIGINT/SIGTERM into the shutdown channel
///
/// Spawned from `main`; returns once a signal has been forwarded or the
/// handlers could not be installed.
pub async fn forward_signals(shutdown_tx: watch::Sender<bool>) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => s,
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                return;
            }
        };

        tokio::select! {
            _ = tokio::signal::ctrl_c() => info!("Received SIGINT"),
            _ = sigterm.recv() => info!("Received SIGTERM"),
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl-C");
            return;
        }
        info!("Received Ctrl-C");
    }

    let _ = shutdown_tx.send(true);
}
