//! Talos Node Updater
//!
//! One-shot reconciliation of a single Talos node: reads the node's running
//! version and extension schematic, compares them with the desired version
//! tag and submits an upgrade when they differ.
//!
//! After an upgrade has been issued the process stays up until it receives
//! SIGINT or SIGTERM; with nothing to do it exits immediately.

mod cluster;
mod config;
mod error;
mod reconciler;
mod shutdown;
mod state;
#[cfg(test)]
mod test_utils;

use crate::cluster::{KubeNodeAnnotations, NodeAnnotations};
use crate::error::{StepContext, UpdaterError};
use crate::reconciler::{DesiredState, ReconcileResult, Reconciler};
use crate::state::StateReader;
use anyhow::Result;
use clap::Parser;
use config::{Args, Config};
use std::sync::Arc;
use std::time::Duration;
use talos_client::{TalosClient, TalosClientTrait};
use tokio::sync::watch;
use tracing::{debug, error, info};

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = init_tracing(&args.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    let config = match Config::from_args(args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    // kube's rustls backend needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let (shutdown_tx, shutdown_rx) = shutdown::channel();
    tokio::spawn(shutdown::forward_signals(shutdown_tx));

    if let Err(e) = run(&config, shutdown_rx).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Main application logic.
async fn run(config: &Config, shutdown_rx: watch::Receiver<bool>) -> Result<(), UpdaterError> {
    info!("Configuration:");
    info!("  Node: {}", config.node);
    info!("  Desired version: {}", config.tag);
    info!("  Powercycle: {}, staged: {}", config.powercycle, config.staged);

    let talos = TalosClient::from_talosconfig(
        config.talosconfig.as_deref(),
        config.talos_context.as_deref(),
        &config.node,
        config.timeout,
    )
    .map_err(|e| UpdaterError::InvalidConfig(e.to_string()))
    .step("create Talos client")?;

    let desired = DesiredState {
        tag: config.tag.clone(),
        powercycle: config.powercycle,
        staged: config.staged,
    };

    reconcile_node(
        Arc::new(talos),
        Arc::new(KubeNodeAnnotations::new(config.kube_context.clone())),
        &desired,
        config.timeout,
        shutdown_rx,
    )
    .await
    .map(|_| ())
}

/// Run one reconciliation pass, then hold until shutdown if an upgrade was issued
///
/// A shutdown signal during the state reads aborts the pass with
/// [`UpdaterError::Interrupted`] before anything is submitted. Once the
/// upgrade request is in flight it runs to completion.
async fn reconcile_node(
    talos: Arc<dyn TalosClientTrait>,
    cluster: Arc<dyn NodeAnnotations>,
    desired: &DesiredState,
    timeout: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<ReconcileResult, UpdaterError> {
    let reader = StateReader::new(Arc::clone(&talos), cluster, timeout);
    let observed = tokio::select! {
        biased;
        () = shutdown::cancelled(shutdown_rx.clone()) => return Err(UpdaterError::Interrupted),
        observed = reader.observe() => observed?,
    };

    // a signal that lands during the last read must still stop the upgrade
    if *shutdown_rx.borrow() {
        return Err(UpdaterError::Interrupted);
    }

    let result = Reconciler::new(talos, timeout)
        .reconcile(&observed, desired)
        .await?;

    match &result {
        ReconcileResult::NoChangeNeeded => {
            info!("Node {} is already running {}", observed.identity, desired.tag);
        }
        ReconcileResult::UpgradeIssued(image) => {
            info!(image = %image, "Upgrade issued, waiting for termination signal");
            shutdown::wait_for_shutdown(shutdown_rx).await;
            info!("Shutting down");
        }
    }

    Ok(result)
}

/// Initialize the tracing subscriber; `RUST_LOG` takes precedence over `log_level`.
fn init_tracing(log_level: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| anyhow::anyhow!("Failed to initialize log filter: {}", e))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use talos_client::MockCall;

    const TIMEOUT: Duration = Duration::from_secs(30);

    fn desired(tag: &str) -> DesiredState {
        DesiredState {
            tag: tag.to_string(),
            powercycle: false,
            staged: false,
        }
    }

    #[tokio::test]
    async fn test_current_node_returns_without_waiting() {
        let talos = mock_node("abc123", "v1.5.0");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, "abc123");
        let (_shutdown_tx, shutdown_rx) = shutdown::channel();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            reconcile_node(Arc::new(talos), Arc::new(cluster), &desired("v1.5.0"), TIMEOUT, shutdown_rx),
        )
        .await
        .expect("pass without an upgrade must not wait")
        .unwrap();

        assert_eq!(result, ReconcileResult::NoChangeNeeded);
    }

    #[tokio::test]
    async fn test_issued_upgrade_waits_for_shutdown() {
        let talos = mock_node("abc123", "v1.5.0");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, "abc123");
        let (shutdown_tx, shutdown_rx) = shutdown::channel();

        let node = talos.clone();
        let pass = tokio::spawn(async move {
            let wanted = desired("v1.6.0");
            reconcile_node(Arc::new(node), Arc::new(cluster), &wanted, TIMEOUT, shutdown_rx).await
        });

        while talos.upgrade_requests().is_empty() {
            tokio::task::yield_now().await;
        }
        assert!(!pass.is_finished());

        shutdown_tx.send(true).unwrap();
        let result = pass.await.unwrap().unwrap();

        assert_eq!(
            result,
            ReconcileResult::UpgradeIssued(installer_image("abc123", "v1.6.0").parse().unwrap())
        );
    }

    #[tokio::test]
    async fn test_shutdown_before_pass_submits_nothing() {
        let talos = mock_node("abc123", "v1.5.0");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, "abc123");
        let (shutdown_tx, shutdown_rx) = shutdown::channel();
        shutdown_tx.send(true).unwrap();

        let err = reconcile_node(Arc::new(talos.clone()), Arc::new(cluster), &desired("v1.6.0"), TIMEOUT, shutdown_rx)
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::Interrupted));
        assert!(talos.upgrade_requests().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_during_reads_aborts_pass() {
        let talos = mock_node("abc123", "v1.5.0");
        let cluster = FakeNodeAnnotations::hanging();
        let (shutdown_tx, shutdown_rx) = shutdown::channel();

        let node = talos.clone();
        let pass = tokio::spawn(async move {
            let wanted = desired("v1.6.0");
            reconcile_node(Arc::new(node), Arc::new(cluster), &wanted, TIMEOUT, shutdown_rx).await
        });

        while !talos.calls().contains(&MockCall::MachineConfig) {
            tokio::task::yield_now().await;
        }
        shutdown_tx.send(true).unwrap();

        let err = pass.await.unwrap().unwrap_err();
        assert!(matches!(err, UpdaterError::Interrupted));
        assert!(!talos.calls().contains(&MockCall::Upgrade));
    }

    #[tokio::test]
    async fn test_failed_pass_does_not_wait() {
        let talos = mock_node("abc123", "v1.5.0").reject_upgrade("not enough disk space");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, "abc123");
        let (_shutdown_tx, shutdown_rx) = shutdown::channel();

        let err = reconcile_node(Arc::new(talos), Arc::new(cluster), &desired("v1.6.0"), TIMEOUT, shutdown_rx)
            .await
            .unwrap_err();

        assert!(matches!(err.root(), UpdaterError::UpgradeRejected(_)));
    }
}
