//! Integration tests for the Talos client
//!
//! These tests require a reachable Talos node and a talosconfig for it.
//! Set TALOS_NODE (and optionally TALOSCONFIG) to run.

use std::path::PathBuf;
use std::time::Duration;
use talos_client::{TalosClient, TalosClientTrait};

fn client() -> TalosClient {
    let node = std::env::var("TALOS_NODE").expect("TALOS_NODE environment variable must be set");
    let talosconfig = std::env::var("TALOSCONFIG").ok().map(PathBuf::from);

    TalosClient::from_talosconfig(talosconfig.as_deref(), None, node, Duration::from_secs(30))
        .expect("Failed to create client")
}

#[tokio::test]
#[ignore] // Requires running Talos node
async fn test_read_nodename() {
    let nodename = client().nodename().await.expect("Failed to read nodename");
    assert!(!nodename.nodename.is_empty());
    println!("Node name: {}", nodename.nodename);
}

#[tokio::test]
#[ignore]
async fn test_read_machine_config() {
    let config = client()
        .machine_config()
        .await
        .expect("Failed to read machine config");

    println!("Install image: {:?}", config.install_image());
}

#[tokio::test]
#[ignore]
async fn test_read_version() {
    let version = client().version().await.expect("Failed to read version");
    assert!(version.tag.starts_with('v'));
    println!("Running {} ({})", version.tag, version.arch);
}
