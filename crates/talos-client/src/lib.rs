//! Talos Machine API Client
//!
//! A Rust client for the Talos machine API (apid), covering the calls a node
//! updater needs: COSI resource reads, the running version and upgrades.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use talos_client::{RebootMode, TalosClient, TalosClientTrait, UpgradeOptions};
//!
//! # async fn example() -> Result<(), talos_client::TalosError> {
//! // Connect using the current context of ~/.talos/config
//! let client = TalosClient::from_talosconfig(None, None, "10.0.0.11", Duration::from_secs(30))?;
//!
//! let nodename = client.nodename().await?;
//! let version = client.version().await?;
//! println!("{} runs {}", nodename.nodename, version.tag);
//!
//! let ack = client
//!     .upgrade(&UpgradeOptions {
//!         image: "ghcr.io/siderolabs/installer:v1.8.0".to_string(),
//!         preserve: true,
//!         stage: false,
//!         force: false,
//!         reboot_mode: RebootMode::Default,
//!     })
//!     .await?;
//! println!("upgrade accepted: {}", ack.ack);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Mutual TLS**: credentials and endpoints come from a talosconfig context
//! - **Node routing**: every request targets one node through the `node` metadata key
//! - **Per-node errors**: errors embedded in response metadata become [`TalosError::Node`]
//! - **Mocking**: `test-util` enables [`MockTalosClient`]

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod pb;
#[path = "trait.rs"]
pub mod talos_trait;
#[cfg(feature = "test-util")]
pub mod mock;

pub use client::TalosClient;
pub use config::{Credentials, TalosConfig, TalosContext};
pub use error::TalosError;
pub use models::*;
pub use talos_trait::TalosClientTrait;
#[cfg(feature = "test-util")]
pub use mock::{MockCall, MockTalosClient};
