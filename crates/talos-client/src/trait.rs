//! TalosClient trait for mocking
//!
//! This trait abstracts the TalosClient to enable mocking in unit tests.
//! The concrete TalosClient implements this trait, and tests can use mock implementations.

use crate::error::TalosError;
use crate::models::*;

/// Trait for the Talos machine API operations the updater needs
///
/// All async methods must be `Send` to work with Tokio's work-stealing runtime.
#[async_trait::async_trait]
pub trait TalosClientTrait: Send + Sync {
    /// Address of the node requests are routed to
    fn node(&self) -> &str;

    /// Read the node's Kubernetes node name resource
    async fn nodename(&self) -> Result<Nodename, TalosError>;

    /// Read the node's active machine configuration resource
    async fn machine_config(&self) -> Result<MachineConfig, TalosError>;

    /// Query the running Talos version
    async fn version(&self) -> Result<VersionInfo, TalosError>;

    /// Submit an upgrade request
    async fn upgrade(&self, options: &UpgradeOptions) -> Result<UpgradeAck, TalosError>;
}
