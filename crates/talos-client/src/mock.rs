//! Mock TalosClient for unit testing
//!
//! In-memory implementation of TalosClientTrait for tests that need a node
//! without a running Talos API.

use crate::error::TalosError;
use crate::models::*;
use crate::talos_trait::TalosClientTrait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tonic::Code;

/// Trait method a mock failure applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockCall {
    /// `nodename`
    Nodename,
    /// `machine_config`
    MachineConfig,
    /// `version`
    Version,
    /// `upgrade`
    Upgrade,
}

#[derive(Debug, Clone)]
enum Failure {
    Status(Code, String),
    Node(String),
    Hang,
}

#[derive(Debug, Default)]
struct MockState {
    nodename: Option<Nodename>,
    machine_config: Option<MachineConfig>,
    version: Option<VersionInfo>,
    failures: HashMap<MockCall, Failure>,
    calls: Vec<MockCall>,
    upgrades: Vec<UpgradeOptions>,
}

/// Mock TalosClient for testing
///
/// Unset resources behave like a node that does not have them: a missing
/// nodename or machine config yields [`TalosError::NotFound`].
#[derive(Debug, Clone)]
pub struct MockTalosClient {
    node: String,
    state: Arc<Mutex<MockState>>,
}

impl MockTalosClient {
    /// Create a new mock client for `node`
    pub fn new(node: impl Into<String>) -> Self {
        Self {
            node: node.into(),
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Set the Kubernetes node name the mock reports
    pub fn with_nodename(self, nodename: impl Into<String>) -> Self {
        self.state().nodename = Some(Nodename {
            nodename: nodename.into(),
            hostname_version: "1".to_string(),
            skip_node_registration: false,
        });
        self
    }

    /// Set a machine config carrying only `machine.install.image`
    pub fn with_install_image(self, image: impl Into<String>) -> Self {
        self.state().machine_config = Some(MachineConfig::with_install_image(image));
        self
    }

    /// Set the machine config from a raw YAML document
    pub fn with_machine_config_yaml(self, yaml: &str) -> Result<Self, TalosError> {
        let config = MachineConfig::from_yaml(yaml)?;
        self.state().machine_config = Some(config);
        Ok(self)
    }

    /// Set the running version tag
    pub fn with_version(self, tag: impl Into<String>) -> Self {
        let hostname = self.node.clone();
        self.state().version = Some(VersionInfo {
            hostname,
            tag: tag.into(),
            sha: "0000000".to_string(),
            arch: "amd64".to_string(),
        });
        self
    }

    /// Make `call` fail with a gRPC status
    pub fn fail_with(self, call: MockCall, code: Code, message: impl Into<String>) -> Self {
        self.state()
            .failures
            .insert(call, Failure::Status(code, message.into()));
        self
    }

    /// Make the upgrade fail with a per-node error in the response metadata
    pub fn reject_upgrade(self, message: impl Into<String>) -> Self {
        self.state()
            .failures
            .insert(MockCall::Upgrade, Failure::Node(message.into()));
        self
    }

    /// Make `call` never complete
    pub fn hang(self, call: MockCall) -> Self {
        self.state().failures.insert(call, Failure::Hang);
        self
    }

    /// Upgrade requests received so far
    pub fn upgrade_requests(&self) -> Vec<UpgradeOptions> {
        self.state().upgrades.clone()
    }

    /// Trait methods called so far, in order
    pub fn calls(&self) -> Vec<MockCall> {
        self.state().calls.clone()
    }

    fn hostname(&self) -> String {
        self.state()
            .nodename
            .as_ref()
            .map(|n| n.nodename.clone())
            .unwrap_or_else(|| self.node.clone())
    }

    /// Record `call` and apply any configured failure
    async fn enter(&self, call: MockCall) -> Result<(), TalosError> {
        let failure = {
            let mut state = self.state();
            state.calls.push(call);
            state.failures.get(&call).cloned()
        };

        match failure {
            None => Ok(()),
            Some(Failure::Status(code, message)) => Err(tonic::Status::new(code, message).into()),
            Some(Failure::Node(message)) => Err(TalosError::Node {
                hostname: self.hostname(),
                message,
            }),
            Some(Failure::Hang) => std::future::pending().await,
        }
    }
}

#[async_trait::async_trait]
impl TalosClientTrait for MockTalosClient {
    fn node(&self) -> &str {
        &self.node
    }

    async fn nodename(&self) -> Result<Nodename, TalosError> {
        self.enter(MockCall::Nodename).await?;
        self.state()
            .nodename
            .clone()
            .ok_or_else(|| TalosError::NotFound(NODENAME.to_string()))
    }

    async fn machine_config(&self) -> Result<MachineConfig, TalosError> {
        self.enter(MockCall::MachineConfig).await?;
        self.state()
            .machine_config
            .clone()
            .ok_or_else(|| TalosError::NotFound(MACHINE_CONFIG.to_string()))
    }

    async fn version(&self) -> Result<VersionInfo, TalosError> {
        self.enter(MockCall::Version).await?;
        self.state()
            .version
            .clone()
            .ok_or(TalosError::EmptyResponse("Version"))
    }

    async fn upgrade(&self, options: &UpgradeOptions) -> Result<UpgradeAck, TalosError> {
        self.enter(MockCall::Upgrade).await?;
        self.state().upgrades.push(options.clone());
        Ok(UpgradeAck {
            hostname: self.hostname(),
            ack: "Upgrade request received".to_string(),
            actor_id: "mock-actor".to_string(),
        })
    }
}
