//! Observation of a node's current state.
//!
//! The state reader gathers everything the reconciler compares: the node's
//! Kubernetes name, its configured install image, the schematic annotation
//! on its Kubernetes node and the Talos version it is running. Reads run in
//! that order and stop at the first failure.

use crate::cluster::{NodeAnnotations, SCHEMATIC_ANNOTATION};
use crate::error::{StepContext, UpdaterError};
use image_reference::ImageReference;
use std::sync::Arc;
use std::time::Duration;
use talos_client::{TalosClientTrait, TalosError};
use tracing::{debug, info};

/// Kubernetes node name of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity(String);

impl NodeIdentity {
    /// Node name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeIdentity {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl std::fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Node state read at the start of a pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservedState {
    /// Kubernetes node name
    pub identity: NodeIdentity,
    /// Configured install image (`machine.install.image`)
    pub image: ImageReference,
    /// Schematic ID from the Kubernetes node annotation
    pub schematic_annotation: String,
    /// Running Talos version tag
    pub running_version: String,
}

/// Run a Talos call, failing with [`TalosError::Timeout`] once `timeout` elapses
pub(crate) async fn with_timeout<T>(
    timeout: Duration,
    call: impl Future<Output = Result<T, TalosError>>,
) -> Result<T, TalosError> {
    tokio::time::timeout(timeout, call)
        .await
        .unwrap_or(Err(TalosError::Timeout(timeout)))
}

/// Map a failed resource read: transport problems are RPC errors, missing
/// or misshapen resources are unavailable.
fn resource_error(err: TalosError) -> UpdaterError {
    if err.is_resource_error() {
        UpdaterError::ResourceUnavailable(err.to_string())
    } else {
        UpdaterError::Rpc(err)
    }
}

/// Reads the observed state of one node
pub struct StateReader {
    talos: Arc<dyn TalosClientTrait>,
    cluster: Arc<dyn NodeAnnotations>,
    timeout: Duration,
}

impl StateReader {
    /// Create a reader over the Talos and Kubernetes APIs
    ///
    /// Every remote call is bounded by `timeout`.
    pub fn new(
        talos: Arc<dyn TalosClientTrait>,
        cluster: Arc<dyn NodeAnnotations>,
        timeout: Duration,
    ) -> Self {
        Self {
            talos,
            cluster,
            timeout,
        }
    }

    /// Resolve the node's Kubernetes name from its Nodename resource
    pub async fn resolve_node_identity(&self) -> Result<NodeIdentity, UpdaterError> {
        let nodename = with_timeout(self.timeout, self.talos.nodename())
            .await
            .map_err(resource_error)?;

        if nodename.nodename.is_empty() {
            return Err(UpdaterError::ResourceUnavailable(
                "Nodename resource has an empty node name".to_string(),
            ));
        }

        Ok(NodeIdentity(nodename.nodename))
    }

    /// Resolve and parse the configured install image
    pub async fn resolve_machine_image(&self) -> Result<ImageReference, UpdaterError> {
        let config = with_timeout(self.timeout, self.talos.machine_config())
            .await
            .map_err(resource_error)?;

        let image = config.install_image().ok_or_else(|| {
            UpdaterError::ResourceUnavailable(
                "machine config has no machine.install.image".to_string(),
            )
        })?;

        Ok(ImageReference::parse(image)?)
    }

    /// Read the schematic annotation from the node's Kubernetes object
    pub async fn resolve_schematic_annotation(
        &self,
        identity: &NodeIdentity,
    ) -> Result<String, UpdaterError> {
        let lookup = self
            .cluster
            .node_annotation(identity.as_str(), SCHEMATIC_ANNOTATION);

        let annotation = tokio::time::timeout(self.timeout, lookup)
            .await
            .unwrap_or_else(|_| {
                Err(UpdaterError::ClusterApi(format!(
                    "get node {identity}: timed out after {:?}",
                    self.timeout
                )))
            })?;

        annotation.ok_or_else(|| UpdaterError::AnnotationMissing {
            node: identity.to_string(),
            annotation: SCHEMATIC_ANNOTATION,
        })
    }

    /// Query the running Talos version tag
    pub async fn resolve_running_version(&self) -> Result<String, UpdaterError> {
        let version = with_timeout(self.timeout, self.talos.version())
            .await
            .map_err(UpdaterError::Rpc)?;

        if version.tag.is_empty() {
            return Err(UpdaterError::Rpc(TalosError::EmptyResponse("Version")));
        }

        Ok(version.tag)
    }

    /// Read the full observed state, stopping at the first failure
    pub async fn observe(&self) -> Result<ObservedState, UpdaterError> {
        info!(node = %self.talos.node(), "Examining node");

        let identity = self
            .resolve_node_identity()
            .await
            .step("resolve node identity")?;
        debug!(nodename = %identity, "Resolved node identity");

        let image = self
            .resolve_machine_image()
            .await
            .step("resolve machine image")?;
        info!(image = %image, "Configured install image");

        let schematic_annotation = self
            .resolve_schematic_annotation(&identity)
            .await
            .step("resolve schematic annotation")?;
        debug!(schematic = %schematic_annotation, "Node schematic annotation");

        let running_version = self
            .resolve_running_version()
            .await
            .step("resolve running version")?;
        info!(version = %running_version, "Running version");

        Ok(ObservedState {
            identity,
            image,
            schematic_annotation,
            running_version,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use image_reference::ReferenceError;
    use talos_client::{MockCall, MockTalosClient};
    use tonic::Code;

    const SCHEMATIC: &str = "abc123";
    const TIMEOUT: Duration = Duration::from_secs(30);

    fn reader(talos: MockTalosClient, cluster: FakeNodeAnnotations) -> StateReader {
        StateReader::new(Arc::new(talos), Arc::new(cluster), TIMEOUT)
    }

    #[tokio::test]
    async fn test_observe_reads_all_state() {
        let talos = mock_node(SCHEMATIC, "v1.5.0");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, SCHEMATIC);

        let observed = reader(talos.clone(), cluster.clone()).observe().await.unwrap();

        assert_eq!(observed.identity.as_str(), NODE_NAME);
        assert_eq!(observed.image.to_string(), installer_image(SCHEMATIC, "v1.5.0"));
        assert_eq!(observed.schematic_annotation, SCHEMATIC);
        assert_eq!(observed.running_version, "v1.5.0");
        assert_eq!(
            talos.calls(),
            vec![MockCall::Nodename, MockCall::MachineConfig, MockCall::Version]
        );
        assert_eq!(cluster.lookups(), vec![NODE_NAME.to_string()]);
    }

    #[tokio::test]
    async fn test_missing_nodename_is_resource_unavailable() {
        let talos = MockTalosClient::new(NODE_ADDRESS);
        let err = reader(talos.clone(), FakeNodeAnnotations::new())
            .observe()
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to resolve node identity: "));
        assert!(matches!(err.root(), UpdaterError::ResourceUnavailable(_)));
        assert_eq!(talos.calls(), vec![MockCall::Nodename]);
    }

    #[tokio::test]
    async fn test_unreachable_node_is_rpc_error() {
        let talos = mock_node(SCHEMATIC, "v1.5.0").fail_with(
            MockCall::Nodename,
            Code::Unavailable,
            "connection refused",
        );
        let err = reader(talos, FakeNodeAnnotations::new())
            .resolve_node_identity()
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_missing_install_image() {
        let talos = MockTalosClient::new(NODE_ADDRESS)
            .with_nodename(NODE_NAME)
            .with_machine_config_yaml("version: v1alpha1\nmachine:\n  type: worker\n")
            .unwrap();
        let err = reader(talos, FakeNodeAnnotations::new())
            .resolve_machine_image()
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::ResourceUnavailable(_)));
    }

    #[tokio::test]
    async fn test_digest_only_image_is_reference_error() {
        let image = format!("factory.talos.dev/installer/{SCHEMATIC}@sha256:{}", "a".repeat(64));
        let talos = MockTalosClient::new(NODE_ADDRESS)
            .with_nodename(NODE_NAME)
            .with_install_image(image)
            .with_version("v1.5.0");
        let cluster = FakeNodeAnnotations::with_schematic(NODE_NAME, SCHEMATIC);

        let err = reader(talos.clone(), cluster.clone()).observe().await.unwrap_err();

        assert!(err.to_string().starts_with("failed to resolve machine image: "));
        assert!(matches!(
            err.root(),
            UpdaterError::ReferenceParse(ReferenceError::NotTagged(_))
        ));
        assert!(cluster.lookups().is_empty());
        assert!(!talos.calls().contains(&MockCall::Version));
    }

    #[tokio::test]
    async fn test_missing_annotation() {
        let talos = mock_node(SCHEMATIC, "v1.5.0");
        let err = reader(talos, FakeNodeAnnotations::new())
            .observe()
            .await
            .unwrap_err();

        match err.root() {
            UpdaterError::AnnotationMissing { node, annotation } => {
                assert_eq!(node, NODE_NAME);
                assert_eq!(*annotation, SCHEMATIC_ANNOTATION);
            }
            other => panic!("expected missing annotation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_cluster_failure() {
        let talos = mock_node(SCHEMATIC, "v1.5.0");
        let err = reader(talos, FakeNodeAnnotations::failing("nodes \"talos-cp-1\" is forbidden"))
            .observe()
            .await
            .unwrap_err();

        assert!(matches!(err.root(), UpdaterError::ClusterApi(_)));
    }

    #[tokio::test]
    async fn test_version_node_error_is_rpc_error() {
        let talos = mock_node(SCHEMATIC, "v1.5.0").fail_with(
            MockCall::Version,
            Code::PermissionDenied,
            "not authorized",
        );
        let err = reader(talos, FakeNodeAnnotations::with_schematic(NODE_NAME, SCHEMATIC))
            .observe()
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("failed to resolve running version: "));
        assert!(matches!(err.root(), UpdaterError::Rpc(_)));
    }

    #[tokio::test]
    async fn test_empty_version_response_is_rpc_error() {
        let talos = MockTalosClient::new(NODE_ADDRESS);
        let err = reader(talos, FakeNodeAnnotations::new())
            .resolve_running_version()
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::Rpc(TalosError::EmptyResponse(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_talos_call_times_out() {
        let talos = mock_node(SCHEMATIC, "v1.5.0").hang(MockCall::Version);
        let err = reader(talos, FakeNodeAnnotations::new())
            .resolve_running_version()
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::Rpc(TalosError::Timeout(t)) if t == TIMEOUT));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_cluster_call_times_out() {
        let err = reader(mock_node(SCHEMATIC, "v1.5.0"), FakeNodeAnnotations::hanging())
            .resolve_schematic_annotation(&NodeIdentity::from(NODE_NAME))
            .await
            .unwrap_err();

        assert!(matches!(err, UpdaterError::ClusterApi(_)));
        assert!(err.to_string().contains("timed out"));
    }
}
