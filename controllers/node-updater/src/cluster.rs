//! Kubernetes node annotation lookup.

use crate::error::UpdaterError;
use k8s_openapi::api::core::v1::Node;
use kube::Api;
use kube::config::KubeConfigOptions;
use tracing::debug;

/// Annotation Talos sets on its Kubernetes node with the running schematic ID
pub const SCHEMATIC_ANNOTATION: &str = "extensions.talos.dev/schematic";

/// Read access to Kubernetes node annotations
///
/// Abstracted so the state reader can be tested without a cluster.
#[async_trait::async_trait]
pub trait NodeAnnotations: Send + Sync {
    /// Value of annotation `key` on node `node`
    ///
    /// Returns `Ok(None)` when the node exists but lacks the annotation;
    /// any lookup failure is a [`UpdaterError::ClusterApi`].
    async fn node_annotation(&self, node: &str, key: &str) -> Result<Option<String>, UpdaterError>;
}

/// Node annotations read through the Kubernetes API
///
/// The client is built on first use from kubeconfig (or the in-cluster
/// service account), optionally pinned to a kubeconfig context.
#[derive(Debug, Clone, Default)]
pub struct KubeNodeAnnotations {
    context: Option<String>,
}

impl KubeNodeAnnotations {
    /// Create a lookup using `context`, or the default kubeconfig context
    pub fn new(context: Option<String>) -> Self {
        Self { context }
    }

    async fn client(&self) -> Result<kube::Client, UpdaterError> {
        let config = match self.context.as_deref() {
            Some(ctx) => {
                debug!("Using kubeconfig context: {}", ctx);
                kube::Config::from_kubeconfig(&KubeConfigOptions {
                    context: Some(ctx.to_string()),
                    ..Default::default()
                })
                .await
                .map_err(|e| UpdaterError::ClusterApi(format!("context '{ctx}': {e}")))?
            }
            None => {
                debug!("Inferring Kubernetes client configuration");
                kube::Config::infer()
                    .await
                    .map_err(|e| UpdaterError::ClusterApi(e.to_string()))?
            }
        };

        kube::Client::try_from(config).map_err(|e| UpdaterError::ClusterApi(e.to_string()))
    }
}

#[async_trait::async_trait]
impl NodeAnnotations for KubeNodeAnnotations {
    async fn node_annotation(&self, node: &str, key: &str) -> Result<Option<String>, UpdaterError> {
        let api: Api<Node> = Api::all(self.client().await?);

        debug!("GET node {}", node);
        let object = api
            .get(node)
            .await
            .map_err(|e| UpdaterError::ClusterApi(format!("get node {node}: {e}")))?;

        Ok(object
            .metadata
            .annotations
            .and_then(|mut annotations| annotations.remove(key)))
    }
}
