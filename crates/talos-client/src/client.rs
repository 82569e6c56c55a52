//! Talos API client
//!
//! Talks gRPC over mutual TLS to the Talos API (apid). Every request carries
//! a `node` metadata entry so the endpoint proxies it to the target node,
//! which lets a single control plane endpoint reach any machine.

use crate::config::{TalosConfig, TalosContext};
use crate::error::TalosError;
use crate::models::*;
use crate::pb::cosi::resource::state_client::StateClient;
use crate::pb::cosi::resource::{GetRequest, Resource};
use crate::pb::machine::UpgradeRequest;
use crate::pb::machine::machine_service_client::MachineServiceClient;
use crate::talos_trait::TalosClientTrait;
use std::path::Path;
use std::time::Duration;
use tonic::Code;
use tonic::metadata::{Ascii, MetadataValue};
use tonic::transport::{Certificate, Channel, ClientTlsConfig, Endpoint, Identity};
use tracing::debug;

/// Metadata key apid routes single-node requests by
const NODE_METADATA_KEY: &str = "node";

/// Talos API client bound to a single target node
#[derive(Debug, Clone)]
pub struct TalosClient {
    node: String,
    node_metadata: MetadataValue<Ascii>,
    timeout: Duration,
    state: StateClient<Channel>,
    machine: MachineServiceClient<Channel>,
}

impl TalosClient {
    /// Create a client for `node` from a talosconfig context
    ///
    /// The channel connects lazily, so an unreachable endpoint surfaces on
    /// the first request rather than here.
    ///
    /// # Arguments
    /// * `context` - talosconfig context with endpoints and credentials
    /// * `node` - address of the node to target
    /// * `timeout` - connect and per-request timeout
    pub fn new(context: &TalosContext, node: impl Into<String>, timeout: Duration) -> Result<Self, TalosError> {
        let node = node.into();
        let node_metadata = MetadataValue::try_from(node.as_str())
            .map_err(|e| TalosError::Config(format!("invalid node address {node:?}: {e}")))?;

        let credentials = context.credentials()?;
        let tls = ClientTlsConfig::new()
            .ca_certificate(Certificate::from_pem(credentials.ca_pem))
            .identity(Identity::from_pem(credentials.cert_pem, credentials.key_pem));

        let endpoints = context
            .endpoint_uris(&node)
            .into_iter()
            .map(|uri| -> Result<Endpoint, TalosError> {
                debug!("Using Talos API endpoint {}", uri);
                Ok(Endpoint::from_shared(uri)?
                    .tls_config(tls.clone())?
                    .connect_timeout(timeout)
                    .timeout(timeout))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let channel = match endpoints.as_slice() {
            [endpoint] => endpoint.connect_lazy(),
            _ => Channel::balance_list(endpoints.into_iter()),
        };

        Ok(Self {
            node,
            node_metadata,
            timeout,
            state: StateClient::new(channel.clone()),
            machine: MachineServiceClient::new(channel),
        })
    }

    /// Create a client from a talosconfig file
    ///
    /// # Arguments
    /// * `path` - talosconfig path, or `None` for the default locations
    /// * `context` - context name, or `None` for the file's current context
    /// * `node` - address of the node to target
    /// * `timeout` - connect and per-request timeout
    pub fn from_talosconfig(
        path: Option<&Path>,
        context: Option<&str>,
        node: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, TalosError> {
        let (config, path) = TalosConfig::load(path)?;
        debug!("Loaded talosconfig from {}", path.display());
        Self::new(config.context(context)?, node, timeout)
    }

    fn request<T>(&self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        request
            .metadata_mut()
            .insert(NODE_METADATA_KEY, self.node_metadata.clone());
        request.set_timeout(self.timeout);
        request
    }

    /// Fetch a COSI resource from the node
    pub async fn get_resource(&self, resource: &ResourceRef) -> Result<Resource, TalosError> {
        debug!("GET resource {} from {}", resource, self.node);

        let request = self.request(GetRequest {
            namespace: resource.namespace.to_string(),
            r#type: resource.r#type.to_string(),
            id: resource.id.to_string(),
            options: None,
        });

        let response = self
            .state
            .clone()
            .get(request)
            .await
            .map_err(|status| match status.code() {
                Code::NotFound => TalosError::NotFound(resource.to_string()),
                _ => TalosError::from(status),
            })?;

        response
            .into_inner()
            .resource
            .ok_or_else(|| TalosError::NotFound(resource.to_string()))
    }
}

#[async_trait::async_trait]
impl TalosClientTrait for TalosClient {
    fn node(&self) -> &str {
        &self.node
    }

    async fn nodename(&self) -> Result<Nodename, TalosError> {
        let resource = self.get_resource(&NODENAME).await?;
        Nodename::from_resource(&resource)
    }

    async fn machine_config(&self) -> Result<MachineConfig, TalosError> {
        let resource = self.get_resource(&MACHINE_CONFIG).await?;
        MachineConfig::from_resource(&resource)
    }

    async fn version(&self) -> Result<VersionInfo, TalosError> {
        debug!("Querying version of {}", self.node);
        let response = self.machine.clone().version(self.request(())).await?;
        VersionInfo::from_response(response.into_inner())
    }

    async fn upgrade(&self, options: &UpgradeOptions) -> Result<UpgradeAck, TalosError> {
        debug!(
            image = %options.image,
            preserve = options.preserve,
            stage = options.stage,
            reboot_mode = %options.reboot_mode,
            "Submitting upgrade to {}", self.node
        );
        let request = self.request(UpgradeRequest::from(options));
        let response = self.machine.clone().upgrade(request).await?;
        UpgradeAck::from_response(response.into_inner())
    }
}
