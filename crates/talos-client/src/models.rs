//! Talos API models
//!
//! Plain Rust views of the protobuf responses, decoupled from the wire types
//! so callers and mocks do not depend on prost.

use crate::error::TalosError;
use crate::pb;
use serde::Deserialize;

/// COSI resource coordinates (namespace, type, id)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceRef {
    /// Resource namespace
    pub namespace: &'static str,
    /// Resource type
    pub r#type: &'static str,
    /// Resource id
    pub id: &'static str,
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.namespace, self.r#type, self.id)
    }
}

/// Kubernetes node name the machine registers with
pub const NODENAME: ResourceRef = ResourceRef {
    namespace: "k8s",
    r#type: "Nodenames.kubernetes.talos.dev",
    id: "nodename",
};

/// Active machine configuration
pub const MACHINE_CONFIG: ResourceRef = ResourceRef {
    namespace: "config",
    r#type: "MachineConfigs.config.talos.dev",
    id: "v1alpha1",
};

/// Nodename resource spec
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nodename {
    /// Kubernetes node name
    pub nodename: String,
    /// Hostname version the name was derived from
    #[serde(default)]
    pub hostname_version: String,
    /// Whether kubelet skips node registration
    #[serde(default)]
    pub skip_node_registration: bool,
}

impl Nodename {
    /// Decode a Nodename resource returned by the COSI API
    pub fn from_resource(resource: &pb::cosi::resource::Resource) -> Result<Self, TalosError> {
        let spec = expect_type(resource, &NODENAME)?;

        if !spec.yaml_spec.trim().is_empty() {
            return Ok(serde_yaml::from_str(&spec.yaml_spec)?);
        }

        let proto: pb::definitions::k8s::NodenameSpec = prost::Message::decode(spec.proto_spec.as_slice())?;
        Ok(Self {
            nodename: proto.nodename,
            hostname_version: proto.hostname_version,
            skip_node_registration: proto.skip_node_registration,
        })
    }
}

/// Active machine configuration document(s)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    install_image: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    machine: Option<MachineSection>,
}

#[derive(Debug, Default, Deserialize)]
struct MachineSection {
    #[serde(default)]
    install: Option<InstallSection>,
}

#[derive(Debug, Default, Deserialize)]
struct InstallSection {
    #[serde(default)]
    image: Option<String>,
}

impl MachineConfig {
    /// Parse a (possibly multi-document) machine configuration
    ///
    /// The install image comes from the first document with a non-empty
    /// `machine.install.image`; other documents are ignored.
    pub fn from_yaml(yaml: &str) -> Result<Self, TalosError> {
        let mut install_image = None;

        for document in serde_yaml::Deserializer::from_str(yaml) {
            let value = serde_yaml::Value::deserialize(document)?;
            if value.is_null() {
                continue;
            }
            let document: ConfigDocument = serde_yaml::from_value(value)?;
            let image = document
                .machine
                .and_then(|machine| machine.install)
                .and_then(|install| install.image)
                .filter(|image| !image.is_empty());
            if image.is_some() {
                install_image = image;
                break;
            }
        }

        Ok(Self { install_image })
    }

    /// Decode a MachineConfig resource returned by the COSI API
    ///
    /// Machine config resources carry the encoded config document itself; it
    /// is read from the YAML spec, or from the raw proto spec bytes when the
    /// YAML spec is empty.
    pub fn from_resource(resource: &pb::cosi::resource::Resource) -> Result<Self, TalosError> {
        let spec = expect_type(resource, &MACHINE_CONFIG)?;

        if !spec.yaml_spec.trim().is_empty() {
            return Self::from_yaml(&spec.yaml_spec);
        }

        let raw = std::str::from_utf8(&spec.proto_spec).map_err(|e| {
            TalosError::UnexpectedResource(format!("{MACHINE_CONFIG} spec is not UTF-8: {e}"))
        })?;
        Self::from_yaml(raw)
    }

    /// Configured OS install image (`machine.install.image`)
    pub fn install_image(&self) -> Option<&str> {
        self.install_image.as_deref()
    }

    /// Build a config carrying only an install image
    pub fn with_install_image(image: impl Into<String>) -> Self {
        Self {
            install_image: Some(image.into()),
        }
    }
}

fn expect_type<'a>(
    resource: &'a pb::cosi::resource::Resource,
    expected: &ResourceRef,
) -> Result<&'a pb::cosi::resource::Spec, TalosError> {
    let metadata = resource
        .metadata
        .as_ref()
        .ok_or_else(|| TalosError::UnexpectedResource(format!("{expected} has no metadata")))?;

    if metadata.r#type != expected.r#type {
        return Err(TalosError::UnexpectedResource(format!(
            "expected {}, got {}",
            expected.r#type, metadata.r#type
        )));
    }

    resource
        .spec
        .as_ref()
        .ok_or_else(|| TalosError::UnexpectedResource(format!("{expected} has no spec")))
}

/// Running Talos version of a node
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VersionInfo {
    /// Hostname reported in the response metadata
    pub hostname: String,
    /// Version tag (e.g. `v1.7.6`)
    pub tag: String,
    /// Git SHA of the build
    pub sha: String,
    /// Build architecture
    pub arch: String,
}

impl VersionInfo {
    /// Build version info from the first message of a Version response
    pub fn from_response(response: pb::machine::VersionResponse) -> Result<Self, TalosError> {
        let message = response
            .messages
            .into_iter()
            .next()
            .ok_or(TalosError::EmptyResponse("Version"))?;

        let hostname = check_metadata(message.metadata)?;
        let version = message.version.unwrap_or_default();

        Ok(Self {
            hostname,
            tag: version.tag,
            sha: version.sha,
            arch: version.arch,
        })
    }
}

/// Reboot behaviour after an upgrade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RebootMode {
    /// kexec into the new kernel where supported
    #[default]
    Default,
    /// Full power cycle
    Powercycle,
}

impl From<RebootMode> for pb::machine::upgrade_request::RebootMode {
    fn from(mode: RebootMode) -> Self {
        match mode {
            RebootMode::Default => Self::Default,
            RebootMode::Powercycle => Self::Powercycle,
        }
    }
}

impl std::fmt::Display for RebootMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(pb::machine::upgrade_request::RebootMode::from(*self).as_str_name())
    }
}

/// Upgrade request options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeOptions {
    /// Installer image to upgrade to
    pub image: String,
    /// Keep the ephemeral partition
    pub preserve: bool,
    /// Stage the upgrade to run on next reboot
    pub stage: bool,
    /// Skip etcd health checks
    pub force: bool,
    /// Reboot behaviour
    pub reboot_mode: RebootMode,
}

impl From<&UpgradeOptions> for pb::machine::UpgradeRequest {
    fn from(options: &UpgradeOptions) -> Self {
        Self {
            image: options.image.clone(),
            preserve: options.preserve,
            stage: options.stage,
            force: options.force,
            reboot_mode: pb::machine::upgrade_request::RebootMode::from(options.reboot_mode) as i32,
        }
    }
}

/// Acknowledgement of an accepted upgrade
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UpgradeAck {
    /// Hostname reported in the response metadata
    pub hostname: String,
    /// Acknowledgement message
    pub ack: String,
    /// Actor ID of the upgrade sequence
    pub actor_id: String,
}

impl UpgradeAck {
    /// Build an ack from the first message of an Upgrade response
    pub fn from_response(response: pb::machine::UpgradeResponse) -> Result<Self, TalosError> {
        let message = response
            .messages
            .into_iter()
            .next()
            .ok_or(TalosError::EmptyResponse("Upgrade"))?;

        let hostname = check_metadata(message.metadata)?;

        Ok(Self {
            hostname,
            ack: message.ack,
            actor_id: message.actor_id,
        })
    }
}

/// Surface per-node errors the API proxy embeds in response metadata
fn check_metadata(metadata: Option<pb::common::Metadata>) -> Result<String, TalosError> {
    let metadata = metadata.unwrap_or_default();
    if metadata.error.is_empty() {
        Ok(metadata.hostname)
    } else {
        Err(TalosError::Node {
            hostname: metadata.hostname,
            message: metadata.error,
        })
    }
}
