//! talosconfig loading
//!
//! A talosconfig file names a current context and, per context, the API
//! endpoints plus base64 encoded PEM credentials for mutual TLS:
//!
//! ```yaml
//! context: homelab
//! contexts:
//!   homelab:
//!     endpoints: [10.0.0.10]
//!     nodes: [10.0.0.11]
//!     ca: LS0tLS1CRUdJTi...
//!     crt: LS0tLS1CRUdJTi...
//!     key: LS0tLS1CRUdJTi...
//! ```

use crate::error::TalosError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Port the Talos API (apid) listens on
pub const DEFAULT_API_PORT: u16 = 50000;

/// talosconfig mounted into pods by the Talos Kubernetes service account feature
pub const SERVICE_ACCOUNT_CONFIG_PATH: &str = "/var/run/secrets/talos.dev/config";

/// Parsed talosconfig file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalosConfig {
    /// Name of the current context
    #[serde(default)]
    pub context: Option<String>,
    /// All contexts keyed by name
    #[serde(default)]
    pub contexts: BTreeMap<String, TalosContext>,
}

/// A single talosconfig context
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TalosContext {
    /// API endpoints (host, host:port or URL)
    #[serde(default)]
    pub endpoints: Vec<String>,
    /// Default target nodes
    #[serde(default)]
    pub nodes: Vec<String>,
    /// Base64 encoded CA certificate (PEM)
    #[serde(default)]
    pub ca: String,
    /// Base64 encoded client certificate (PEM)
    #[serde(default)]
    pub crt: String,
    /// Base64 encoded client key (PEM)
    #[serde(default)]
    pub key: String,
}

/// Decoded PEM credentials of a context
#[derive(Debug, Clone)]
pub struct Credentials {
    /// CA certificate PEM
    pub ca_pem: Vec<u8>,
    /// Client certificate PEM
    pub cert_pem: Vec<u8>,
    /// Client key PEM
    pub key_pem: Vec<u8>,
}

impl TalosConfig {
    /// Parse a talosconfig document
    pub fn from_yaml(yaml: &str) -> Result<Self, TalosError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load talosconfig from `path`, or from the first default location that exists
    ///
    /// Default locations, in order: `~/.talos/config`, then the Talos
    /// service account mount.
    pub fn load(path: Option<&Path>) -> Result<(Self, PathBuf), TalosError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_path().ok_or_else(|| {
                TalosError::Config(format!(
                    "no talosconfig found in ~/.talos/config or {SERVICE_ACCOUNT_CONFIG_PATH}"
                ))
            })?,
        };

        debug!("Loading talosconfig from {}", path.display());
        let contents = std::fs::read_to_string(&path).map_err(|e| {
            TalosError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;

        Ok((Self::from_yaml(&contents)?, path))
    }

    /// Select a context by name, falling back to the file's current context
    pub fn context(&self, name: Option<&str>) -> Result<&TalosContext, TalosError> {
        let name = name
            .or(self.context.as_deref())
            .ok_or_else(|| TalosError::Config("talosconfig has no current context".to_string()))?;

        self.contexts
            .get(name)
            .ok_or_else(|| TalosError::Config(format!("context {name:?} not found in talosconfig")))
    }
}

impl TalosContext {
    /// Decode the context's base64 PEM credentials
    pub fn credentials(&self) -> Result<Credentials, TalosError> {
        let decode = |field: &str, value: &str| -> Result<Vec<u8>, TalosError> {
            if value.is_empty() {
                return Err(TalosError::Config(format!(
                    "talosconfig context has no {field}"
                )));
            }
            Ok(STANDARD.decode(value.trim())?)
        };

        Ok(Credentials {
            ca_pem: decode("ca", &self.ca)?,
            cert_pem: decode("crt", &self.crt)?,
            key_pem: normalize_key_pem(&decode("key", &self.key)?),
        })
    }

    /// HTTPS URIs for the context endpoints
    ///
    /// Without configured endpoints the target node is contacted directly.
    pub fn endpoint_uris(&self, node: &str) -> Vec<String> {
        if self.endpoints.is_empty() {
            return vec![endpoint_uri(node)];
        }
        self.endpoints.iter().map(|e| endpoint_uri(e)).collect()
    }
}

/// Talos labels Ed25519 PKCS#8 keys `ED25519 PRIVATE KEY`; rustls only knows
/// the generic `PRIVATE KEY` label for the same encoding.
fn normalize_key_pem(pem: &[u8]) -> Vec<u8> {
    match std::str::from_utf8(pem) {
        Ok(text) if text.contains("ED25519 PRIVATE KEY") => {
            text.replace("ED25519 PRIVATE KEY", "PRIVATE KEY").into_bytes()
        }
        _ => pem.to_vec(),
    }
}

/// Turn a talosconfig endpoint into an `https://host:port` URI
pub fn endpoint_uri(endpoint: &str) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return endpoint.to_string();
    }

    let has_port = if let Some(rest) = endpoint.strip_prefix('[') {
        rest.split_once(']')
            .is_some_and(|(_, after)| after.starts_with(':'))
    } else {
        endpoint.matches(':').count() == 1
    };

    if has_port {
        format!("https://{endpoint}")
    } else if endpoint.contains(':') && !endpoint.starts_with('[') {
        // bare IPv6 address
        format!("https://[{endpoint}]:{DEFAULT_API_PORT}")
    } else {
        format!("https://{endpoint}:{DEFAULT_API_PORT}")
    }
}

fn default_path() -> Option<PathBuf> {
    let home = dirs::home_dir().map(|home| home.join(".talos").join("config"));
    let service_account = PathBuf::from(SERVICE_ACCOUNT_CONFIG_PATH);

    home.into_iter()
        .chain(std::iter::once(service_account))
        .find(|path| path.exists())
}
