//! Talos client errors

use std::time::Duration;
use thiserror::Error;
use tonic::Code;

/// Message prefix of the status the generated clients return when the
/// channel fails before a request is sent
const SERVICE_NOT_READY: &str = "Service was not ready";

/// Errors that can occur when talking to the Talos machine API
#[derive(Debug, Error)]
pub enum TalosError {
    /// Channel could not be established (connect, TLS handshake, bad URI)
    #[error("transport error: {0}")]
    Transport(#[from] tonic::transport::Error),

    /// The API answered with a non-OK gRPC status
    #[error("gRPC error: {}: {}", .0.code(), .0.message())]
    Status(Box<tonic::Status>),

    /// The call did not complete in time
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The node reported an error for this request in the response metadata
    #[error("node {hostname} returned an error: {message}")]
    Node {
        /// Hostname reported in the response metadata
        hostname: String,
        /// Error message reported by the node
        message: String,
    },

    /// The requested resource does not exist on the node
    #[error("resource not found: {0}")]
    NotFound(String),

    /// The resource exists but does not have the expected type or shape
    #[error("unexpected resource: {0}")]
    UnexpectedResource(String),

    /// The API returned a response without any messages
    #[error("empty response from {0}")]
    EmptyResponse(&'static str),

    /// talosconfig is missing, malformed or incomplete
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error (reading talosconfig)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization error (talosconfig, resource specs)
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Protobuf decoding error (resource specs)
    #[error("protobuf decode error: {0}")]
    Decode(#[from] prost::DecodeError),

    /// Base64 decoding error (talosconfig credentials)
    #[error("base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),
}

impl From<tonic::Status> for TalosError {
    fn from(status: tonic::Status) -> Self {
        Self::Status(Box::new(status))
    }
}

impl TalosError {
    /// Whether the request never got a definitive answer from the node
    ///
    /// Transport failures, timeouts and the gRPC codes tonic uses for them
    /// count as transport errors; any other status was produced by the node
    /// itself. The generated clients report a channel that never became
    /// ready as `Unknown`, so that status is matched by its message.
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport(_) | Self::Timeout(_) => true,
            Self::Status(status) => match status.code() {
                Code::Unavailable | Code::DeadlineExceeded | Code::Cancelled => true,
                Code::Unknown => status.message().starts_with(SERVICE_NOT_READY),
                _ => false,
            },
            _ => false,
        }
    }

    /// Whether the error says the resource is absent or not what was asked for
    pub fn is_resource_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_) | Self::UnexpectedResource(_) | Self::Yaml(_) | Self::Decode(_)
        )
    }
}
