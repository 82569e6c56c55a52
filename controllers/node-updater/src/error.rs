//! Updater error types.
//!
//! Library errors (`TalosError`, `ReferenceError`, kube errors) are mapped
//! into this taxonomy where the state reader and reconciler call out, and
//! each failure is wrapped with the step it happened in.

use image_reference::ReferenceError;
use talos_client::TalosError;
use thiserror::Error;

/// Errors that can occur during a reconciliation pass.
#[derive(Debug, Error)]
pub enum UpdaterError {
    /// A Talos resource is missing or does not have the expected shape
    #[error("resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The configured install image is not a valid tagged reference
    #[error("invalid image reference: {0}")]
    ReferenceParse(#[from] ReferenceError),

    /// The Kubernetes node carries no schematic annotation
    #[error("node {node} has no {annotation} annotation")]
    AnnotationMissing {
        /// Kubernetes node name
        node: String,
        /// Annotation key looked up
        annotation: &'static str,
    },

    /// Kubernetes API lookup failed (config, auth, network, not found, timeout)
    #[error("Kubernetes API error: {0}")]
    ClusterApi(String),

    /// Talos API call failed in transport or protocol
    #[error("Talos API error: {0}")]
    Rpc(#[source] TalosError),

    /// The node declined the upgrade request
    #[error("upgrade rejected: {0}")]
    UpgradeRejected(#[source] TalosError),

    /// A shutdown signal arrived before an upgrade was submitted
    #[error("interrupted by shutdown signal")]
    Interrupted,

    /// Invalid command line or client configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A failure annotated with the step it happened in
    #[error("failed to {step}: {source}")]
    Step {
        /// Step being performed, e.g. `resolve node identity`
        step: &'static str,
        /// Underlying failure
        source: Box<UpdaterError>,
    },
}

impl UpdaterError {
    /// The failure without step context
    pub fn root(&self) -> &Self {
        match self {
            Self::Step { source, .. } => source.root(),
            other => other,
        }
    }
}

/// Attach step context to a fallible result.
pub trait StepContext<T> {
    /// Wrap the error as `failed to <step>: <cause>`
    fn step(self, step: &'static str) -> Result<T, UpdaterError>;
}

impl<T, E: Into<UpdaterError>> StepContext<T> for Result<T, E> {
    fn step(self, step: &'static str) -> Result<T, UpdaterError> {
        self.map_err(|e| UpdaterError::Step {
            step,
            source: Box::new(e.into()),
        })
    }
}
