//! Reconciliation of a node against the desired version.
//!
//! A node is current when it runs the desired tag and its Kubernetes
//! schematic annotation matches the schematic in its configured install
//! image. Otherwise the configured image is retagged and submitted as an
//! upgrade; the repository name, and with it the schematic, never changes.

use crate::error::{StepContext, UpdaterError};
use crate::state::{ObservedState, with_timeout};
use image_reference::ImageReference;
use std::sync::Arc;
use std::time::Duration;
use talos_client::{RebootMode, TalosClientTrait, UpgradeOptions};
use tracing::info;

/// Target state supplied by the operator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DesiredState {
    /// Talos version tag the node should run
    pub tag: String,
    /// Power cycle instead of the default reboot
    pub powercycle: bool,
    /// Stage the upgrade for the next reboot
    pub staged: bool,
}

/// Outcome of a successful pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileResult {
    /// The node already runs the desired version and schematic
    NoChangeNeeded,
    /// An upgrade to the contained image was accepted by the node
    UpgradeIssued(ImageReference),
}

/// Schematic ID encoded in an installer image: the last segment of its
/// repository name.
pub fn schematic_of(image: &ImageReference) -> &str {
    let path = image.path();
    path.rsplit_once('/').map_or(path, |(_, last)| last)
}

/// Decides whether a node needs upgrading and submits the upgrade
pub struct Reconciler {
    talos: Arc<dyn TalosClientTrait>,
    timeout: Duration,
}

impl Reconciler {
    /// Create a reconciler submitting upgrades through `talos`
    pub fn new(talos: Arc<dyn TalosClientTrait>, timeout: Duration) -> Self {
        Self { talos, timeout }
    }

    /// Compare observed against desired state and upgrade if they differ
    pub async fn reconcile(
        &self,
        observed: &ObservedState,
        desired: &DesiredState,
    ) -> Result<ReconcileResult, UpdaterError> {
        let current_schematic = schematic_of(&observed.image);

        if observed.running_version == desired.tag
            && observed.schematic_annotation == current_schematic
        {
            info!(
                node = %observed.identity,
                version = %observed.running_version,
                schematic = %current_schematic,
                "Node is up to date"
            );
            return Ok(ReconcileResult::NoChangeNeeded);
        }

        info!(
            node = %observed.identity,
            running_version = %observed.running_version,
            desired_version = %desired.tag,
            annotated_schematic = %observed.schematic_annotation,
            configured_schematic = %current_schematic,
            "Node has drifted from the desired state"
        );

        let image = observed
            .image
            .with_tag(&desired.tag)
            .step("build upgrade image")?;

        let options = UpgradeOptions {
            image: image.to_string(),
            preserve: true,
            stage: desired.staged,
            force: false,
            reboot_mode: if desired.powercycle {
                RebootMode::Powercycle
            } else {
                RebootMode::Default
            },
        };

        self.submit(&options).await.step("submit upgrade")?;

        Ok(ReconcileResult::UpgradeIssued(image))
    }

    async fn submit(&self, options: &UpgradeOptions) -> Result<(), UpdaterError> {
        info!(
            image = %options.image,
            stage = options.stage,
            reboot_mode = %options.reboot_mode,
            "Submitting upgrade"
        );

        let ack = with_timeout(self.timeout, self.talos.upgrade(options))
            .await
            .map_err(|e| {
                if e.is_transport() {
                    UpdaterError::Rpc(e)
                } else {
                    UpdaterError::UpgradeRejected(e)
                }
            })?;

        info!(
            hostname = %ack.hostname,
            actor_id = %ack.actor_id,
            "Upgrade accepted: {}", ack.ack
        );
        Ok(())
    }
}
