//! Test utilities for unit testing the state reader and reconciler
//!
//! This module provides an in-memory annotation lookup and helpers for
//! setting up mock Talos nodes.

use crate::cluster::{NodeAnnotations, SCHEMATIC_ANNOTATION};
use crate::error::UpdaterError;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use talos_client::MockTalosClient;

/// Node address the mocks answer for
pub const NODE_ADDRESS: &str = "10.0.0.11";

/// Kubernetes node name the mocks report
pub const NODE_NAME: &str = "talos-cp-1";

/// Factory installer image for `schematic` at `tag`
pub fn installer_image(schematic: &str, tag: &str) -> String {
    format!("factory.talos.dev/installer/{schematic}:{tag}")
}

/// Mock Talos node with identity, install image and running version set
pub fn mock_node(schematic: &str, running_tag: &str) -> MockTalosClient {
    MockTalosClient::new(NODE_ADDRESS)
        .with_nodename(NODE_NAME)
        .with_install_image(installer_image(schematic, running_tag))
        .with_version(running_tag)
}

#[derive(Debug, Clone)]
enum Behaviour {
    Answer,
    Fail(String),
    Hang,
}

/// In-memory NodeAnnotations
#[derive(Debug, Clone)]
pub struct FakeNodeAnnotations {
    annotations: Arc<Mutex<HashMap<(String, String), String>>>,
    behaviour: Behaviour,
    lookups: Arc<Mutex<Vec<String>>>,
}

impl FakeNodeAnnotations {
    /// Cluster where no node carries any annotation
    pub fn new() -> Self {
        Self {
            annotations: Arc::new(Mutex::new(HashMap::new())),
            behaviour: Behaviour::Answer,
            lookups: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Cluster where `node` carries `schematic` in the schematic annotation
    pub fn with_schematic(node: &str, schematic: &str) -> Self {
        let fake = Self::new();
        fake.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((node.to_string(), SCHEMATIC_ANNOTATION.to_string()), schematic.to_string());
        fake
    }

    /// Make every lookup fail with a cluster API error
    pub fn failing(message: &str) -> Self {
        Self {
            behaviour: Behaviour::Fail(message.to_string()),
            ..Self::new()
        }
    }

    /// Make every lookup never complete
    pub fn hanging() -> Self {
        Self {
            behaviour: Behaviour::Hang,
            ..Self::new()
        }
    }

    /// Node names looked up so far
    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait::async_trait]
impl NodeAnnotations for FakeNodeAnnotations {
    async fn node_annotation(&self, node: &str, key: &str) -> Result<Option<String>, UpdaterError> {
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(node.to_string());

        match &self.behaviour {
            Behaviour::Answer => Ok(self
                .annotations
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .get(&(node.to_string(), key.to_string()))
                .cloned()),
            Behaviour::Fail(message) => Err(UpdaterError::ClusterApi(message.clone())),
            Behaviour::Hang => std::future::pending().await,
        }
    }
}
