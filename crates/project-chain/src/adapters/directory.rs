//! In-memory node directory
//!
//! Stands in for a client session cache: maps node identities to live
//! in-process clients.

use super::LocalNodeClient;
use crate::domain::NodeIdentity;
use crate::ports::{LeaderGateway, NodeClient, NodeDirectory};
use crate::service::ProjectNode;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Default)]
pub struct InMemoryNodeDirectory {
    clients: RwLock<HashMap<NodeIdentity, Arc<LocalNodeClient>>>,
}

impl InMemoryNodeDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node` and return a client for it.
    pub fn register(&self, node: Arc<ProjectNode>) -> Arc<LocalNodeClient> {
        let identity = node.identity().clone();
        let client = Arc::new(LocalNodeClient::new(node));
        self.clients.write().insert(identity, client.clone());
        client
    }

    pub fn local_client(&self, identity: &NodeIdentity) -> Option<Arc<LocalNodeClient>> {
        self.clients.read().get(identity).cloned()
    }

    pub fn len(&self) -> usize {
        self.clients.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.read().is_empty()
    }
}

impl NodeDirectory for InMemoryNodeDirectory {
    fn client_for(&self, identity: &NodeIdentity) -> Option<Arc<dyn NodeClient>> {
        self.local_client(identity)
            .map(|client| client as Arc<dyn NodeClient>)
    }

    fn leader_for(&self, identity: &NodeIdentity) -> Option<Arc<dyn LeaderGateway>> {
        self.local_client(identity)
            .map(|client| client as Arc<dyn LeaderGateway>)
    }
}
