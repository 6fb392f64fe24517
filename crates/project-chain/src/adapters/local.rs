//! In-process node client
//!
//! Implements both outbound ports (`NodeClient`, `LeaderGateway`) by calling
//! the inbound API of a `ProjectNode` living in the same process.

use crate::domain::{BroadcastOutcome, LeaderError, NodeIdentity, ProjectEvent, ProjectGenesis};
use crate::ports::{LeaderGateway, NodeClient, ProjectNodeApi};
use crate::service::ProjectNode;
use async_trait::async_trait;
use shared_types::{NodeRoute, Uid};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Client for a node in the same process.
pub struct LocalNodeClient {
    node: Arc<ProjectNode>,
    offline: AtomicBool,
}

impl LocalNodeClient {
    pub fn new(node: Arc<ProjectNode>) -> Self {
        Self {
            node,
            offline: AtomicBool::new(false),
        }
    }

    pub fn node(&self) -> &Arc<ProjectNode> {
        &self.node
    }

    /// Simulate a network partition: every call fails while offline.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_reachable(&self) -> Result<(), String> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(format!("{} is offline", self.node.name()));
        }
        Ok(())
    }
}

#[async_trait]
impl NodeClient for LocalNodeClient {
    fn identity(&self) -> NodeIdentity {
        self.node.identity().clone()
    }

    fn route(&self) -> NodeRoute {
        self.node.route().clone()
    }

    fn name(&self) -> String {
        self.node.name().to_string()
    }

    async fn add_route(&self, peer: NodeIdentity, route: NodeRoute) -> Result<(), String> {
        self.check_reachable()?;
        self.node.add_route(peer, route).await
    }

    async fn create_project(&self, genesis: ProjectGenesis) -> Result<ProjectGenesis, String> {
        self.check_reachable()?;
        self.node.create_project(genesis).await
    }
}

#[async_trait]
impl LeaderGateway for LocalNodeClient {
    async fn broadcast_event(&self, event: ProjectEvent) -> Result<BroadcastOutcome, LeaderError> {
        self.check_reachable().map_err(LeaderError::Unreachable)?;
        self.node.broadcast_event(event).await
    }

    async fn sync(&self, project_id: Uid, since_seq_no: u64) -> Result<Vec<ProjectEvent>, LeaderError> {
        self.check_reachable().map_err(LeaderError::Unreachable)?;
        ProjectNodeApi::sync(self.node.as_ref(), project_id, since_seq_no).await
    }
}
