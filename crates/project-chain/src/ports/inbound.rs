//! Driving ports (Inbound API)
//!
//! What a node exposes to its peers: project creation at bootstrap, the
//! leader half of the append protocol, and route exchange.

use crate::domain::{BroadcastOutcome, LeaderError, NodeIdentity, ProjectEvent, ProjectGenesis};
use async_trait::async_trait;
use shared_types::{NodeRoute, Uid};

/// Node-side project API
#[async_trait]
pub trait ProjectNodeApi: Send + Sync {
    /// Store a project issued at bootstrap and echo the stored genesis.
    ///
    /// Fails if the genesis does not hash to its own `start_hash`.
    async fn create_project(&self, genesis: ProjectGenesis) -> Result<ProjectGenesis, String>;

    /// Leader half of an append: accept, flag stale, or reject.
    async fn broadcast_event(&self, event: ProjectEvent) -> Result<BroadcastOutcome, LeaderError>;

    /// Canonical events after `since_seq_no`, in chain order.
    async fn sync(&self, project_id: Uid, since_seq_no: u64) -> Result<Vec<ProjectEvent>, LeaderError>;

    /// Remember how to reach `peer`.
    async fn add_route(&self, peer: NodeIdentity, route: NodeRoute) -> Result<(), String>;
}
