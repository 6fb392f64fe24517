//! Driven ports (Outbound dependencies)

use crate::domain::{
    BroadcastOutcome, LeaderError, NodeIdentity, ProjectEvent, ProjectGenesis, SubmittedRequest,
    UserCodeRef,
};
use async_trait::async_trait;
use shared_types::{NodeRoute, Uid};
use std::sync::Arc;

/// Remote capability of the project's state-sync leader.
///
/// Every append is ordered by this capability: the leader either accepts an
/// event as the next canonical one or reports that the proposer is behind.
#[async_trait]
pub trait LeaderGateway: Send + Sync {
    /// Propose `event` as the next canonical event.
    async fn broadcast_event(&self, event: ProjectEvent) -> Result<BroadcastOutcome, LeaderError>;

    /// Canonical events with `seq_no > since_seq_no`, in chain order.
    async fn sync(&self, project_id: Uid, since_seq_no: u64) -> Result<Vec<ProjectEvent>, LeaderError>;
}

/// Live connection to a participant node, used at bootstrap.
#[async_trait]
pub trait NodeClient: Send + Sync {
    fn identity(&self) -> NodeIdentity;

    fn route(&self) -> NodeRoute;

    fn name(&self) -> String;

    /// Tell the remote node how to reach `peer`.
    async fn add_route(&self, peer: NodeIdentity, route: NodeRoute) -> Result<(), String>;

    /// Make this node and `peer` reachable from each other.
    async fn exchange_route(&self, peer: &dyn NodeClient) -> Result<(), String> {
        self.add_route(peer.identity(), peer.route()).await?;
        peer.add_route(self.identity(), self.route()).await
    }

    /// Issue a project genesis to the remote node.
    async fn create_project(&self, genesis: ProjectGenesis) -> Result<ProjectGenesis, String>;
}

impl NodeIdentity {
    /// Identity of the node behind a live client.
    pub fn from_client(client: &dyn NodeClient) -> Self {
        client.identity()
    }
}

/// Resolves identities to live connections.
pub trait NodeDirectory: Send + Sync {
    fn client_for(&self, identity: &NodeIdentity) -> Option<Arc<dyn NodeClient>>;

    fn leader_for(&self, identity: &NodeIdentity) -> Option<Arc<dyn LeaderGateway>>;
}

/// Node-local request service that owns the request lifecycle.
#[async_trait]
pub trait RequestService: Send + Sync {
    /// Submit a request to run `code`.
    async fn submit(&self, code: &UserCodeRef) -> Result<SubmittedRequest, String>;

    /// Approve a previously submitted request.
    async fn approve(&self, request: &SubmittedRequest) -> Result<(), String>;
}
