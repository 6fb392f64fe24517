//! Project submission and genesis issuance.

use super::BootstrapError;
use crate::domain::{ConsensusModel, LeaderElection, NodeIdentity, ProjectGenesis};
use crate::ports::{NodeClient, NodeDirectory};
use shared_types::{NodeRoute, Uid};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A participant named either by identity or by a live client.
#[derive(Clone)]
pub enum ShareholderRef {
    Identity(NodeIdentity),
    Client(Arc<dyn NodeClient>),
}

impl ShareholderRef {
    pub fn identity(&self) -> NodeIdentity {
        match self {
            ShareholderRef::Identity(identity) => identity.clone(),
            ShareholderRef::Client(client) => NodeIdentity::from_client(client.as_ref()),
        }
    }
}

impl fmt::Debug for ShareholderRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShareholderRef::Identity(identity) => write!(f, "Identity({})", identity),
            ShareholderRef::Client(client) => write!(f, "Client({})", client.name()),
        }
    }
}

impl From<NodeIdentity> for ShareholderRef {
    fn from(identity: NodeIdentity) -> Self {
        ShareholderRef::Identity(identity)
    }
}

impl From<Arc<dyn NodeClient>> for ShareholderRef {
    fn from(client: Arc<dyn NodeClient>) -> Self {
        ShareholderRef::Client(client)
    }
}

/// Request to start a project.
#[derive(Clone, Debug)]
pub struct ProjectSubmit {
    pub name: String,
    pub description: Option<String>,
    pub shareholders: Vec<ShareholderRef>,
    pub users: Option<Vec<ShareholderRef>>,
    pub user_email_address: Option<String>,
    pub project_permissions: BTreeSet<String>,
    pub consensus_model: ConsensusModel,
    pub leader_node_route: Option<NodeRoute>,
}

impl ProjectSubmit {
    pub fn new(name: impl Into<String>, shareholders: Vec<ShareholderRef>) -> Self {
        Self {
            name: name.into(),
            description: None,
            shareholders,
            users: None,
            user_email_address: None,
            project_permissions: BTreeSet::new(),
            consensus_model: ConsensusModel::default(),
            leader_node_route: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn users(mut self, users: Vec<ShareholderRef>) -> Self {
        self.users = Some(users);
        self
    }

    pub fn user_email_address(mut self, email: impl Into<String>) -> Self {
        self.user_email_address = Some(email.into());
        self
    }

    pub fn permission(mut self, permission: impl Into<String>) -> Self {
        self.project_permissions.insert(permission.into());
        self
    }

    pub fn consensus_model(mut self, model: ConsensusModel) -> Self {
        self.consensus_model = model;
        self
    }

    pub fn leader_node_route(mut self, route: NodeRoute) -> Self {
        self.leader_node_route = Some(route);
        self
    }

    /// Resolve every participant to an identity, check users against
    /// shareholders, and exchange routes when shareholders are live clients.
    pub async fn normalize(self) -> Result<NormalizedSubmit, BootstrapError> {
        if self.shareholders.is_empty() {
            return Err(BootstrapError::NoShareholders);
        }

        if self.user_email_address.is_some() {
            let users = self.users.as_ref().map(Vec::len).unwrap_or(0);
            if users == 0 {
                return Err(BootstrapError::UsersRequired);
            }
            if users != self.shareholders.len() {
                return Err(BootstrapError::UserCountMismatch {
                    users,
                    shareholders: self.shareholders.len(),
                });
            }
        }

        let mut leader_node_route = self.leader_node_route;
        if let Some(ShareholderRef::Client(leader)) = self.shareholders.first() {
            exchange_routes(leader.as_ref(), &self.shareholders[1..]).await?;
            leader_node_route = Some(leader.route());
        }

        Ok(NormalizedSubmit {
            name: self.name,
            description: self.description,
            shareholders: self.shareholders.iter().map(ShareholderRef::identity).collect(),
            users: self
                .users
                .map(|users| users.iter().map(ShareholderRef::identity).collect()),
            user_email_address: self.user_email_address,
            project_permissions: self.project_permissions,
            consensus_model: self.consensus_model,
            leader_node_route,
        })
    }

    /// Normalize, elect a leader and issue the genesis to every target node.
    pub async fn start(
        self,
        directory: &dyn NodeDirectory,
        election: &dyn LeaderElection,
    ) -> Result<Vec<ProjectGenesis>, BootstrapError> {
        self.normalize().await?.start(directory, election).await
    }
}

/// The leader exchanges routes with every follower. Followers do not
/// exchange routes among themselves.
async fn exchange_routes(
    leader: &dyn NodeClient,
    followers: &[ShareholderRef],
) -> Result<(), BootstrapError> {
    for follower in followers {
        let ShareholderRef::Client(follower) = follower else {
            continue;
        };
        info!(
            "[project-chain] exchanging routes {} --- {}",
            leader.name(),
            follower.name()
        );
        leader
            .exchange_route(follower.as_ref())
            .await
            .map_err(|reason| BootstrapError::RouteExchange {
                leader: leader.name(),
                follower: follower.name(),
                reason,
            })?;
    }
    Ok(())
}

/// Submission with every participant resolved to an identity.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSubmit {
    pub name: String,
    pub description: Option<String>,
    pub shareholders: Vec<NodeIdentity>,
    pub users: Option<Vec<NodeIdentity>>,
    pub user_email_address: Option<String>,
    pub project_permissions: BTreeSet<String>,
    pub consensus_model: ConsensusModel,
    pub leader_node_route: Option<NodeRoute>,
}

impl NormalizedSubmit {
    /// Genesis for `project_id`: elected leader, owner permissions for every
    /// shareholder when none were given, and the start hash.
    pub fn to_genesis(
        &self,
        project_id: Uid,
        election: &dyn LeaderElection,
    ) -> Result<ProjectGenesis, BootstrapError> {
        if self.shareholders.is_empty() {
            return Err(BootstrapError::NoShareholders);
        }
        let leader = election
            .elect(&self.shareholders, &self.consensus_model)
            .ok_or(BootstrapError::NoLeader)?;

        let project_permissions = if self.project_permissions.is_empty() {
            self.shareholders
                .iter()
                .map(NodeIdentity::owner_permission)
                .collect()
        } else {
            self.project_permissions.clone()
        };

        let mut genesis = ProjectGenesis {
            id: project_id,
            name: self.name.clone(),
            description: self.description.clone(),
            shareholders: self.shareholders.clone(),
            users: self.users.clone(),
            user_email_address: self.user_email_address.clone(),
            project_permissions,
            state_sync_leader: leader,
            leader_node_route: self.leader_node_route.clone(),
            consensus_model: self.consensus_model.clone(),
            start_hash: [0u8; 32],
        };
        genesis.start_hash = genesis
            .compute_start_hash()
            .map_err(|e| BootstrapError::Hashing(e.to_string()))?;
        Ok(genesis)
    }

    /// Issue a fresh project to the user nodes if users were given, else to
    /// the shareholder nodes.
    ///
    /// Nodes that accepted before a later failure keep their copy.
    pub async fn start(
        &self,
        directory: &dyn NodeDirectory,
        election: &dyn LeaderElection,
    ) -> Result<Vec<ProjectGenesis>, BootstrapError> {
        let genesis = self.to_genesis(Uid::new(), election)?;
        let targets = self.users.as_ref().unwrap_or(&self.shareholders);

        let mut issued = Vec::with_capacity(targets.len());
        for identity in targets {
            let client = directory
                .client_for(identity)
                .ok_or_else(|| BootstrapError::NodeUnreachable(identity.clone()))?;

            let stored = client
                .create_project(genesis.clone())
                .await
                .map_err(|reason| BootstrapError::CreateFailed {
                    node: identity.clone(),
                    reason,
                })?;

            if stored.start_hash != genesis.start_hash {
                return Err(BootstrapError::StartHashMismatch {
                    node: identity.clone(),
                });
            }
            debug!(project_id = %genesis.id, "[project-chain] issued to {}", identity);
            issued.push(stored);
        }

        info!(
            project_id = %genesis.id,
            leader = %genesis.state_sync_leader,
            "[project-chain] project '{}' started on {} nodes",
            genesis.name,
            issued.len()
        );
        Ok(issued)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FirstShareholder;
    use shared_crypto::SigningKey;

    fn identity(seed: u8) -> NodeIdentity {
        NodeIdentity::new(Uid::new(), SigningKey::from_seed([seed; 32]).verify_key())
    }

    #[tokio::test]
    async fn test_empty_shareholders_rejected() {
        let err = ProjectSubmit::new("p", vec![]).normalize().await.unwrap_err();
        assert!(matches!(err, BootstrapError::NoShareholders));
    }

    #[tokio::test]
    async fn test_email_requires_matching_users() {
        let a = identity(1);
        let b = identity(2);

        let err = ProjectSubmit::new("p", vec![a.clone().into(), b.clone().into()])
            .user_email_address("ds@example.org")
            .normalize()
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::UsersRequired));

        let err = ProjectSubmit::new("p", vec![a.clone().into(), b.into()])
            .user_email_address("ds@example.org")
            .users(vec![identity(3).into()])
            .normalize()
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BootstrapError::UserCountMismatch { users: 1, shareholders: 2 }
        ));

        let ok = ProjectSubmit::new("p", vec![a.into()])
            .user_email_address("ds@example.org")
            .users(vec![identity(3).into()])
            .normalize()
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_genesis_defaults() {
        let a = identity(1);
        let b = identity(2);
        let normalized = ProjectSubmit::new("p", vec![a.clone().into(), b.clone().into()])
            .normalize()
            .await
            .unwrap();
        assert_eq!(normalized.leader_node_route, None);

        let genesis = normalized.to_genesis(Uid::new(), &FirstShareholder).unwrap();
        assert_eq!(genesis.state_sync_leader, a);
        assert_eq!(
            genesis.project_permissions,
            BTreeSet::from([a.owner_permission(), b.owner_permission()])
        );
        assert_eq!(genesis.consensus_model, ConsensusModel::default());
        assert!(genesis.verify_start_hash().unwrap());
    }

    #[tokio::test]
    async fn test_explicit_permissions_are_kept() {
        let normalized = ProjectSubmit::new("p", vec![identity(1).into()])
            .permission("READ_ALL")
            .normalize()
            .await
            .unwrap();
        let genesis = normalized.to_genesis(Uid::new(), &FirstShareholder).unwrap();
        assert_eq!(genesis.project_permissions, BTreeSet::from(["READ_ALL".to_string()]));
    }
}
