//! Node-side project service
//!
//! A `ProjectNode` stores the replicas of every project it was issued at
//! bootstrap. On the project's leader that replica is canonical and orders
//! every broadcast; on other nodes it only records the genesis.
//!
//! Participants never append to these replicas directly. They open a local
//! `Project` view with `open_project`, which talks back to the leader.

use crate::config::ChainConfig;
use crate::domain::{
    BroadcastOutcome, LeaderError, NodeIdentity, Project, ProjectError, ProjectEvent,
    ProjectGenesis, ProjectResult,
};
use crate::ports::{NodeDirectory, ProjectNodeApi};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_crypto::SigningKey;
use shared_types::{NodeRoute, Uid};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

/// One participant node.
pub struct ProjectNode {
    identity: NodeIdentity,
    route: NodeRoute,
    name: String,
    signing_key: SigningKey,
    config: ChainConfig,
    projects: RwLock<HashMap<Uid, Project>>,
    peers: RwLock<BTreeMap<NodeIdentity, NodeRoute>>,
}

impl ProjectNode {
    pub fn new(name: impl Into<String>, route: NodeRoute, signing_key: SigningKey) -> Self {
        let identity = NodeIdentity::new(Uid::new(), signing_key.verify_key());
        Self {
            identity,
            route,
            name: name.into(),
            signing_key,
            config: ChainConfig::default(),
            projects: RwLock::new(HashMap::new()),
            peers: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn route(&self) -> &NodeRoute {
        &self.route
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Known peer routes.
    pub fn peers(&self) -> Vec<(NodeIdentity, NodeRoute)> {
        self.peers
            .read()
            .iter()
            .map(|(id, route)| (id.clone(), route.clone()))
            .collect()
    }

    pub fn project_ids(&self) -> Vec<Uid> {
        self.projects.read().keys().copied().collect()
    }

    pub fn genesis(&self, project_id: &Uid) -> Option<ProjectGenesis> {
        self.projects.read().get(project_id).map(Project::genesis)
    }

    /// Number of events in the stored replica.
    pub fn replica_len(&self, project_id: &Uid) -> Option<usize> {
        self.projects.read().get(project_id).map(Project::len)
    }

    /// Local view of `project_id`, signed with this node's key and ordered by
    /// the project's leader as resolved through `directory`. Starts empty;
    /// call `sync` to catch up.
    pub fn open_project(
        &self,
        project_id: Uid,
        directory: &dyn NodeDirectory,
    ) -> ProjectResult<Project> {
        let genesis = self
            .genesis(&project_id)
            .ok_or(LeaderError::UnknownProject(project_id))?;
        let leader = directory
            .leader_for(&genesis.state_sync_leader)
            .ok_or(ProjectError::LeaderNotSet)?;

        debug!(
            project_id = %project_id,
            leader = %genesis.state_sync_leader,
            "[project-chain] opened project on {}",
            self.name
        );

        Ok(Project::from_genesis(genesis)
            .with_leader(leader)
            .with_signing_key(self.signing_key.clone())
            .with_config(self.config.clone()))
    }
}

#[async_trait]
impl ProjectNodeApi for ProjectNode {
    async fn create_project(&self, genesis: ProjectGenesis) -> Result<ProjectGenesis, String> {
        let valid = genesis.verify_start_hash().map_err(|e| e.to_string())?;
        if !valid {
            warn!(
                project_id = %genesis.id,
                "[project-chain] {} refused genesis with bad start hash",
                self.name
            );
            return Err(format!("start_hash mismatch for project {:?}", genesis.id));
        }

        let mut projects = self.projects.write();
        if let Some(existing) = projects.get(&genesis.id) {
            if existing.start_hash != genesis.start_hash {
                return Err(format!("project {:?} already exists", genesis.id));
            }
            return Ok(existing.genesis());
        }

        projects.insert(
            genesis.id,
            Project::from_genesis(genesis.clone()).with_config(self.config.clone()),
        );
        info!(
            project_id = %genesis.id,
            "[project-chain] {} created project '{}'",
            self.name,
            genesis.name
        );
        Ok(genesis)
    }

    async fn broadcast_event(&self, event: ProjectEvent) -> Result<BroadcastOutcome, LeaderError> {
        let project_id = event
            .project_id
            .ok_or_else(|| LeaderError::Rejected(format!("Event {:?} has no project", event.id)))?;

        let mut projects = self.projects.write();
        let project = projects
            .get_mut(&project_id)
            .ok_or(LeaderError::UnknownProject(project_id))?;

        if project.state_sync_leader != self.identity {
            return Err(LeaderError::Rejected(format!(
                "{} is not the state sync leader of {:?}",
                self.name, project_id
            )));
        }

        let event_id = event.id;
        let outcome = project.accept_broadcast(event)?;
        debug!(
            project_id = %project_id,
            event_id = %event_id,
            seq_no = project.get_last_seq_no(),
            "[project-chain] leader answered {:?}",
            outcome
        );
        Ok(outcome)
    }

    async fn sync(&self, project_id: Uid, since_seq_no: u64) -> Result<Vec<ProjectEvent>, LeaderError> {
        let projects = self.projects.read();
        let project = projects
            .get(&project_id)
            .ok_or(LeaderError::UnknownProject(project_id))?;
        Ok(project.events_since(since_seq_no))
    }

    async fn add_route(&self, peer: NodeIdentity, route: NodeRoute) -> Result<(), String> {
        debug!("[project-chain] {} learned route {} for {}", self.name, route, peer);
        self.peers.write().insert(peer, route);
        Ok(())
    }
}
