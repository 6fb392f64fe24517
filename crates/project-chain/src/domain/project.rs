//! The project aggregate
//!
//! A `Project` owns the ordered event log of one collaboration plus an
//! id -> position index. The log is the only source of ordering; the index
//! is a lookup aid and both are always updated together.
//!
//! The remote half of the append protocol (`add_event`, `sync`) lives in
//! `crate::service`; everything here is local and synchronous.

use super::{
    ChainValidationError, ConsensusModel, EventKindTag, EventPayload, LeaderError, NodeIdentity,
    ProjectError, ProjectEvent, ProjectResult, StatusError,
};
use crate::config::ChainConfig;
use crate::ports::LeaderGateway;
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_tagged, SigningKey, VerifyKey};
use shared_types::{Hash, NodeRoute, Uid};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

const GENESIS_HASH_TAG: &[u8] = b"project-chain/genesis";

/// Leader's answer to a broadcast.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BroadcastOutcome {
    /// The event extends the leader's tail and is now canonical.
    Accepted,
    /// The proposer's tail lags the leader's; resync and retry.
    Stale,
}

/// Immutable identifying state of a project, fixed at bootstrap.
///
/// Every shareholder node receives an identical copy and must derive the
/// same `start_hash` from it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectGenesis {
    pub id: Uid,
    pub name: String,
    pub description: Option<String>,
    pub shareholders: Vec<NodeIdentity>,
    pub users: Option<Vec<NodeIdentity>>,
    pub user_email_address: Option<String>,
    pub project_permissions: BTreeSet<String>,
    pub state_sync_leader: NodeIdentity,
    pub leader_node_route: Option<NodeRoute>,
    pub consensus_model: ConsensusModel,
    pub start_hash: Hash,
}

#[derive(Serialize)]
struct GenesisMaterial<'a> {
    id: &'a Uid,
    name: &'a str,
    description: &'a Option<String>,
    shareholders: &'a [NodeIdentity],
    project_permissions: &'a BTreeSet<String>,
    state_sync_leader: &'a NodeIdentity,
    consensus_model: &'a ConsensusModel,
    // object store, object permissions and events are empty at genesis
    store: BTreeMap<Uid, BTreeMap<Uid, Vec<u8>>>,
    permissions: BTreeMap<Uid, BTreeMap<Uid, BTreeSet<String>>>,
    events: &'a [ProjectEvent],
}

impl ProjectGenesis {
    /// Digest over the immutable identifying fields with an empty store,
    /// empty object permissions and no events.
    pub fn compute_start_hash(&self) -> ProjectResult<Hash> {
        let material = GenesisMaterial {
            id: &self.id,
            name: &self.name,
            description: &self.description,
            shareholders: &self.shareholders,
            project_permissions: &self.project_permissions,
            state_sync_leader: &self.state_sync_leader,
            consensus_model: &self.consensus_model,
            store: BTreeMap::new(),
            permissions: BTreeMap::new(),
            events: &[],
        };
        let bytes =
            bincode::serialize(&material).map_err(|e| ProjectError::Serialization(e.to_string()))?;
        Ok(sha256_tagged(GENESIS_HASH_TAG, &bytes))
    }

    pub fn verify_start_hash(&self) -> ProjectResult<bool> {
        Ok(self.compute_start_hash()? == self.start_hash)
    }

    #[cfg(test)]
    pub(crate) fn for_tests(name: &str) -> Self {
        let key = SigningKey::generate().verify_key();
        let leader = NodeIdentity::new(Uid::new(), key);
        let mut genesis = Self {
            id: Uid::new(),
            name: name.to_string(),
            description: None,
            shareholders: vec![leader.clone()],
            users: None,
            user_email_address: None,
            project_permissions: BTreeSet::from([leader.owner_permission()]),
            state_sync_leader: leader,
            leader_node_route: None,
            consensus_model: ConsensusModel::default(),
            start_hash: [0u8; 32],
        };
        genesis.start_hash = genesis.compute_start_hash().unwrap();
        genesis
    }
}

/// Which parent an event must have to match a query.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ParentFilter {
    /// Any event, sub-event or not.
    #[default]
    Any,
    /// Only events that are not sub-events.
    TopLevel,
    /// Only sub-events replying to one of these ids.
    ChildOf(Vec<Uid>),
}

/// Predicate over kind, parent and id. Empty lists match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub kinds: Vec<EventKindTag>,
    pub parent: ParentFilter,
    pub ids: Vec<Uid>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind(mut self, kind: EventKindTag) -> Self {
        self.kinds.push(kind);
        self
    }

    pub fn top_level(mut self) -> Self {
        self.parent = ParentFilter::TopLevel;
        self
    }

    pub fn child_of(mut self, parent: Uid) -> Self {
        match &mut self.parent {
            ParentFilter::ChildOf(ids) => ids.push(parent),
            _ => self.parent = ParentFilter::ChildOf(vec![parent]),
        }
        self
    }

    pub fn id(mut self, id: Uid) -> Self {
        self.ids.push(id);
        self
    }

    pub fn matches(&self, event: &ProjectEvent) -> bool {
        let kind_check = self.kinds.is_empty() || self.kinds.contains(&event.kind());

        let parent_check = match &self.parent {
            ParentFilter::Any => true,
            ParentFilter::TopLevel => !event.is_sub_event(),
            ParentFilter::ChildOf(ids) => event
                .parent_event_id()
                .map(|parent| ids.contains(&parent))
                .unwrap_or(false),
        };

        let id_check = self.ids.is_empty() || self.ids.contains(&event.id);

        kind_check && parent_check && id_check
    }
}

/// Event chain of one collaborative project.
#[derive(Clone, Serialize)]
pub struct Project {
    pub id: Uid,
    pub name: String,
    pub description: Option<String>,
    pub shareholders: Vec<NodeIdentity>,
    pub users: Option<Vec<NodeIdentity>>,
    pub user_email_address: Option<String>,
    pub project_permissions: BTreeSet<String>,
    pub state_sync_leader: NodeIdentity,
    pub leader_node_route: Option<NodeRoute>,
    pub consensus_model: ConsensusModel,
    pub start_hash: Hash,
    events: Vec<ProjectEvent>,
    #[serde(skip)]
    event_index: HashMap<Uid, usize>,
    #[serde(skip)]
    pub(crate) leader: Option<Arc<dyn LeaderGateway>>,
    // WARNING: never serialize, hash or print the signing key
    #[serde(skip)]
    pub(crate) signing_key: Option<SigningKey>,
    #[serde(skip)]
    pub(crate) config: ChainConfig,
}

impl Project {
    /// Empty chain from a genesis record.
    pub fn from_genesis(genesis: ProjectGenesis) -> Self {
        Self {
            id: genesis.id,
            name: genesis.name,
            description: genesis.description,
            shareholders: genesis.shareholders,
            users: genesis.users,
            user_email_address: genesis.user_email_address,
            project_permissions: genesis.project_permissions,
            state_sync_leader: genesis.state_sync_leader,
            leader_node_route: genesis.leader_node_route,
            consensus_model: genesis.consensus_model,
            start_hash: genesis.start_hash,
            events: Vec::new(),
            event_index: HashMap::new(),
            leader: None,
            signing_key: None,
            config: ChainConfig::default(),
        }
    }

    /// Chain rebuilt from stored events without any checks. Run
    /// `validate_events` before trusting it.
    pub fn restore(genesis: ProjectGenesis, events: Vec<ProjectEvent>) -> Self {
        let mut project = Self::from_genesis(genesis);
        for event in events {
            project.push_event(event);
        }
        project
    }

    /// Attach the remote leader capability.
    pub fn with_leader(mut self, leader: Arc<dyn LeaderGateway>) -> Self {
        self.leader = Some(leader);
        self
    }

    /// Default credentials used when `add_event` is called without a key.
    pub fn with_signing_key(mut self, signing_key: SigningKey) -> Self {
        self.signing_key = Some(signing_key);
        self
    }

    pub fn with_config(mut self, config: ChainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn set_leader(&mut self, leader: Arc<dyn LeaderGateway>) {
        self.leader = Some(leader);
    }

    pub fn config(&self) -> &ChainConfig {
        &self.config
    }

    /// Identifying state, as issued at bootstrap.
    pub fn genesis(&self) -> ProjectGenesis {
        ProjectGenesis {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            shareholders: self.shareholders.clone(),
            users: self.users.clone(),
            user_email_address: self.user_email_address.clone(),
            project_permissions: self.project_permissions.clone(),
            state_sync_leader: self.state_sync_leader.clone(),
            leader_node_route: self.leader_node_route.clone(),
            consensus_model: self.consensus_model.clone(),
            start_hash: self.start_hash,
        }
    }

    // === LOG ACCESS ===

    /// Events in chain order.
    pub fn events(&self) -> &[ProjectEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last_event(&self) -> Option<&ProjectEvent> {
        self.events.last()
    }

    pub fn get_event(&self, id: &Uid) -> Option<&ProjectEvent> {
        self.event_index.get(id).and_then(|&pos| self.events.get(pos))
    }

    pub fn contains_event(&self, id: &Uid) -> bool {
        self.event_index.contains_key(id)
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &Uid> {
        self.event_index.keys()
    }

    pub fn get_last_seq_no(&self) -> u64 {
        self.last_event().and_then(|e| e.seq_no).unwrap_or(0)
    }

    /// Hash the next event must link to.
    pub fn tail_hash(&self) -> Hash {
        self.last_event()
            .and_then(|e| e.event_hash)
            .unwrap_or(self.start_hash)
    }

    /// Append to log and index together.
    pub(crate) fn push_event(&mut self, event: ProjectEvent) {
        self.event_index.insert(event.id, self.events.len());
        self.events.push(event);
    }

    /// Copies of every event after `seq_no`, in chain order.
    pub fn events_since(&self, seq_no: u64) -> Vec<ProjectEvent> {
        self.events
            .iter()
            .filter(|e| e.seq_no.map(|s| s > seq_no).unwrap_or(false))
            .cloned()
            .collect()
    }

    // === QUERIES ===

    /// Events matching `filter`, in chain order.
    pub fn get_events(&self, filter: &EventFilter) -> Vec<&ProjectEvent> {
        self.events.iter().filter(|e| filter.matches(e)).collect()
    }

    pub fn get_children(&self, event: &ProjectEvent) -> Vec<&ProjectEvent> {
        self.get_events(&EventFilter::new().child_of(event.id))
    }

    /// The single event with `id`, if any. More than one is index corruption.
    pub fn get_parent(&self, id: Uid) -> ProjectResult<Option<&ProjectEvent>> {
        let found = self.get_events(&EventFilter::new().id(id));
        match found.len() {
            0 => Ok(None),
            1 => Ok(found.into_iter().next()),
            count => Err(ProjectError::CorruptIndex { id, count }),
        }
    }

    /// Messages and thread replies in chain order.
    pub fn get_messages(&self) -> Vec<&ProjectEvent> {
        self.get_events(
            &EventFilter::new()
                .kind(EventKindTag::Message)
                .kind(EventKindTag::ThreadMessage),
        )
    }

    /// Text rendering of the message board: each top-level message followed
    /// by its thread replies.
    pub fn messages(&self) -> String {
        let mut text = String::new();
        let top = self.get_events(&EventFilter::new().kind(EventKindTag::Message).top_level());
        for message in top {
            push_message_line(&mut text, "", message);
            for child in self.get_children(message) {
                push_message_line(&mut text, "> ", child);
            }
        }
        if text.is_empty() {
            text.push_str("No messages");
        }
        text
    }

    // === MEMBERSHIP ===

    pub fn key_in_project(&self, verify_key: &VerifyKey) -> bool {
        self.shareholders
            .iter()
            .chain(self.users.iter().flatten())
            .any(|identity| &identity.verify_key == verify_key)
    }

    /// Membership is the only permission check so far.
    pub fn has_permission(&self, verify_key: &VerifyKey) -> bool {
        self.key_in_project(verify_key)
    }

    pub fn get_identity_from_key(&self, verify_key: &VerifyKey) -> Result<&NodeIdentity, StatusError> {
        self.shareholders
            .iter()
            .chain(self.users.iter().flatten())
            .find(|identity| &identity.verify_key == verify_key)
            .ok_or(StatusError::UnknownIdentity(*verify_key))
    }

    // === VALIDATION ===

    /// Walk the log from genesis, checking each event against its true
    /// predecessor. Returns the head hash, or the first failure.
    pub fn validate_events(&self, debug: bool) -> Result<Hash, ChainValidationError> {
        let mut current_hash = self.start_hash;
        let mut last_event: Option<&ProjectEvent> = None;

        for (index, event) in self.events.iter().enumerate() {
            let result = event.valid_descendant(self, last_event);

            if debug {
                let prev_id = last_event.map(|e| e.id).unwrap_or(self.id);
                match &result {
                    Ok(()) => debug!(
                        "[project-chain] ok {} {:?} after {:?}",
                        event.kind(),
                        event.id,
                        prev_id
                    ),
                    Err(e) => warn!(
                        "[project-chain] failed {} {:?} after {:?}: {}",
                        event.kind(),
                        event.id,
                        prev_id,
                        e
                    ),
                }
            }

            if let Err(source) = result {
                return Err(ChainValidationError {
                    index,
                    event_id: event.id,
                    source,
                });
            }

            current_hash = event.event_hash.unwrap_or(current_hash);
            last_event = Some(event);
        }

        debug!(
            project_id = %self.id,
            head = %shared_types::hash_to_hex(&current_hash),
            "[project-chain] events are valid"
        );
        Ok(current_hash)
    }

    // === LEADER SIDE ===

    /// Leader-side half of a broadcast: decide whether `event` extends the
    /// canonical tail and store it if so.
    ///
    /// Ordering only: any correctly signed key is accepted, member or not.
    /// Membership is checked by readers (`get_identity_from_key`, status
    /// queries), not here, and `has_permission` is not consulted.
    pub fn accept_broadcast(&mut self, event: ProjectEvent) -> Result<BroadcastOutcome, LeaderError> {
        if self.contains_event(&event.id) {
            return Err(LeaderError::Rejected(format!(
                "Event already added: {:?}",
                event.id
            )));
        }

        let tail_seq_no = self.get_last_seq_no();
        let next_seq_no = tail_seq_no.checked_add(1).ok_or_else(|| {
            LeaderError::Rejected(format!("seq_no {} has no successor", tail_seq_no))
        })?;
        match event.seq_no {
            Some(seq_no) if seq_no <= tail_seq_no => {
                debug!(
                    event_id = %event.id,
                    seq_no,
                    tail_seq_no,
                    "[project-chain] proposer is behind leader"
                );
                return Ok(BroadcastOutcome::Stale);
            }
            Some(seq_no) if seq_no > next_seq_no => {
                return Err(LeaderError::Rejected(format!(
                    "seq_no {} is ahead of leader tail {}",
                    seq_no, tail_seq_no
                )));
            }
            Some(_) => {}
            None => {
                return Err(LeaderError::Rejected(format!(
                    "Event {:?} is not attached to a chain",
                    event.id
                )))
            }
        }

        event
            .valid_descendant(self, self.last_event())
            .map_err(|e| LeaderError::Rejected(e.to_string()))?;

        self.push_event(event);
        Ok(BroadcastOutcome::Accepted)
    }

    // === EXPORT ===

    pub fn to_json(&self) -> ProjectResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::Serialization(e.to_string()))
    }
}

fn push_message_line(text: &mut String, prefix: &str, event: &ProjectEvent) {
    if let EventPayload::Message(_) | EventPayload::ThreadMessage(_) = &event.payload {
        let author = event
            .creator_verify_key
            .map(|k| k.short())
            .unwrap_or_default();
        let body = event.payload.message_text().unwrap_or_default();
        text.push_str(&format!("{}{}: {}\n", prefix, author, body));
    }
}

impl fmt::Debug for Project {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Project")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("shareholders", &self.shareholders)
            .field("state_sync_leader", &self.state_sync_leader)
            .field("events", &self.events.len())
            .finish()
    }
}
