//! # project-chain
//!
//! Signed, hash-linked event log shared by the participants of a
//! collaborative project.
//!
//! ## Architecture
//!
//! Every participant keeps a local copy of the log. One participant, the
//! state-sync leader, orders appends:
//!
//! ```text
//!  Participant B                         Leader A
//!  ─────────────                         ────────
//!  rebase + sign ──── broadcast ───────→ extends tail? ──→ Accepted
//!        ↑                                     │
//!        │                                     └─────────→ Stale
//!        └──── rebase ←── sync ←──────── events since B's tail
//! ```
//!
//! Events are immutable once appended. Each one commits to its predecessor
//! through `prev_event_hash`, so rewriting any stored event breaks
//! `validate_events` at that position.
//!
//! ## Layers
//!
//! - `domain`: events, kinds, the `Project` aggregate, status queries
//! - `ports`: the leader, node, directory and request-service seams
//! - `service`: append/sync protocol, conveniences, node-side service
//! - `adapters`: in-memory port implementations
//! - `bootstrap`: submission → genesis on every node
//!
//! ## Usage
//!
//! ```rust,ignore
//! use project_chain::{InMemoryNodeDirectory, ProjectNode, ProjectSubmit, FirstShareholder};
//!
//! let directory = InMemoryNodeDirectory::new();
//! let leader = directory.register(Arc::new(ProjectNode::new("a", route_a, key_a)));
//! let follower = directory.register(Arc::new(ProjectNode::new("b", route_b, key_b)));
//!
//! let issued = ProjectSubmit::new("demo", vec![leader.clone().into(), follower.clone().into()])
//!     .start(&directory, &FirstShareholder)
//!     .await?;
//!
//! let mut project = follower.node().open_project(issued[0].id, &directory)?;
//! project.send_message("hello").await?;
//! project.validate_events(false)?;
//! ```

pub mod adapters;
pub mod bootstrap;
pub mod config;
pub mod domain;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::{InMemoryNodeDirectory, InMemoryRequestService, LocalNodeClient};
pub use bootstrap::{BootstrapError, NormalizedSubmit, ProjectSubmit, ShareholderRef};
pub use config::{ChainConfig, ConfigError};
pub use domain::{
    AnswerProjectPoll, BroadcastOutcome, ChainValidationError, ConsensusModel, EventFilter,
    EventKindTag, EventPayload, FirstShareholder, LeaderElection, LeaderError, NodeIdentity,
    ParentFilter, PollStatus, Project, ProjectError, ProjectEvent, ProjectGenesis,
    ProjectMessage, ProjectMultipleChoicePoll, ProjectRequest, ProjectRequestResponse,
    ProjectResult, ProjectThreadMessage, RequestStatus, StatusError, SubmittedRequest,
    UserCodeRef, ValidationError,
};
pub use ports::{LeaderGateway, NodeClient, NodeDirectory, ProjectNodeApi, RequestService};
pub use service::{AppendReceipt, ProjectNode, PublishOutcome, SharedProject};
