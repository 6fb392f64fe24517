//! # Project Bootstrap
//!
//! Turns a submission into an identical genesis on every participant node.
//!
//! ```text
//! ProjectSubmit ──normalize──→ NormalizedSubmit ──to_genesis──→ ProjectGenesis
//!   (clients or identities)      (identities, route)        (leader, permissions,
//!                                                              start_hash)
//! ```
//!
//! `start` issues the genesis to each shareholder node (or to each user node
//! when users are given) and checks that every node stored the same
//! `start_hash`.

mod submit;

pub use submit::{NormalizedSubmit, ProjectSubmit, ShareholderRef};

use crate::domain::NodeIdentity;
use thiserror::Error;

/// Bootstrap errors.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Shareholders cannot be empty")]
    NoShareholders,

    #[error("Users cannot be empty if user email address is provided")]
    UsersRequired,

    #[error("Number of users ({users}) should be equal to number of shareholders ({shareholders})")]
    UserCountMismatch { users: usize, shareholders: usize },

    #[error("Route exchange {leader} --- {follower} failed: {reason}")]
    RouteExchange {
        leader: String,
        follower: String,
        reason: String,
    },

    #[error("Client not found for node identity {0}. Kindly login to the node")]
    NodeUnreachable(NodeIdentity),

    #[error("Node {node} refused project: {reason}")]
    CreateFailed { node: NodeIdentity, reason: String },

    #[error("Node {node} stored a different start hash")]
    StartHashMismatch { node: NodeIdentity },

    #[error("Leader election produced no leader")]
    NoLeader,

    #[error("Genesis hashing failed: {0}")]
    Hashing(String),
}
