//! Service layer
//!
//! Async operations on top of the domain: the leader-ordered append
//! protocol and sync, the message/poll/request conveniences, and the
//! node-side service that hosts project replicas.

mod append;
mod node;
mod ops;

pub use append::{AppendReceipt, PublishOutcome, SharedProject};
pub use node::ProjectNode;
