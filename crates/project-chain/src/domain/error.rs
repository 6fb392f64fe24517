//! Error types for the project event chain
//!
//! Three families:
//! - `ValidationError` / `ChainValidationError` / `StatusError`: reported
//!   failures, returned as values for callers to branch on.
//! - `LeaderError`: failures of the remote leader capability.
//! - `ProjectError`: fatal conditions and propagated failures of the
//!   aggregate. A failed append never leaves the log partially updated.

use super::EventKindTag;
use shared_crypto::VerifyKey;
use shared_types::Uid;

/// Structural or cryptographic failure of a single event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Sign event first: event {0:?} has no signature")]
    MissingSignature(Uid),

    #[error("Event {0:?} has no creator verify key")]
    MissingCreatorKey(Uid),

    #[error("Failed to validate event {id:?}: {reason}")]
    BadSignature { id: Uid, reason: String },

    #[error("Event {id:?} event_hash does not match its contents")]
    HashMismatch { id: Uid },

    #[error("Event {id:?} prev_event_uid: {actual:?} does not match {expected:?}")]
    PrevUidMismatch {
        id: Uid,
        expected: Uid,
        actual: Option<Uid>,
    },

    #[error("Event {id:?} prev_event_hash: {actual} does not match {expected}")]
    PrevHashMismatch {
        id: Uid,
        expected: String,
        actual: String,
    },

    #[error("Event {id:?} seq_no: {actual:?} is not subsequent to {previous}")]
    SeqNoMismatch {
        id: Uid,
        previous: u64,
        actual: Option<u64>,
    },

    #[error("Event {id:?} follows seq_no {previous}, which has no successor")]
    SeqNoOverflow { id: Uid, previous: u64 },

    #[error("Event {id:?} project_id: {actual:?} does not match {expected:?}")]
    ProjectIdMismatch {
        id: Uid,
        expected: Uid,
        actual: Option<Uid>,
    },

    #[error("Event {id:?} refers to unknown parent {parent:?}")]
    UnknownParent { id: Uid, parent: Uid },

    #[error("{kind} is not a valid sub event for {parent_kind}")]
    DisallowedSubEvent {
        kind: EventKindTag,
        parent_kind: EventKindTag,
    },

    #[error("Canonical serialization failed: {0}")]
    Serialization(String),
}

/// First failure found while walking a chain from genesis.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Event #{index} ({event_id:?}) is invalid: {source}")]
pub struct ChainValidationError {
    /// Zero-based position in the ordered log.
    pub index: usize,
    pub event_id: Uid,
    #[source]
    pub source: ValidationError,
}

/// Data errors surfaced by kind-specific status queries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatusError {
    #[error("The request contains {count} responses; a request can only have one. Re-submit a new request")]
    MultipleResponses { count: usize },

    #[error("Child event is a {actual}, expected {expected}")]
    UnexpectedChild {
        expected: EventKindTag,
        actual: EventKindTag,
    },

    #[error("Event is a {0}, not a request")]
    NotARequest(EventKindTag),

    #[error("Event is a {0}, not a poll")]
    NotAPoll(EventKindTag),

    #[error("Shareholder with verify key: {0} not found")]
    UnknownIdentity(VerifyKey),

    #[error("Event {0:?} has no creator")]
    MissingCreator(Uid),
}

/// Failures of the remote leader capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LeaderError {
    #[error("Leader does not host project {0:?}")]
    UnknownProject(Uid),

    #[error("Leader rejected event: {0}")]
    Rejected(String),

    #[error("Leader unreachable: {0}")]
    Unreachable(String),
}

/// Fatal and propagated errors of the project aggregate.
#[derive(Debug, thiserror::Error)]
pub enum ProjectError {
    #[error("Event already added: {0:?}")]
    DuplicateEvent(Uid),

    #[error("Adding an event requires a signing key")]
    MissingSigningKey,

    #[error("Leader node peer is not set")]
    LeaderNotSet,

    #[error("creator_verify_key has changed from: {expected:?} to {actual}")]
    SignerMismatch {
        expected: Option<VerifyKey>,
        actual: VerifyKey,
    },

    #[error("Index corrupted: {count} events share id {id:?}")]
    CorruptIndex { id: Uid, count: usize },

    #[error("Event rejected: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Leader(#[from] LeaderError),

    #[error("Gave up after {attempts} stale retries against the leader")]
    StaleRetriesExhausted { attempts: u32 },

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("Event id: {0:?} not found")]
    EventNotFound(Uid),

    #[error("Event {id:?} is a {actual}, expected {expected}")]
    WrongEventKind {
        id: Uid,
        expected: EventKindTag,
        actual: EventKindTag,
    },

    #[error("choices must have at least one item")]
    EmptyPollChoices,

    #[error("Poll answer {answer} is outside 1..={choices}")]
    InvalidPollAnswer { answer: u32, choices: usize },

    #[error("Node uid is not set for the object: {0:?}")]
    MissingNodeUid(Uid),

    #[error("Request service error: {0}")]
    RequestService(String),
}

/// Result type for project operations
pub type ProjectResult<T> = Result<T, ProjectError>;
