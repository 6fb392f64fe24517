//! Project events
//!
//! A `ProjectEvent` is one immutable, signed, hash-linked unit of the log.
//! Its lifecycle inside an append attempt is
//! built -> rebased -> signed -> broadcast -> appended.
//!
//! Two canonical encodings are derived from the same field order:
//! - hash material: every field except `event_hash` and `signature`
//! - signing material: every field except `signature`

use super::{EventKindTag, EventPayload, Project, ProjectError, ProjectResult, ValidationError};
use serde::{Deserialize, Serialize};
use shared_crypto::{sha256_tagged, Signature, SigningKey, VerifyKey};
use shared_types::{hash_to_hex, Hash, Timestamp, Uid};

const EVENT_HASH_TAG: &[u8] = b"project-chain/event";

/// Signed, hash-linked event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectEvent {
    // 1. Creation attrs
    pub id: Uid,
    pub timestamp: Timestamp,
    // 2. Rebase attrs
    pub project_id: Option<Uid>,
    pub seq_no: Option<u64>,
    pub prev_event_uid: Option<Uid>,
    pub prev_event_hash: Option<Hash>,
    pub event_hash: Option<Hash>,
    // 3. Signature attrs
    pub creator_verify_key: Option<VerifyKey>,
    pub signature: Option<Signature>,
    pub payload: EventPayload,
}

/// Borrowed view used for both canonical encodings.
#[derive(Serialize)]
struct CanonicalEvent<'a> {
    id: &'a Uid,
    timestamp: &'a Timestamp,
    project_id: &'a Option<Uid>,
    seq_no: &'a Option<u64>,
    prev_event_uid: &'a Option<Uid>,
    prev_event_hash: &'a Option<Hash>,
    event_hash: Option<&'a Hash>,
    creator_verify_key: &'a Option<VerifyKey>,
    payload: &'a EventPayload,
}

impl ProjectEvent {
    /// New unattached event stamped with the current time.
    pub fn new(payload: impl Into<EventPayload>) -> Self {
        Self::with_timestamp(payload, Timestamp::now())
    }

    pub fn with_timestamp(payload: impl Into<EventPayload>, timestamp: Timestamp) -> Self {
        Self {
            id: Uid::new(),
            timestamp,
            project_id: None,
            seq_no: None,
            prev_event_uid: None,
            prev_event_hash: None,
            event_hash: None,
            creator_verify_key: None,
            signature: None,
            payload: payload.into(),
        }
    }

    pub fn kind(&self) -> EventKindTag {
        self.payload.kind()
    }

    pub fn parent_event_id(&self) -> Option<Uid> {
        self.payload.parent_event_id()
    }

    pub fn is_sub_event(&self) -> bool {
        self.parent_event_id().is_some()
    }

    fn canonical_bytes(&self, event_hash: Option<&Hash>) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(&CanonicalEvent {
            id: &self.id,
            timestamp: &self.timestamp,
            project_id: &self.project_id,
            seq_no: &self.seq_no,
            prev_event_uid: &self.prev_event_uid,
            prev_event_hash: &self.prev_event_hash,
            event_hash,
            creator_verify_key: &self.creator_verify_key,
            payload: &self.payload,
        })
    }

    /// Digest over every field except `event_hash` and `signature`.
    pub fn compute_event_hash(&self) -> Result<Hash, ValidationError> {
        self.canonical_bytes(None)
            .map(|bytes| sha256_tagged(EVENT_HASH_TAG, &bytes))
            .map_err(|e| ValidationError::Serialization(e.to_string()))
    }

    /// Bytes covered by the signature.
    pub fn signing_bytes(&self) -> Result<Vec<u8>, ValidationError> {
        self.canonical_bytes(self.event_hash.as_ref())
            .map_err(|e| ValidationError::Serialization(e.to_string()))
    }

    /// Re-link this event onto the current tail of `project` (or its genesis
    /// when empty), clear hash and signature, then recompute the hash.
    pub fn rebase(&mut self, project: &Project) -> ProjectResult<()> {
        self.project_id = Some(project.id);

        match project.last_event() {
            Some(prev) => {
                let previous = prev.seq_no.unwrap_or(0);
                let seq_no = previous
                    .checked_add(1)
                    .ok_or(ValidationError::SeqNoOverflow {
                        id: self.id,
                        previous,
                    })?;
                self.prev_event_uid = Some(prev.id);
                self.prev_event_hash = prev.event_hash;
                self.seq_no = Some(seq_no);
            }
            None => {
                self.prev_event_uid = Some(project.id);
                self.prev_event_hash = Some(project.start_hash);
                self.seq_no = Some(1);
            }
        }

        self.event_hash = None;
        self.signature = None;
        self.event_hash = Some(self.compute_event_hash()?);
        Ok(())
    }

    /// Sign with `signing_key`. The creator key must already be set to the
    /// key's public half; anything else is a programming error.
    pub fn sign(&mut self, signing_key: &SigningKey) -> ProjectResult<()> {
        let actual = signing_key.verify_key();
        if self.creator_verify_key != Some(actual) {
            return Err(ProjectError::SignerMismatch {
                expected: self.creator_verify_key,
                actual,
            });
        }

        self.signature = None;
        let bytes = self.signing_bytes()?;
        self.signature = Some(signing_key.sign(&bytes));
        Ok(())
    }

    /// Signature presence and validity against `creator_verify_key`.
    pub fn valid(&self) -> Result<(), ValidationError> {
        let signature = self
            .signature
            .as_ref()
            .ok_or(ValidationError::MissingSignature(self.id))?;
        let creator = self
            .creator_verify_key
            .as_ref()
            .ok_or(ValidationError::MissingCreatorKey(self.id))?;

        let bytes = self.signing_bytes()?;
        creator
            .verify(&bytes, signature)
            .map_err(|e| ValidationError::BadSignature {
                id: self.id,
                reason: e.to_string(),
            })
    }

    /// Check that this event correctly and signedly follows `prev_event`
    /// (or the genesis of `project` when `None`).
    pub fn valid_descendant(
        &self,
        project: &Project,
        prev_event: Option<&ProjectEvent>,
    ) -> Result<(), ValidationError> {
        self.valid()?;

        if self.event_hash != Some(self.compute_event_hash()?) {
            return Err(ValidationError::HashMismatch { id: self.id });
        }

        let (prev_event_id, prev_event_hash, prev_seq_no) = match prev_event {
            Some(prev) => (prev.id, prev.event_hash, prev.seq_no.unwrap_or(0)),
            None => (project.id, Some(project.start_hash), 0),
        };

        if self.prev_event_uid != Some(prev_event_id) {
            return Err(ValidationError::PrevUidMismatch {
                id: self.id,
                expected: prev_event_id,
                actual: self.prev_event_uid,
            });
        }

        if self.prev_event_hash != prev_event_hash {
            return Err(ValidationError::PrevHashMismatch {
                id: self.id,
                expected: render_hash(prev_event_hash.as_ref()),
                actual: render_hash(self.prev_event_hash.as_ref()),
            });
        }

        let expected_seq_no = prev_seq_no
            .checked_add(1)
            .ok_or(ValidationError::SeqNoOverflow {
                id: self.id,
                previous: prev_seq_no,
            })?;
        if self.seq_no != Some(expected_seq_no) {
            return Err(ValidationError::SeqNoMismatch {
                id: self.id,
                previous: prev_seq_no,
                actual: self.seq_no,
            });
        }

        if self.project_id != Some(project.id) {
            return Err(ValidationError::ProjectIdMismatch {
                id: self.id,
                expected: project.id,
                actual: self.project_id,
            });
        }

        if let Some(parent_id) = self.parent_event_id() {
            let parent = project
                .get_event(&parent_id)
                .ok_or(ValidationError::UnknownParent {
                    id: self.id,
                    parent: parent_id,
                })?;
            if !parent.kind().allows_child(self.kind()) {
                return Err(ValidationError::DisallowedSubEvent {
                    kind: self.kind(),
                    parent_kind: parent.kind(),
                });
            }
        }

        Ok(())
    }

    /// Kind-specific check run once the creator key is known and before the
    /// first rebase. Only poll answers have one: the parent must be a poll of
    /// this project and the answer must name one of its choices.
    pub(crate) fn pre_attach(&self, project: &Project) -> ProjectResult<()> {
        if let EventPayload::PollAnswer(answer) = &self.payload {
            let parent = project
                .get_event(&answer.parent_event_id)
                .ok_or(ProjectError::EventNotFound(answer.parent_event_id))?;
            match &parent.payload {
                EventPayload::MultipleChoicePoll(poll) => poll.check_answer(answer.answer)?,
                other => {
                    return Err(ProjectError::WrongEventKind {
                        id: parent.id,
                        expected: EventKindTag::MultipleChoicePoll,
                        actual: other.kind(),
                    })
                }
            }
        }
        Ok(())
    }
}

fn render_hash(hash: Option<&Hash>) -> String {
    hash.map(hash_to_hex).unwrap_or_else(|| "None".to_string())
}
