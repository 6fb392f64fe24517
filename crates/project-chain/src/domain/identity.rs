//! Node identities
//!
//! A participant is known by its stable node id and the public key it signs
//! with. Equality, ordering and hashing use both fields.

use serde::{Deserialize, Serialize};
use shared_crypto::VerifyKey;
use shared_types::Uid;
use std::fmt;

/// Stable identifier and verification key of a participant.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeIdentity {
    pub id: Uid,
    pub verify_key: VerifyKey,
}

impl NodeIdentity {
    pub fn new(id: Uid, verify_key: VerifyKey) -> Self {
        Self { id, verify_key }
    }

    /// Owner permission token granted to this identity when a project
    /// starts without explicit permissions.
    pub fn owner_permission(&self) -> String {
        format!("OWNER_{}", self.verify_key)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} @ {}>", self.verify_key.short(), self.id.short())
    }
}

impl fmt::Debug for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}
