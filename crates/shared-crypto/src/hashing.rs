//! # SHA-256 Hashing
//!
//! Digest helpers used for event hashes and genesis hashes.

use sha2::{Digest, Sha256};

/// SHA-256 output (256-bit).
pub type Hash = [u8; 32];

/// Stateful SHA-256 hasher.
pub struct Sha256Hasher {
    inner: Sha256,
}

impl Sha256Hasher {
    /// Create new hasher.
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Update with data.
    pub fn update(&mut self, data: &[u8]) -> &mut Self {
        self.inner.update(data);
        self
    }

    /// Update with a domain-separation tag followed by the data length and data.
    pub fn update_tagged(&mut self, tag: &[u8], data: &[u8]) -> &mut Self {
        self.inner.update(tag);
        self.inner.update((data.len() as u64).to_le_bytes());
        self.inner.update(data);
        self
    }

    /// Finalize and return hash.
    pub fn finalize(self) -> Hash {
        self.inner.finalize().into()
    }
}

impl Default for Sha256Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Hash data with SHA-256 (one-shot).
pub fn sha256(data: &[u8]) -> Hash {
    Sha256::digest(data).into()
}

/// Hash `data` under a domain-separation tag.
pub fn sha256_tagged(tag: &[u8], data: &[u8]) -> Hash {
    let mut hasher = Sha256Hasher::new();
    hasher.update_tagged(tag, data);
    hasher.finalize()
}
