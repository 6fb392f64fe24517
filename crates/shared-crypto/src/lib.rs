//! # Shared Crypto - Signing and Hashing Primitives
//!
//! ## Components
//!
//! | Module | Algorithm | Use Case |
//! |--------|-----------|----------|
//! | `hashing` | SHA-256 | Event hashes, genesis hashes |
//! | `signatures` | Ed25519 | Event signatures, node identity keys |
//!
//! ## Security Properties
//!
//! - **Ed25519**: Deterministic nonces, no RNG dependency when signing
//! - **Key hygiene**: Secret key bytes are zeroized when a `SigningKey` is dropped;
//!   `SigningKey::from_secret` also wipes the seed it was built from.
//!   `from_seed` copies its argument and leaves the caller's bytes alone.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod errors;
pub mod hashing;
pub mod signatures;

// Re-exports
pub use errors::CryptoError;
pub use hashing::{sha256, sha256_tagged, Sha256Hasher};
pub use signatures::{Signature, SigningKey, VerifyKey};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
