//! # Ed25519 Signatures
//!
//! Twisted Edwards curve signatures with deterministic nonces.
//!
//! ## Security Properties
//!
//! - No RNG dependency (deterministic nonce from message)
//! - Complete addition formulas (no conditional branches)
//! - Secret key zeroized on drop (`ed25519-dalek` `zeroize` feature)
//! - `SigningKey::from_secret` also wipes the caller's seed buffer

use crate::CryptoError;
use ed25519_dalek::{Signer, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};
use std::fmt;
use zeroize::Zeroize;

/// Ed25519 public key (32 bytes).
///
/// Stored as raw bytes so it can be hashed, ordered and serialized
/// deterministically. Point validity is checked when verifying.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerifyKey([u8; 32]);

impl VerifyKey {
    /// Create from bytes, rejecting encodings that are not curve points.
    pub fn from_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        VerifyingKey::from_bytes(&bytes).map_err(|_| CryptoError::InvalidPublicKey)?;
        Ok(Self(bytes))
    }

    /// Create from a hex string.
    pub fn from_hex(s: &str) -> Result<Self, CryptoError> {
        let bytes = hex::decode(s).map_err(|_| CryptoError::InvalidPublicKey)?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|v: Vec<u8>| CryptoError::InvalidKeyLength {
                expected: 32,
                actual: v.len(),
            })?;
        Self::from_bytes(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// First eight hex chars, for compact display.
    pub fn short(&self) -> String {
        let mut s = self.to_hex();
        s.truncate(8);
        s
    }

    /// Verify a signature.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<(), CryptoError> {
        let verifying_key =
            VerifyingKey::from_bytes(&self.0).map_err(|_| CryptoError::InvalidPublicKey)?;

        let sig = ed25519_dalek::Signature::from_bytes(&signature.0);

        verifying_key
            .verify(message, &sig)
            .map_err(|_| CryptoError::SignatureVerificationFailed)
    }
}

impl fmt::Display for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for VerifyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VerifyKey({})", self.to_hex())
    }
}

/// Ed25519 signature (64 bytes).
#[serde_as]
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature(#[serde_as(as = "Bytes")] [u8; 64]);

impl Signature {
    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; 64]) -> Self {
        Self(bytes)
    }

    /// Get raw bytes.
    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.0
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({}..)", hex::encode(&self.0[..8]))
    }
}

/// Ed25519 signing key.
///
/// Never serialized; `Debug` only shows the public half.
#[derive(Clone)]
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl SigningKey {
    /// Generate random key.
    pub fn generate() -> Self {
        let inner = ed25519_dalek::SigningKey::generate(&mut rand::thread_rng());
        Self { inner }
    }

    /// Create from a secret seed (32 bytes).
    ///
    /// The seed is taken by value, so the caller's copy is left untouched.
    /// Use `from_secret` for seeds that must not outlive the key.
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&seed),
        }
    }

    /// Create from a secret seed and wipe the caller's buffer.
    pub fn from_secret(seed: &mut [u8; 32]) -> Self {
        let inner = ed25519_dalek::SigningKey::from_bytes(seed);
        seed.zeroize();
        Self { inner }
    }

    /// The matching public key.
    pub fn verify_key(&self) -> VerifyKey {
        VerifyKey(self.inner.verifying_key().to_bytes())
    }

    /// Sign a message (deterministic - no RNG needed).
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.inner.sign(message).to_bytes())
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SigningKey(verify_key={})", self.verify_key().short())
    }
}

impl PartialEq for SigningKey {
    fn eq(&self, other: &Self) -> bool {
        self.verify_key() == other.verify_key()
    }
}

impl Eq for SigningKey {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify() {
        let key = SigningKey::generate();
        let message = b"Hello, Ed25519!";

        let signature = key.sign(message);
        assert!(key.verify_key().verify(message, &signature).is_ok());
    }

    #[test]
    fn test_wrong_message_fails() {
        let key = SigningKey::generate();

        let signature = key.sign(b"message1");
        let result = key.verify_key().verify(b"message2", &signature);

        assert_eq!(result, Err(CryptoError::SignatureVerificationFailed));
    }

    #[test]
    fn test_wrong_key_fails() {
        let key1 = SigningKey::generate();
        let key2 = SigningKey::generate();

        let signature = key1.sign(b"test");
        assert!(key2.verify_key().verify(b"test", &signature).is_err());
    }

    #[test]
    fn test_from_secret_wipes_seed() {
        let mut seed = [0x5Au8; 32];
        let key = SigningKey::from_secret(&mut seed);

        assert_eq!(seed, [0u8; 32]);
        assert_eq!(key, SigningKey::from_seed([0x5Au8; 32]));
    }

    #[test]
    fn test_deterministic_signatures() {
        let key = SigningKey::from_seed([0xABu8; 32]);

        let sig1 = key.sign(b"deterministic test");
        let sig2 = key.sign(b"deterministic test");

        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_verify_key_hex_roundtrip() {
        let key = SigningKey::from_seed([3u8; 32]);
        let vk = key.verify_key();
        assert_eq!(VerifyKey::from_hex(&vk.to_hex()).unwrap(), vk);
        assert_eq!(vk.short().len(), 8);
        assert!(matches!(
            VerifyKey::from_hex("abcd"),
            Err(CryptoError::InvalidKeyLength { expected: 32, actual: 2 })
        ));
    }

    #[test]
    fn test_signature_serde() {
        let key = SigningKey::from_seed([9u8; 32]);
        let sig = key.sign(b"payload");
        let bytes = bincode::serialize(&sig).unwrap();
        let back: Signature = bincode::deserialize(&bytes).unwrap();
        assert_eq!(sig, back);
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = SigningKey::from_seed([1u8; 32]);
        let rendered = format!("{:?}", key);
        assert!(rendered.starts_with("SigningKey(verify_key="));
    }
}
