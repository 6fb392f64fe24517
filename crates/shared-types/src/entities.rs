//! # Core Value Types
//!
//! - **Identity**: `Uid`
//! - **Integrity**: `Hash`, `hash_to_hex`
//! - **Time**: `Timestamp`
//! - **Networking**: `NodeRoute`

use crate::TypeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// A 32-byte digest (SHA-256).
pub type Hash = [u8; 32];

/// The all-zero digest.
pub const ZERO_HASH: Hash = [0u8; 32];

/// Lowercase hex rendering of a digest.
pub fn hash_to_hex(hash: &Hash) -> String {
    hex::encode(hash)
}

/// Parse a 64-char hex string into a digest.
pub fn hash_from_hex(s: &str) -> Result<Hash, TypeError> {
    let bytes = hex::decode(s).map_err(|_| TypeError::InvalidHash(s.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| TypeError::InvalidHash(s.to_string()))
}

/// Globally unique identifier for projects, events and nodes.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Uid(Uuid);

impl Uid {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Build from raw bytes (useful for deterministic fixtures).
    pub fn from_bytes(bytes: [u8; 16]) -> Self {
        Self(Uuid::from_bytes(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 16] {
        self.0.as_bytes()
    }

    /// First eight hex chars, for log lines and compact rendering.
    pub fn short(&self) -> String {
        let mut s = self.0.simple().to_string();
        s.truncate(8);
        s
    }
}

impl Default for Uid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<UID: {}>", self.0.simple())
    }
}

impl FromStr for Uid {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| TypeError::InvalidUid(s.to_string()))
    }
}

/// Wall-clock instant in milliseconds since the Unix epoch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Current system time.
    pub fn now() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0); // Fallback to epoch if system time is before UNIX_EPOCH
        Self(millis)
    }

    /// Milliseconds since the epoch.
    pub fn as_millis(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// How to reach a node over the network.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeRoute {
    /// Scheme, e.g. `http`.
    pub protocol: String,
    /// Host name or IP address.
    pub host_or_ip: String,
    /// TCP port.
    pub port: u16,
}

impl NodeRoute {
    /// Plain HTTP route.
    pub fn http(host_or_ip: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: "http".to_string(),
            host_or_ip: host_or_ip.into(),
            port,
        }
    }
}

impl fmt::Display for NodeRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host_or_ip, self.port)
    }
}

impl FromStr for NodeRoute {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, rest) = s
            .split_once("://")
            .ok_or_else(|| TypeError::InvalidRoute(s.to_string()))?;
        let (host, port) = rest
            .rsplit_once(':')
            .ok_or_else(|| TypeError::InvalidRoute(s.to_string()))?;
        let port = port
            .parse()
            .map_err(|_| TypeError::InvalidRoute(s.to_string()))?;
        if host.is_empty() {
            return Err(TypeError::InvalidRoute(s.to_string()));
        }
        Ok(Self {
            protocol: protocol.to_string(),
            host_or_ip: host.to_string(),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uid_roundtrip_text() {
        let uid = Uid::new();
        let parsed: Uid = uid.to_string().parse().unwrap();
        assert_eq!(uid, parsed);
    }

    #[test]
    fn test_uid_short() {
        let uid = Uid::from_bytes([0xAB; 16]);
        assert_eq!(uid.short(), "abababab");
    }

    #[test]
    fn test_uid_bincode_is_stable() {
        let uid = Uid::from_bytes([7u8; 16]);
        let a = bincode::serialize(&uid).unwrap();
        let b = bincode::serialize(&uid).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_uid() {
        assert!("not-a-uid".parse::<Uid>().is_err());
    }

    #[test]
    fn test_hash_hex() {
        let hash = [0x11u8; 32];
        let text = hash_to_hex(&hash);
        assert_eq!(text.len(), 64);
        assert_eq!(hash_from_hex(&text).unwrap(), hash);
        assert!(hash_from_hex("abcd").is_err());
    }

    #[test]
    fn test_route_parse() {
        let route: NodeRoute = "http://localhost:8080".parse().unwrap();
        assert_eq!(route, NodeRoute::http("localhost", 8080));
        assert_eq!(route.to_string(), "http://localhost:8080");
        assert!("localhost:8080".parse::<NodeRoute>().is_err());
        assert!("http://:80".parse::<NodeRoute>().is_err());
    }

    #[test]
    fn test_timestamp_now_is_nonzero() {
        assert!(Timestamp::now().as_millis() > 0);
        let json = serde_json::to_string(&Timestamp(5)).unwrap();
        assert_eq!(json, "5");
    }
}
