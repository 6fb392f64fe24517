//! # Shared Types Crate
//!
//! Leaf value types used across the Project-Chain workspace.
//!
//! ## Design Principles
//!
//! - **Plain values**: Everything here is `Clone`, serializable and free of
//!   behaviour that depends on other crates.
//! - **Deterministic encoding**: No type in this crate serializes through a
//!   hash map, so bincode output is stable across processes.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
