//! Adapters layer
//!
//! In-memory implementations of the outbound ports, for tests and for
//! running several nodes inside one process.

mod directory;
mod local;
mod request;

pub use directory::InMemoryNodeDirectory;
pub use local::LocalNodeClient;
pub use request::InMemoryRequestService;
