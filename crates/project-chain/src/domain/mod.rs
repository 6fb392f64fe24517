//! Domain layer for the project event chain.
//!
//! Pure types and synchronous logic: identities, event kinds, the event
//! record with its hash and signature rules, the `Project` aggregate and
//! status queries. Nothing here performs I/O.

mod consensus;
mod error;
mod event;
mod identity;
mod kinds;
mod project;
mod status;

pub use consensus::*;
pub use error::*;
pub use event::*;
pub use identity::*;
pub use kinds::*;
pub use project::*;
pub use status::*;
