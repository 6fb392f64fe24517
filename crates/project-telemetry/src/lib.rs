//! # Project Telemetry
//!
//! Logging bootstrap for Project-Chain node processes.
//!
//! Library crates only emit `tracing` events; binaries call `init_logging`
//! once at startup to install a subscriber.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use project_telemetry::{init_logging, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = TelemetryConfig::from_env();
//!     init_logging(&config)?;
//!     // ...
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `PC_SERVICE_NAME` | `project-chain` | Service name on every line |
//! | `PC_LOG_LEVEL` / `RUST_LOG` | `info` | Filter directive |
//! | `PC_JSON_LOGS` | `false` | JSON output |
//! | `PC_LOG_TARGET` | `true` | Include module targets |

mod config;
mod logging;

pub use config::TelemetryConfig;
pub use logging::init_logging;

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Invalid log filter: {0}")]
    Filter(String),

    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(String),
}
