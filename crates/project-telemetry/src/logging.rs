//! Subscriber installation and structured log helpers.
//!
//! Every line carries the same fields so logs from several nodes can be
//! merged and filtered:
//! - `service`: service name from `TelemetryConfig`
//! - `project_id`, `event_id`, `seq_no`: when the line is about an event

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Install the global subscriber.
///
/// Fails if the level directive does not parse or a subscriber is already
/// installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .map_err(|e| TelemetryError::Filter(e.to_string()))?;

    if config.json_logs {
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(config.with_target)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(config.with_target)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::AlreadyInitialized(e.to_string()))?;
    }

    tracing::info!(
        service = %config.service_name,
        json = config.json_logs,
        "Logging initialized"
    );
    Ok(())
}

/// Log with the service name attached.
#[macro_export]
macro_rules! log_event {
    (info, $service:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::info!(
            service = $service,
            $($($field)*,)?
            $msg
        )
    };

    (warn, $service:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::warn!(
            service = $service,
            $($($field)*,)?
            $msg
        )
    };

    (error, $service:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::error!(
            service = $service,
            $($($field)*,)?
            $msg
        )
    };

    (debug, $service:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::debug!(
            service = $service,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a project event with its standard fields.
#[macro_export]
macro_rules! log_project_event {
    ($level:ident, $service:expr, $msg:expr, $project_id:expr, $event_id:expr, $seq_no:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            service = $service,
            project_id = %$project_id,
            event_id = %$event_id,
            seq_no = $seq_no,
            $($($field)*,)?
            $msg
        )
    };
}
