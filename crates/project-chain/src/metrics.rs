//! # Chain Metrics
//!
//! Prometheus counters for the append protocol.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! project-chain = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `project_events_appended_total` - events accepted by the leader and appended locally
//! - `project_events_rejected_total` - appends that failed (by reason)
//! - `project_stale_retries_total` - stale answers that triggered a resync
//! - `project_events_synced_total` - events pulled from the leader

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{register_int_counter, register_int_counter_vec, IntCounter, IntCounterVec};

#[cfg(feature = "metrics")]
lazy_static! {
    pub static ref EVENTS_APPENDED: IntCounter = register_int_counter!(
        "project_events_appended_total",
        "Total number of events appended after leader acceptance"
    )
    .expect("Failed to create EVENTS_APPENDED metric");

    pub static ref EVENTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "project_events_rejected_total",
        "Total number of failed appends",
        &["reason"]
    )
    .expect("Failed to create EVENTS_REJECTED metric");

    pub static ref STALE_RETRIES: IntCounter = register_int_counter!(
        "project_stale_retries_total",
        "Total number of stale leader answers"
    )
    .expect("Failed to create STALE_RETRIES metric");

    pub static ref EVENTS_SYNCED: IntCounter = register_int_counter!(
        "project_events_synced_total",
        "Total number of events pulled from the leader"
    )
    .expect("Failed to create EVENTS_SYNCED metric");
}

#[cfg(feature = "metrics")]
pub fn record_event_appended() {
    EVENTS_APPENDED.inc();
}

#[cfg(feature = "metrics")]
pub fn record_event_rejected(reason: &str) {
    EVENTS_REJECTED.with_label_values(&[reason]).inc();
}

#[cfg(feature = "metrics")]
pub fn record_stale_retry() {
    STALE_RETRIES.inc();
}

#[cfg(feature = "metrics")]
pub fn record_events_synced(count: usize) {
    EVENTS_SYNCED.inc_by(count as u64);
}

#[cfg(not(feature = "metrics"))]
pub fn record_event_appended() {}

#[cfg(not(feature = "metrics"))]
pub fn record_event_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_stale_retry() {}

#[cfg(not(feature = "metrics"))]
pub fn record_events_synced(_count: usize) {}
