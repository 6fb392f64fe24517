//! Append and sync protocol
//!
//! ```text
//! add_event ──→ rebase ──→ sign ──→ valid_descendant ──→ broadcast
//!                  ↑                                         │
//!                  │                     Accepted ───────────┼──→ append locally
//!                  │                                         │
//!                  └──── sync ←── backoff ←── Stale ─────────┘
//! ```
//!
//! The local log only grows on leader acceptance or through sync, so a
//! failed append never leaves a partially updated chain behind.

use crate::domain::{BroadcastOutcome, Project, ProjectError, ProjectEvent, ProjectResult};
use crate::metrics;
use shared_crypto::SigningKey;
use shared_types::{Hash, Uid};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Project shared between tasks. Appends and syncs take the lock for their
/// whole duration, keeping a single writer per local chain.
pub type SharedProject = Arc<tokio::sync::Mutex<Project>>;

/// Where an appended event ended up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppendReceipt {
    pub event_id: Uid,
    pub seq_no: u64,
    pub event_hash: Hash,
    /// Broadcasts sent, including the accepted one.
    pub attempts: u32,
}

impl AppendReceipt {
    fn from_event(event: &ProjectEvent, attempts: u32) -> Self {
        Self {
            event_id: event.id,
            seq_no: event.seq_no.unwrap_or_default(),
            event_hash: event.event_hash.unwrap_or_default(),
            attempts,
        }
    }
}

/// Result of `ProjectEvent::publish`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublishOutcome {
    Appended(AppendReceipt),
    AlreadyAdded,
}

impl Project {
    /// Append `event` signed with the project's own credentials.
    pub async fn add_event(&mut self, event: ProjectEvent) -> ProjectResult<AppendReceipt> {
        let signing_key = self
            .signing_key
            .clone()
            .ok_or(ProjectError::MissingSigningKey)?;
        self.append(event, signing_key).await
    }

    /// Append `event` signed with `signing_key`.
    pub async fn add_event_as(
        &mut self,
        event: ProjectEvent,
        signing_key: &SigningKey,
    ) -> ProjectResult<AppendReceipt> {
        self.append(event, signing_key.clone()).await
    }

    async fn append(
        &mut self,
        mut event: ProjectEvent,
        signing_key: SigningKey,
    ) -> ProjectResult<AppendReceipt> {
        if self.contains_event(&event.id) {
            return Err(ProjectError::DuplicateEvent(event.id));
        }

        event.creator_verify_key = Some(signing_key.verify_key());
        event.pre_attach(self)?;
        event.rebase(self)?;
        event.sign(&signing_key)?;

        let mut stale_retries = 0u32;
        let mut attempts = 0u32;

        loop {
            if let Err(e) = event.valid_descendant(self, self.last_event()) {
                metrics::record_event_rejected("invalid");
                warn!(
                    project_id = %self.id,
                    event_id = %event.id,
                    "[project-chain] refusing to broadcast invalid event: {}",
                    e
                );
                return Err(e.into());
            }

            let leader = self.leader.clone().ok_or(ProjectError::LeaderNotSet)?;
            attempts += 1;

            debug!(
                project_id = %self.id,
                event_id = %event.id,
                seq_no = event.seq_no.unwrap_or_default(),
                attempt = attempts,
                "[project-chain] broadcasting {}",
                event.kind()
            );

            match leader.broadcast_event(event.clone()).await {
                Ok(BroadcastOutcome::Accepted) => {
                    let receipt = AppendReceipt::from_event(&event, attempts);
                    self.push_event(event);
                    metrics::record_event_appended();
                    info!(
                        project_id = %self.id,
                        event_id = %receipt.event_id,
                        seq_no = receipt.seq_no,
                        "[project-chain] event appended"
                    );
                    return Ok(receipt);
                }
                Ok(BroadcastOutcome::Stale) => {
                    if stale_retries >= self.config.max_stale_retries {
                        metrics::record_event_rejected("stale");
                        warn!(
                            project_id = %self.id,
                            event_id = %event.id,
                            "[project-chain] giving up after {} stale retries",
                            stale_retries
                        );
                        return Err(ProjectError::StaleRetriesExhausted {
                            attempts: stale_retries,
                        });
                    }

                    metrics::record_stale_retry();
                    warn!(
                        project_id = %self.id,
                        event_id = %event.id,
                        attempt = stale_retries + 1,
                        "[project-chain] local chain is stale, resyncing"
                    );

                    tokio::time::sleep(self.config.backoff_for(stale_retries)).await;
                    stale_retries += 1;
                    self.sync().await?;

                    // the leader may have kept an earlier attempt
                    if let Some(stored) = self.get_event(&event.id) {
                        return Ok(AppendReceipt::from_event(stored, attempts));
                    }

                    event.rebase(self)?;
                    event.sign(&signing_key)?;
                }
                Err(e) => {
                    metrics::record_event_rejected("leader");
                    warn!(
                        project_id = %self.id,
                        event_id = %event.id,
                        "[project-chain] leader refused event: {}",
                        e
                    );
                    return Err(e.into());
                }
            }
        }
    }

    /// Pull canonical events past the local tail and append them in order.
    ///
    /// The leader is trusted: pulled events are not re-validated here. The
    /// leader in turn orders events from any signer without a membership
    /// check, so a replica can hold events from keys outside the project;
    /// status queries report those as `UnknownIdentity`.
    pub async fn sync(&mut self) -> ProjectResult<usize> {
        let leader = self.leader.clone().ok_or(ProjectError::LeaderNotSet)?;
        let since = self.get_last_seq_no();
        let events = leader.sync(self.id, since).await?;
        let total = events.len();

        if total == 0 {
            debug!(project_id = %self.id, "[project-chain] already up to date");
            return Ok(0);
        }

        let mut synced = 0usize;
        for event in events {
            if self.contains_event(&event.id) {
                debug!(event_id = %event.id, "[project-chain] skipping known event");
                continue;
            }
            self.push_event(event);
            synced += 1;

            if self.config.verbose_sync {
                info!(
                    project_id = %self.id,
                    "[project-chain] syncing {}/{}",
                    synced,
                    total
                );
            }
        }

        metrics::record_events_synced(synced);
        info!(
            project_id = %self.id,
            seq_no = self.get_last_seq_no(),
            "[project-chain] synced {} events",
            synced
        );
        Ok(synced)
    }
}

impl ProjectEvent {
    /// Append this event to `project` unless it is already there.
    pub async fn publish(self, project: &mut Project) -> ProjectResult<PublishOutcome> {
        if project.contains_event(&self.id) {
            return Ok(PublishOutcome::AlreadyAdded);
        }
        project.add_event(self).await.map(PublishOutcome::Appended)
    }
}
