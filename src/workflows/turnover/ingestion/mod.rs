//! Calendar feed ingestion: fetch, parse, and idempotently materialize
//! turnover jobs keyed by the external event uid.

pub mod hours;
pub mod parser;

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::domain::{
    EvidencePacket, Job, JobId, JobStatus, PaymentStatus, PropertyConfiguration, PropertyId,
    Subscription, SubscriptionId,
};
use super::gateways::{CalendarFeed, FeedError};
use super::repository::{RepositoryError, TurnoverStore, UpsertOutcome};
use parser::{CalendarEvent, FeedParseError};

pub use hours::expected_hours;
pub use parser::parse_events;

const DEFAULT_CHUNK_SIZE: usize = 100;

/// Per-subscription sync failure. The sweep records these and moves on.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("subscription {} not found", .0 .0)]
    SubscriptionNotFound(SubscriptionId),
    #[error("property {} not found", .0 .0)]
    PropertyNotFound(PropertyId),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Parse(#[from] FeedParseError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Outcome summary for one subscription's sync.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub subscription_id: SubscriptionId,
    pub inserted: usize,
    pub updated: usize,
    pub skipped: usize,
    pub chunk_errors: Vec<ChunkFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    pub chunk_index: usize,
    pub event_uid: String,
    pub error: String,
}

/// Outcome of the cron sweep over every subscription.
#[derive(Debug, Clone, Serialize)]
pub struct SweepReport {
    pub synced: usize,
    pub failed: usize,
    pub outcomes: Vec<SubscriptionOutcome>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionOutcome {
    pub subscription_id: SubscriptionId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<SyncReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Service materializing jobs from external calendar feeds.
pub struct CalendarSyncService<S, F> {
    store: Arc<S>,
    feed: Arc<F>,
    chunk_size: usize,
}

impl<S, F> CalendarSyncService<S, F>
where
    S: TurnoverStore,
    F: CalendarFeed,
{
    pub fn new(store: Arc<S>, feed: Arc<F>) -> Self {
        Self::with_chunk_size(store, feed, DEFAULT_CHUNK_SIZE)
    }

    pub fn with_chunk_size(store: Arc<S>, feed: Arc<F>, chunk_size: usize) -> Self {
        Self {
            store,
            feed,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Sweep every subscription. A failing subscription is recorded and
    /// never aborts the run.
    pub fn sync_all(&self) -> Result<SweepReport, RepositoryError> {
        let subscriptions = self.store.subscriptions()?;
        let mut outcomes = Vec::with_capacity(subscriptions.len());
        let mut synced = 0;
        let mut failed = 0;

        for subscription in subscriptions {
            match self.sync_subscription(&subscription.id) {
                Ok(report) => {
                    synced += 1;
                    outcomes.push(SubscriptionOutcome {
                        subscription_id: subscription.id,
                        report: Some(report),
                        error: None,
                    });
                }
                Err(error) => {
                    warn!(
                        subscription = %subscription.id.0,
                        %error,
                        "calendar sync failed for subscription"
                    );
                    failed += 1;
                    outcomes.push(SubscriptionOutcome {
                        subscription_id: subscription.id,
                        report: None,
                        error: Some(error.to_string()),
                    });
                }
            }
        }

        Ok(SweepReport {
            synced,
            failed,
            outcomes,
        })
    }

    /// Fetch and parse one subscription's feed, then upsert a job per
    /// event. Re-running on an unchanged feed produces only updates.
    pub fn sync_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<SyncReport, SyncError> {
        let subscription = self
            .store
            .fetch_subscription(subscription_id)?
            .ok_or_else(|| SyncError::SubscriptionNotFound(subscription_id.clone()))?;
        let property = self
            .store
            .fetch_property(&subscription.property_id)?
            .ok_or_else(|| SyncError::PropertyNotFound(subscription.property_id.clone()))?;

        let body = self.feed.fetch(&subscription.calendar_feed_url)?;
        let events = parse_events(&body)?;

        let mut report = SyncReport {
            subscription_id: subscription_id.clone(),
            inserted: 0,
            updated: 0,
            skipped: 0,
            chunk_errors: Vec::new(),
        };

        for (chunk_index, chunk) in events.chunks(self.chunk_size).enumerate() {
            if let Err((uid, error)) = self.apply_chunk(&subscription, &property, chunk, &mut report)
            {
                warn!(
                    subscription = %subscription_id.0,
                    chunk_index,
                    event_uid = %uid,
                    %error,
                    "skipping failed ingestion chunk"
                );
                report.chunk_errors.push(ChunkFailure {
                    chunk_index,
                    event_uid: uid,
                    error: error.to_string(),
                });
            }
        }

        info!(
            subscription = %subscription_id.0,
            inserted = report.inserted,
            updated = report.updated,
            skipped = report.skipped,
            "calendar sync finished"
        );

        Ok(report)
    }

    fn apply_chunk(
        &self,
        subscription: &Subscription,
        property: &PropertyConfiguration,
        chunk: &[CalendarEvent],
        report: &mut SyncReport,
    ) -> Result<(), (String, RepositoryError)> {
        for event in chunk {
            let outcome = self
                .upsert_event(subscription, property, event)
                .map_err(|error| (event.uid.clone(), error))?;
            match outcome {
                UpsertOutcome::Inserted => report.inserted += 1,
                UpsertOutcome::Updated => report.updated += 1,
                UpsertOutcome::Skipped => report.skipped += 1,
            }
        }
        Ok(())
    }

    fn upsert_event(
        &self,
        subscription: &Subscription,
        property: &PropertyConfiguration,
        event: &CalendarEvent,
    ) -> Result<UpsertOutcome, RepositoryError> {
        match self.store.job_by_event_uid(&event.uid)? {
            Some(mut job) => {
                // Terminal jobs keep their actual timestamps; a re-sync
                // must not clobber them.
                if job.status.is_terminal() {
                    return Ok(UpsertOutcome::Skipped);
                }
                job.check_in_time = Some(event.start);
                job.check_out_time = Some(event.end);
                job.expected_hours = expected_hours(property);
                job.addons_snapshot = property.snapshot_addons();
                self.store.update_job(job)?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                let job = Job {
                    id: JobId(format!("job-{}", event.uid)),
                    subscription_id: subscription.id.clone(),
                    property_id: property.id.clone(),
                    status: JobStatus::Unassigned,
                    check_in_time: Some(event.start),
                    check_out_time: Some(event.end),
                    is_urgent_bonus: false,
                    calendar_event_uid: event.uid.clone(),
                    expected_hours: expected_hours(property),
                    addons_snapshot: property.snapshot_addons(),
                    payment_intent_id: None,
                    payment_status: PaymentStatus::Pending,
                    payment_error: None,
                };
                let job = self.store.insert_job(job)?;
                self.store.insert_evidence(EvidencePacket::new(job.id))?;
                Ok(UpsertOutcome::Inserted)
            }
        }
    }
}
