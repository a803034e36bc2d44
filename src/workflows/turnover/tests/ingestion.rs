use std::sync::Arc;

use super::common::*;
use crate::workflows::turnover::domain::{
    EvidenceStatus, JobId, JobStatus, PaymentStatus, PropertyId, SubscriptionId,
};
use crate::workflows::turnover::domain::{PropertyConfiguration, Subscription};
use crate::workflows::turnover::ingestion::{CalendarSyncService, SyncError};
use crate::workflows::turnover::memory::MemoryStore;
use crate::workflows::turnover::repository::TurnoverStore;

fn shore_feed() -> String {
    feed_body(&[
        ("stay-001@feed", "20260901T150000Z", "20260904T110000Z"),
        ("stay-002@feed", "20260906T160000Z", "20260909T110000Z"),
    ])
}

fn sync_service(
    store: Arc<MemoryStore>,
    body: String,
) -> CalendarSyncService<MemoryStore, StaticFeed> {
    CalendarSyncService::new(store, Arc::new(StaticFeed { body }))
}

#[test]
fn first_sync_materializes_jobs_with_evidence() {
    let store = seeded_store();
    let sync = sync_service(store.clone(), shore_feed());

    let report = sync
        .sync_subscription(&SubscriptionId("sub-shore".to_string()))
        .expect("sync succeeds");

    assert_eq!(report.inserted, 2);
    assert_eq!(report.updated, 0);
    assert_eq!(report.skipped, 0);
    assert!(report.chunk_errors.is_empty());

    let job = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup succeeds")
        .expect("job materialized");
    assert_eq!(job.id, JobId("job-stay-001@feed".to_string()));
    assert_eq!(job.status, JobStatus::Unassigned);
    assert_eq!(job.payment_status, PaymentStatus::Pending);
    assert_eq!(job.expected_hours, 6.40);
    assert_eq!(job.check_in_time, Some(ts(2026, 9, 1, 15)));
    assert_eq!(job.check_out_time, Some(ts(2026, 9, 4, 11)));
    assert_eq!(job.addons_snapshot.laundry_loads(), 4);

    let packet = store
        .fetch_evidence(&job.id)
        .expect("lookup succeeds")
        .expect("packet created eagerly");
    assert_eq!(packet.status, EvidenceStatus::Incomplete);
    assert!(packet.photo_urls.is_empty());
}

#[test]
fn resync_of_unchanged_feed_only_updates() {
    let store = seeded_store();
    let sync = sync_service(store.clone(), shore_feed());
    let subscription = SubscriptionId("sub-shore".to_string());

    sync.sync_subscription(&subscription).expect("first sync");
    let first = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup")
        .expect("job exists");

    let report = sync.sync_subscription(&subscription).expect("second sync");
    assert_eq!(report.inserted, 0);
    assert_eq!(report.updated, 2);
    assert_eq!(report.skipped, 0);

    let second = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup")
        .expect("job still exists");
    assert_eq!(second.id, first.id);
}

#[test]
fn resync_refreshes_hours_and_addons_snapshot() {
    let store = seeded_store();
    let sync = sync_service(store.clone(), shore_feed());
    let subscription = SubscriptionId("sub-shore".to_string());
    sync.sync_subscription(&subscription).expect("first sync");

    let mut property = store
        .fetch_property(&PropertyId("prop-shore".to_string()))
        .expect("lookup")
        .expect("property exists");
    property.bedrooms = 5;
    if let Some(laundry) = property.laundry.as_mut() {
        laundry.loads = 6;
    }
    store.update_property(property).expect("update property");

    sync.sync_subscription(&subscription).expect("second sync");

    let job = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup")
        .expect("job exists");
    // 5 bedrooms moves the property into the estate tier.
    assert_eq!(job.expected_hours, 8.80);
    assert_eq!(job.addons_snapshot.laundry_loads(), 6);
}

#[test]
fn terminal_jobs_are_skipped_on_resync() {
    let store = seeded_store();
    let sync = sync_service(store.clone(), shore_feed());
    let subscription = SubscriptionId("sub-shore".to_string());
    sync.sync_subscription(&subscription).expect("first sync");

    let job = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup")
        .expect("job exists");
    store
        .update_job_status(&job.id, JobStatus::Unassigned, JobStatus::Canceled)
        .expect("cancel directly");

    let mut property = store
        .fetch_property(&PropertyId("prop-shore".to_string()))
        .expect("lookup")
        .expect("property exists");
    if let Some(laundry) = property.laundry.as_mut() {
        laundry.loads = 9;
    }
    store.update_property(property).expect("update property");

    let report = sync.sync_subscription(&subscription).expect("second sync");
    assert_eq!(report.skipped, 1);
    assert_eq!(report.updated, 1);

    let canceled = store
        .job_by_event_uid("stay-001@feed")
        .expect("lookup")
        .expect("job exists");
    assert_eq!(canceled.status, JobStatus::Canceled);
    assert_eq!(canceled.addons_snapshot.laundry_loads(), 4);
}

#[test]
fn failing_chunk_is_recorded_and_the_rest_proceeds() {
    let store = seeded_store();
    // A pre-existing packet for the job id the poison event will produce
    // forces the insert path to fail inside its chunk.
    store
        .insert_evidence(crate::workflows::turnover::domain::EvidencePacket::new(
            JobId("job-poison@feed".to_string()),
        ))
        .expect("plant conflicting packet");

    let body = feed_body(&[
        ("poison@feed", "20260901T150000Z", "20260904T110000Z"),
        ("stay-002@feed", "20260906T160000Z", "20260909T110000Z"),
    ]);
    let sync =
        CalendarSyncService::with_chunk_size(store.clone(), Arc::new(StaticFeed { body }), 1);

    let report = sync
        .sync_subscription(&SubscriptionId("sub-shore".to_string()))
        .expect("sync survives the bad chunk");

    assert_eq!(report.inserted, 1);
    assert_eq!(report.chunk_errors.len(), 1);
    assert_eq!(report.chunk_errors[0].event_uid, "poison@feed");
    assert!(store
        .job_by_event_uid("stay-002@feed")
        .expect("lookup")
        .is_some());
}

#[test]
fn sweep_isolates_subscription_failures() {
    let store = seeded_store();
    store
        .insert_property(PropertyConfiguration {
            id: PropertyId("prop-dune".to_string()),
            address: "8 Dune Way".to_string(),
            bedrooms: 2,
            bathrooms: 1.0,
            square_feet: 900,
            coordinates: None,
            laundry: None,
            hot_tub: None,
        })
        .expect("seed second property");
    store
        .insert_subscription(Subscription {
            id: SubscriptionId("sub-dune".to_string()),
            property_id: PropertyId("prop-dune".to_string()),
            calendar_feed_url: "https://calendar.example/dune.ics".to_string(),
            customer_id: "cus_200".to_string(),
            saved_payment_method_id: None,
        })
        .expect("seed second subscription");

    let feed = RoutedFeed::default().with("https://calendar.example/shore.ics", shore_feed());
    let sync = CalendarSyncService::new(store, Arc::new(feed));

    let sweep = sync.sync_all().expect("sweep completes");
    assert_eq!(sweep.synced, 1);
    assert_eq!(sweep.failed, 1);

    let failed = sweep
        .outcomes
        .iter()
        .find(|outcome| outcome.subscription_id.0 == "sub-dune")
        .expect("failed outcome recorded");
    assert!(failed.report.is_none());
    assert!(failed
        .error
        .as_deref()
        .is_some_and(|error| error.contains("connection refused")));
}

#[test]
fn unknown_subscription_is_an_error() {
    let store = seeded_store();
    let sync = sync_service(store, shore_feed());

    assert!(matches!(
        sync.sync_subscription(&SubscriptionId("sub-ghost".to_string())),
        Err(SyncError::SubscriptionNotFound(_))
    ));
}
