use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::workflows::turnover::domain::{
    AssignmentRole, ChecklistEntry, Cleaner, CleanerId, EvidencePacket, EvidenceStatus, GeoPoint,
    Job, JobCleanerAssignment, JobId, JobStatus, LaundryKind, LaundryService, OnCallStatus,
    PaymentStatus, PropertyConfiguration, PropertyId, Subscription, SubscriptionId,
};
use crate::workflows::turnover::gateways::{
    CalendarFeed, CaptureReceipt, FeedError, GatewayError, GeocodeError, GeocodeResolver,
    PaymentGateway, PriceQuote, PricingCalculator, PricingError, TransferMetadata,
};
use crate::workflows::turnover::memory::MemoryStore;
use crate::workflows::turnover::repository::TurnoverStore;

pub(super) fn ts(year: i32, month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn origin() -> GeoPoint {
    GeoPoint {
        latitude: 41.0,
        longitude: -93.0,
    }
}

/// 3bd/2ba/1500sqft with off-site laundry: expected hours come out to 6.40.
pub(super) fn shore_property() -> PropertyConfiguration {
    PropertyConfiguration {
        id: PropertyId("prop-shore".to_string()),
        address: "12 Shore Rd, Clear Lake IA".to_string(),
        bedrooms: 3,
        bathrooms: 2.0,
        square_feet: 1500,
        coordinates: Some(origin()),
        laundry: Some(LaundryService {
            kind: LaundryKind::OffSite,
            loads: 4,
        }),
        hot_tub: None,
    }
}

pub(super) fn shore_subscription() -> Subscription {
    Subscription {
        id: SubscriptionId("sub-shore".to_string()),
        property_id: PropertyId("prop-shore".to_string()),
        calendar_feed_url: "https://calendar.example/shore.ics".to_string(),
        customer_id: "cus_100".to_string(),
        saved_payment_method_id: Some("pm_100".to_string()),
    }
}

pub(super) fn cleaner(
    id: &str,
    reliability: f64,
    coordinates: Option<GeoPoint>,
    connected_account: Option<&str>,
) -> Cleaner {
    Cleaner {
        id: CleanerId(id.to_string()),
        name: id.to_string(),
        reliability_score: reliability,
        on_call_status: OnCallStatus::Available,
        coordinates,
        connected_account_id: connected_account.map(str::to_string),
    }
}

/// Store pre-loaded with the shore property, its subscription, and two
/// payable cleaners plus one without a connected account.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store
        .insert_property(shore_property())
        .expect("seed property");
    store
        .insert_subscription(shore_subscription())
        .expect("seed subscription");
    for roster in [
        cleaner("cleaner-ana", 95.0, Some(origin()), Some("acct_ana")),
        cleaner("cleaner-bo", 90.0, Some(origin()), Some("acct_bo")),
        cleaner("cleaner-cam", 80.0, Some(origin()), None),
    ] {
        store.insert_cleaner(roster).expect("seed cleaner");
    }
    store
}

/// A job as ingestion would materialize it, with a chosen duration.
pub(super) fn scheduled_job(id: &str, uid: &str, expected_hours: f64) -> Job {
    Job {
        id: JobId(id.to_string()),
        subscription_id: SubscriptionId("sub-shore".to_string()),
        property_id: PropertyId("prop-shore".to_string()),
        status: JobStatus::Unassigned,
        check_in_time: Some(ts(2026, 9, 1, 15)),
        check_out_time: Some(ts(2026, 9, 4, 11)),
        is_urgent_bonus: false,
        calendar_event_uid: uid.to_string(),
        expected_hours,
        addons_snapshot: shore_property().snapshot_addons(),
        payment_intent_id: None,
        payment_status: PaymentStatus::Pending,
        payment_error: None,
    }
}

pub(super) fn assignment(job: &JobId, cleaner: &str, role: AssignmentRole) -> JobCleanerAssignment {
    JobCleanerAssignment {
        job_id: job.clone(),
        cleaner_id: CleanerId(cleaner.to_string()),
        role,
    }
}

/// An evidence packet that passes every settlement sub-condition.
pub(super) fn complete_packet(job_id: &JobId) -> EvidencePacket {
    EvidencePacket {
        job_id: job_id.clone(),
        photo_urls: vec!["https://cdn.example/after.jpg".to_string()],
        is_checklist_complete: true,
        checklist_log: vec![ChecklistEntry {
            task: "Strip and remake beds".to_string(),
            done: true,
        }],
        gps_check_in_timestamp: Some(ts(2026, 9, 4, 11)),
        gps_check_out_timestamp: Some(ts(2026, 9, 4, 15)),
        status: EvidenceStatus::Complete,
    }
}

pub(super) fn feed_body(events: &[(&str, &str, &str)]) -> String {
    let mut body = String::from("BEGIN:VCALENDAR\r\n");
    for (uid, start, end) in events {
        body.push_str("BEGIN:VEVENT\r\n");
        body.push_str(&format!("UID:{uid}\r\n"));
        body.push_str(&format!("DTSTART:{start}\r\n"));
        body.push_str(&format!("DTEND:{end}\r\n"));
        body.push_str("END:VEVENT\r\n");
    }
    body.push_str("END:VCALENDAR\r\n");
    body
}

/// Feed double serving one fixed body for every URL.
pub(super) struct StaticFeed {
    pub(super) body: String,
}

impl CalendarFeed for StaticFeed {
    fn fetch(&self, _url: &str) -> Result<String, FeedError> {
        Ok(self.body.clone())
    }
}

/// Feed double keyed by URL; unknown URLs fail like a dead endpoint.
#[derive(Default)]
pub(super) struct RoutedFeed {
    bodies: HashMap<String, String>,
}

impl RoutedFeed {
    pub(super) fn with(mut self, url: &str, body: String) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

impl CalendarFeed for RoutedFeed {
    fn fetch(&self, url: &str) -> Result<String, FeedError> {
        self.bodies
            .get(url)
            .cloned()
            .ok_or_else(|| FeedError::Fetch(format!("connection refused: {url}")))
    }
}

/// Gateway double that succeeds everywhere and records what it did.
#[derive(Default)]
pub(super) struct RecordingGateway {
    sequence: AtomicU64,
    holds: Mutex<HashMap<String, i64>>,
    transfers: Mutex<Vec<(String, i64)>>,
}

impl RecordingGateway {
    fn next(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}-{id:04}")
    }

    /// Register a pre-existing hold so capture succeeds without a prior
    /// authorize call through this double.
    pub(super) fn preload_hold(&self, intent_id: &str, amount_cents: i64) {
        self.holds
            .lock()
            .expect("gateway mutex poisoned")
            .insert(intent_id.to_string(), amount_cents);
    }

    pub(super) fn transfers(&self) -> Vec<(String, i64)> {
        self.transfers.lock().expect("gateway mutex poisoned").clone()
    }
}

impl PaymentGateway for RecordingGateway {
    fn authorize(
        &self,
        _customer_id: &str,
        _payment_method_id: &str,
        amount_cents: i64,
    ) -> Result<String, GatewayError> {
        let intent_id = self.next("pi");
        self.preload_hold(&intent_id, amount_cents);
        Ok(intent_id)
    }

    fn capture(&self, intent_id: &str) -> Result<CaptureReceipt, GatewayError> {
        let amount_cents = self
            .holds
            .lock()
            .expect("gateway mutex poisoned")
            .get(intent_id)
            .copied()
            .ok_or_else(|| GatewayError::Declined(format!("unknown intent {intent_id}")))?;
        Ok(CaptureReceipt {
            amount_cents,
            transaction_id: self.next("txn"),
        })
    }

    fn transfer(
        &self,
        connected_account_id: &str,
        amount_cents: i64,
        _metadata: &TransferMetadata,
    ) -> Result<String, GatewayError> {
        self.transfers
            .lock()
            .expect("gateway mutex poisoned")
            .push((connected_account_id.to_string(), amount_cents));
        Ok(self.next("tr"))
    }
}

/// Gateway double whose captures and transfers are always declined.
pub(super) struct DecliningGateway;

impl PaymentGateway for DecliningGateway {
    fn authorize(
        &self,
        _customer_id: &str,
        _payment_method_id: &str,
        _amount_cents: i64,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::Declined("card expired".to_string()))
    }

    fn capture(&self, _intent_id: &str) -> Result<CaptureReceipt, GatewayError> {
        Err(GatewayError::Declined("card disputed".to_string()))
    }

    fn transfer(
        &self,
        _connected_account_id: &str,
        _amount_cents: i64,
        _metadata: &TransferMetadata,
    ) -> Result<String, GatewayError> {
        Err(GatewayError::Unavailable("transfers offline".to_string()))
    }
}

pub(super) struct FlatPricing(pub(super) i64);

impl PricingCalculator for FlatPricing {
    fn calculate(&self, _property: &PropertyConfiguration) -> Result<PriceQuote, PricingError> {
        Ok(PriceQuote {
            total_per_clean_cents: self.0,
        })
    }
}

/// Geocoder double resolving every address to the test origin, counting
/// calls so caching behavior is observable.
#[derive(Default)]
pub(super) struct CountingGeocoder {
    calls: AtomicU64,
}

impl CountingGeocoder {
    pub(super) fn calls(&self) -> u64 {
        self.calls.load(Ordering::Relaxed)
    }
}

impl GeocodeResolver for CountingGeocoder {
    fn resolve(&self, _address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        Ok(Some(origin()))
    }
}

/// Geocoder double that cannot place any address.
pub(super) struct NowhereGeocoder;

impl GeocodeResolver for NowhereGeocoder {
    fn resolve(&self, _address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(None)
    }
}
