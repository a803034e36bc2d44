//! In-process collaborators backing the `demo` subcommand and the default
//! `serve` wiring: a canned calendar feed, a flat-rate pricing calculator,
//! and a payment gateway that succeeds and remembers what it did.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

use turnover_ops::workflows::turnover::domain::{
    Cleaner, CleanerId, GeoPoint, HotTubCadence, HotTubLevel, HotTubService, LaundryKind,
    LaundryService, OnCallStatus, PropertyConfiguration, PropertyId, Subscription, SubscriptionId,
};
use turnover_ops::workflows::turnover::gateways::{
    CalendarFeed, CaptureReceipt, FeedError, GatewayError, GeocodeError, GeocodeResolver,
    PaymentGateway, PriceQuote, PricingCalculator, TransferMetadata,
};
use turnover_ops::workflows::turnover::repository::TurnoverStore;
use turnover_ops::workflows::turnover::MemoryStore;

/// Feed serving one synthesized stay ending tomorrow morning, so the
/// pre-authorization batch has a candidate on its first run.
pub(crate) struct CannedFeed {
    body: String,
}

impl CannedFeed {
    pub(crate) fn for_tomorrow(now: DateTime<Utc>) -> Self {
        let start = now - Duration::days(2);
        let end = (now + Duration::days(1))
            .date_naive()
            .and_hms_opt(11, 0, 0)
            .expect("valid time")
            .and_utc();
        let body = format!(
            "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\nUID:demo-stay-001\r\nDTSTART:{}\r\nDTEND:{}\r\nEND:VEVENT\r\nEND:VCALENDAR\r\n",
            start.format("%Y%m%dT%H%M%SZ"),
            end.format("%Y%m%dT%H%M%SZ"),
        );
        Self { body }
    }
}

impl CalendarFeed for CannedFeed {
    fn fetch(&self, _url: &str) -> Result<String, FeedError> {
        Ok(self.body.clone())
    }
}

pub(crate) struct FlatPricing {
    pub(crate) total_per_clean_cents: i64,
}

impl PricingCalculator for FlatPricing {
    fn calculate(
        &self,
        _property: &PropertyConfiguration,
    ) -> Result<PriceQuote, turnover_ops::workflows::turnover::gateways::PricingError> {
        Ok(PriceQuote {
            total_per_clean_cents: self.total_per_clean_cents,
        })
    }
}

/// Gateway double that authorizes, captures, and transfers successfully,
/// remembering authorized amounts so captures return the held amount.
#[derive(Default)]
pub(crate) struct DemoGateway {
    sequence: AtomicU64,
    holds: Mutex<HashMap<String, i64>>,
}

impl DemoGateway {
    fn next(&self, prefix: &str) -> String {
        let id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{prefix}_{id:04}")
    }
}

impl PaymentGateway for DemoGateway {
    fn authorize(
        &self,
        _customer_id: &str,
        _payment_method_id: &str,
        amount_cents: i64,
    ) -> Result<String, GatewayError> {
        let intent_id = self.next("pi_demo");
        self.holds
            .lock()
            .expect("gateway mutex poisoned")
            .insert(intent_id.clone(), amount_cents);
        Ok(intent_id)
    }

    fn capture(&self, intent_id: &str) -> Result<CaptureReceipt, GatewayError> {
        let holds = self.holds.lock().expect("gateway mutex poisoned");
        let amount_cents = holds
            .get(intent_id)
            .copied()
            .ok_or_else(|| GatewayError::Declined(format!("unknown intent {intent_id}")))?;
        Ok(CaptureReceipt {
            amount_cents,
            transaction_id: self.next("txn_demo"),
        })
    }

    fn transfer(
        &self,
        _connected_account_id: &str,
        _amount_cents: i64,
        _metadata: &TransferMetadata,
    ) -> Result<String, GatewayError> {
        Ok(self.next("tr_demo"))
    }
}

pub(crate) struct GridGeocoder;

impl GeocodeResolver for GridGeocoder {
    fn resolve(&self, _address: &str) -> Result<Option<GeoPoint>, GeocodeError> {
        Ok(Some(GeoPoint {
            latitude: 41.5868,
            longitude: -93.6250,
        }))
    }
}

/// Seed one property, its subscription, and a small cleaner roster.
pub(crate) fn seed(store: &MemoryStore) {
    store
        .insert_property(PropertyConfiguration {
            id: PropertyId("prop-shorehouse".to_string()),
            address: "12 Shore Rd, Clear Lake IA".to_string(),
            bedrooms: 3,
            bathrooms: 2.0,
            square_feet: 1500,
            // Left unresolved so the assignment ranker exercises the
            // geocoder and caches the result back onto the record.
            coordinates: None,
            laundry: Some(LaundryService {
                kind: LaundryKind::OffSite,
                loads: 4,
            }),
            hot_tub: Some(HotTubService {
                level: HotTubLevel::Basic,
                cadence: HotTubCadence::EveryTurnover,
            }),
        })
        .expect("seed property");

    store
        .insert_subscription(Subscription {
            id: SubscriptionId("sub-shorehouse".to_string()),
            property_id: PropertyId("prop-shorehouse".to_string()),
            calendar_feed_url: "https://calendar.example/shorehouse.ics".to_string(),
            customer_id: "cus_demo_01".to_string(),
            saved_payment_method_id: Some("pm_demo_01".to_string()),
        })
        .expect("seed subscription");

    let roster = [
        ("cleaner-ana", "Ana", 95.0, 41.60, -93.62, Some("acct_demo_ana")),
        ("cleaner-bo", "Bo", 90.0, 41.55, -93.70, Some("acct_demo_bo")),
        ("cleaner-cam", "Cam", 80.0, 42.10, -94.40, None),
    ];
    for (id, name, reliability, lat, lon, account) in roster {
        store
            .insert_cleaner(Cleaner {
                id: CleanerId(id.to_string()),
                name: name.to_string(),
                reliability_score: reliability,
                on_call_status: OnCallStatus::Available,
                coordinates: Some(GeoPoint {
                    latitude: lat,
                    longitude: lon,
                }),
                connected_account_id: account.map(str::to_string),
            })
            .expect("seed cleaner");
    }
}
