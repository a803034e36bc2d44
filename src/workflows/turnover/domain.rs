use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CleanerId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PayoutId(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Unassigned,
    Assigned,
    InProgress,
    Completed,
    Canceled,
}

impl JobStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Canceled => "canceled",
        }
    }

    /// Terminal states accept no further lifecycle triggers.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Canceled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Authorized,
    Failed,
    Captured,
    CaptureFailed,
}

impl PaymentStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Authorized => "authorized",
            Self::Failed => "failed",
            Self::Captured => "captured",
            Self::CaptureFailed => "capture_failed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentRole {
    Primary,
    Backup,
    OnCall,
    LaundryLead,
}

impl AssignmentRole {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Backup => "backup",
            Self::OnCall => "on_call",
            Self::LaundryLead => "laundry_lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCallStatus {
    Available,
    Unavailable,
    OnJob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Complete,
    Incomplete,
    PendingReview,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutStatus {
    Pending,
    Released,
    Held,
}

/// Latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaundryKind {
    InUnit,
    OffSite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotTubLevel {
    Basic,
    Premium,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HotTubCadence {
    EveryTurnover,
    EveryOtherTurnover,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaundryService {
    pub kind: LaundryKind,
    pub loads: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotTubService {
    pub level: HotTubLevel,
    pub cadence: HotTubCadence,
}

/// Sizing tier used to scale off-site laundry duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobSizeTier {
    Standard,
    Large,
    Estate,
}

/// Live, mutable property settings. Jobs never read these after creation;
/// they carry their own [`JobAddonsSnapshot`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyConfiguration {
    pub id: PropertyId,
    pub address: String,
    pub bedrooms: u32,
    pub bathrooms: f64,
    pub square_feet: u32,
    pub coordinates: Option<GeoPoint>,
    pub laundry: Option<LaundryService>,
    pub hot_tub: Option<HotTubService>,
}

impl PropertyConfiguration {
    pub fn job_size_tier(&self) -> JobSizeTier {
        match self.bedrooms {
            0..=2 => JobSizeTier::Standard,
            3..=4 => JobSizeTier::Large,
            _ => JobSizeTier::Estate,
        }
    }

    /// Freeze the add-on settings in effect right now. The returned value is
    /// copied onto the job and never refreshed, so pricing and payouts
    /// reflect what was promised at scheduling time.
    pub fn snapshot_addons(&self) -> JobAddonsSnapshot {
        JobAddonsSnapshot {
            laundry: self.laundry,
            hot_tub: self.hot_tub,
        }
    }
}

/// Immutable copy of the property's add-ons taken at job creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobAddonsSnapshot {
    pub laundry: Option<LaundryService>,
    pub hot_tub: Option<HotTubService>,
}

impl JobAddonsSnapshot {
    pub fn laundry_loads(&self) -> u32 {
        self.laundry.map(|laundry| laundry.loads).unwrap_or(0)
    }
}

/// One scheduled turnover clean, materialized from a calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub subscription_id: SubscriptionId,
    pub property_id: PropertyId,
    pub status: JobStatus,
    /// Scheduled start from the calendar, overwritten with the actual
    /// timestamp at cleaner check-in.
    pub check_in_time: Option<DateTime<Utc>>,
    /// Scheduled end from the calendar, overwritten at cleaner check-out.
    pub check_out_time: Option<DateTime<Utc>>,
    pub is_urgent_bonus: bool,
    /// External event uid; globally unique, the ingestion idempotency key.
    pub calendar_event_uid: String,
    /// Computed at ingestion (refreshed on re-sync); settlement reads this,
    /// never the live property settings.
    pub expected_hours: f64,
    pub addons_snapshot: JobAddonsSnapshot,
    pub payment_intent_id: Option<String>,
    pub payment_status: PaymentStatus,
    pub payment_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JobCleanerAssignment {
    pub job_id: JobId,
    pub cleaner_id: CleanerId,
    pub role: AssignmentRole,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub task: String,
    pub done: bool,
}

/// Proof-of-work record backing payment capture; one per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidencePacket {
    pub job_id: JobId,
    pub photo_urls: Vec<String>,
    pub is_checklist_complete: bool,
    pub checklist_log: Vec<ChecklistEntry>,
    pub gps_check_in_timestamp: Option<DateTime<Utc>>,
    pub gps_check_out_timestamp: Option<DateTime<Utc>>,
    pub status: EvidenceStatus,
}

impl EvidencePacket {
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            photo_urls: Vec::new(),
            is_checklist_complete: false,
            checklist_log: Vec::new(),
            gps_check_in_timestamp: None,
            gps_check_out_timestamp: None,
            status: EvidenceStatus::Incomplete,
        }
    }
}

/// Append-only ledger entry written once per successful capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReserveTransaction {
    pub job_id: JobId,
    pub captured_cents: i64,
    pub reserve_cents: i64,
    pub net_cents: i64,
    pub gateway_transaction_id: String,
    pub recorded_at: DateTime<Utc>,
}

/// Money owed to one cleaner for one job, inclusive of bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payout {
    pub id: PayoutId,
    pub job_id: JobId,
    pub cleaner_id: CleanerId,
    pub role: AssignmentRole,
    pub base_cents: i64,
    pub urgent_bonus_cents: i64,
    pub laundry_bonus_cents: i64,
    pub status: PayoutStatus,
    pub transfer_id: Option<String>,
    pub hold_reason: Option<String>,
}

impl Payout {
    pub fn total_cents(&self) -> i64 {
        self.base_cents + self.urgent_bonus_cents + self.laundry_bonus_cents
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cleaner {
    pub id: CleanerId,
    pub name: String,
    pub reliability_score: f64,
    pub on_call_status: OnCallStatus,
    pub coordinates: Option<GeoPoint>,
    /// Connected payment account; absence forces payouts to `held`.
    pub connected_account_id: Option<String>,
}

/// Customer subscription tying a property to its calendar feed and billing
/// identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub property_id: PropertyId,
    pub calendar_feed_url: String,
    pub customer_id: String,
    pub saved_payment_method_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_is_detached_from_live_settings() {
        let mut property = PropertyConfiguration {
            id: PropertyId("prop-1".to_string()),
            address: "12 Shore Rd".to_string(),
            bedrooms: 3,
            bathrooms: 2.0,
            square_feet: 1500,
            coordinates: None,
            laundry: Some(LaundryService {
                kind: LaundryKind::OffSite,
                loads: 4,
            }),
            hot_tub: None,
        };

        let snapshot = property.snapshot_addons();
        property.laundry = None;
        property.hot_tub = Some(HotTubService {
            level: HotTubLevel::Basic,
            cadence: HotTubCadence::EveryTurnover,
        });

        assert_eq!(snapshot.laundry_loads(), 4);
        assert!(snapshot.hot_tub.is_none());
    }

    #[test]
    fn job_size_tier_tracks_bedroom_count() {
        let mut property = PropertyConfiguration {
            id: PropertyId("prop-2".to_string()),
            address: "8 Dune Way".to_string(),
            bedrooms: 2,
            bathrooms: 1.0,
            square_feet: 900,
            coordinates: None,
            laundry: None,
            hot_tub: None,
        };
        assert_eq!(property.job_size_tier(), JobSizeTier::Standard);

        property.bedrooms = 4;
        assert_eq!(property.job_size_tier(), JobSizeTier::Large);

        property.bedrooms = 6;
        assert_eq!(property.job_size_tier(), JobSizeTier::Estate);
    }

    #[test]
    fn terminal_states() {
        assert!(JobStatus::Completed.is_terminal());
        assert!(JobStatus::Canceled.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
    }
}
