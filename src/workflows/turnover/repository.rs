use chrono::{DateTime, NaiveDate, Utc};

use super::domain::{
    Cleaner, CleanerId, EvidencePacket, Job, JobCleanerAssignment, JobId, JobStatus, Payout,
    PayoutId, PropertyConfiguration, PropertyId, ReserveTransaction, Subscription, SubscriptionId,
};

/// Error enumeration for store failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("job status changed underneath the caller (expected {}, found {})", .expected.label(), .found.label())]
    StaleStatus {
        expected: JobStatus,
        found: JobStatus,
    },
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Outcome of an idempotent upsert keyed by `calendar_event_uid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Skipped,
}

/// Prepared write-set for a cleaner check-in. The store applies all four
/// writes (status, check-in time, evidence GPS stamp, cleaner on-call
/// status) or none of them.
#[derive(Debug, Clone)]
pub struct CheckInCommit {
    pub job_id: JobId,
    pub cleaner_id: CleanerId,
    pub expected: JobStatus,
    pub next: JobStatus,
    pub at: DateTime<Utc>,
}

/// Prepared write-set for a check-out; applied atomically like check-in.
#[derive(Debug, Clone)]
pub struct CheckOutCommit {
    pub job_id: JobId,
    pub expected: JobStatus,
    pub next: JobStatus,
    pub at: DateTime<Utc>,
}

/// Payout fields the caller controls; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewPayout {
    pub job_id: JobId,
    pub cleaner_id: CleanerId,
    pub role: super::domain::AssignmentRole,
    pub base_cents: i64,
    pub urgent_bonus_cents: i64,
    pub laundry_bonus_cents: i64,
}

/// Storage abstraction over the relational records the core depends on.
/// Composite operations exist where the design requires multi-row
/// atomicity; everything else is row-at-a-time.
pub trait TurnoverStore: Send + Sync {
    // Jobs.
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    fn job_by_event_uid(&self, uid: &str) -> Result<Option<Job>, RepositoryError>;
    fn update_job(&self, job: Job) -> Result<(), RepositoryError>;
    /// Jobs whose scheduled check-out falls on `day` and that have no
    /// payment intent yet; the nightly pre-authorization candidate set.
    fn jobs_awaiting_preauth(&self, day: NaiveDate) -> Result<Vec<Job>, RepositoryError>;
    /// Compare-and-swap status update; fails with [`RepositoryError::StaleStatus`]
    /// when another writer got there first. Returns the stored job.
    fn update_job_status(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, RepositoryError>;

    // Assignments. One row per (job, cleaner, role).
    fn assignments_for_job(
        &self,
        id: &JobId,
    ) -> Result<Vec<JobCleanerAssignment>, RepositoryError>;
    fn insert_assignment(&self, assignment: JobCleanerAssignment) -> Result<(), RepositoryError>;
    /// Atomic delete-of-existing-primary plus insert-of-new-primary, so no
    /// window exists with zero or two primaries.
    fn replace_primary(&self, job_id: &JobId, cleaner_id: &CleanerId)
        -> Result<(), RepositoryError>;
    fn clear_assignments(&self, job_id: &JobId) -> Result<usize, RepositoryError>;

    // Evidence packets.
    fn insert_evidence(&self, packet: EvidencePacket) -> Result<(), RepositoryError>;
    fn fetch_evidence(&self, job_id: &JobId) -> Result<Option<EvidencePacket>, RepositoryError>;
    fn update_evidence(&self, packet: EvidencePacket) -> Result<(), RepositoryError>;

    // Cleaners.
    fn insert_cleaner(&self, cleaner: Cleaner) -> Result<(), RepositoryError>;
    fn fetch_cleaner(&self, id: &CleanerId) -> Result<Option<Cleaner>, RepositoryError>;
    fn cleaners(&self) -> Result<Vec<Cleaner>, RepositoryError>;
    fn update_cleaner(&self, cleaner: Cleaner) -> Result<(), RepositoryError>;

    // Properties and subscriptions.
    fn insert_property(&self, property: PropertyConfiguration) -> Result<(), RepositoryError>;
    fn fetch_property(
        &self,
        id: &PropertyId,
    ) -> Result<Option<PropertyConfiguration>, RepositoryError>;
    fn update_property(&self, property: PropertyConfiguration) -> Result<(), RepositoryError>;
    fn insert_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError>;
    fn fetch_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, RepositoryError>;
    fn subscriptions(&self) -> Result<Vec<Subscription>, RepositoryError>;

    // Reserve ledger. Append-only; at most one row per job.
    fn insert_reserve_transaction(
        &self,
        transaction: ReserveTransaction,
    ) -> Result<(), RepositoryError>;
    fn reserve_transactions_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<ReserveTransaction>, RepositoryError>;

    // Payouts.
    fn insert_payout(&self, payout: NewPayout) -> Result<Payout, RepositoryError>;
    fn fetch_payout(&self, id: &PayoutId) -> Result<Option<Payout>, RepositoryError>;
    fn payouts_for_job(&self, job_id: &JobId) -> Result<Vec<Payout>, RepositoryError>;
    fn pending_payouts(&self) -> Result<Vec<Payout>, RepositoryError>;
    fn update_payout(&self, payout: Payout) -> Result<(), RepositoryError>;

    // Composite lifecycle commits.
    fn commit_check_in(&self, commit: CheckInCommit) -> Result<Job, RepositoryError>;
    fn commit_check_out(&self, commit: CheckOutCommit) -> Result<Job, RepositoryError>;
}
