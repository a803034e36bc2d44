//! Turnover job lifecycle and payment settlement core: calendar ingestion,
//! the job/payment dual state machine, evidence-gated capture, payout
//! batches, and proximity-based cleaner ranking.

pub mod assignment;
pub mod domain;
pub mod gateways;
pub mod ingestion;
pub mod lifecycle;
pub mod memory;
pub mod repository;
pub mod router;
pub mod service;
pub mod settlement;

#[cfg(test)]
mod tests;

pub use assignment::{haversine_miles, rank_candidates, AssignmentRanker, RankedCleaner, RankingOptions};
pub use domain::{
    AssignmentRole, ChecklistEntry, Cleaner, CleanerId, EvidencePacket, EvidenceStatus, GeoPoint,
    Job, JobAddonsSnapshot, JobCleanerAssignment, JobId, JobStatus, OnCallStatus, Payout, PayoutId,
    PayoutStatus, PaymentStatus, PropertyConfiguration, PropertyId, ReserveTransaction,
    Subscription, SubscriptionId,
};
pub use ingestion::{CalendarSyncService, SweepReport, SyncError, SyncReport};
pub use lifecycle::{next_status, TransitionError, Trigger};
pub use memory::MemoryStore;
pub use repository::{NewPayout, RepositoryError, TurnoverStore, UpsertOutcome};
pub use router::{turnover_router, TurnoverApi};
pub use service::{EvidenceSubmission, TurnoverError, TurnoverService};
pub use settlement::{
    PayoutReleaseBatch, PreAuthBatch, SettlementEngine, SettlementError, SettlementOutcome,
    SettlementPolicy,
};
