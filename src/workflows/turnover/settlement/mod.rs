//! Payment settlement: evidence-gated capture, reserve bookkeeping, payout
//! creation, plus the nightly pre-authorization and payout release batches.

pub mod bonus;
pub mod evidence;
pub mod preauth;
pub mod release;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use super::domain::{Job, JobId, PaymentStatus, ReserveTransaction};
use super::gateways::{GatewayError, PaymentGateway};
use super::repository::{NewPayout, RepositoryError, TurnoverStore};
use bonus::{BonusContext, BonusKind, BonusSchedule};
use evidence::EvidenceGaps;

pub use bonus::{BonusAward, LAUNDRY_BONUS_PER_LOAD_CENTS, URGENT_BONUS_CENTS};
pub use evidence::{verify_complete, EvidenceGap};
pub use preauth::{PreAuthBatch, PreAuthOutcome, PreAuthReport};
pub use release::{PayoutReleaseBatch, ReleaseOutcome, ReleaseReport};

pub const DEFAULT_HOURLY_RATE_CENTS: i64 = 1_700;
pub const DEFAULT_RESERVE_RATE: f64 = 0.02;

/// Financial dials for settlement. Constants today, but threaded through
/// the engine so tests can pin them explicitly.
#[derive(Debug, Clone, Copy)]
pub struct SettlementPolicy {
    pub hourly_rate_cents: i64,
    pub reserve_rate: f64,
}

impl Default for SettlementPolicy {
    fn default() -> Self {
        Self {
            hourly_rate_cents: DEFAULT_HOURLY_RATE_CENTS,
            reserve_rate: DEFAULT_RESERVE_RATE,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("job {} not found", .0 .0)]
    JobNotFound(JobId),
    #[error("job {} has no payment intent; pre-authorization has not run", .0 .0)]
    NoPaymentIntent(JobId),
    #[error("job {} has no evidence packet", .0 .0)]
    NoEvidencePacket(JobId),
    #[error(transparent)]
    EvidenceIncomplete(#[from] EvidenceGaps),
    #[error("capture failed for job {}: {source}", .job .0)]
    CaptureFailed { job: JobId, source: GatewayError },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Successful settlement summary reported to the caller.
#[derive(Debug, Clone, Serialize)]
pub struct SettlementReceipt {
    pub job_id: JobId,
    pub captured_cents: i64,
    pub reserve_cents: i64,
    pub net_cents: i64,
    pub gateway_transaction_id: String,
    pub payouts_created: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SettlementOutcome {
    /// The job was already captured; nothing was re-charged or re-created.
    AlreadyCaptured { job_id: JobId },
    Settled(SettlementReceipt),
}

/// Captures authorized payments once the evidence gate passes, writes the
/// reserve ledger entry, and creates pending payouts per assignment.
pub struct SettlementEngine<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
    policy: SettlementPolicy,
    bonuses: BonusSchedule,
}

impl<S, G> SettlementEngine<S, G>
where
    S: TurnoverStore,
    G: PaymentGateway,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
        Self::with_policy(store, gateway, SettlementPolicy::default())
    }

    pub fn with_policy(store: Arc<S>, gateway: Arc<G>, policy: SettlementPolicy) -> Self {
        Self {
            store,
            gateway,
            policy,
            bonuses: BonusSchedule::standard(),
        }
    }

    /// Evidence-gated capture and payout creation, triggered when the
    /// cleaner app reports the job complete. Idempotent: an already
    /// captured job is a successful no-op.
    pub fn capture_and_settle(
        &self,
        job_id: &JobId,
        now: DateTime<Utc>,
    ) -> Result<SettlementOutcome, SettlementError> {
        let job = self
            .store
            .fetch_job(job_id)?
            .ok_or_else(|| SettlementError::JobNotFound(job_id.clone()))?;

        let intent_id = job
            .payment_intent_id
            .clone()
            .ok_or_else(|| SettlementError::NoPaymentIntent(job_id.clone()))?;

        if job.payment_status == PaymentStatus::Captured {
            return Ok(SettlementOutcome::AlreadyCaptured {
                job_id: job_id.clone(),
            });
        }

        let packet = self
            .store
            .fetch_evidence(job_id)?
            .ok_or_else(|| SettlementError::NoEvidencePacket(job_id.clone()))?;
        evidence::verify_complete(&packet)?;

        let receipt = match self.gateway.capture(&intent_id) {
            Ok(receipt) => receipt,
            Err(source) => {
                // Requires operator intervention; never retried here.
                let mut failed = job;
                failed.payment_status = PaymentStatus::CaptureFailed;
                failed.payment_error = Some(source.to_string());
                self.store.update_job(failed)?;
                warn!(job = %job_id.0, error = %source, "payment capture failed");
                return Err(SettlementError::CaptureFailed {
                    job: job_id.clone(),
                    source,
                });
            }
        };

        let reserve_cents = (receipt.amount_cents as f64 * self.policy.reserve_rate).round() as i64;
        let net_cents = receipt.amount_cents - reserve_cents;

        self.store.insert_reserve_transaction(ReserveTransaction {
            job_id: job_id.clone(),
            captured_cents: receipt.amount_cents,
            reserve_cents,
            net_cents,
            gateway_transaction_id: receipt.transaction_id.clone(),
            recorded_at: now,
        })?;

        let mut settled = job;
        settled.payment_status = PaymentStatus::Captured;
        settled.payment_error = None;
        self.store.update_job(settled.clone())?;

        let payouts_created = self.create_payouts(&settled)?;

        info!(
            job = %job_id.0,
            captured_cents = receipt.amount_cents,
            reserve_cents,
            net_cents,
            payouts_created,
            "job settled"
        );

        Ok(SettlementOutcome::Settled(SettlementReceipt {
            job_id: job_id.clone(),
            captured_cents: receipt.amount_cents,
            reserve_cents,
            net_cents,
            gateway_transaction_id: receipt.transaction_id,
            payouts_created,
        }))
    }

    /// One pending payout per assignment. Zero assignments is reported,
    /// not an error; capture and payout creation are separable steps.
    fn create_payouts(&self, job: &Job) -> Result<usize, RepositoryError> {
        let assignments = self.store.assignments_for_job(&job.id)?;
        if assignments.is_empty() {
            warn!(job = %job.id.0, "captured with no assignments; zero payouts created");
            return Ok(0);
        }

        let base_cents =
            (self.policy.hourly_rate_cents as f64 * job.expected_hours).round() as i64;

        for assignment in &assignments {
            let awards = self.bonuses.evaluate(&BonusContext {
                role: assignment.role,
                is_urgent: job.is_urgent_bonus,
                addons: &job.addons_snapshot,
            });
            let totals = total_by_kind(&awards);

            self.store.insert_payout(NewPayout {
                job_id: job.id.clone(),
                cleaner_id: assignment.cleaner_id.clone(),
                role: assignment.role,
                base_cents,
                urgent_bonus_cents: totals.urgent,
                laundry_bonus_cents: totals.laundry,
            })?;
        }

        Ok(assignments.len())
    }
}

struct AwardTotals {
    urgent: i64,
    laundry: i64,
}

fn total_by_kind(awards: &[BonusAward]) -> AwardTotals {
    let mut totals = AwardTotals {
        urgent: 0,
        laundry: 0,
    };
    for award in awards {
        match award.kind {
            BonusKind::Urgent => totals.urgent += award.amount_cents,
            BonusKind::Laundry => totals.laundry += award.amount_cents,
        }
    }
    totals
}
