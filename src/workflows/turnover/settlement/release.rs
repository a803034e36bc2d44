use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::turnover::domain::{Payout, PayoutId, PayoutStatus};
use crate::workflows::turnover::gateways::{PaymentGateway, TransferMetadata};
use crate::workflows::turnover::repository::{RepositoryError, TurnoverStore};

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseOutcome {
    pub payout_id: PayoutId,
    pub status: PayoutStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transfer_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReleaseReport {
    pub released: usize,
    pub held: usize,
    pub outcomes: Vec<ReleaseOutcome>,
}

/// Periodic batch transferring pending payouts to cleaners' connected
/// accounts. Failures park the payout as `held` — always eligible for a
/// manual retry — and never stop the rest of the batch.
pub struct PayoutReleaseBatch<S, G> {
    store: Arc<S>,
    gateway: Arc<G>,
}

impl<S, G> PayoutReleaseBatch<S, G>
where
    S: TurnoverStore,
    G: PaymentGateway,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>) -> Self {
        Self { store, gateway }
    }

    pub fn run(&self) -> Result<ReleaseReport, RepositoryError> {
        let pending = self.store.pending_payouts()?;
        let mut report = ReleaseReport {
            released: 0,
            held: 0,
            outcomes: Vec::with_capacity(pending.len()),
        };

        for payout in pending {
            let outcome = self.release_payout(payout)?;
            match outcome.status {
                PayoutStatus::Released => report.released += 1,
                _ => report.held += 1,
            }
            report.outcomes.push(outcome);
        }

        info!(
            released = report.released,
            held = report.held,
            "payout release batch finished"
        );
        Ok(report)
    }

    fn release_payout(&self, mut payout: Payout) -> Result<ReleaseOutcome, RepositoryError> {
        let cleaner = self.store.fetch_cleaner(&payout.cleaner_id)?;

        let connected_account = match cleaner.and_then(|cleaner| cleaner.connected_account_id) {
            Some(account) => account,
            None => {
                return self.hold(payout, "no connected payment account".to_string());
            }
        };

        let metadata = TransferMetadata {
            job_id: payout.job_id.clone(),
            cleaner_id: payout.cleaner_id.clone(),
            base_cents: payout.base_cents,
            urgent_bonus_cents: payout.urgent_bonus_cents,
            laundry_bonus_cents: payout.laundry_bonus_cents,
        };

        match self
            .gateway
            .transfer(&connected_account, payout.total_cents(), &metadata)
        {
            Ok(transfer_id) => {
                payout.status = PayoutStatus::Released;
                payout.transfer_id = Some(transfer_id.clone());
                payout.hold_reason = None;
                let payout_id = payout.id.clone();
                self.store.update_payout(payout)?;
                Ok(ReleaseOutcome {
                    payout_id,
                    status: PayoutStatus::Released,
                    transfer_id: Some(transfer_id),
                    error: None,
                })
            }
            Err(error) => self.hold(payout, error.to_string()),
        }
    }

    fn hold(
        &self,
        mut payout: Payout,
        reason: String,
    ) -> Result<ReleaseOutcome, RepositoryError> {
        warn!(payout = %payout.id.0, %reason, "payout held");
        payout.status = PayoutStatus::Held;
        payout.hold_reason = Some(reason.clone());
        let payout_id = payout.id.clone();
        self.store.update_payout(payout)?;
        Ok(ReleaseOutcome {
            payout_id,
            status: PayoutStatus::Held,
            transfer_id: None,
            error: Some(reason),
        })
    }
}
