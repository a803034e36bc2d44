use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, warn};

use crate::workflows::turnover::domain::{JobId, PaymentStatus};
use crate::workflows::turnover::gateways::{PaymentGateway, PricingCalculator};
use crate::workflows::turnover::repository::{RepositoryError, TurnoverStore};

/// Per-job result of the nightly authorization pass.
#[derive(Debug, Clone, Serialize)]
pub struct PreAuthOutcome {
    pub job_id: JobId,
    pub status: PaymentStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_cents: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PreAuthReport {
    pub day: NaiveDate,
    pub authorized: usize,
    pub failed: usize,
    pub outcomes: Vec<PreAuthOutcome>,
}

/// Nightly batch placing manual-capture holds on jobs scheduled to check
/// out the next calendar day. One customer's failure never blocks the
/// rest of the candidate set.
pub struct PreAuthBatch<S, G, P> {
    store: Arc<S>,
    gateway: Arc<G>,
    pricing: Arc<P>,
}

impl<S, G, P> PreAuthBatch<S, G, P>
where
    S: TurnoverStore,
    G: PaymentGateway,
    P: PricingCalculator,
{
    pub fn new(store: Arc<S>, gateway: Arc<G>, pricing: Arc<P>) -> Self {
        Self {
            store,
            gateway,
            pricing,
        }
    }

    /// Authorize every job checking out on `day` that has no intent yet.
    pub fn run(&self, day: NaiveDate) -> Result<PreAuthReport, RepositoryError> {
        let candidates = self.store.jobs_awaiting_preauth(day)?;
        let mut report = PreAuthReport {
            day,
            authorized: 0,
            failed: 0,
            outcomes: Vec::with_capacity(candidates.len()),
        };

        for job in candidates {
            match self.authorize_job(&job) {
                Ok(amount_cents) => {
                    report.authorized += 1;
                    report.outcomes.push(PreAuthOutcome {
                        job_id: job.id,
                        status: PaymentStatus::Authorized,
                        amount_cents: Some(amount_cents),
                        error: None,
                    });
                }
                Err(reason) => {
                    warn!(job = %job.id.0, %reason, "pre-authorization failed");
                    let mut failed = job;
                    failed.payment_status = PaymentStatus::Failed;
                    failed.payment_error = Some(reason.clone());
                    let job_id = failed.id.clone();
                    self.store.update_job(failed)?;

                    report.failed += 1;
                    report.outcomes.push(PreAuthOutcome {
                        job_id,
                        status: PaymentStatus::Failed,
                        amount_cents: None,
                        error: Some(reason),
                    });
                }
            }
        }

        info!(
            %day,
            authorized = report.authorized,
            failed = report.failed,
            "pre-authorization batch finished"
        );
        Ok(report)
    }

    /// Price the clean from the property's current attributes and place a
    /// manual-capture hold. Any failure is reduced to a recorded reason.
    fn authorize_job(
        &self,
        job: &crate::workflows::turnover::domain::Job,
    ) -> Result<i64, String> {
        let subscription = self
            .store
            .fetch_subscription(&job.subscription_id)
            .map_err(|error| error.to_string())?
            .ok_or_else(|| format!("subscription {} not found", job.subscription_id.0))?;
        let property = self
            .store
            .fetch_property(&job.property_id)
            .map_err(|error| error.to_string())?
            .ok_or_else(|| format!("property {} not found", job.property_id.0))?;

        let payment_method = subscription
            .saved_payment_method_id
            .as_deref()
            .ok_or_else(|| "no saved payment method".to_string())?;

        let quote = self
            .pricing
            .calculate(&property)
            .map_err(|error| error.to_string())?;

        let intent_id = self
            .gateway
            .authorize(
                &subscription.customer_id,
                payment_method,
                quote.total_per_clean_cents,
            )
            .map_err(|error| error.to_string())?;

        let mut authorized = job.clone();
        authorized.payment_intent_id = Some(intent_id);
        authorized.payment_status = PaymentStatus::Authorized;
        authorized.payment_error = None;
        self.store
            .update_job(authorized)
            .map_err(|error| error.to_string())?;

        Ok(quote.total_per_clean_cents)
    }
}
