use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::NaiveDate;

use super::domain::{
    AssignmentRole, Cleaner, CleanerId, EvidencePacket, Job, JobCleanerAssignment, JobId,
    JobStatus, OnCallStatus, Payout, PayoutId, PayoutStatus, PropertyConfiguration, PropertyId,
    ReserveTransaction, Subscription, SubscriptionId,
};
use super::repository::{
    CheckInCommit, CheckOutCommit, NewPayout, RepositoryError, TurnoverStore,
};

#[derive(Default)]
struct Tables {
    jobs: HashMap<JobId, Job>,
    event_uid_index: HashMap<String, JobId>,
    assignments: Vec<JobCleanerAssignment>,
    evidence: HashMap<JobId, EvidencePacket>,
    cleaners: HashMap<CleanerId, Cleaner>,
    properties: HashMap<PropertyId, PropertyConfiguration>,
    subscriptions: HashMap<SubscriptionId, Subscription>,
    reserve_ledger: Vec<ReserveTransaction>,
    payouts: HashMap<PayoutId, Payout>,
}

/// In-memory store backing tests, the demo CLI, and the HTTP surface. One
/// mutex guards all tables, which makes the composite commits naturally
/// all-or-nothing: they validate every row before touching any.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
    payout_sequence: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("store mutex poisoned")
    }

    fn next_payout_id(&self) -> PayoutId {
        let id = self.payout_sequence.fetch_add(1, Ordering::Relaxed) + 1;
        PayoutId(format!("payout-{id:06}"))
    }
}

impl TurnoverStore for MemoryStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.lock();
        if tables.jobs.contains_key(&job.id)
            || tables.event_uid_index.contains_key(&job.calendar_event_uid)
        {
            return Err(RepositoryError::Conflict);
        }
        tables
            .event_uid_index
            .insert(job.calendar_event_uid.clone(), job.id.clone());
        tables.jobs.insert(job.id.clone(), job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.lock().jobs.get(id).cloned())
    }

    fn job_by_event_uid(&self, uid: &str) -> Result<Option<Job>, RepositoryError> {
        let tables = self.lock();
        Ok(tables
            .event_uid_index
            .get(uid)
            .and_then(|id| tables.jobs.get(id))
            .cloned())
    }

    fn update_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.jobs.contains_key(&job.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.jobs.insert(job.id.clone(), job);
        Ok(())
    }

    fn jobs_awaiting_preauth(&self, day: NaiveDate) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.lock();
        let mut jobs: Vec<Job> = tables
            .jobs
            .values()
            .filter(|job| job.payment_intent_id.is_none())
            .filter(|job| {
                job.check_out_time
                    .map(|at| at.date_naive() == day)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        jobs.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(jobs)
    }

    fn update_job_status(
        &self,
        id: &JobId,
        expected: JobStatus,
        next: JobStatus,
    ) -> Result<Job, RepositoryError> {
        let mut tables = self.lock();
        let job = tables.jobs.get_mut(id).ok_or(RepositoryError::NotFound)?;
        if job.status != expected {
            return Err(RepositoryError::StaleStatus {
                expected,
                found: job.status,
            });
        }
        job.status = next;
        Ok(job.clone())
    }

    fn assignments_for_job(
        &self,
        id: &JobId,
    ) -> Result<Vec<JobCleanerAssignment>, RepositoryError> {
        Ok(self
            .lock()
            .assignments
            .iter()
            .filter(|assignment| &assignment.job_id == id)
            .cloned()
            .collect())
    }

    fn insert_assignment(&self, assignment: JobCleanerAssignment) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.assignments.contains(&assignment) {
            return Err(RepositoryError::Conflict);
        }
        tables.assignments.push(assignment);
        Ok(())
    }

    fn replace_primary(
        &self,
        job_id: &JobId,
        cleaner_id: &CleanerId,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.jobs.contains_key(job_id) {
            return Err(RepositoryError::NotFound);
        }
        tables
            .assignments
            .retain(|a| !(&a.job_id == job_id && a.role == AssignmentRole::Primary));
        tables.assignments.push(JobCleanerAssignment {
            job_id: job_id.clone(),
            cleaner_id: cleaner_id.clone(),
            role: AssignmentRole::Primary,
        });
        Ok(())
    }

    fn clear_assignments(&self, job_id: &JobId) -> Result<usize, RepositoryError> {
        let mut tables = self.lock();
        let before = tables.assignments.len();
        tables.assignments.retain(|a| &a.job_id != job_id);
        Ok(before - tables.assignments.len())
    }

    fn insert_evidence(&self, packet: EvidencePacket) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.evidence.contains_key(&packet.job_id) {
            return Err(RepositoryError::Conflict);
        }
        tables.evidence.insert(packet.job_id.clone(), packet);
        Ok(())
    }

    fn fetch_evidence(&self, job_id: &JobId) -> Result<Option<EvidencePacket>, RepositoryError> {
        Ok(self.lock().evidence.get(job_id).cloned())
    }

    fn update_evidence(&self, packet: EvidencePacket) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.evidence.contains_key(&packet.job_id) {
            return Err(RepositoryError::NotFound);
        }
        tables.evidence.insert(packet.job_id.clone(), packet);
        Ok(())
    }

    fn insert_cleaner(&self, cleaner: Cleaner) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.cleaners.contains_key(&cleaner.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.cleaners.insert(cleaner.id.clone(), cleaner);
        Ok(())
    }

    fn fetch_cleaner(&self, id: &CleanerId) -> Result<Option<Cleaner>, RepositoryError> {
        Ok(self.lock().cleaners.get(id).cloned())
    }

    fn cleaners(&self) -> Result<Vec<Cleaner>, RepositoryError> {
        let mut cleaners: Vec<Cleaner> = self.lock().cleaners.values().cloned().collect();
        cleaners.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(cleaners)
    }

    fn update_cleaner(&self, cleaner: Cleaner) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.cleaners.contains_key(&cleaner.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.cleaners.insert(cleaner.id.clone(), cleaner);
        Ok(())
    }

    fn insert_property(&self, property: PropertyConfiguration) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.properties.contains_key(&property.id) {
            return Err(RepositoryError::Conflict);
        }
        tables.properties.insert(property.id.clone(), property);
        Ok(())
    }

    fn fetch_property(
        &self,
        id: &PropertyId,
    ) -> Result<Option<PropertyConfiguration>, RepositoryError> {
        Ok(self.lock().properties.get(id).cloned())
    }

    fn update_property(&self, property: PropertyConfiguration) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.properties.contains_key(&property.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.properties.insert(property.id.clone(), property);
        Ok(())
    }

    fn insert_subscription(&self, subscription: Subscription) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables.subscriptions.contains_key(&subscription.id) {
            return Err(RepositoryError::Conflict);
        }
        tables
            .subscriptions
            .insert(subscription.id.clone(), subscription);
        Ok(())
    }

    fn fetch_subscription(
        &self,
        id: &SubscriptionId,
    ) -> Result<Option<Subscription>, RepositoryError> {
        Ok(self.lock().subscriptions.get(id).cloned())
    }

    fn subscriptions(&self) -> Result<Vec<Subscription>, RepositoryError> {
        let mut subscriptions: Vec<Subscription> =
            self.lock().subscriptions.values().cloned().collect();
        subscriptions.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(subscriptions)
    }

    fn insert_reserve_transaction(
        &self,
        transaction: ReserveTransaction,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if tables
            .reserve_ledger
            .iter()
            .any(|entry| entry.job_id == transaction.job_id)
        {
            return Err(RepositoryError::Conflict);
        }
        tables.reserve_ledger.push(transaction);
        Ok(())
    }

    fn reserve_transactions_for_job(
        &self,
        job_id: &JobId,
    ) -> Result<Vec<ReserveTransaction>, RepositoryError> {
        Ok(self
            .lock()
            .reserve_ledger
            .iter()
            .filter(|entry| &entry.job_id == job_id)
            .cloned()
            .collect())
    }

    fn insert_payout(&self, payout: NewPayout) -> Result<Payout, RepositoryError> {
        let stored = Payout {
            id: self.next_payout_id(),
            job_id: payout.job_id,
            cleaner_id: payout.cleaner_id,
            role: payout.role,
            base_cents: payout.base_cents,
            urgent_bonus_cents: payout.urgent_bonus_cents,
            laundry_bonus_cents: payout.laundry_bonus_cents,
            status: PayoutStatus::Pending,
            transfer_id: None,
            hold_reason: None,
        };
        self.lock().payouts.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }

    fn fetch_payout(&self, id: &PayoutId) -> Result<Option<Payout>, RepositoryError> {
        Ok(self.lock().payouts.get(id).cloned())
    }

    fn payouts_for_job(&self, job_id: &JobId) -> Result<Vec<Payout>, RepositoryError> {
        let mut payouts: Vec<Payout> = self
            .lock()
            .payouts
            .values()
            .filter(|payout| &payout.job_id == job_id)
            .cloned()
            .collect();
        payouts.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(payouts)
    }

    fn pending_payouts(&self) -> Result<Vec<Payout>, RepositoryError> {
        let mut payouts: Vec<Payout> = self
            .lock()
            .payouts
            .values()
            .filter(|payout| payout.status == PayoutStatus::Pending)
            .cloned()
            .collect();
        payouts.sort_by(|a, b| a.id.0.cmp(&b.id.0));
        Ok(payouts)
    }

    fn update_payout(&self, payout: Payout) -> Result<(), RepositoryError> {
        let mut tables = self.lock();
        if !tables.payouts.contains_key(&payout.id) {
            return Err(RepositoryError::NotFound);
        }
        tables.payouts.insert(payout.id.clone(), payout);
        Ok(())
    }

    fn commit_check_in(&self, commit: CheckInCommit) -> Result<Job, RepositoryError> {
        let mut tables = self.lock();

        // Validate every row up front so a failure leaves nothing mutated.
        let job = tables
            .jobs
            .get(&commit.job_id)
            .ok_or(RepositoryError::NotFound)?;
        if job.status != commit.expected {
            return Err(RepositoryError::StaleStatus {
                expected: commit.expected,
                found: job.status,
            });
        }
        if !tables.evidence.contains_key(&commit.job_id) {
            return Err(RepositoryError::NotFound);
        }
        if !tables.cleaners.contains_key(&commit.cleaner_id) {
            return Err(RepositoryError::NotFound);
        }

        let job = tables
            .jobs
            .get_mut(&commit.job_id)
            .expect("job validated above");
        job.status = commit.next;
        job.check_in_time = Some(commit.at);
        let job = job.clone();

        let packet = tables
            .evidence
            .get_mut(&commit.job_id)
            .expect("evidence validated above");
        packet.gps_check_in_timestamp = Some(commit.at);

        let cleaner = tables
            .cleaners
            .get_mut(&commit.cleaner_id)
            .expect("cleaner validated above");
        cleaner.on_call_status = OnCallStatus::OnJob;

        Ok(job)
    }

    fn commit_check_out(&self, commit: CheckOutCommit) -> Result<Job, RepositoryError> {
        let mut tables = self.lock();

        let job = tables
            .jobs
            .get(&commit.job_id)
            .ok_or(RepositoryError::NotFound)?;
        if job.status != commit.expected {
            return Err(RepositoryError::StaleStatus {
                expected: commit.expected,
                found: job.status,
            });
        }
        if !tables.evidence.contains_key(&commit.job_id) {
            return Err(RepositoryError::NotFound);
        }

        let job = tables
            .jobs
            .get_mut(&commit.job_id)
            .expect("job validated above");
        job.status = commit.next;
        job.check_out_time = Some(commit.at);
        let job = job.clone();

        let packet = tables
            .evidence
            .get_mut(&commit.job_id)
            .expect("evidence validated above");
        packet.gps_check_out_timestamp = Some(commit.at);

        Ok(job)
    }
}
