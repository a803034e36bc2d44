use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::info;

use super::domain::{
    ChecklistEntry, CleanerId, EvidencePacket, EvidenceStatus, Job, JobId,
};
use super::lifecycle::{self, TransitionError, Trigger};
use super::repository::{CheckInCommit, CheckOutCommit, RepositoryError, TurnoverStore};

#[derive(Debug, thiserror::Error)]
pub enum TurnoverError {
    #[error("job {} not found", .0 .0)]
    JobNotFound(JobId),
    #[error("cleaner {} not found", .0 .0)]
    CleanerNotFound(CleanerId),
    #[error("job {} has no primary cleaner", .0 .0)]
    NoPrimaryCleaner(JobId),
    #[error("job {} has no evidence packet", .0 .0)]
    NoEvidencePacket(JobId),
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Evidence fields the cleaner-facing app submits ahead of settlement.
#[derive(Debug, Clone, Deserialize)]
pub struct EvidenceSubmission {
    pub photo_urls: Vec<String>,
    pub checklist_log: Vec<ChecklistEntry>,
    pub is_checklist_complete: bool,
    pub status: EvidenceStatus,
}

/// Owns the job status state machine: assignment, check-in/out,
/// cancellation, and urgent replacement.
pub struct TurnoverService<S> {
    store: Arc<S>,
}

impl<S> TurnoverService<S>
where
    S: TurnoverStore,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn job(&self, job_id: &JobId) -> Result<Job, TurnoverError> {
        self.store
            .fetch_job(job_id)?
            .ok_or_else(|| TurnoverError::JobNotFound(job_id.clone()))
    }

    /// Attach (or swap) the primary cleaner. The delete+insert of the
    /// primary row is a single store operation.
    pub fn assign_primary(
        &self,
        job_id: &JobId,
        cleaner_id: &CleanerId,
    ) -> Result<Job, TurnoverError> {
        let job = self.job(job_id)?;
        let next = lifecycle::next_status(job.status, Trigger::Assign)?;

        self.store
            .fetch_cleaner(cleaner_id)?
            .ok_or_else(|| TurnoverError::CleanerNotFound(cleaner_id.clone()))?;

        self.store.replace_primary(job_id, cleaner_id)?;
        let job = self.store.update_job_status(job_id, job.status, next)?;

        info!(job = %job_id.0, cleaner = %cleaner_id.0, "primary cleaner assigned");
        Ok(job)
    }

    /// Cleaner arrival. Four writes — status, check-in time, evidence GPS
    /// stamp, cleaner on-call status — commit together or not at all.
    pub fn check_in(&self, job_id: &JobId, at: DateTime<Utc>) -> Result<Job, TurnoverError> {
        let job = self.job(job_id)?;
        let next = lifecycle::next_status(job.status, Trigger::CheckIn)?;

        let assignments = self.store.assignments_for_job(job_id)?;
        let primary = assignments
            .iter()
            .find(|assignment| assignment.role == super::domain::AssignmentRole::Primary)
            .ok_or_else(|| TurnoverError::NoPrimaryCleaner(job_id.clone()))?;

        let job = self.store.commit_check_in(CheckInCommit {
            job_id: job_id.clone(),
            cleaner_id: primary.cleaner_id.clone(),
            expected: job.status,
            next,
            at,
        })?;

        info!(job = %job_id.0, cleaner = %primary.cleaner_id.0, "cleaner checked in");
        Ok(job)
    }

    /// Cleaner departure; committed atomically like check-in.
    pub fn check_out(&self, job_id: &JobId, at: DateTime<Utc>) -> Result<Job, TurnoverError> {
        let job = self.job(job_id)?;
        let next = lifecycle::next_status(job.status, Trigger::CheckOut)?;

        let job = self.store.commit_check_out(CheckOutCommit {
            job_id: job_id.clone(),
            expected: job.status,
            next,
            at,
        })?;

        info!(job = %job_id.0, "cleaner checked out");
        Ok(job)
    }

    /// Cancel the job and release every cleaner attached to it. Terminal.
    pub fn cancel(&self, job_id: &JobId) -> Result<Job, TurnoverError> {
        let job = self.job(job_id)?;
        let next = lifecycle::next_status(job.status, Trigger::Cancel)?;

        let job = self.store.update_job_status(job_id, job.status, next)?;
        let removed = self.store.clear_assignments(job_id)?;

        info!(job = %job_id.0, removed_assignments = removed, "job canceled");
        Ok(job)
    }

    /// Emergency re-open: drop every assignment, return to `unassigned`,
    /// and permanently flag the urgent bonus for whoever takes the job.
    pub fn urgent_replacement(&self, job_id: &JobId) -> Result<Job, TurnoverError> {
        let job = self.job(job_id)?;
        let next = lifecycle::next_status(job.status, Trigger::UrgentReplacement)?;

        let mut job = self.store.update_job_status(job_id, job.status, next)?;
        self.store.clear_assignments(job_id)?;

        if !job.is_urgent_bonus {
            job.is_urgent_bonus = true;
            self.store.update_job(job.clone())?;
        }

        info!(job = %job_id.0, "urgent replacement requested");
        Ok(job)
    }

    /// Merge app-submitted evidence into the job's packet.
    pub fn record_evidence(
        &self,
        job_id: &JobId,
        submission: EvidenceSubmission,
    ) -> Result<EvidencePacket, TurnoverError> {
        let mut packet = self
            .store
            .fetch_evidence(job_id)?
            .ok_or_else(|| TurnoverError::NoEvidencePacket(job_id.clone()))?;

        packet.photo_urls = submission.photo_urls;
        packet.checklist_log = submission.checklist_log;
        packet.is_checklist_complete = submission.is_checklist_complete;
        packet.status = submission.status;
        self.store.update_evidence(packet.clone())?;

        Ok(packet)
    }
}
