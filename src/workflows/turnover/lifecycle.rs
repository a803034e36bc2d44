use serde::Serialize;

use super::domain::JobStatus;

/// Lifecycle triggers a job can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Assign,
    CheckIn,
    CheckOut,
    Cancel,
    UrgentReplacement,
}

impl Trigger {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Assign => "assign",
            Self::CheckIn => "check_in",
            Self::CheckOut => "check_out",
            Self::Cancel => "cancel",
            Self::UrgentReplacement => "urgent_replacement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    #[error("job is {}; no further transitions are allowed", .0.label())]
    TerminalState(JobStatus),
    #[error("{} is not valid while the job is {}", .trigger.label(), .from.label())]
    InvalidTransition { from: JobStatus, trigger: Trigger },
}

/// Resolve the status a trigger moves a job into, rejecting anything the
/// state machine does not permit. Pure; callers commit the result through
/// a compare-and-swap store write so racing transitions lose cleanly.
pub fn next_status(from: JobStatus, trigger: Trigger) -> Result<JobStatus, TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::TerminalState(from));
    }

    let next = match (from, trigger) {
        (JobStatus::Unassigned | JobStatus::Assigned, Trigger::Assign) => JobStatus::Assigned,
        (JobStatus::Assigned, Trigger::CheckIn) => JobStatus::InProgress,
        (JobStatus::InProgress, Trigger::CheckOut) => JobStatus::Completed,
        (_, Trigger::Cancel) => JobStatus::Canceled,
        (_, Trigger::UrgentReplacement) => JobStatus::Unassigned,
        (from, trigger) => return Err(TransitionError::InvalidTransition { from, trigger }),
    };

    Ok(next)
}
