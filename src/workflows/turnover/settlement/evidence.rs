use serde::Serialize;

use crate::workflows::turnover::domain::{EvidencePacket, EvidenceStatus};

/// One failed sub-condition of the completeness gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceGap {
    StatusNotComplete,
    MissingGpsCheckIn,
    MissingGpsCheckOut,
    ChecklistIncomplete,
    NoPhotos,
}

impl EvidenceGap {
    pub const fn label(self) -> &'static str {
        match self {
            Self::StatusNotComplete => "status_not_complete",
            Self::MissingGpsCheckIn => "missing_gps_check_in",
            Self::MissingGpsCheckOut => "missing_gps_check_out",
            Self::ChecklistIncomplete => "checklist_incomplete",
            Self::NoPhotos => "no_photos",
        }
    }
}

/// Every sub-condition the packet failed, so the caller can close the gaps
/// and retry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize)]
#[error("evidence incomplete: {}", self.describe())]
pub struct EvidenceGaps(pub Vec<EvidenceGap>);

impl EvidenceGaps {
    fn describe(&self) -> String {
        self.0
            .iter()
            .map(|gap| gap.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// The gate deciding whether a job may be financially settled: the
/// conjunction of five documented sub-conditions. Total over any packet.
pub fn verify_complete(packet: &EvidencePacket) -> Result<(), EvidenceGaps> {
    let mut gaps = Vec::new();

    if packet.status != EvidenceStatus::Complete {
        gaps.push(EvidenceGap::StatusNotComplete);
    }
    if packet.gps_check_in_timestamp.is_none() {
        gaps.push(EvidenceGap::MissingGpsCheckIn);
    }
    if packet.gps_check_out_timestamp.is_none() {
        gaps.push(EvidenceGap::MissingGpsCheckOut);
    }
    if !packet.is_checklist_complete {
        gaps.push(EvidenceGap::ChecklistIncomplete);
    }
    if packet.photo_urls.is_empty() {
        gaps.push(EvidenceGap::NoPhotos);
    }

    if gaps.is_empty() {
        Ok(())
    } else {
        Err(EvidenceGaps(gaps))
    }
}
