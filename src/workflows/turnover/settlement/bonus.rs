use serde::Serialize;

use crate::workflows::turnover::domain::{AssignmentRole, JobAddonsSnapshot};

pub const URGENT_BONUS_CENTS: i64 = 1_000;
pub const LAUNDRY_BONUS_PER_LOAD_CENTS: i64 = 500;

/// Everything a bonus rule may look at for one assignment.
#[derive(Debug, Clone, Copy)]
pub struct BonusContext<'a> {
    pub role: AssignmentRole,
    pub is_urgent: bool,
    pub addons: &'a JobAddonsSnapshot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BonusKind {
    Urgent,
    Laundry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BonusAward {
    pub kind: BonusKind,
    pub amount_cents: i64,
}

struct BonusRule {
    kind: BonusKind,
    evaluate: fn(&BonusContext<'_>) -> Option<i64>,
}

/// Table of bonus rules keyed by role and job flags. New bonus types are
/// added as rows, not as inline conditionals in the settlement path.
pub struct BonusSchedule {
    rules: Vec<BonusRule>,
}

impl BonusSchedule {
    /// The production schedule: a flat urgent bonus for every cleaner on a
    /// flagged job, and a per-load laundry bonus for the laundry lead when
    /// the snapshot recorded loads.
    pub fn standard() -> Self {
        Self {
            rules: vec![
                BonusRule {
                    kind: BonusKind::Urgent,
                    evaluate: |context| context.is_urgent.then_some(URGENT_BONUS_CENTS),
                },
                BonusRule {
                    kind: BonusKind::Laundry,
                    evaluate: |context| {
                        if context.role != AssignmentRole::LaundryLead {
                            return None;
                        }
                        let loads = i64::from(context.addons.laundry_loads());
                        (loads > 0).then_some(loads * LAUNDRY_BONUS_PER_LOAD_CENTS)
                    },
                },
            ],
        }
    }

    pub fn evaluate(&self, context: &BonusContext<'_>) -> Vec<BonusAward> {
        self.rules
            .iter()
            .filter_map(|rule| {
                (rule.evaluate)(context).map(|amount_cents| BonusAward {
                    kind: rule.kind,
                    amount_cents,
                })
            })
            .collect()
    }
}

impl Default for BonusSchedule {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflows::turnover::domain::{LaundryKind, LaundryService};

    fn addons(loads: u32) -> JobAddonsSnapshot {
        JobAddonsSnapshot {
            laundry: (loads > 0).then_some(LaundryService {
                kind: LaundryKind::OffSite,
                loads,
            }),
            hot_tub: None,
        }
    }

    #[test]
    fn urgent_bonus_applies_to_every_role() {
        let schedule = BonusSchedule::standard();
        let addons = addons(0);
        for role in [
            AssignmentRole::Primary,
            AssignmentRole::Backup,
            AssignmentRole::OnCall,
            AssignmentRole::LaundryLead,
        ] {
            let awards = schedule.evaluate(&BonusContext {
                role,
                is_urgent: true,
                addons: &addons,
            });
            assert!(awards.contains(&BonusAward {
                kind: BonusKind::Urgent,
                amount_cents: URGENT_BONUS_CENTS,
            }));
        }
    }

    #[test]
    fn laundry_bonus_requires_lead_role_and_recorded_loads() {
        let schedule = BonusSchedule::standard();
        let with_loads = addons(4);
        let without_loads = addons(0);

        let lead = schedule.evaluate(&BonusContext {
            role: AssignmentRole::LaundryLead,
            is_urgent: false,
            addons: &with_loads,
        });
        assert_eq!(
            lead,
            vec![BonusAward {
                kind: BonusKind::Laundry,
                amount_cents: 2_000,
            }]
        );

        let primary = schedule.evaluate(&BonusContext {
            role: AssignmentRole::Primary,
            is_urgent: false,
            addons: &with_loads,
        });
        assert!(primary.is_empty());

        let lead_no_loads = schedule.evaluate(&BonusContext {
            role: AssignmentRole::LaundryLead,
            is_urgent: false,
            addons: &without_loads,
        });
        assert!(lead_no_loads.is_empty());
    }
}
