#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure gate deciding whether a worker may take on a turret's upgrade.

use bastion_core::{IneligibleReason, ObstacleId, TurretId, TurretSnapshot, WorkerSnapshot};

/// Verdict returned by [`evaluate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Eligibility {
    /// The worker may work on the upgrade.
    Eligible,
    /// The worker may not work on the upgrade.
    Ineligible(IneligibleReason),
}

impl Eligibility {
    /// Reports whether the verdict allows the pairing.
    #[must_use]
    pub const fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }

    /// Reason the pairing was refused, if any.
    #[must_use]
    pub const fn reason(&self) -> Option<IneligibleReason> {
        match self {
            Self::Eligible => None,
            Self::Ineligible(reason) => Some(*reason),
        }
    }
}

/// Evaluates the pairing of `worker` and `turret`.
///
/// Checks run in a fixed order and stop at the first refusal: faction,
/// upgradability, designation, obstacles, then skill. The `first_blocker`
/// lookup is only invoked once the cheaper checks pass.
pub fn evaluate<F>(worker: &WorkerSnapshot, turret: &TurretSnapshot, first_blocker: F) -> Eligibility
where
    F: FnOnce(TurretId) -> Option<ObstacleId>,
{
    if worker.faction != turret.faction {
        return Eligibility::Ineligible(IneligibleReason::WrongFaction);
    }
    if !turret.upgradable {
        return Eligibility::Ineligible(IneligibleReason::NotUpgradable);
    }
    if !turret.designated {
        return Eligibility::Ineligible(IneligibleReason::NotDesignated);
    }
    if let Some(obstacle) = first_blocker(turret.id) {
        return Eligibility::Ineligible(IneligibleReason::BlockedByObstacle(obstacle));
    }
    if worker.construction_level < turret.skill_prerequisite {
        return Eligibility::Ineligible(IneligibleReason::SkillTooLow {
            required: turret.skill_prerequisite,
            actual: worker.construction_level,
        });
    }
    Eligibility::Eligible
}
