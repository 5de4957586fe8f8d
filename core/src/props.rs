//! Static definitions for turrets, workers, and the upgrade policy attached to a turret.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::BTreeSet;

use crate::{MaterialStack, ResourceKind};

/// Inclusive range of fractions sampled uniformly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FractionRange {
    /// Lower bound of the range.
    pub min: f32,
    /// Upper bound of the range.
    pub max: f32,
}

impl FractionRange {
    /// Creates a new range descriptor.
    #[must_use]
    pub const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Stat changes applied to a turret once its upgrade completes.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeEffects {
    /// Multiplier applied to both current and maximum durability.
    pub max_durability_factor: f32,
    /// Multiplier applied to the delay between bursts.
    pub burst_cooldown_factor: f32,
    /// Multiplier applied to the aiming delay preceding a burst.
    pub burst_warmup_factor: f32,
}

impl Default for UpgradeEffects {
    fn default() -> Self {
        Self {
            max_durability_factor: 1.0,
            burst_cooldown_factor: 1.0,
            burst_warmup_factor: 1.0,
        }
    }
}

/// Upgrade policy attached to an upgradable turret definition.
///
/// The failure knobs mirror the construct-failure model: the chance of a
/// critical failure scales with how likely the worker was to fail at all,
/// and critical failures both damage the turret and forfeit more of the
/// stored materials.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct UpgradeProps {
    /// Amount of work required to finish the upgrade.
    pub work_total: f32,
    /// Materials that must be delivered before work can begin.
    pub cost: Vec<MaterialStack>,
    /// Multiplier on the worker's construct success chance.
    pub success_chance_factor: f32,
    /// Whether the upgrade can fail at all.
    pub failable: bool,
    /// Multiplier on the base failure chance used to escalate to a major failure.
    pub major_failure_chance_factor: f32,
    /// Forces every failure to be major.
    pub always_major: bool,
    /// Fraction of stored materials returned after a minor failure.
    pub minor_resource_recovery: f32,
    /// Fraction of stored materials returned after a major failure.
    pub major_resource_recovery: f32,
    /// Structural damage dealt by a major failure, as a fraction of max durability.
    pub major_damage_fraction: FractionRange,
    /// Minimum construction skill level required to start.
    pub construction_skill_prerequisite: u8,
    /// Upgraded definition applied on success.
    pub effects: UpgradeEffects,
}

impl Default for UpgradeProps {
    fn default() -> Self {
        Self {
            work_total: 1_000.0,
            cost: Vec::new(),
            success_chance_factor: 1.0,
            failable: true,
            major_failure_chance_factor: 2.0,
            always_major: false,
            minor_resource_recovery: 0.5,
            major_resource_recovery: 0.0,
            major_damage_fraction: FractionRange::new(0.1, 0.5),
            construction_skill_prerequisite: 0,
            effects: UpgradeEffects::default(),
        }
    }
}

impl UpgradeProps {
    /// Checks that every knob lies in its permitted domain.
    pub fn validate(&self) -> Result<(), UpgradePropsError> {
        if !self.work_total.is_finite() || self.work_total <= 0.0 {
            return Err(UpgradePropsError::NonPositiveWork(self.work_total));
        }
        if !(self.success_chance_factor > 0.0 && self.success_chance_factor <= 1.0) {
            return Err(UpgradePropsError::SuccessChanceFactor(
                self.success_chance_factor,
            ));
        }
        if !(self.major_failure_chance_factor >= 0.0) {
            return Err(UpgradePropsError::MajorChanceFactor(
                self.major_failure_chance_factor,
            ));
        }
        check_unit("minor_resource_recovery", self.minor_resource_recovery)?;
        check_unit("major_resource_recovery", self.major_resource_recovery)?;

        let range = self.major_damage_fraction;
        if !(range.min >= 0.0 && range.min <= range.max && range.max <= 1.0) {
            return Err(UpgradePropsError::DamageRange {
                min: range.min,
                max: range.max,
            });
        }
        if self.cost.iter().any(|stack| stack.quantity == 0) {
            return Err(UpgradePropsError::EmptyCostEntry);
        }
        let mut seen = BTreeSet::new();
        if let Some(stack) = self.cost.iter().find(|stack| !seen.insert(stack.kind)) {
            return Err(UpgradePropsError::DuplicateCostKind(stack.kind));
        }
        Ok(())
    }
}

fn check_unit(field: &'static str, value: f32) -> Result<(), UpgradePropsError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(UpgradePropsError::Recovery { field, value })
    }
}

/// Reasons an [`UpgradeProps`] definition is rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum UpgradePropsError {
    /// Work total must be a finite positive amount.
    #[error("upgrade work total must be positive and finite, got {0}")]
    NonPositiveWork(f32),
    /// Success chance factor must lie in `(0, 1]`.
    #[error("success chance factor must lie in (0, 1], got {0}")]
    SuccessChanceFactor(f32),
    /// Major failure factor must be non-negative.
    #[error("major failure chance factor must be non-negative, got {0}")]
    MajorChanceFactor(f32),
    /// A recovery fraction lies outside `[0, 1]`.
    #[error("{field} must lie in [0, 1], got {value}")]
    Recovery {
        /// Name of the offending field.
        field: &'static str,
        /// Value that failed validation.
        value: f32,
    },
    /// Damage range is not ordered within `[0, 1]`.
    #[error("major damage range must satisfy 0 <= min <= max <= 1, got {min}..{max}")]
    DamageRange {
        /// Lower bound supplied.
        min: f32,
        /// Upper bound supplied.
        max: f32,
    },
    /// Cost entries must request at least one unit.
    #[error("upgrade cost entries must have a positive quantity")]
    EmptyCostEntry,
    /// Each resource kind may appear in the cost only once.
    #[error("upgrade cost lists {0:?} more than once")]
    DuplicateCostKind(ResourceKind),
}

/// Definition used when spawning a turret into the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TurretSpec {
    /// Maximum durability of the turret.
    pub max_durability: f32,
    /// Construction speed factor of the turret's build material, if any.
    #[serde(default)]
    pub stuff_speed_factor: Option<f32>,
    /// Upgrade policy; `None` when the turret cannot be upgraded.
    #[serde(default)]
    pub upgrade: Option<UpgradeProps>,
}

/// Construction-relevant capabilities of a worker.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerProfile {
    /// Starting construction skill level.
    pub construction_level: u8,
    /// Work contributed per tick.
    pub construction_speed: f32,
    /// Base probability of completing construction work without failing.
    pub construct_success_chance: f32,
}

impl TurretSpec {
    /// Checks the turret's own stats and its upgrade policy, if any.
    pub fn validate(&self) -> Result<(), TurretSpecError> {
        if !(self.max_durability.is_finite() && self.max_durability > 0.0) {
            return Err(TurretSpecError::MaxDurability(self.max_durability));
        }
        if let Some(factor) = self.stuff_speed_factor {
            if !(factor.is_finite() && factor > 0.0) {
                return Err(TurretSpecError::StuffSpeedFactor(factor));
            }
        }
        if let Some(props) = &self.upgrade {
            props.validate()?;
        }
        Ok(())
    }
}

/// Reasons a [`TurretSpec`] is refused at spawn.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum TurretSpecError {
    /// Durability must be a finite positive amount.
    #[error("max durability must be positive and finite, got {0}")]
    MaxDurability(f32),
    /// A material speed factor must be a finite positive amount.
    #[error("stuff speed factor must be positive and finite, got {0}")]
    StuffSpeedFactor(f32),
    /// The attached upgrade policy is invalid.
    #[error(transparent)]
    Upgrade(#[from] UpgradePropsError),
}

impl WorkerProfile {
    /// Checks that the worker can make progress and rolls against a probability.
    pub fn validate(&self) -> Result<(), WorkerProfileError> {
        if !(self.construction_speed.is_finite() && self.construction_speed > 0.0) {
            return Err(WorkerProfileError::ConstructionSpeed(
                self.construction_speed,
            ));
        }
        if !(0.0..=1.0).contains(&self.construct_success_chance) {
            return Err(WorkerProfileError::SuccessChance(
                self.construct_success_chance,
            ));
        }
        Ok(())
    }
}

/// Reasons a [`WorkerProfile`] is refused at spawn.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum WorkerProfileError {
    /// Construction speed must be a finite positive amount.
    #[error("construction speed must be positive and finite, got {0}")]
    ConstructionSpeed(f32),
    /// Construct success chance must lie in `[0, 1]`.
    #[error("construct success chance must lie in [0, 1], got {0}")]
    SuccessChance(f32),
}

impl Default for WorkerProfile {
    fn default() -> Self {
        Self {
            construction_level: 6,
            construction_speed: 1.0,
            construct_success_chance: 0.9,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_props_are_valid() {
        assert_eq!(UpgradeProps::default().validate(), Ok(()));
    }

    #[test]
    fn zero_work_total_is_rejected() {
        let props = UpgradeProps {
            work_total: 0.0,
            ..UpgradeProps::default()
        };
        assert_eq!(props.validate(), Err(UpgradePropsError::NonPositiveWork(0.0)));
    }

    #[test]
    fn nan_work_total_is_rejected() {
        let props = UpgradeProps {
            work_total: f32::NAN,
            ..UpgradeProps::default()
        };
        assert!(matches!(
            props.validate(),
            Err(UpgradePropsError::NonPositiveWork(_))
        ));
    }

    #[test]
    fn success_factor_of_zero_is_rejected() {
        let props = UpgradeProps {
            success_chance_factor: 0.0,
            ..UpgradeProps::default()
        };
        assert_eq!(
            props.validate(),
            Err(UpgradePropsError::SuccessChanceFactor(0.0))
        );
    }

    #[test]
    fn recovery_above_one_names_the_field() {
        let props = UpgradeProps {
            major_resource_recovery: 1.5,
            ..UpgradeProps::default()
        };
        assert_eq!(
            props.validate(),
            Err(UpgradePropsError::Recovery {
                field: "major_resource_recovery",
                value: 1.5,
            })
        );
    }

    #[test]
    fn inverted_damage_range_is_rejected() {
        let props = UpgradeProps {
            major_damage_fraction: FractionRange::new(0.6, 0.2),
            ..UpgradeProps::default()
        };
        assert!(matches!(
            props.validate(),
            Err(UpgradePropsError::DamageRange { .. })
        ));
    }

    #[test]
    fn empty_cost_entry_is_rejected() {
        let props = UpgradeProps {
            cost: vec![MaterialStack::new(ResourceKind::Steel, 0)],
            ..UpgradeProps::default()
        };
        assert_eq!(props.validate(), Err(UpgradePropsError::EmptyCostEntry));
    }

    #[test]
    fn repeated_cost_kind_is_rejected() {
        let props = UpgradeProps {
            cost: vec![
                MaterialStack::new(ResourceKind::Steel, 10),
                MaterialStack::new(ResourceKind::Components, 1),
                MaterialStack::new(ResourceKind::Steel, 10),
            ],
            ..UpgradeProps::default()
        };
        assert_eq!(
            props.validate(),
            Err(UpgradePropsError::DuplicateCostKind(ResourceKind::Steel))
        );
    }

    fn valid_spec() -> TurretSpec {
        TurretSpec {
            max_durability: 100.0,
            stuff_speed_factor: None,
            upgrade: Some(UpgradeProps::default()),
        }
    }

    #[test]
    fn turret_without_durability_is_rejected() {
        let spec = TurretSpec {
            max_durability: 0.0,
            ..valid_spec()
        };
        assert_eq!(spec.validate(), Err(TurretSpecError::MaxDurability(0.0)));
    }

    #[test]
    fn non_positive_stuff_factor_is_rejected() {
        for factor in [0.0, -1.0, f32::INFINITY] {
            let spec = TurretSpec {
                stuff_speed_factor: Some(factor),
                ..valid_spec()
            };
            assert!(matches!(
                spec.validate(),
                Err(TurretSpecError::StuffSpeedFactor(_))
            ));
        }
    }

    #[test]
    fn turret_spec_reports_invalid_upgrade() {
        let spec = TurretSpec {
            upgrade: Some(UpgradeProps {
                work_total: -1.0,
                ..UpgradeProps::default()
            }),
            ..valid_spec()
        };
        assert_eq!(
            spec.validate(),
            Err(TurretSpecError::Upgrade(UpgradePropsError::NonPositiveWork(
                -1.0
            )))
        );
        assert_eq!(valid_spec().validate(), Ok(()));
    }

    #[test]
    fn idle_or_improbable_workers_are_rejected() {
        let stalled = WorkerProfile {
            construction_speed: 0.0,
            ..WorkerProfile::default()
        };
        assert_eq!(
            stalled.validate(),
            Err(WorkerProfileError::ConstructionSpeed(0.0))
        );

        let overconfident = WorkerProfile {
            construct_success_chance: 1.2,
            ..WorkerProfile::default()
        };
        assert_eq!(
            overconfident.validate(),
            Err(WorkerProfileError::SuccessChance(1.2))
        );
        assert_eq!(WorkerProfile::default().validate(), Ok(()));
    }
}
