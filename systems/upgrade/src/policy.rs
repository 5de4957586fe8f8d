//! Failure and refund policy applied when an upgrade attempt goes wrong.

use bastion_core::{
    FailureReport, FailureSeverity, MaterialStack, RefundTier, StoredMaterials, TurretId,
    UpgradeProps, WorkerId,
};

use crate::UpgradeDice;

/// Combines a worker's construct success chance with the upgrade's factor.
#[must_use]
pub fn effective_success_chance(worker_success_chance: f32, factor: f32) -> f32 {
    (worker_success_chance * factor).clamp(0.0, 1.0)
}

/// Chance that a single tick contributing `progress_rate` work fails.
///
/// The per-tick risk is `1 - s^(rate / total)`, so the probability of
/// finishing `work_total` without a single failure is exactly `s`
/// however the work is sliced into ticks. It is evaluated as
/// `-expm1(rate / total * ln s)` in `f64`, which keeps risks of order
/// `1e-7` and below representable when a job spans millions of ticks.
#[must_use]
pub fn failure_chance_per_tick(success_chance: f32, progress_rate: f32, work_total: f32) -> f64 {
    if progress_rate <= 0.0 || work_total <= 0.0 {
        return 0.0;
    }
    let success = f64::from(success_chance.clamp(0.0, 1.0));
    let share = f64::from(progress_rate) / f64::from(work_total);
    (-(share * success.ln()).exp_m1()).clamp(0.0, 1.0)
}

/// Rounds `value` down or up at random so the expectation equals `value`.
///
/// Negative and non-finite inputs round to zero.
pub fn round_random<D>(value: f32, dice: &mut D) -> u32
where
    D: UpgradeDice + ?Sized,
{
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let floor = value.floor();
    let remainder = value - floor;
    let base = floor as u32;
    if remainder > 0.0 && dice.unit() < f64::from(remainder) {
        base.saturating_add(1)
    } else {
        base
    }
}

/// Empties `stored`, returning `fraction` of every stack after stochastic rounding.
///
/// Stacks that round down to nothing are dropped from the result.
pub fn refund<D>(stored: &mut StoredMaterials, fraction: f32, dice: &mut D) -> Vec<MaterialStack>
where
    D: UpgradeDice + ?Sized,
{
    stored
        .drain()
        .into_iter()
        .filter_map(|stack| {
            let quantity = round_random(stack.quantity as f32 * fraction, dice);
            (quantity > 0).then(|| MaterialStack::new(stack.kind, quantity))
        })
        .collect()
}

/// Inputs describing the failed attempt.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FailureContext {
    /// Turret whose upgrade failed.
    pub turret: TurretId,
    /// Worker performing the upgrade.
    pub worker: WorkerId,
    /// Effective success chance used for the tick that failed.
    pub success_chance: f32,
    /// Maximum durability of the turret.
    pub max_durability: f32,
}

/// Rolls severity, damage, and refund for a single failure event.
///
/// `stored` is always emptied, whatever the refund rounds to.
pub fn resolve_failure<D>(
    props: &UpgradeProps,
    stored: &mut StoredMaterials,
    context: FailureContext,
    dice: &mut D,
) -> FailureReport
where
    D: UpgradeDice + ?Sized,
{
    let major = props.always_major
        || dice.unit()
            < (1.0 - f64::from(context.success_chance))
                * f64::from(props.major_failure_chance_factor);

    let (severity, damage, refund_fraction) = if major {
        let range = props.major_damage_fraction;
        let damage = context.max_durability * dice.in_range(range.min, range.max);
        (FailureSeverity::Major, damage, props.major_resource_recovery)
    } else {
        (FailureSeverity::Minor, 0.0, props.minor_resource_recovery)
    };

    let refunded = refund(stored, refund_fraction, dice);

    FailureReport {
        turret: context.turret,
        worker: context.worker,
        severity,
        refund_fraction,
        tier: RefundTier::classify(refund_fraction),
        damage,
        refunded,
    }
}
