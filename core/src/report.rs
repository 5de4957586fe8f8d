//! Structured outcome of a failed upgrade attempt.

use serde::{Deserialize, Serialize};

use crate::{MaterialStack, TurretId, WorkerId};

/// Severity of an upgrade failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailureSeverity {
    /// Materials are partially lost; the turret is untouched.
    Minor,
    /// Materials are largely lost and the turret takes structural damage.
    Major,
}

/// Coarse classification of how much material a failure returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefundTier {
    /// Nothing was returned.
    None,
    /// Less than 35% was returned.
    HighLoss,
    /// Between 35% and 80% was returned.
    MediumLoss,
    /// At least 80% but not everything was returned.
    SmallLoss,
    /// Everything was returned.
    NoLoss,
}

impl RefundTier {
    /// Classifies a refund fraction into its loss tier.
    ///
    /// Fractions at or above one map to [`RefundTier::NoLoss`]; fractions at
    /// or below zero map to [`RefundTier::None`].
    #[must_use]
    pub fn classify(fraction: f32) -> Self {
        if fraction >= 1.0 {
            Self::NoLoss
        } else if fraction >= 0.8 {
            Self::SmallLoss
        } else if fraction >= 0.35 {
            Self::MediumLoss
        } else if fraction > 0.0 {
            Self::HighLoss
        } else {
            Self::None
        }
    }
}

/// Report describing a single upgrade failure, published for messaging.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FailureReport {
    /// Turret whose upgrade failed.
    pub turret: TurretId,
    /// Worker performing the upgrade when it failed.
    pub worker: WorkerId,
    /// Severity rolled for the failure.
    pub severity: FailureSeverity,
    /// Fraction of stored materials the policy returns for this severity.
    pub refund_fraction: f32,
    /// Loss tier derived from [`FailureReport::refund_fraction`].
    pub tier: RefundTier,
    /// Structural damage dealt to the turret.
    pub damage: f32,
    /// Materials actually returned after stochastic rounding.
    pub refunded: Vec<MaterialStack>,
}
