//! Monte-Carlo estimation of upgrade odds for a worker and upgrade policy.

use anyhow::{bail, Result};
use bastion_core::{TurretId, UpgradeProps, WorkerId, WorkerProfile};
use bastion_system_upgrade::{
    effective_success_chance, SeededDice, TickOutcome, UpgradeTask, WorkContext,
};

/// Inputs describing the attempts being estimated.
#[derive(Clone, Copy, Debug)]
pub(crate) struct EstimateParams {
    pub(crate) construct_success_chance: f32,
    pub(crate) construction_speed: f32,
    pub(crate) work_total: f32,
    pub(crate) success_chance_factor: f32,
}

/// Aggregated outcome of the simulated attempts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Estimate {
    pub(crate) trials: u32,
    pub(crate) successes: u32,
    pub(crate) expected_success: f32,
    pub(crate) mean_ticks_to_success: Option<f64>,
}

impl Estimate {
    pub(crate) fn success_rate(&self) -> f64 {
        f64::from(self.successes) / f64::from(self.trials.max(1))
    }
}

/// Runs `trials` independent attempts, each ending in success or failure.
pub(crate) fn run(params: EstimateParams, trials: u32, seed: u64) -> Result<Estimate> {
    if trials == 0 {
        bail!("at least one trial is required");
    }
    WorkerProfile {
        construction_speed: params.construction_speed,
        construct_success_chance: params.construct_success_chance,
        ..WorkerProfile::default()
    }
    .validate()?;

    let props = UpgradeProps {
        work_total: params.work_total,
        success_chance_factor: params.success_chance_factor,
        ..UpgradeProps::default()
    };
    props.validate()?;

    let context = WorkContext {
        construction_speed: params.construction_speed,
        construct_success_chance: params.construct_success_chance,
        stuff_speed_factor: 1.0,
        max_durability: 100.0,
    };
    let mut dice = SeededDice::from_seed(seed);
    let mut successes = 0;
    let mut success_ticks = 0_u64;

    for _ in 0..trials {
        let mut task = UpgradeTask::new(TurretId::new(0), props.clone())?;
        if let Err(error) = task.begin(WorkerId::new(0)) {
            bail!("estimation task refused to start: {error:?}");
        }
        let mut ticks = 0_u64;
        loop {
            ticks += 1;
            match task.tick(&context, &mut dice) {
                TickOutcome::Progressed { .. } => {}
                TickOutcome::Succeeded { .. } => {
                    successes += 1;
                    success_ticks += ticks;
                    break;
                }
                TickOutcome::Failed(_) | TickOutcome::Inactive => break,
            }
        }
    }

    Ok(Estimate {
        trials,
        successes,
        expected_success: effective_success_chance(
            params.construct_success_chance,
            params.success_chance_factor,
        ),
        mean_ticks_to_success: (successes > 0)
            .then(|| success_ticks as f64 / f64::from(successes)),
    })
}
