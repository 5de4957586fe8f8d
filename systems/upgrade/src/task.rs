//! Upgrade progression state machine.

use bastion_core::{
    FailureReport, MaterialStack, StoredMaterials, TurretId, UpgradePhase, UpgradeProps,
    UpgradePropsError, UpgradeProgress, WorkerId,
};

use crate::{
    policy::{effective_success_chance, failure_chance_per_tick, resolve_failure, FailureContext},
    UpgradeDice,
};

/// Lifecycle state of an [`UpgradeTask`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpgradeState {
    /// Waiting for a worker; progress is frozen.
    Idle,
    /// A worker is bound to the task and advances it every tick.
    InProgress {
        /// Worker bound to the task.
        worker: WorkerId,
    },
    /// The upgrade finished; the task must be discarded.
    Succeeded {
        /// Worker credited with the upgrade.
        worker: WorkerId,
    },
}

/// Per-tick inputs supplied by the world for the bound worker and turret.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkContext {
    /// Worker's construction speed stat.
    pub construction_speed: f32,
    /// Worker's construct success chance stat.
    pub construct_success_chance: f32,
    /// Construction speed factor of the turret's material, `1.0` when absent.
    pub stuff_speed_factor: f32,
    /// Maximum durability of the turret, used to size failure damage.
    pub max_durability: f32,
}

impl WorkContext {
    /// Work contributed by a single tick.
    #[must_use]
    pub fn progress_rate(&self) -> f32 {
        (self.construction_speed * self.stuff_speed_factor).max(0.0)
    }
}

/// Result of advancing a task by one tick.
#[derive(Clone, Debug, PartialEq)]
pub enum TickOutcome {
    /// No worker is bound, so nothing happened.
    Inactive,
    /// Work was added and the task remains in progress.
    Progressed {
        /// Worker that contributed the work.
        worker: WorkerId,
        /// Work accumulated after the tick.
        work_done: f32,
    },
    /// The threshold was reached; the turret should be transformed.
    Succeeded {
        /// Worker credited with the upgrade.
        worker: WorkerId,
    },
    /// The attempt failed; progress was reset and the worker released.
    Failed(FailureReport),
}

/// Reasons [`UpgradeTask::begin`] refuses to bind a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BeginError {
    /// The material cost is not fully delivered.
    AwaitingMaterials,
    /// A worker is already bound to the task.
    Occupied {
        /// Worker currently bound.
        worker: WorkerId,
    },
    /// The task already succeeded.
    Finished,
}

/// Upgrade work pending on a single turret.
///
/// The task stays alive while the turret carries the upgrade marker: a
/// failure zeroes its progress and refunds part of the materials, but the
/// task itself remains ready for another attempt.
#[derive(Clone, Debug)]
pub struct UpgradeTask {
    turret: TurretId,
    props: UpgradeProps,
    work_done: f32,
    stored: StoredMaterials,
    state: UpgradeState,
}

impl UpgradeTask {
    /// Creates an idle task for `turret` governed by `props`.
    pub fn new(turret: TurretId, props: UpgradeProps) -> Result<Self, UpgradePropsError> {
        props.validate()?;
        Ok(Self {
            turret,
            props,
            work_done: 0.0,
            stored: StoredMaterials::new(),
            state: UpgradeState::Idle,
        })
    }

    /// Turret the task belongs to.
    #[must_use]
    pub fn turret(&self) -> TurretId {
        self.turret
    }

    /// Policy governing the task.
    #[must_use]
    pub fn props(&self) -> &UpgradeProps {
        &self.props
    }

    /// Work accumulated so far.
    #[must_use]
    pub fn work_done(&self) -> f32 {
        self.work_done
    }

    /// Work required to finish.
    #[must_use]
    pub fn work_total(&self) -> f32 {
        self.props.work_total
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> UpgradeState {
        self.state
    }

    /// Worker bound to the task, if any.
    #[must_use]
    pub fn worker(&self) -> Option<WorkerId> {
        match self.state {
            UpgradeState::InProgress { worker } => Some(worker),
            UpgradeState::Idle | UpgradeState::Succeeded { .. } => None,
        }
    }

    /// Materials sunk into the task so far.
    #[must_use]
    pub fn stored(&self) -> &StoredMaterials {
        &self.stored
    }

    /// Materials still required before work may begin.
    #[must_use]
    pub fn outstanding(&self) -> Vec<MaterialStack> {
        self.stored.outstanding(&self.props.cost)
    }

    /// Reports whether the material cost is fully covered.
    #[must_use]
    pub fn is_resourced(&self) -> bool {
        self.stored.covers(&self.props.cost)
    }

    /// Accepts as much of `stack` as the cost still requires, returning the accepted amount.
    pub fn accept(&mut self, stack: MaterialStack) -> u32 {
        let missing = self
            .outstanding()
            .into_iter()
            .find(|needed| needed.kind == stack.kind)
            .map_or(0, |needed| needed.quantity);
        let accepted = stack.quantity.min(missing);
        self.stored.add(MaterialStack::new(stack.kind, accepted));
        accepted
    }

    /// Binds `worker` to the task.
    pub fn begin(&mut self, worker: WorkerId) -> Result<(), BeginError> {
        match self.state {
            UpgradeState::InProgress { worker: bound } => {
                return Err(BeginError::Occupied { worker: bound })
            }
            UpgradeState::Succeeded { .. } => return Err(BeginError::Finished),
            UpgradeState::Idle => {}
        }
        if !self.is_resourced() {
            return Err(BeginError::AwaitingMaterials);
        }
        self.state = UpgradeState::InProgress { worker };
        Ok(())
    }

    /// Unbinds the current worker while keeping accumulated work.
    pub fn suspend(&mut self) -> Option<WorkerId> {
        let worker = self.worker()?;
        self.state = UpgradeState::Idle;
        Some(worker)
    }

    /// Empties the material store, returning everything delivered so far.
    pub fn withdraw_materials(&mut self) -> Vec<MaterialStack> {
        self.stored.drain()
    }

    /// Advances the task by one tick of work from the bound worker.
    pub fn tick<D>(&mut self, context: &WorkContext, dice: &mut D) -> TickOutcome
    where
        D: UpgradeDice + ?Sized,
    {
        let UpgradeState::InProgress { worker } = self.state else {
            return TickOutcome::Inactive;
        };

        let rate = context.progress_rate();
        let success_chance = effective_success_chance(
            context.construct_success_chance,
            self.props.success_chance_factor,
        );

        if self.props.failable {
            let risk = failure_chance_per_tick(success_chance, rate, self.props.work_total);
            if dice.unit() < risk {
                self.work_done = 0.0;
                self.state = UpgradeState::Idle;
                let report = resolve_failure(
                    &self.props,
                    &mut self.stored,
                    FailureContext {
                        turret: self.turret,
                        worker,
                        success_chance,
                        max_durability: context.max_durability,
                    },
                    dice,
                );
                return TickOutcome::Failed(report);
            }
        }

        self.work_done += rate;
        if self.work_done >= self.props.work_total {
            self.work_done = self.props.work_total;
            let _ = self.stored.drain();
            self.state = UpgradeState::Succeeded { worker };
            return TickOutcome::Succeeded { worker };
        }

        TickOutcome::Progressed {
            worker,
            work_done: self.work_done,
        }
    }

    /// Captures the externally visible progress of the task.
    #[must_use]
    pub fn progress(&self) -> UpgradeProgress {
        let phase = match self.state {
            UpgradeState::InProgress { worker } => UpgradePhase::InProgress { worker },
            UpgradeState::Idle | UpgradeState::Succeeded { .. } => UpgradePhase::Idle,
        };
        UpgradeProgress {
            phase,
            work_done: self.work_done,
            work_total: self.props.work_total,
            resourced: self.is_resourced(),
        }
    }
}
