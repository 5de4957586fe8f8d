#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Bastion.
//!
//! The world owns turrets, workers, the upgrade designation registry, the
//! reservation table, and one [`UpgradeTask`] per designated turret. Every
//! mutation flows through [`apply`], which reports its effects as [`Event`]
//! values.

mod reservations;
mod turrets;
mod workers;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
};

use bastion_core::{
    Command, DeliveryError, DesignationError, Event, FactionId, FailureReport, IneligibleReason,
    InterruptReason, MaterialStack, ObstacleId, StartError, StoredMaterials, TurretId,
    TurretSnapshot, TurretSpec, UpgradeEffects, WorkerId, WorkerProfile, WorkerSnapshot,
};
use bastion_system_eligibility::{evaluate, Eligibility};
use bastion_system_upgrade::{
    BeginError, SeededDice, TickOutcome, UpgradeDice, UpgradeTask, WorkContext,
    XP_PER_TICK_CONSTRUCTION,
};
use log::{debug, info, warn};

use reservations::{ObstacleRegistry, ReservationTable};
use turrets::{TurretRegistry, TurretState};
use workers::WorkerRegistry;

/// Seed used by [`World::new`].
pub const DEFAULT_SEED: u64 = 0x42f0_e1eb_d4a5_3c21;

/// Represents the authoritative Bastion world state.
pub struct World {
    turrets: TurretRegistry,
    workers: WorkerRegistry,
    designations: BTreeSet<TurretId>,
    tasks: BTreeMap<TurretId, UpgradeTask>,
    reservations: ReservationTable,
    obstacles: ObstacleRegistry,
    loose_materials: StoredMaterials,
    dice: Box<dyn UpgradeDice>,
    tick_index: u64,
}

impl fmt::Debug for World {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("World")
            .field("turrets", &self.turrets)
            .field("workers", &self.workers)
            .field("designations", &self.designations)
            .field("tasks", &self.tasks)
            .field("reservations", &self.reservations)
            .field("obstacles", &self.obstacles)
            .field("loose_materials", &self.loose_materials)
            .field("tick_index", &self.tick_index)
            .finish_non_exhaustive()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    /// Creates an empty world seeded with [`DEFAULT_SEED`].
    #[must_use]
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Creates an empty world whose randomness is derived from `seed`.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self::with_dice(Box::new(SeededDice::from_seed(seed)))
    }

    /// Creates an empty world drawing randomness from the provided dice.
    #[must_use]
    pub fn with_dice(dice: Box<dyn UpgradeDice>) -> Self {
        Self {
            turrets: TurretRegistry::new(),
            workers: WorkerRegistry::new(),
            designations: BTreeSet::new(),
            tasks: BTreeMap::new(),
            reservations: ReservationTable::new(),
            obstacles: ObstacleRegistry::new(),
            loose_materials: StoredMaterials::new(),
            dice,
            tick_index: 0,
        }
    }

    fn spawn_turret(&mut self, faction: FactionId, spec: TurretSpec, out_events: &mut Vec<Event>) {
        if let Err(error) = spec.validate() {
            debug!("rejected turret spawn for faction {}: {error}", faction.get());
            out_events.push(Event::TurretSpawnRejected { faction, error });
            return;
        }
        let turret = self.turrets.insert(faction, spec);
        out_events.push(Event::TurretSpawned { turret, faction });
    }

    fn spawn_worker(
        &mut self,
        faction: FactionId,
        profile: WorkerProfile,
        out_events: &mut Vec<Event>,
    ) {
        if let Err(error) = profile.validate() {
            debug!("rejected worker spawn for faction {}: {error}", faction.get());
            out_events.push(Event::WorkerSpawnRejected { faction, error });
            return;
        }
        let worker = self.workers.insert(faction, profile);
        out_events.push(Event::WorkerSpawned { worker, faction });
    }

    fn designate(&mut self, turret: TurretId, out_events: &mut Vec<Event>) {
        let result = match self.turrets.get(turret) {
            None => Err(DesignationError::MissingTurret),
            Some(state) if state.is_upgraded() => Err(DesignationError::AlreadyUpgraded),
            Some(_) if self.designations.contains(&turret) => {
                Err(DesignationError::AlreadyDesignated)
            }
            Some(state) => match state.upgrade_props() {
                None => Err(DesignationError::NotUpgradable),
                Some(props) => UpgradeTask::new(turret, props.clone()).map_err(|error| {
                    warn!("turret {} has an invalid upgrade policy: {error}", turret.get());
                    DesignationError::InvalidPolicy
                }),
            },
        };

        match result {
            Ok(task) => {
                let _ = self.designations.insert(turret);
                let _ = self.tasks.insert(turret, task);
                debug!("turret {} designated for upgrade", turret.get());
                out_events.push(Event::UpgradeDesignated { turret });
            }
            Err(reason) => out_events.push(Event::DesignationRejected { turret, reason }),
        }
    }

    fn cancel_designation(&mut self, turret: TurretId, out_events: &mut Vec<Event>) {
        if !self.designations.contains(&turret) {
            return;
        }
        self.disengage(turret, InterruptReason::DesignationRemoved, out_events);
        let returned = self.remove_task(turret);
        debug!("upgrade designation on turret {} cancelled", turret.get());
        out_events.push(Event::DesignationCancelled { turret, returned });
    }

    fn deliver(&mut self, turret: TurretId, stack: MaterialStack, out_events: &mut Vec<Event>) {
        let result = if self.turrets.get(turret).is_none() {
            Err(DeliveryError::MissingTurret)
        } else if stack.quantity == 0 {
            Err(DeliveryError::EmptyStack)
        } else {
            match self.tasks.get_mut(&turret) {
                None => Err(DeliveryError::NotDesignated),
                Some(task) => match task.accept(stack) {
                    0 => Err(DeliveryError::NotRequired),
                    accepted => Ok((accepted, task.is_resourced())),
                },
            }
        };

        match result {
            Ok((accepted, fully_resourced)) => out_events.push(Event::MaterialsDelivered {
                turret,
                accepted: MaterialStack::new(stack.kind, accepted),
                fully_resourced,
            }),
            Err(reason) => out_events.push(Event::DeliveryRejected {
                turret,
                stack,
                reason,
            }),
        }
    }

    fn begin_upgrade(&mut self, worker: WorkerId, turret: TurretId, out_events: &mut Vec<Event>) {
        match self.try_begin(worker, turret) {
            Ok(()) => {
                debug!(
                    "worker {} began upgrading turret {}",
                    worker.get(),
                    turret.get()
                );
                out_events.push(Event::UpgradeStarted { turret, worker });
            }
            Err(reason) => out_events.push(Event::UpgradeStartRejected {
                turret,
                worker,
                reason,
            }),
        }
    }

    fn try_begin(&mut self, worker: WorkerId, turret: TurretId) -> Result<(), StartError> {
        let worker_snapshot = self
            .workers
            .get(worker)
            .map(worker_snapshot)
            .ok_or(StartError::MissingWorker)?;
        let turret_state = self.turrets.get(turret).ok_or(StartError::MissingTurret)?;
        if worker_snapshot.engaged.is_some() {
            return Err(StartError::WorkerBusy);
        }
        if turret_state.forbidden {
            return Err(StartError::Forbidden);
        }

        let turret_snapshot = self.turret_snapshot(turret_state);
        let obstacles = &self.obstacles;
        if let Eligibility::Ineligible(reason) =
            evaluate(&worker_snapshot, &turret_snapshot, |id| {
                obstacles.first_blocking(id)
            })
        {
            return Err(StartError::Ineligible(reason));
        }

        let task = self
            .tasks
            .get_mut(&turret)
            .ok_or(StartError::MissingTurret)?;
        if !task.is_resourced() {
            return Err(StartError::AwaitingMaterials);
        }
        if !self.reservations.try_reserve(turret, worker) {
            let holder = self.reservations.holder(turret).unwrap_or(worker);
            return Err(StartError::Reserved { holder });
        }
        if let Err(error) = task.begin(worker) {
            let _ = self.reservations.release(turret);
            return Err(match error {
                BeginError::AwaitingMaterials => StartError::AwaitingMaterials,
                BeginError::Occupied { worker: holder } => StartError::Reserved { holder },
                BeginError::Finished => StartError::Ineligible(IneligibleReason::NotUpgradable),
            });
        }

        if let Some(state) = self.workers.get_mut(worker) {
            state.engaged = Some(turret);
        }
        Ok(())
    }

    fn interrupt_worker(&mut self, worker: WorkerId, out_events: &mut Vec<Event>) {
        let Some(turret) = self.workers.get(worker).and_then(|state| state.engaged) else {
            return;
        };
        self.disengage(turret, InterruptReason::WorkerInterrupted, out_events);
    }

    fn release_reservation(&mut self, turret: TurretId, out_events: &mut Vec<Event>) {
        if self.reservations.holder(turret).is_none() {
            return;
        }
        self.disengage(turret, InterruptReason::ReservationLost, out_events);
        let _ = self.reservations.release(turret);
    }

    fn set_forbidden(&mut self, turret: TurretId, forbidden: bool, out_events: &mut Vec<Event>) {
        let Some(state) = self.turrets.get_mut(turret) else {
            return;
        };
        state.forbidden = forbidden;
        out_events.push(Event::TurretForbiddenChanged { turret, forbidden });
        if forbidden {
            self.disengage(turret, InterruptReason::TargetForbidden, out_events);
        }
    }

    fn place_obstacle(&mut self, turret: TurretId, out_events: &mut Vec<Event>) {
        if self.turrets.get(turret).is_none() {
            return;
        }
        let obstacle = self.obstacles.place(turret);
        out_events.push(Event::ObstaclePlaced { obstacle, turret });
    }

    fn clear_obstacle(&mut self, obstacle: ObstacleId, out_events: &mut Vec<Event>) {
        if let Some(turret) = self.obstacles.clear(obstacle) {
            out_events.push(Event::ObstacleCleared { obstacle, turret });
        }
    }

    fn destroy_turret(&mut self, turret: TurretId, out_events: &mut Vec<Event>) {
        if self.turrets.get(turret).is_none() {
            return;
        }
        self.disengage(turret, InterruptReason::TargetDestroyed, out_events);
        self.remove_turret(turret);
        out_events.push(Event::TurretDestroyed { turret });
    }

    /// Removes a turret together with its marker, task, and obstacles.
    fn remove_turret(&mut self, turret: TurretId) {
        let _ = self.remove_task(turret);
        self.obstacles.clear_for(turret);
        let _ = self.reservations.release(turret);
        let _ = self.turrets.remove(turret);
    }

    /// Removes the marker and task atomically, yielding the materials they held.
    fn remove_task(&mut self, turret: TurretId) -> Vec<MaterialStack> {
        let _ = self.designations.remove(&turret);
        let returned = self
            .tasks
            .remove(&turret)
            .map(|mut task| task.withdraw_materials())
            .unwrap_or_default();
        for stack in &returned {
            self.loose_materials.add(*stack);
        }
        returned
    }

    /// Suspends the task on `turret`, keeping its progress, and frees the worker.
    fn disengage(&mut self, turret: TurretId, reason: InterruptReason, out_events: &mut Vec<Event>) {
        let Some(task) = self.tasks.get_mut(&turret) else {
            return;
        };
        let Some(worker) = task.suspend() else {
            return;
        };
        let work_done = task.work_done();
        let _ = self.reservations.release(turret);
        if let Some(state) = self.workers.get_mut(worker) {
            state.engaged = None;
        }
        debug!(
            "upgrade of turret {} suspended at {work_done} ({reason:?})",
            turret.get()
        );
        out_events.push(Event::UpgradeInterrupted {
            turret,
            worker,
            reason,
            work_done,
        });
    }

    fn advance_upgrades(&mut self, out_events: &mut Vec<Event>) {
        let engaged: Vec<(TurretId, WorkerId)> = self
            .tasks
            .iter()
            .filter_map(|(turret, task)| task.worker().map(|worker| (*turret, worker)))
            .collect();

        for (turret, worker) in engaged {
            if let Some(reason) = self.engagement_fault(turret, worker) {
                self.disengage(turret, reason, out_events);
                continue;
            }
            let Some(turret_state) = self.turrets.get(turret) else {
                continue;
            };
            let Some(worker_state) = self.workers.get_mut(worker) else {
                continue;
            };
            if let Some(level) = worker_state.learn(XP_PER_TICK_CONSTRUCTION) {
                out_events.push(Event::SkillLevelled { worker, level });
            }
            let context = WorkContext {
                construction_speed: worker_state.profile.construction_speed,
                construct_success_chance: worker_state.profile.construct_success_chance,
                stuff_speed_factor: turret_state.stuff_speed_factor(),
                max_durability: turret_state.max_durability,
            };
            let Some(task) = self.tasks.get_mut(&turret) else {
                continue;
            };

            match task.tick(&context, self.dice.as_mut()) {
                TickOutcome::Inactive => {}
                TickOutcome::Progressed { worker, work_done } => {
                    out_events.push(Event::UpgradeProgressed {
                        turret,
                        worker,
                        work_done,
                        work_total: task.work_total(),
                    });
                }
                TickOutcome::Succeeded { worker } => {
                    let effects = task.props().effects;
                    self.complete_upgrade(turret, worker, effects, out_events);
                }
                TickOutcome::Failed(report) => self.fail_upgrade(report, out_events),
            }
        }
    }

    /// Re-validates an engagement before the worker contributes another tick.
    fn engagement_fault(&self, turret: TurretId, worker: WorkerId) -> Option<InterruptReason> {
        let Some(state) = self.turrets.get(turret) else {
            return Some(InterruptReason::TargetDestroyed);
        };
        if state.forbidden {
            return Some(InterruptReason::TargetForbidden);
        }
        if !self.designations.contains(&turret) {
            return Some(InterruptReason::DesignationRemoved);
        }
        if self.reservations.holder(turret) != Some(worker) {
            return Some(InterruptReason::ReservationLost);
        }
        let engaged_here = self
            .workers
            .get(worker)
            .map_or(false, |state| state.engaged == Some(turret));
        (!engaged_here).then_some(InterruptReason::WorkerInterrupted)
    }

    fn complete_upgrade(
        &mut self,
        turret: TurretId,
        worker: WorkerId,
        effects: UpgradeEffects,
        out_events: &mut Vec<Event>,
    ) {
        let _ = self.designations.remove(&turret);
        let _ = self.tasks.remove(&turret);
        let _ = self.reservations.release(turret);
        if let Some(state) = self.turrets.get_mut(turret) {
            state.apply_upgrade(effects);
        }
        if let Some(state) = self.workers.get_mut(worker) {
            state.engaged = None;
            state.records.turrets_upgraded = state.records.turrets_upgraded.saturating_add(1);
        }
        info!(
            "worker {} finished upgrading turret {}",
            worker.get(),
            turret.get()
        );
        out_events.push(Event::UpgradeCompleted { turret, worker });
    }

    fn fail_upgrade(&mut self, report: FailureReport, out_events: &mut Vec<Event>) {
        let turret = report.turret;
        let _ = self.reservations.release(turret);
        if let Some(state) = self.workers.get_mut(report.worker) {
            state.engaged = None;
        }
        for stack in &report.refunded {
            self.loose_materials.add(*stack);
        }
        let destroyed = report.damage > 0.0
            && self
                .turrets
                .get_mut(turret)
                .map_or(false, |state| state.take_damage(report.damage));
        info!(
            "upgrade of turret {} failed: {:?}, {:.1} damage, {:?}",
            turret.get(),
            report.severity,
            report.damage,
            report.tier
        );
        out_events.push(Event::UpgradeFailed { report });
        if destroyed {
            self.remove_turret(turret);
            out_events.push(Event::TurretDestroyed { turret });
        }
    }

    fn turret_snapshot(&self, state: &TurretState) -> TurretSnapshot {
        let props = state.upgrade_props();
        TurretSnapshot {
            id: state.id,
            faction: state.faction,
            upgradable: props.is_some() && !state.is_upgraded(),
            upgraded: state.is_upgraded(),
            designated: self.designations.contains(&state.id),
            forbidden: state.forbidden,
            skill_prerequisite: props.map_or(0, |props| props.construction_skill_prerequisite),
            durability: state.durability,
            max_durability: state.max_durability,
            upgrade: self.tasks.get(&state.id).map(UpgradeTask::progress),
        }
    }
}

fn worker_snapshot(state: &workers::WorkerState) -> WorkerSnapshot {
    WorkerSnapshot {
        id: state.id,
        faction: state.faction,
        construction_level: state.level,
        experience: state.experience,
        engaged: state.engaged,
        turrets_upgraded: state.records.turrets_upgraded,
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            world.advance_upgrades(out_events);
        }
        Command::SpawnTurret { faction, spec } => world.spawn_turret(faction, spec, out_events),
        Command::DespawnTurret { turret } => world.destroy_turret(turret, out_events),
        Command::SetTurretForbidden { turret, forbidden } => {
            world.set_forbidden(turret, forbidden, out_events);
        }
        Command::SpawnWorker { faction, profile } => {
            world.spawn_worker(faction, profile, out_events);
        }
        Command::DesignateUpgrade { turret } => world.designate(turret, out_events),
        Command::CancelUpgradeDesignation { turret } => {
            world.cancel_designation(turret, out_events);
        }
        Command::DeliverMaterials { turret, stack } => world.deliver(turret, stack, out_events),
        Command::PlaceObstacle { turret } => world.place_obstacle(turret, out_events),
        Command::ClearObstacle { obstacle } => world.clear_obstacle(obstacle, out_events),
        Command::BeginUpgrade { worker, turret } => {
            world.begin_upgrade(worker, turret, out_events);
        }
        Command::InterruptWorker { worker } => world.interrupt_worker(worker, out_events),
        Command::ReleaseReservation { turret } => world.release_reservation(turret, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use bastion_core::{
        MaterialStack, ObstacleId, StoredMaterials, TurretId, TurretSnapshot, TurretView,
        UpgradeEffects, WorkerId, WorkerSnapshot, WorkerView,
    };

    use super::{worker_snapshot, World};

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of every turret.
    #[must_use]
    pub fn turret_view(world: &World) -> TurretView {
        TurretView::from_snapshots(
            world
                .turrets
                .iter()
                .map(|state| world.turret_snapshot(state))
                .collect(),
        )
    }

    /// Captures a read-only view of every worker.
    #[must_use]
    pub fn worker_view(world: &World) -> WorkerView {
        WorkerView::from_snapshots(world.workers.iter().map(worker_snapshot).collect())
    }

    /// Snapshot of a single turret.
    #[must_use]
    pub fn turret(world: &World, turret: TurretId) -> Option<TurretSnapshot> {
        world
            .turrets
            .get(turret)
            .map(|state| world.turret_snapshot(state))
    }

    /// Snapshot of a single worker.
    #[must_use]
    pub fn worker(world: &World, worker: WorkerId) -> Option<WorkerSnapshot> {
        world.workers.get(worker).map(worker_snapshot)
    }

    /// First obstacle blocking work on the turret, if any.
    #[must_use]
    pub fn first_blocker(world: &World, turret: TurretId) -> Option<ObstacleId> {
        world.obstacles.first_blocking(turret)
    }

    /// Worker holding the reservation on the turret, if any.
    #[must_use]
    pub fn reservation_holder(world: &World, turret: TurretId) -> Option<WorkerId> {
        world.reservations.holder(turret)
    }

    /// Materials delivered to the turret's pending upgrade.
    #[must_use]
    pub fn stored_materials(world: &World, turret: TurretId) -> Option<&StoredMaterials> {
        world.tasks.get(&turret).map(|task| task.stored())
    }

    /// Materials the pending upgrade still needs before work can start.
    #[must_use]
    pub fn outstanding_materials(world: &World, turret: TurretId) -> Vec<MaterialStack> {
        world
            .tasks
            .get(&turret)
            .map(|task| task.outstanding())
            .unwrap_or_default()
    }

    /// Materials refunded or returned to the world, awaiting pickup.
    #[must_use]
    pub fn loose_materials(world: &World) -> &StoredMaterials {
        &world.loose_materials
    }

    /// Effects applied to the turret by a completed upgrade.
    #[must_use]
    pub fn upgrade_effects(world: &World, turret: TurretId) -> Option<UpgradeEffects> {
        world.turrets.get(turret).and_then(|state| state.applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{
        ResourceKind, TurretSpecError, UpgradeProps, UpgradePropsError, WorkerProfileError,
    };

    fn upgradable_spec(work_total: f32) -> TurretSpec {
        TurretSpec {
            max_durability: 100.0,
            stuff_speed_factor: None,
            upgrade: Some(UpgradeProps {
                work_total,
                cost: vec![MaterialStack::new(ResourceKind::Steel, 20)],
                failable: false,
                ..UpgradeProps::default()
            }),
        }
    }

    fn world_with_turret(spec: TurretSpec) -> (World, TurretId) {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnTurret {
                faction: FactionId::new(0),
                spec,
            },
            &mut events,
        );
        (world, TurretId::new(0))
    }

    #[test]
    fn invalid_upgrade_policy_rejects_spawn() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SpawnTurret {
                faction: FactionId::new(0),
                spec: upgradable_spec(0.0),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TurretSpawnRejected {
                faction: FactionId::new(0),
                error: TurretSpecError::Upgrade(UpgradePropsError::NonPositiveWork(0.0)),
            }]
        );
        assert_eq!(query::turret_view(&world).iter().count(), 0);
    }

    #[test]
    fn turret_stats_are_validated_at_spawn() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SpawnTurret {
                faction: FactionId::new(0),
                spec: TurretSpec {
                    max_durability: 0.0,
                    ..upgradable_spec(100.0)
                },
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::SpawnTurret {
                faction: FactionId::new(0),
                spec: TurretSpec {
                    stuff_speed_factor: Some(0.0),
                    ..upgradable_spec(100.0)
                },
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::TurretSpawnRejected {
                    faction: FactionId::new(0),
                    error: TurretSpecError::MaxDurability(0.0),
                },
                Event::TurretSpawnRejected {
                    faction: FactionId::new(0),
                    error: TurretSpecError::StuffSpeedFactor(0.0),
                },
            ]
        );
        assert_eq!(query::turret_view(&world).iter().count(), 0);
    }

    #[test]
    fn stalled_worker_is_rejected_at_spawn() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::SpawnWorker {
                faction: FactionId::new(0),
                profile: WorkerProfile {
                    construction_speed: 0.0,
                    ..WorkerProfile::default()
                },
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::WorkerSpawnRejected {
                faction: FactionId::new(0),
                error: WorkerProfileError::ConstructionSpeed(0.0),
            }]
        );
        assert_eq!(query::worker_view(&world).iter().count(), 0);
    }

    #[test]
    fn invalid_policy_is_reported_on_designation() {
        let mut world = World::new();
        let turret = world
            .turrets
            .insert(FactionId::new(0), upgradable_spec(-1.0));
        let mut events = Vec::new();

        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);

        assert_eq!(
            events,
            vec![Event::DesignationRejected {
                turret,
                reason: DesignationError::InvalidPolicy,
            }]
        );
        assert!(query::stored_materials(&world, turret).is_none());
    }

    #[test]
    fn designation_creates_task_and_rejects_duplicates() {
        let (mut world, turret) = world_with_turret(upgradable_spec(100.0));
        let mut events = Vec::new();

        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);
        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);

        assert_eq!(
            events,
            vec![
                Event::UpgradeDesignated { turret },
                Event::DesignationRejected {
                    turret,
                    reason: DesignationError::AlreadyDesignated,
                },
            ]
        );
        assert!(query::stored_materials(&world, turret).is_some());
    }

    #[test]
    fn unupgradable_turret_cannot_be_designated() {
        let (mut world, turret) = world_with_turret(TurretSpec {
            max_durability: 100.0,
            stuff_speed_factor: None,
            upgrade: None,
        });
        let mut events = Vec::new();

        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);

        assert_eq!(
            events,
            vec![Event::DesignationRejected {
                turret,
                reason: DesignationError::NotUpgradable,
            }]
        );
    }

    #[test]
    fn deliveries_are_capped_at_outstanding_cost() {
        let (mut world, turret) = world_with_turret(upgradable_spec(100.0));
        let mut events = Vec::new();
        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);
        events.clear();

        let steel = |quantity| Command::DeliverMaterials {
            turret,
            stack: MaterialStack::new(ResourceKind::Steel, quantity),
        };
        apply(&mut world, steel(15), &mut events);
        apply(&mut world, steel(15), &mut events);
        apply(&mut world, steel(15), &mut events);

        assert_eq!(
            events,
            vec![
                Event::MaterialsDelivered {
                    turret,
                    accepted: MaterialStack::new(ResourceKind::Steel, 15),
                    fully_resourced: false,
                },
                Event::MaterialsDelivered {
                    turret,
                    accepted: MaterialStack::new(ResourceKind::Steel, 5),
                    fully_resourced: true,
                },
                Event::DeliveryRejected {
                    turret,
                    stack: MaterialStack::new(ResourceKind::Steel, 15),
                    reason: DeliveryError::NotRequired,
                },
            ]
        );
    }

    #[test]
    fn silently_lost_reservation_suspends_work_on_next_tick() {
        let (mut world, turret) = world_with_turret(upgradable_spec(100.0));
        let worker = WorkerId::new(0);
        let mut events = Vec::new();
        for command in [
            Command::SpawnWorker {
                faction: FactionId::new(0),
                profile: WorkerProfile::default(),
            },
            Command::DesignateUpgrade { turret },
            Command::DeliverMaterials {
                turret,
                stack: MaterialStack::new(ResourceKind::Steel, 20),
            },
            Command::BeginUpgrade { worker, turret },
            Command::Tick,
        ] {
            apply(&mut world, command, &mut events);
        }
        let _ = world.reservations.release(turret);
        events.clear();

        apply(&mut world, Command::Tick, &mut events);

        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced { tick: 2 },
                Event::UpgradeInterrupted {
                    turret,
                    worker,
                    reason: InterruptReason::ReservationLost,
                    work_done: 1.0,
                },
            ]
        );
        assert_eq!(query::worker(&world, worker).expect("worker").engaged, None);
    }

    #[test]
    fn cancellation_returns_materials_to_loose_stock() {
        let (mut world, turret) = world_with_turret(upgradable_spec(100.0));
        let mut events = Vec::new();
        apply(&mut world, Command::DesignateUpgrade { turret }, &mut events);
        apply(
            &mut world,
            Command::DeliverMaterials {
                turret,
                stack: MaterialStack::new(ResourceKind::Steel, 12),
            },
            &mut events,
        );
        events.clear();

        apply(
            &mut world,
            Command::CancelUpgradeDesignation { turret },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::DesignationCancelled {
                turret,
                returned: vec![MaterialStack::new(ResourceKind::Steel, 12)],
            }]
        );
        assert_eq!(
            query::loose_materials(&world).quantity(ResourceKind::Steel),
            12
        );
        assert!(query::stored_materials(&world, turret).is_none());
        assert!(!query::turret(&world, turret).expect("turret").designated);
    }
}
