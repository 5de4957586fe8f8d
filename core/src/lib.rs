#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Bastion turret upgrade engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

mod materials;
mod props;
mod report;

use serde::{Deserialize, Serialize};

pub use materials::{MaterialStack, ResourceKind, StoredMaterials};
pub use props::{
    FractionRange, TurretSpec, TurretSpecError, UpgradeEffects, UpgradeProps, UpgradePropsError,
    WorkerProfile, WorkerProfileError,
};
pub use report::{FailureReport, FailureSeverity, RefundTier};

/// Highest construction skill level a worker can reach.
pub const MAX_SKILL_LEVEL: u8 = 20;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation by a single tick.
    Tick,
    /// Requests that a turret built from the provided definition be spawned.
    SpawnTurret {
        /// Faction owning the turret.
        faction: FactionId,
        /// Definition describing durability, material, and upgrade policy.
        spec: TurretSpec,
    },
    /// Requests removal of a turret, as if it were destroyed by the host.
    DespawnTurret {
        /// Turret to remove.
        turret: TurretId,
    },
    /// Toggles the forbidden flag, which bars workers from touching the turret.
    SetTurretForbidden {
        /// Turret to update.
        turret: TurretId,
        /// New value of the flag.
        forbidden: bool,
    },
    /// Requests that a worker with the provided profile be spawned.
    SpawnWorker {
        /// Faction the worker belongs to.
        faction: FactionId,
        /// Construction capabilities of the worker.
        profile: WorkerProfile,
    },
    /// Attaches the pending upgrade marker to a turret.
    DesignateUpgrade {
        /// Turret ordered to be upgraded.
        turret: TurretId,
    },
    /// Removes the pending upgrade marker and abandons the task.
    CancelUpgradeDesignation {
        /// Turret whose order is withdrawn.
        turret: TurretId,
    },
    /// Hands materials over to a pending upgrade.
    DeliverMaterials {
        /// Turret receiving the materials.
        turret: TurretId,
        /// Materials carried to the turret.
        stack: MaterialStack,
    },
    /// Places an obstacle that blocks work on the turret.
    PlaceObstacle {
        /// Turret being blocked.
        turret: TurretId,
    },
    /// Removes a previously placed obstacle.
    ClearObstacle {
        /// Obstacle to remove.
        obstacle: ObstacleId,
    },
    /// Binds a worker to a turret's upgrade task.
    BeginUpgrade {
        /// Worker performing the upgrade.
        worker: WorkerId,
        /// Turret being upgraded.
        turret: TurretId,
    },
    /// Pulls a worker off whatever upgrade it is performing.
    InterruptWorker {
        /// Worker being interrupted.
        worker: WorkerId,
    },
    /// Drops the reservation held on a turret, as if the host revoked it.
    ReleaseReservation {
        /// Turret whose reservation is dropped.
        turret: TurretId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation advanced by one tick.
    TimeAdvanced {
        /// Index of the tick that just completed.
        tick: u64,
    },
    /// Confirms that a turret was spawned.
    TurretSpawned {
        /// Identifier assigned to the turret.
        turret: TurretId,
        /// Faction owning the turret.
        faction: FactionId,
    },
    /// Reports that a turret definition failed validation.
    TurretSpawnRejected {
        /// Faction that requested the spawn.
        faction: FactionId,
        /// Validation failure.
        error: TurretSpecError,
    },
    /// Confirms that a turret left the world.
    TurretDestroyed {
        /// Turret that was removed.
        turret: TurretId,
    },
    /// Confirms a change of the forbidden flag.
    TurretForbiddenChanged {
        /// Turret that changed.
        turret: TurretId,
        /// New value of the flag.
        forbidden: bool,
    },
    /// Confirms that a worker was spawned.
    WorkerSpawned {
        /// Identifier assigned to the worker.
        worker: WorkerId,
        /// Faction the worker belongs to.
        faction: FactionId,
    },
    /// Reports that a worker profile failed validation.
    WorkerSpawnRejected {
        /// Faction that requested the spawn.
        faction: FactionId,
        /// Validation failure.
        error: WorkerProfileError,
    },
    /// Confirms that an upgrade marker was attached.
    UpgradeDesignated {
        /// Turret carrying the marker.
        turret: TurretId,
    },
    /// Reports that a designation request was rejected.
    DesignationRejected {
        /// Turret named by the request.
        turret: TurretId,
        /// Specific reason the request failed.
        reason: DesignationError,
    },
    /// Confirms that an upgrade marker was withdrawn.
    DesignationCancelled {
        /// Turret that lost the marker.
        turret: TurretId,
        /// Materials returned to the loose stock.
        returned: Vec<MaterialStack>,
    },
    /// Confirms that materials were accepted by a pending upgrade.
    MaterialsDelivered {
        /// Turret receiving the materials.
        turret: TurretId,
        /// Portion of the delivery that was accepted.
        accepted: MaterialStack,
        /// Whether the upgrade cost is now fully covered.
        fully_resourced: bool,
    },
    /// Reports that a delivery was refused.
    DeliveryRejected {
        /// Turret named by the delivery.
        turret: TurretId,
        /// Materials that were offered.
        stack: MaterialStack,
        /// Specific reason the delivery failed.
        reason: DeliveryError,
    },
    /// Confirms that an obstacle now blocks a turret.
    ObstaclePlaced {
        /// Identifier assigned to the obstacle.
        obstacle: ObstacleId,
        /// Turret being blocked.
        turret: TurretId,
    },
    /// Confirms that an obstacle was removed.
    ObstacleCleared {
        /// Obstacle that was removed.
        obstacle: ObstacleId,
        /// Turret that is no longer blocked by it.
        turret: TurretId,
    },
    /// Confirms that a worker began upgrading a turret.
    UpgradeStarted {
        /// Turret being upgraded.
        turret: TurretId,
        /// Worker performing the upgrade.
        worker: WorkerId,
    },
    /// Reports that a worker could not begin an upgrade.
    UpgradeStartRejected {
        /// Turret named by the request.
        turret: TurretId,
        /// Worker named by the request.
        worker: WorkerId,
        /// Specific reason the request failed.
        reason: StartError,
    },
    /// Reports progress accumulated during a tick.
    UpgradeProgressed {
        /// Turret being upgraded.
        turret: TurretId,
        /// Worker performing the upgrade.
        worker: WorkerId,
        /// Work accumulated so far.
        work_done: f32,
        /// Work required to finish.
        work_total: f32,
    },
    /// Reports that an upgrade was suspended with its progress intact.
    UpgradeInterrupted {
        /// Turret whose upgrade was suspended.
        turret: TurretId,
        /// Worker that was disengaged.
        worker: WorkerId,
        /// Cause of the suspension.
        reason: InterruptReason,
        /// Work preserved for the next attempt.
        work_done: f32,
    },
    /// Reports that an upgrade attempt failed.
    UpgradeFailed {
        /// Structured failure description for messaging.
        report: FailureReport,
    },
    /// Confirms that a turret finished upgrading.
    UpgradeCompleted {
        /// Turret that was upgraded.
        turret: TurretId,
        /// Worker credited with the upgrade.
        worker: WorkerId,
    },
    /// Announces that a worker's construction skill increased.
    SkillLevelled {
        /// Worker that improved.
        worker: WorkerId,
        /// New construction level.
        level: u8,
    },
}

/// Unique identifier assigned to a turret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TurretId(u32);

impl TurretId {
    /// Creates a new turret identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WorkerId(u32);

impl WorkerId {
    /// Creates a new worker identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of a faction owning turrets and workers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactionId(u32);

impl FactionId {
    /// Creates a new faction identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Identifier of an obstacle blocking work on a turret.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObstacleId(u32);

impl ObstacleId {
    /// Creates a new obstacle identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Reasons a worker is not eligible to work on a turret's upgrade.
///
/// Variants are listed in the order the eligibility gate evaluates them.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IneligibleReason {
    /// The worker and turret belong to different factions.
    WrongFaction,
    /// The turret has no upgrade policy or is already upgraded.
    NotUpgradable,
    /// The turret carries no pending upgrade marker.
    NotDesignated,
    /// An obstacle stands in the way.
    BlockedByObstacle(ObstacleId),
    /// The worker's construction skill is below the prerequisite.
    SkillTooLow {
        /// Level demanded by the upgrade policy.
        required: u8,
        /// Level the worker currently has.
        actual: u8,
    },
}

/// Reasons a designation request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DesignationError {
    /// No turret with the provided identifier exists.
    MissingTurret,
    /// The turret has no upgrade policy.
    NotUpgradable,
    /// The turret has already been upgraded.
    AlreadyUpgraded,
    /// The turret already carries the marker.
    AlreadyDesignated,
    /// The turret's upgrade policy failed validation.
    InvalidPolicy,
}

/// Reasons a material delivery may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeliveryError {
    /// No turret with the provided identifier exists.
    MissingTurret,
    /// The turret carries no pending upgrade marker.
    NotDesignated,
    /// The delivery contained no units.
    EmptyStack,
    /// The upgrade needs no more of this resource kind.
    NotRequired,
}

/// Reasons a worker could not be bound to an upgrade task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartError {
    /// No worker with the provided identifier exists.
    MissingWorker,
    /// No turret with the provided identifier exists.
    MissingTurret,
    /// The eligibility gate refused the pairing.
    Ineligible(IneligibleReason),
    /// The turret is forbidden.
    Forbidden,
    /// The upgrade cost has not been delivered yet.
    AwaitingMaterials,
    /// The worker is already engaged elsewhere.
    WorkerBusy,
    /// Another worker holds the reservation on the turret.
    Reserved {
        /// Worker holding the reservation.
        holder: WorkerId,
    },
}

/// Causes of an upgrade being suspended with progress preserved.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterruptReason {
    /// The controlling collaborator pulled the worker off the job.
    WorkerInterrupted,
    /// The reservation on the turret was lost.
    ReservationLost,
    /// The turret became forbidden.
    TargetForbidden,
    /// The turret left the world.
    TargetDestroyed,
    /// The pending upgrade marker was removed.
    DesignationRemoved,
}

/// Phase of an upgrade task as observed from outside the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradePhase {
    /// No worker is bound to the task.
    Idle,
    /// A worker is actively performing the task.
    InProgress {
        /// Worker bound to the task.
        worker: WorkerId,
    },
}

/// Progress of a pending upgrade captured for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UpgradeProgress {
    /// Current phase of the task.
    pub phase: UpgradePhase,
    /// Work accumulated so far.
    pub work_done: f32,
    /// Work required to finish.
    pub work_total: f32,
    /// Whether the material cost is fully covered.
    pub resourced: bool,
}

impl UpgradeProgress {
    /// Fraction of the work completed, in `[0, 1]`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        (self.work_done / self.work_total).clamp(0.0, 1.0)
    }
}

/// Immutable representation of a single turret's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurretSnapshot {
    /// Identifier allocated to the turret by the world.
    pub id: TurretId,
    /// Faction owning the turret.
    pub faction: FactionId,
    /// Whether the turret has an upgrade policy and has not been upgraded yet.
    pub upgradable: bool,
    /// Whether the turret has already been upgraded.
    pub upgraded: bool,
    /// Whether the turret carries the pending upgrade marker.
    pub designated: bool,
    /// Whether the turret is forbidden.
    pub forbidden: bool,
    /// Construction skill demanded by the upgrade policy.
    pub skill_prerequisite: u8,
    /// Current durability.
    pub durability: f32,
    /// Maximum durability.
    pub max_durability: f32,
    /// Progress of the pending upgrade, if any.
    pub upgrade: Option<UpgradeProgress>,
}

impl TurretSnapshot {
    /// Reports whether the turret waits for a worker with all materials delivered.
    #[must_use]
    pub fn awaiting_worker(&self) -> bool {
        self.designated
            && !self.forbidden
            && self
                .upgrade
                .map_or(false, |progress| {
                    progress.resourced && progress.phase == UpgradePhase::Idle
                })
    }
}

/// Read-only snapshot describing all turrets in the world.
#[derive(Clone, Debug, Default)]
pub struct TurretView {
    snapshots: Vec<TurretSnapshot>,
}

impl TurretView {
    /// Creates a new turret view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TurretSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured turret snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TurretSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single turret.
    #[must_use]
    pub fn get(&self, turret: TurretId) -> Option<&TurretSnapshot> {
        self.snapshots
            .binary_search_by_key(&turret, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TurretSnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single worker's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorkerSnapshot {
    /// Identifier allocated to the worker by the world.
    pub id: WorkerId,
    /// Faction the worker belongs to.
    pub faction: FactionId,
    /// Current construction skill level.
    pub construction_level: u8,
    /// Experience accumulated toward the next level.
    pub experience: f32,
    /// Turret the worker is currently upgrading, if any.
    pub engaged: Option<TurretId>,
    /// Number of upgrades the worker has completed.
    pub turrets_upgraded: u32,
}

/// Read-only snapshot describing all workers in the world.
#[derive(Clone, Debug, Default)]
pub struct WorkerView {
    snapshots: Vec<WorkerSnapshot>,
}

impl WorkerView {
    /// Creates a new worker view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<WorkerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured worker snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &WorkerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a single worker.
    #[must_use]
    pub fn get(&self, worker: WorkerId) -> Option<&WorkerSnapshot> {
        self.snapshots
            .binary_search_by_key(&worker, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<WorkerSnapshot> {
        self.snapshots
    }
}
