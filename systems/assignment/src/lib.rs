#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that pairs idle workers with turrets awaiting an upgrade.

use bastion_core::{Command, Event, ObstacleId, TurretId, TurretView, WorkerSnapshot, WorkerView};
use bastion_system_eligibility::evaluate;

/// Work assignment system that reuses its scratch buffer between passes.
#[derive(Debug)]
pub struct WorkAssignment {
    dirty: bool,
    idle_workers: Vec<WorkerSnapshot>,
}

impl Default for WorkAssignment {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkAssignment {
    /// Creates a new assignment system that computes on the first tick.
    #[must_use]
    pub fn new() -> Self {
        Self {
            dirty: true,
            idle_workers: Vec::new(),
        }
    }

    /// Consumes world events and emits `BeginUpgrade` commands for new pairings.
    ///
    /// Pairings are recomputed at most once per `TimeAdvanced` event and only
    /// after an event that could change which pairings are possible.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        turrets: &TurretView,
        workers: &WorkerView,
        mut obstacle_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(TurretId) -> Option<ObstacleId>,
    {
        let mut ticked = false;
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => ticked = true,
                event if invalidates_pairings(event) => self.dirty = true,
                _ => {}
            }
        }

        if !ticked || !self.dirty {
            return;
        }
        self.dirty = false;

        self.idle_workers.clear();
        self.idle_workers
            .extend(workers.iter().filter(|worker| worker.engaged.is_none()));

        for turret in turrets.iter().filter(|turret| turret.awaiting_worker()) {
            let chosen = self
                .idle_workers
                .iter()
                .position(|worker| evaluate(worker, turret, &mut obstacle_at).is_eligible());
            if let Some(index) = chosen {
                let worker = self.idle_workers.remove(index).id;
                out.push(Command::BeginUpgrade {
                    worker,
                    turret: turret.id,
                });
            }
        }
    }
}

fn invalidates_pairings(event: &Event) -> bool {
    matches!(
        event,
        Event::TurretSpawned { .. }
            | Event::TurretForbiddenChanged { .. }
            | Event::WorkerSpawned { .. }
            | Event::UpgradeDesignated { .. }
            | Event::MaterialsDelivered { .. }
            | Event::ObstacleCleared { .. }
            | Event::UpgradeStartRejected { .. }
            | Event::UpgradeInterrupted { .. }
            | Event::UpgradeFailed { .. }
            | Event::UpgradeCompleted { .. }
            | Event::SkillLevelled { .. }
            | Event::TurretDestroyed { .. }
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use bastion_core::{FactionId, TurretSnapshot, UpgradePhase, UpgradeProgress, WorkerId};

    fn turret(id: u32, resourced: bool) -> TurretSnapshot {
        TurretSnapshot {
            id: TurretId::new(id),
            faction: FactionId::new(0),
            upgradable: true,
            upgraded: false,
            designated: true,
            forbidden: false,
            skill_prerequisite: 5,
            durability: 100.0,
            max_durability: 100.0,
            upgrade: Some(UpgradeProgress {
                phase: UpgradePhase::Idle,
                work_done: 0.0,
                work_total: 100.0,
                resourced,
            }),
        }
    }

    fn worker(id: u32, level: u8, engaged: Option<TurretId>) -> WorkerSnapshot {
        WorkerSnapshot {
            id: WorkerId::new(id),
            faction: FactionId::new(0),
            construction_level: level,
            experience: 0.0,
            engaged,
            turrets_upgraded: 0,
        }
    }

    fn tick() -> Vec<Event> {
        vec![Event::TimeAdvanced { tick: 1 }]
    }

    #[test]
    fn pairs_lowest_eligible_worker_with_each_turret() {
        let mut system = WorkAssignment::new();
        let turrets = TurretView::from_snapshots(vec![
            turret(2, true),
            turret(0, true),
            turret(1, false),
        ]);
        let workers = WorkerView::from_snapshots(vec![
            worker(0, 2, None),
            worker(1, 9, Some(TurretId::new(7))),
            worker(2, 6, None),
            worker(3, 8, None),
        ]);
        let mut out = Vec::new();

        system.handle(&tick(), &turrets, &workers, |_| None, &mut out);

        assert_eq!(
            out,
            vec![
                Command::BeginUpgrade {
                    worker: WorkerId::new(2),
                    turret: TurretId::new(0),
                },
                Command::BeginUpgrade {
                    worker: WorkerId::new(3),
                    turret: TurretId::new(2),
                },
            ]
        );
    }

    #[test]
    fn recomputes_only_after_relevant_events() {
        let mut system = WorkAssignment::new();
        let turrets = TurretView::from_snapshots(vec![turret(0, true)]);
        let workers = WorkerView::from_snapshots(vec![worker(0, 10, None)]);
        let mut out = Vec::new();

        system.handle(&[], &turrets, &workers, |_| None, &mut out);
        assert!(out.is_empty(), "no pass without a tick");

        system.handle(&tick(), &turrets, &workers, |_| None, &mut out);
        assert_eq!(out.len(), 1);

        out.clear();
        system.handle(&tick(), &turrets, &workers, |_| None, &mut out);
        assert!(out.is_empty(), "clean system must stay quiet");

        let events = vec![
            Event::UpgradeDesignated {
                turret: TurretId::new(0),
            },
            Event::TimeAdvanced { tick: 3 },
        ];
        system.handle(&events, &turrets, &workers, |_| None, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn blocked_turrets_are_skipped() {
        let mut system = WorkAssignment::new();
        let turrets = TurretView::from_snapshots(vec![turret(0, true), turret(1, true)]);
        let workers = WorkerView::from_snapshots(vec![worker(0, 10, None)]);
        let mut out = Vec::new();

        system.handle(
            &tick(),
            &turrets,
            &workers,
            |turret| (turret == TurretId::new(0)).then(|| ObstacleId::new(4)),
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::BeginUpgrade {
                worker: WorkerId::new(0),
                turret: TurretId::new(1),
            }]
        );
    }
}
