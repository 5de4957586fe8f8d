//! Reservation table and obstacle bookkeeping guarding access to turrets.

use std::collections::BTreeMap;

use bastion_core::{ObstacleId, TurretId, WorkerId};

/// Exclusive claims that bind at most one worker to each turret.
#[derive(Debug, Default)]
pub(crate) struct ReservationTable {
    holders: BTreeMap<TurretId, WorkerId>,
}

impl ReservationTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Claims `target` for `requester`; re-reserving one's own claim succeeds.
    pub(crate) fn try_reserve(&mut self, target: TurretId, requester: WorkerId) -> bool {
        match self.holders.get(&target) {
            Some(holder) => *holder == requester,
            None => {
                let _ = self.holders.insert(target, requester);
                true
            }
        }
    }

    pub(crate) fn release(&mut self, target: TurretId) -> Option<WorkerId> {
        self.holders.remove(&target)
    }

    pub(crate) fn holder(&self, target: TurretId) -> Option<WorkerId> {
        self.holders.get(&target).copied()
    }
}

/// Obstacles standing between workers and turrets.
#[derive(Debug)]
pub(crate) struct ObstacleRegistry {
    entries: BTreeMap<ObstacleId, TurretId>,
    next_obstacle_id: ObstacleId,
}

impl ObstacleRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_obstacle_id: ObstacleId::new(0),
        }
    }

    pub(crate) fn place(&mut self, turret: TurretId) -> ObstacleId {
        let id = self.next_obstacle_id;
        self.next_obstacle_id = ObstacleId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, turret);
        id
    }

    pub(crate) fn clear(&mut self, obstacle: ObstacleId) -> Option<TurretId> {
        self.entries.remove(&obstacle)
    }

    /// Lowest-numbered obstacle blocking `turret`.
    pub(crate) fn first_blocking(&self, turret: TurretId) -> Option<ObstacleId> {
        self.entries
            .iter()
            .find(|(_, blocked)| **blocked == turret)
            .map(|(obstacle, _)| *obstacle)
    }

    pub(crate) fn clear_for(&mut self, turret: TurretId) {
        self.entries.retain(|_, blocked| *blocked != turret);
    }
}
