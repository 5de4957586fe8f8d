//! Worker state, construction skill progression, and per-worker records.

use std::collections::BTreeMap;

use bastion_core::{FactionId, TurretId, WorkerId, WorkerProfile, MAX_SKILL_LEVEL};

/// Experience needed to gain one construction level.
pub(crate) const XP_PER_LEVEL: f32 = 1_000.0;

/// Lifetime statistics kept for a worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct WorkerRecords {
    pub(crate) turrets_upgraded: u32,
}

#[derive(Clone, Debug)]
pub(crate) struct WorkerState {
    pub(crate) id: WorkerId,
    pub(crate) faction: FactionId,
    pub(crate) profile: WorkerProfile,
    pub(crate) level: u8,
    pub(crate) experience: f32,
    pub(crate) engaged: Option<TurretId>,
    pub(crate) records: WorkerRecords,
}

impl WorkerState {
    fn new(id: WorkerId, faction: FactionId, profile: WorkerProfile) -> Self {
        Self {
            id,
            faction,
            level: profile.construction_level.min(MAX_SKILL_LEVEL),
            profile,
            experience: 0.0,
            engaged: None,
            records: WorkerRecords::default(),
        }
    }

    /// Grants construction experience, returning the new level on a level-up.
    pub(crate) fn learn(&mut self, xp: f32) -> Option<u8> {
        if self.level >= MAX_SKILL_LEVEL {
            return None;
        }
        self.experience += xp;
        if self.experience < XP_PER_LEVEL {
            return None;
        }
        self.experience -= XP_PER_LEVEL;
        self.level += 1;
        Some(self.level)
    }
}

#[derive(Debug)]
pub(crate) struct WorkerRegistry {
    entries: BTreeMap<WorkerId, WorkerState>,
    next_worker_id: WorkerId,
}

impl WorkerRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_worker_id: WorkerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, faction: FactionId, profile: WorkerProfile) -> WorkerId {
        let id = self.next_worker_id;
        self.next_worker_id = WorkerId::new(id.get().saturating_add(1));
        let _ = self
            .entries
            .insert(id, WorkerState::new(id, faction, profile));
        id
    }

    pub(crate) fn get(&self, id: WorkerId) -> Option<&WorkerState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: WorkerId) -> Option<&mut WorkerState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &WorkerState> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(level: u8) -> WorkerState {
        WorkerState::new(
            WorkerId::new(0),
            FactionId::new(0),
            WorkerProfile {
                construction_level: level,
                ..WorkerProfile::default()
            },
        )
    }

    #[test]
    fn experience_rolls_over_into_levels() {
        let mut worker = state(3);
        assert_eq!(worker.learn(999.0), None);
        assert_eq!(worker.learn(2.0), Some(4));
        assert!((worker.experience - 1.0).abs() < 1e-3);
    }

    #[test]
    fn capped_workers_stop_learning() {
        let mut worker = state(MAX_SKILL_LEVEL);
        assert_eq!(worker.learn(5_000.0), None);
        assert_eq!(worker.level, MAX_SKILL_LEVEL);
        assert_eq!(worker.experience, 0.0);
    }

    #[test]
    fn starting_level_is_clamped() {
        assert_eq!(state(u8::MAX).level, MAX_SKILL_LEVEL);
    }
}
