//! Authoritative turret state management utilities.

use std::collections::BTreeMap;

use bastion_core::{FactionId, TurretId, TurretSpec, UpgradeEffects, UpgradeProps};

/// Snapshot of a turret stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct TurretState {
    /// Identifier allocated by the world for the turret.
    pub(crate) id: TurretId,
    /// Faction owning the turret.
    pub(crate) faction: FactionId,
    /// Definition the turret was spawned from.
    pub(crate) spec: TurretSpec,
    /// Remaining durability.
    pub(crate) durability: f32,
    /// Maximum durability, raised by upgrades.
    pub(crate) max_durability: f32,
    /// Whether workers are barred from touching the turret.
    pub(crate) forbidden: bool,
    /// Effects applied by a completed upgrade.
    pub(crate) applied: Option<UpgradeEffects>,
}

impl TurretState {
    fn new(id: TurretId, faction: FactionId, spec: TurretSpec) -> Self {
        Self {
            id,
            faction,
            durability: spec.max_durability,
            max_durability: spec.max_durability,
            spec,
            forbidden: false,
            applied: None,
        }
    }

    pub(crate) fn upgrade_props(&self) -> Option<&UpgradeProps> {
        self.spec.upgrade.as_ref()
    }

    pub(crate) fn is_upgraded(&self) -> bool {
        self.applied.is_some()
    }

    pub(crate) fn stuff_speed_factor(&self) -> f32 {
        self.spec.stuff_speed_factor.unwrap_or(1.0)
    }

    /// Transforms the turret into its upgraded definition.
    pub(crate) fn apply_upgrade(&mut self, effects: UpgradeEffects) {
        self.max_durability *= effects.max_durability_factor;
        self.durability *= effects.max_durability_factor;
        self.applied = Some(effects);
    }

    /// Deals structural damage, returning `true` when this hit destroyed the turret.
    ///
    /// Hits that deal no damage never destroy anything.
    pub(crate) fn take_damage(&mut self, amount: f32) -> bool {
        if !(amount > 0.0) {
            return false;
        }
        self.durability = (self.durability - amount).max(0.0);
        self.durability <= 0.0
    }
}

/// Registry that stores turrets and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TurretRegistry {
    entries: BTreeMap<TurretId, TurretState>,
    next_turret_id: TurretId,
}

impl TurretRegistry {
    /// Creates an empty turret registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_turret_id: TurretId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, faction: FactionId, spec: TurretSpec) -> TurretId {
        let id = self.next_turret_id;
        self.next_turret_id = TurretId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, TurretState::new(id, faction, spec));
        id
    }

    pub(crate) fn get(&self, id: TurretId) -> Option<&TurretState> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TurretId) -> Option<&mut TurretState> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: TurretId) -> Option<TurretState> {
        self.entries.remove(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &TurretState> {
        self.entries.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> TurretSpec {
        TurretSpec {
            max_durability: 200.0,
            stuff_speed_factor: None,
            upgrade: Some(UpgradeProps::default()),
        }
    }

    #[test]
    fn registry_allocates_sequential_identifiers() {
        let mut registry = TurretRegistry::new();
        let first = registry.insert(FactionId::new(0), spec());
        let second = registry.insert(FactionId::new(0), spec());

        assert_eq!(first, TurretId::new(0));
        assert_eq!(second, TurretId::new(1));
        assert_eq!(registry.iter().count(), 2);
    }

    #[test]
    fn missing_stuff_factor_defaults_to_one() {
        let mut registry = TurretRegistry::new();
        let id = registry.insert(FactionId::new(0), spec());
        let state = registry.get(id).expect("inserted");
        assert_eq!(state.stuff_speed_factor(), 1.0);
        assert_eq!(state.durability, 200.0);
    }

    #[test]
    fn upgrade_scales_durability() {
        let mut registry = TurretRegistry::new();
        let id = registry.insert(FactionId::new(0), spec());
        let state = registry.get_mut(id).expect("inserted");
        let _ = state.take_damage(50.0);

        state.apply_upgrade(UpgradeEffects {
            max_durability_factor: 1.5,
            ..UpgradeEffects::default()
        });

        assert!(state.is_upgraded());
        assert_eq!(state.max_durability, 300.0);
        assert_eq!(state.durability, 225.0);
    }

    #[test]
    fn damage_saturates_at_zero() {
        let mut registry = TurretRegistry::new();
        let id = registry.insert(FactionId::new(0), spec());
        let state = registry.get_mut(id).expect("inserted");

        assert!(!state.take_damage(150.0));
        assert!(state.take_damage(150.0));
        assert_eq!(state.durability, 0.0);
    }

    #[test]
    fn harmless_hits_never_destroy() {
        let mut registry = TurretRegistry::new();
        let id = registry.insert(FactionId::new(0), spec());
        let state = registry.get_mut(id).expect("inserted");
        assert!(state.take_damage(250.0));

        assert!(!state.take_damage(0.0), "a zero hit must not report destruction");
        assert!(!state.take_damage(-5.0));
        assert!(!state.take_damage(f32::NAN));
        assert_eq!(state.durability, 0.0);
    }
}
