//! Resource kinds and the multiset container holding materials sunk into an upgrade.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Kinds of construction resources that can fund an upgrade.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// Structural steel.
    Steel,
    /// Lightweight high-strength alloy.
    Plasteel,
    /// Basic industrial components.
    Components,
    /// Spacer-grade components.
    AdvancedComponents,
    /// Dense metal used by heavy emplacements.
    Uranium,
    /// Conductive precious metal.
    Silver,
    /// Rough-cut timber.
    Wood,
}

/// Quantity of a single resource kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MaterialStack {
    /// Kind of resource in the stack.
    pub kind: ResourceKind,
    /// Number of units in the stack.
    pub quantity: u32,
}

impl MaterialStack {
    /// Creates a new stack descriptor.
    #[must_use]
    pub const fn new(kind: ResourceKind, quantity: u32) -> Self {
        Self { kind, quantity }
    }
}

/// Multiset of materials consumed by an upgrade so far.
///
/// Entries never hold a zero quantity; iteration order follows
/// [`ResourceKind`] ordering so refunds are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredMaterials {
    entries: BTreeMap<ResourceKind, u32>,
}

impl StoredMaterials {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the stack to the container, merging with any existing entry.
    pub fn add(&mut self, stack: MaterialStack) {
        if stack.quantity == 0 {
            return;
        }
        let entry = self.entries.entry(stack.kind).or_insert(0);
        *entry = entry.saturating_add(stack.quantity);
    }

    /// Quantity currently stored for the provided kind.
    #[must_use]
    pub fn quantity(&self, kind: ResourceKind) -> u32 {
        self.entries.get(&kind).copied().unwrap_or(0)
    }

    /// Reports whether nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the stored stacks in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = MaterialStack> + '_ {
        self.entries
            .iter()
            .map(|(kind, quantity)| MaterialStack::new(*kind, *quantity))
    }

    /// Removes every stored stack, yielding them in deterministic order.
    pub fn drain(&mut self) -> Vec<MaterialStack> {
        std::mem::take(&mut self.entries)
            .into_iter()
            .map(|(kind, quantity)| MaterialStack::new(kind, quantity))
            .collect()
    }

    /// Computes how much of each costed kind is still missing.
    ///
    /// Entries naming the same kind are summed, and the result keeps the
    /// order in which kinds first appear in `cost`.
    #[must_use]
    pub fn outstanding(&self, cost: &[MaterialStack]) -> Vec<MaterialStack> {
        let mut merged: Vec<MaterialStack> = Vec::with_capacity(cost.len());
        for stack in cost {
            match merged.iter_mut().find(|entry| entry.kind == stack.kind) {
                Some(entry) => entry.quantity = entry.quantity.saturating_add(stack.quantity),
                None => merged.push(*stack),
            }
        }

        merged
            .into_iter()
            .filter_map(|required| {
                let missing = required.quantity.saturating_sub(self.quantity(required.kind));
                (missing > 0).then(|| MaterialStack::new(required.kind, missing))
            })
            .collect()
    }

    /// Reports whether the container satisfies the provided cost.
    #[must_use]
    pub fn covers(&self, cost: &[MaterialStack]) -> bool {
        self.outstanding(cost).is_empty()
    }
}
