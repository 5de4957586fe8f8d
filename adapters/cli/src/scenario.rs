//! TOML scenario files describing the turrets and workers a simulation starts with.

use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use bastion_core::{Command, FactionId, TurretId, TurretSpec, WorkerProfile};
use serde::Deserialize;

const SUPPORTED_SCENARIO_VERSION: u32 = 1;

/// Parsed scenario ready to be replayed into a fresh world.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    version: u32,
    /// Seed for the world's dice; overridden by `--seed`.
    #[serde(default)]
    pub(crate) seed: Option<u64>,
    /// Number of ticks to simulate; overridden by `--ticks`.
    #[serde(default)]
    pub(crate) ticks: Option<u64>,
    /// Whether failed upgrades are supplied with fresh materials.
    #[serde(default = "default_restock")]
    pub(crate) restock: bool,
    #[serde(default)]
    turrets: Vec<TurretEntry>,
    #[serde(default)]
    workers: Vec<WorkerEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TurretEntry {
    faction: u32,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    designate: bool,
    #[serde(default)]
    stock: bool,
    spec: TurretSpec,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct WorkerEntry {
    faction: u32,
    #[serde(default = "default_count")]
    count: u32,
    #[serde(default)]
    profile: WorkerProfile,
}

fn default_count() -> u32 {
    1
}

fn default_restock() -> bool {
    true
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario file {}", path.display()))
    }

    /// Parses and validates scenario TOML contents.
    pub(crate) fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if scenario.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                scenario.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }

        for (index, entry) in scenario.turrets.iter().enumerate() {
            if entry.stock && !entry.designate {
                bail!("turret entry {index} stocks materials without designating an upgrade");
            }
            if entry.designate && entry.spec.upgrade.is_none() {
                bail!("turret entry {index} designates an upgrade but defines none");
            }
            entry
                .spec
                .validate()
                .with_context(|| format!("turret entry {index} has an invalid spec"))?;
        }
        for (index, entry) in scenario.workers.iter().enumerate() {
            entry
                .profile
                .validate()
                .with_context(|| format!("worker entry {index} has an invalid profile"))?;
        }

        Ok(scenario)
    }

    /// Expands the scenario into the commands that build its opening state.
    ///
    /// Turret identifiers are allocated in file order, so designations and
    /// deliveries can name the turrets they target.
    pub(crate) fn commands(&self) -> Vec<Command> {
        let mut commands = Vec::new();
        let mut next_turret = 0;

        for entry in &self.turrets {
            for _ in 0..entry.count {
                let turret = TurretId::new(next_turret);
                next_turret += 1;
                commands.push(Command::SpawnTurret {
                    faction: FactionId::new(entry.faction),
                    spec: entry.spec.clone(),
                });
                if entry.designate {
                    commands.push(Command::DesignateUpgrade { turret });
                }
                if entry.stock {
                    let cost = entry
                        .spec
                        .upgrade
                        .iter()
                        .flat_map(|props| props.cost.iter().copied());
                    commands.extend(cost.map(|stack| Command::DeliverMaterials { turret, stack }));
                }
            }
        }

        for entry in &self.workers {
            for _ in 0..entry.count {
                commands.push(Command::SpawnWorker {
                    faction: FactionId::new(entry.faction),
                    profile: entry.profile,
                });
            }
        }

        commands
    }
}
