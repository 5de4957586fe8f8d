#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Turret upgrade progression: the per-tick state machine, the failure and
//! refund policy, and the dice seam that feeds both.
//!
//! The world owns one [`UpgradeTask`] per designated turret and advances it
//! with [`UpgradeTask::tick`] once per simulation tick while a worker is
//! bound. All randomness flows through [`UpgradeDice`] so replays can be
//! seeded and individual outcomes can be forced.

mod dice;
mod policy;
mod task;

pub use dice::{ScriptedDice, SeededDice, UpgradeDice};
pub use policy::{
    effective_success_chance, failure_chance_per_tick, refund, resolve_failure, round_random,
    FailureContext,
};
pub use task::{BeginError, TickOutcome, UpgradeState, UpgradeTask, WorkContext};

/// Construction experience granted to a worker for every tick spent upgrading.
pub const XP_PER_TICK_CONSTRUCTION: f32 = 0.25;
