#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives Bastion turret upgrade simulations.

mod estimate;
mod report;
mod scenario;

use std::path::PathBuf;

use anyhow::{Context, Result};
use bastion_core::{Command, Event, TurretId};
use bastion_system_assignment::WorkAssignment;
use bastion_world::{apply, query, World};
use clap::{Args, Parser, Subcommand};
use log::{debug, info, LevelFilter};

use estimate::EstimateParams;
use report::{kind_label, render_failure};
use scenario::Scenario;

const DEFAULT_TICKS: u64 = 2_500;

/// Turret upgrade simulator.
#[derive(Debug, Parser)]
#[command(name = "bastion", version, about)]
struct Cli {
    /// Increases log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Replays a scenario file and reports upgrade outcomes.
    Simulate(SimulateArgs),
    /// Estimates the odds of finishing an upgrade without failing.
    Estimate(EstimateArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Path to the TOML scenario file.
    #[arg(long)]
    scenario: PathBuf,
    /// Seed for the simulation dice; defaults to the scenario's seed.
    #[arg(long)]
    seed: Option<u64>,
    /// Number of ticks to simulate; defaults to the scenario's value.
    #[arg(long)]
    ticks: Option<u64>,
}

#[derive(Debug, Args)]
struct EstimateArgs {
    /// Worker's base construct success chance.
    #[arg(long, default_value_t = 0.9)]
    success_chance: f32,
    /// Upgrade's success chance factor.
    #[arg(long, default_value_t = 1.0)]
    success_factor: f32,
    /// Work contributed per tick.
    #[arg(long, default_value_t = 1.0)]
    speed: f32,
    /// Work required to finish the upgrade.
    #[arg(long, default_value_t = 1_000.0)]
    work_total: f32,
    /// Number of simulated attempts.
    #[arg(long, default_value_t = 10_000)]
    trials: u32,
    /// Seed for the simulation dice.
    #[arg(long, default_value_t = 0)]
    seed: u64,
}

/// Entry point for the Bastion command-line interface.
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    match cli.command {
        CliCommand::Simulate(args) => simulate(&args),
        CliCommand::Estimate(args) => run_estimate(&args),
    }
}

fn init_logging(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}] {}",
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(std::io::stderr())
        .apply()
        .context("failed to install logger")
}

/// Running tallies printed once the simulation ends.
#[derive(Debug, Default)]
struct Tally {
    completed: u32,
    failed: u32,
    destroyed: u32,
    interrupted: u32,
}

fn simulate(args: &SimulateArgs) -> Result<()> {
    let scenario = Scenario::load(&args.scenario)?;
    let seed = args
        .seed
        .or(scenario.seed)
        .unwrap_or_else(rand::random::<u64>);
    let ticks = args.ticks.or(scenario.ticks).unwrap_or(DEFAULT_TICKS);
    info!(
        "simulating {} for {ticks} ticks with seed {seed}",
        args.scenario.display()
    );

    let mut world = World::with_seed(seed);
    let mut assignment = WorkAssignment::new();
    let mut events = Vec::new();
    let mut commands = scenario.commands();
    let mut tally = Tally::default();

    for _ in 0..ticks {
        commands.push(Command::Tick);
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
        }

        let mut restock = Vec::new();
        for event in &events {
            report_event(event, query::tick_index(&world), &mut tally);
            if let Event::UpgradeFailed { report } = event {
                if scenario.restock && query::turret(&world, report.turret).is_some() {
                    restock.push(report.turret);
                }
            }
        }

        let turrets = query::turret_view(&world);
        let workers = query::worker_view(&world);
        assignment.handle(
            &events,
            &turrets,
            &workers,
            |turret| query::first_blocker(&world, turret),
            &mut commands,
        );
        events.clear();
        commands.extend(restock_commands(&world, &restock));
    }

    print_summary(&world, &tally);
    Ok(())
}

fn restock_commands(world: &World, turrets: &[TurretId]) -> Vec<Command> {
    turrets
        .iter()
        .flat_map(|turret| {
            query::outstanding_materials(world, *turret)
                .into_iter()
                .map(|stack| Command::DeliverMaterials {
                    turret: *turret,
                    stack,
                })
        })
        .collect()
}

fn report_event(event: &Event, tick: u64, tally: &mut Tally) {
    match event {
        Event::UpgradeFailed { report } => {
            tally.failed += 1;
            println!("[tick {tick}] {}", render_failure(report));
        }
        Event::UpgradeCompleted { turret, worker } => {
            tally.completed += 1;
            println!(
                "[tick {tick}] Worker {} finished upgrading turret {}.",
                worker.get(),
                turret.get()
            );
        }
        Event::TurretDestroyed { turret } => {
            tally.destroyed += 1;
            println!("[tick {tick}] Turret {} was destroyed.", turret.get());
        }
        Event::UpgradeInterrupted { .. } => tally.interrupted += 1,
        Event::SkillLevelled { worker, level } => {
            info!("worker {} reached construction level {level}", worker.get());
        }
        other => debug!("{other:?}"),
    }
}

fn print_summary(world: &World, tally: &Tally) {
    println!();
    println!(
        "{} completed, {} failed, {} interrupted, {} destroyed after {} ticks",
        tally.completed,
        tally.failed,
        tally.interrupted,
        tally.destroyed,
        query::tick_index(world)
    );

    for turret in query::turret_view(world).iter() {
        let status = match (turret.upgraded, turret.upgrade) {
            (true, _) => "upgraded".to_owned(),
            (false, Some(progress)) => format!("pending ({:.0}%)", progress.fraction() * 100.0),
            (false, None) => "untouched".to_owned(),
        };
        println!(
            "turret {:>3}: {status}, durability {:.0}/{:.0}",
            turret.id.get(),
            turret.durability,
            turret.max_durability
        );
    }

    for worker in query::worker_view(world).iter() {
        println!(
            "worker {:>3}: construction {}, {} turrets upgraded",
            worker.id.get(),
            worker.construction_level,
            worker.turrets_upgraded
        );
    }

    let loose = query::loose_materials(world);
    if !loose.is_empty() {
        let listing = loose
            .iter()
            .map(|stack| format!("{} {}", stack.quantity, kind_label(stack.kind)))
            .collect::<Vec<_>>()
            .join(", ");
        println!("loose materials: {listing}");
    }
}

fn run_estimate(args: &EstimateArgs) -> Result<()> {
    let params = EstimateParams {
        construct_success_chance: args.success_chance,
        construction_speed: args.speed,
        work_total: args.work_total,
        success_chance_factor: args.success_factor,
    };
    let estimate = estimate::run(params, args.trials, args.seed)?;

    println!(
        "{} of {} attempts succeeded ({:.3}); expected {:.3}",
        estimate.successes,
        estimate.trials,
        estimate.success_rate(),
        estimate.expected_success
    );
    match estimate.mean_ticks_to_success {
        Some(mean) => println!("successful attempts took {mean:.1} ticks on average"),
        None => println!("no attempt succeeded"),
    }
    Ok(())
}
