use bastion_core::{
    Command, Event, FactionId, MaterialStack, ResourceKind, TurretId, TurretSpec, UpgradeProps,
    WorkerId, WorkerProfile,
};
use bastion_system_assignment::WorkAssignment;
use bastion_world::{apply, query, World};

fn spec(prerequisite: u8) -> TurretSpec {
    TurretSpec {
        max_durability: 120.0,
        stuff_speed_factor: None,
        upgrade: Some(UpgradeProps {
            work_total: 30.0,
            cost: vec![MaterialStack::new(ResourceKind::Steel, 5)],
            failable: false,
            construction_skill_prerequisite: prerequisite,
            ..UpgradeProps::default()
        }),
    }
}

fn profile(level: u8) -> WorkerProfile {
    WorkerProfile {
        construction_level: level,
        construction_speed: 10.0,
        construct_success_chance: 1.0,
    }
}

/// Drives the world and the assignment system the way an adapter loop would.
fn step(
    world: &mut World,
    system: &mut WorkAssignment,
    commands: Vec<Command>,
    events: &mut Vec<Event>,
) {
    let mut pending = commands;
    pending.push(Command::Tick);
    let mut produced = Vec::new();
    for command in pending {
        apply(world, command, &mut produced);
    }

    let turrets = query::turret_view(world);
    let workers = query::worker_view(world);
    let mut follow_up = Vec::new();
    system.handle(
        &produced,
        &turrets,
        &workers,
        |turret| query::first_blocker(world, turret),
        &mut follow_up,
    );
    for command in follow_up {
        apply(world, command, &mut produced);
    }
    events.extend(produced);
}

#[test]
fn idle_workers_are_sent_to_resourced_turrets() {
    let mut world = World::new();
    let mut system = WorkAssignment::new();
    let mut events = Vec::new();
    let faction = FactionId::new(0);

    step(
        &mut world,
        &mut system,
        vec![
            Command::SpawnTurret {
                faction,
                spec: spec(0),
            },
            Command::SpawnTurret {
                faction,
                spec: spec(10),
            },
            Command::SpawnWorker {
                faction,
                profile: profile(4),
            },
            Command::SpawnWorker {
                faction,
                profile: profile(12),
            },
            Command::DesignateUpgrade {
                turret: TurretId::new(0),
            },
            Command::DesignateUpgrade {
                turret: TurretId::new(1),
            },
        ],
        &mut events,
    );
    assert!(
        !events
            .iter()
            .any(|event| matches!(event, Event::UpgradeStarted { .. })),
        "unresourced turrets must not attract workers"
    );

    let deliveries = (0..2)
        .map(|id| Command::DeliverMaterials {
            turret: TurretId::new(id),
            stack: MaterialStack::new(ResourceKind::Steel, 5),
        })
        .collect();
    step(&mut world, &mut system, deliveries, &mut events);

    let started: Vec<(TurretId, WorkerId)> = events
        .iter()
        .filter_map(|event| match event {
            Event::UpgradeStarted { turret, worker } => Some((*turret, *worker)),
            _ => None,
        })
        .collect();
    assert_eq!(
        started,
        vec![
            (TurretId::new(0), WorkerId::new(0)),
            (TurretId::new(1), WorkerId::new(1)),
        ]
    );

    for _ in 0..4 {
        step(&mut world, &mut system, Vec::new(), &mut events);
    }
    let completed = events
        .iter()
        .filter(|event| matches!(event, Event::UpgradeCompleted { .. }))
        .count();
    assert_eq!(completed, 2);
    assert!(query::worker_view(&world)
        .iter()
        .all(|worker| worker.engaged.is_none() && worker.turrets_upgraded == 1));
}

#[test]
fn workers_return_after_an_interruption() {
    let mut world = World::new();
    let mut system = WorkAssignment::new();
    let mut events = Vec::new();
    let faction = FactionId::new(0);
    let turret = TurretId::new(0);

    step(
        &mut world,
        &mut system,
        vec![
            Command::SpawnTurret {
                faction,
                spec: spec(0),
            },
            Command::SpawnWorker {
                faction,
                profile: profile(5),
            },
            Command::DesignateUpgrade { turret },
            Command::DeliverMaterials {
                turret,
                stack: MaterialStack::new(ResourceKind::Steel, 5),
            },
        ],
        &mut events,
    );
    assert_eq!(
        query::reservation_holder(&world, turret),
        Some(WorkerId::new(0))
    );

    events.clear();
    step(
        &mut world,
        &mut system,
        vec![Command::InterruptWorker {
            worker: WorkerId::new(0),
        }],
        &mut events,
    );

    assert!(events.contains(&Event::UpgradeStarted {
        turret,
        worker: WorkerId::new(0),
    }));
    let progress = query::turret(&world, turret)
        .and_then(|snapshot| snapshot.upgrade)
        .expect("upgrade still pending");
    assert_eq!(progress.work_done, 0.0);
}
