use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use glam::Vec2;
use tower_siege_core::{
    ActionError, Command, Difficulty, EnemyId, EnemyKind, Event, GameConfig, ProjectileEffect,
    ProjectileId, SpecialPower, TowerId, TowerKind, UpgradeRequest,
};
use tower_siege_world::{self as world, query, World};

const ARROW_SPOT: Vec2 = Vec2::new(128.0, 420.0);
const PATH_START: Vec2 = Vec2::new(0.0, 384.0);

fn normal_world() -> World {
    World::new(GameConfig::default(), Difficulty::Normal, 0x5eed)
}

fn run(world: &mut World, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(world, command, &mut events).expect("command accepted");
    events
}

fn place(world: &mut World, kind: TowerKind, position: Vec2) -> Result<Vec<Event>, ActionError> {
    let mut events = Vec::new();
    world::apply(world, Command::PlaceTower { kind, position }, &mut events).map(|()| events)
}

fn tick(world: &mut World, millis: u64) -> Vec<Event> {
    run(
        world,
        Command::Tick {
            dt: Duration::from_millis(millis),
        },
    )
}

fn spawn(world: &mut World, kind: EnemyKind, wave: u32) -> EnemyId {
    let events = run(world, Command::SpawnEnemy { kind, wave });
    match events.as_slice() {
        [Event::EnemySpawned { enemy, .. }] => *enemy,
        other => panic!("unexpected spawn events: {other:?}"),
    }
}

fn fire(world: &mut World, tower: TowerId, target: EnemyId, damage: f32, effect: ProjectileEffect) {
    let _ = run(
        world,
        Command::FireProjectile {
            tower,
            target,
            aim: PATH_START,
            damage,
            effect,
        },
    );
}

#[test]
fn placement_spends_gold_and_sale_refunds_seventy_percent() {
    let mut world = normal_world();
    let events = place(&mut world, TowerKind::Arrow, ARROW_SPOT).expect("placement");
    assert_eq!(
        events,
        vec![
            Event::GoldChanged { new: 400, old: 500 },
            Event::TowerPlaced {
                tower: TowerId::new(0),
                kind: TowerKind::Arrow,
                position: ARROW_SPOT,
                cost: 100,
            },
        ]
    );

    let events = run(
        &mut world,
        Command::SellTower {
            tower: TowerId::new(0),
        },
    );
    assert_eq!(
        events,
        vec![
            Event::GoldChanged { new: 470, old: 400 },
            Event::TowerSold {
                tower: TowerId::new(0),
                refund: 70,
            },
        ]
    );
    assert!(query::tower_view(&world).is_empty());
}

#[test]
fn placement_rejects_invalid_positions() {
    let mut world = normal_world();
    assert_eq!(
        place(&mut world, TowerKind::Arrow, Vec2::new(5.0, 5.0)),
        Err(ActionError::OutOfBounds(Vec2::new(5.0, 5.0)))
    );
    assert_eq!(
        place(&mut world, TowerKind::Arrow, Vec2::new(100.0, 390.0)),
        Err(ActionError::OnPath)
    );
    let _ = place(&mut world, TowerKind::Arrow, Vec2::new(400.0, 300.0)).expect("free spot");
    assert_eq!(
        place(&mut world, TowerKind::Arrow, Vec2::new(420.0, 300.0)),
        Err(ActionError::Occupied(TowerId::new(0)))
    );
    assert_eq!(query::ledger(&world).gold(), 400, "rejections cost nothing");
}

#[test]
fn placement_requires_gold_and_a_free_slot() {
    let mut world = normal_world();
    let spots = [
        Vec2::new(400.0, 300.0),
        Vec2::new(460.0, 300.0),
        Vec2::new(520.0, 300.0),
        Vec2::new(400.0, 360.0),
        Vec2::new(460.0, 360.0),
    ];
    for spot in spots {
        let _ = place(&mut world, TowerKind::Arrow, spot).expect("affordable");
    }
    let mut events = Vec::new();
    let result = world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Arrow,
            position: Vec2::new(520.0, 360.0),
        },
        &mut events,
    );
    let expected = ActionError::InsufficientGold {
        required: 100,
        available: 0,
    };
    assert_eq!(result, Err(expected.clone()));
    assert_eq!(events, vec![Event::ActionRejected { error: expected }]);

    let mut config = GameConfig::default();
    config.playfield.max_towers = 1;
    let mut cramped = World::new(config, Difficulty::Normal, 1);
    let _ = place(&mut cramped, TowerKind::Arrow, spots[0]).expect("first slot");
    assert_eq!(
        place(&mut cramped, TowerKind::Arrow, spots[2]),
        Err(ActionError::NoFreeSlots(1))
    );
}

#[test]
fn projectile_kill_pays_reward_and_credits_the_tower() {
    let mut world = normal_world();
    let _ = place(&mut world, TowerKind::Arrow, ARROW_SPOT).expect("placement");
    let enemy = spawn(&mut world, EnemyKind::Basic, 1);
    fire(&mut world, TowerId::new(0), enemy, 60.0, ProjectileEffect::Normal);
    assert_eq!(query::projectiles_in_flight(&world), 1);

    let events = tick(&mut world, 500);
    assert!(events.contains(&Event::ProjectileHit {
        projectile: ProjectileId::new(0),
        enemy,
        damage: 50.0,
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::EnemyDied {
            killer: Some(tower),
            reward: 10,
            ..
        } if *tower == TowerId::new(0)
    )));

    let ledger = query::ledger(&world);
    assert_eq!(ledger.gold(), 410);
    assert_eq!(ledger.score(), 10);
    let details = query::tower(&world, TowerId::new(0)).expect("tower");
    assert_eq!(details.stats.shots_fired, 1);
    assert_eq!(details.stats.kills, 1);
    assert_eq!(details.stats.damage_dealt, 50.0);
    assert_eq!(query::live_enemies(&world), 0);
}

#[test]
fn projectiles_fizzle_on_enemies_that_already_died() {
    let mut world = normal_world();
    let _ = place(&mut world, TowerKind::Arrow, ARROW_SPOT).expect("placement");
    let enemy = spawn(&mut world, EnemyKind::Basic, 1);
    fire(&mut world, TowerId::new(0), enemy, 10.0, ProjectileEffect::Normal);
    let _ = run(&mut world, Command::ReportEnemyDeath { enemy });

    let events = tick(&mut world, 500);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::ProjectileHit { .. })));
    assert_eq!(query::projectiles_in_flight(&world), 0);
}

#[test]
fn burning_enemies_die_and_credit_the_igniting_tower() {
    let mut world = normal_world();
    let _ = place(&mut world, TowerKind::Arrow, ARROW_SPOT).expect("placement");
    let _ = run(
        &mut world,
        Command::UpgradeTower {
            tower: TowerId::new(0),
            request: UpgradeRequest::Power(SpecialPower::Fire),
        },
    );
    assert_eq!(query::ledger(&world).gold(), 250);

    let enemy = spawn(&mut world, EnemyKind::Basic, 1);
    fire(&mut world, TowerId::new(0), enemy, 40.0, ProjectileEffect::Fire);
    let _ = tick(&mut world, 500);
    let burning = query::enemy(&world, enemy).expect("survives the hit");
    assert_eq!(burning.health, 10.0);

    let _ = tick(&mut world, 1_000);
    let events = tick(&mut world, 1_000);
    assert!(events.iter().any(|event| matches!(
        event,
        Event::EnemyDied { killer: Some(tower), .. } if *tower == TowerId::new(0)
    )));
    let details = query::tower(&world, TowerId::new(0)).expect("tower");
    assert_eq!(details.stats.kills, 1);
    assert_eq!(details.stats.damage_dealt, 50.0);
}

#[test]
fn escaping_enemies_cost_lives() {
    let mut world = normal_world();
    let enemy = spawn(&mut world, EnemyKind::Fast, 1);
    let events = tick(&mut world, 15_000);
    assert!(events.contains(&Event::EnemyEscaped {
        enemy,
        kind: EnemyKind::Fast,
        damage: 1,
    }));
    assert!(events.contains(&Event::LivesChanged { new: 19, old: 20 }));
    assert_eq!(query::live_enemies(&world), 0);
}

#[test]
fn game_over_blocks_player_actions() {
    let mut config = GameConfig::default();
    if let Some(normal) = config.difficulty.get_mut(&Difficulty::Normal) {
        normal.starting_lives = 1;
    }
    let mut world = World::new(config, Difficulty::Normal, 3);
    let _ = place(&mut world, TowerKind::Arrow, ARROW_SPOT).expect("placement");
    let _ = spawn(&mut world, EnemyKind::Basic, 1);
    let tank = spawn(&mut world, EnemyKind::Tank, 1);
    let events = tick(&mut world, 30_000);
    assert!(events.contains(&Event::GameOver { final_score: 0 }));
    assert!(query::ledger(&world).is_game_over());
    assert_eq!(query::live_enemies(&world), 1, "the tank is still walking");

    assert_eq!(
        place(&mut world, TowerKind::Arrow, ARROW_SPOT),
        Err(ActionError::GameOver)
    );

    let mut events = Vec::new();
    assert_eq!(
        world::apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Basic,
                wave: 1,
            },
            &mut events,
        ),
        Err(ActionError::GameOver)
    );
    assert_eq!(
        world::apply(
            &mut world,
            Command::FireProjectile {
                tower: TowerId::new(0),
                target: tank,
                aim: PATH_START,
                damage: 10.0,
                effect: ProjectileEffect::Normal,
            },
            &mut events,
        ),
        Err(ActionError::GameOver)
    );
    assert_eq!(query::live_enemies(&world), 1);
    assert_eq!(query::projectiles_in_flight(&world), 0);

    let events = run(&mut world, Command::Restart);
    assert!(events.contains(&Event::LivesChanged { new: 1, old: 0 }));
    assert!(!query::ledger(&world).is_game_over());
    assert!(place(&mut world, TowerKind::Arrow, ARROW_SPOT).is_ok());
}

#[test]
fn engine_reports_resolve_once() {
    let mut world = normal_world();
    let boss = spawn(&mut world, EnemyKind::Boss, 5);

    let events = run(&mut world, Command::ReportEnemyDeath { enemy: boss });
    assert!(events.iter().any(|event| matches!(
        event,
        Event::EnemyDied { killer: None, kind: EnemyKind::Boss, .. }
    )));
    assert!(
        events
            .iter()
            .any(|event| matches!(event, Event::ItemDropped { .. })),
        "bosses always drop an item"
    );

    let events = run(&mut world, Command::ReportEnemyEscape { enemy: boss });
    assert!(events.is_empty(), "later reports for the same enemy are ignored");
    assert_eq!(query::ledger(&world).lives(), 20);

    let mut events = Vec::new();
    let result = world::apply(
        &mut world,
        Command::ReportEnemyDeath {
            enemy: EnemyId::new(40),
        },
        &mut events,
    );
    assert_eq!(result, Err(ActionError::UnknownEnemy(EnemyId::new(40))));
}

#[test]
fn boss_shockwave_damages_nearby_towers() {
    let mut world = normal_world();
    let _ = place(&mut world, TowerKind::Arrow, Vec2::new(60.0, 420.0)).expect("placement");
    let _ = spawn(&mut world, EnemyKind::Boss, 5);

    let events = tick(&mut world, 6_000);
    assert!(events.contains(&Event::TowerDamaged {
        tower: TowerId::new(0),
        health: 75.0,
    }));

    let events = run(
        &mut world,
        Command::DamageTower {
            tower: TowerId::new(0),
            amount: 100.0,
        },
    );
    assert_eq!(
        events,
        vec![
            Event::TowerDamaged {
                tower: TowerId::new(0),
                health: 0.0,
            },
            Event::TowerDestroyed {
                tower: TowerId::new(0),
            },
        ]
    );
    assert!(query::tower(&world, TowerId::new(0)).is_none());
}

#[test]
fn deterministic_replay_produces_identical_event_log() {
    let first = replay();
    let second = replay();
    assert_eq!(first.len(), second.len());
    assert_eq!(fingerprint(&first), fingerprint(&second), "replay diverged between runs");
}

fn replay() -> Vec<Event> {
    let mut world = normal_world();
    let mut log = Vec::new();
    log.extend(place(&mut world, TowerKind::Cannon, ARROW_SPOT).expect("cannon"));
    for _ in 0..12 {
        let enemy = spawn(&mut world, EnemyKind::Basic, 3);
        fire(&mut world, TowerId::new(0), enemy, 80.0, ProjectileEffect::Normal);
        log.extend(tick(&mut world, 250));
    }
    log.extend(tick(&mut world, 60_000));
    log
}

fn fingerprint(events: &[Event]) -> u64 {
    let mut hasher = DefaultHasher::new();
    for event in events {
        format!("{event:?}").hash(&mut hasher);
    }
    hasher.finish()
}
