use std::time::Duration;

use glam::Vec2;
use proptest::prelude::*;
use tower_siege_core::{
    Command, Difficulty, EnemyId, EnemyKind, EnemySnapshot, EnemyView, GameConfig,
    ProjectileEffect, TargetingMode, TowerId, TowerKind, TowerSnapshot, TowerView,
};
use tower_siege_system_tower_targeting::TowerTargeting;
use tower_siege_world::{self as world, query, World};

fn snapshot(id: u32, position: Vec2) -> EnemySnapshot {
    EnemySnapshot {
        id: EnemyId::new(id),
        kind: EnemyKind::Basic,
        position,
        velocity: Vec2::ZERO,
        health: 1.0,
        max_health: 1.0,
        progress: 0.0,
        flying: false,
        boss: false,
    }
}

fn sniper(range: f32) -> TowerSnapshot {
    TowerSnapshot {
        id: TowerId::new(0),
        kind: TowerKind::Sniper,
        targeting: TargetingMode::Single,
        position: Vec2::ZERO,
        range,
        damage: 40.0,
        projectile_speed: 800.0,
        effect: ProjectileEffect::Normal,
        ready_in: Duration::ZERO,
    }
}

proptest! {
    #[test]
    fn single_target_is_the_first_nearest_enemy_in_range(
        points in prop::collection::vec((-20i32..20, -20i32..20), 1..24),
        range in 1.0f32..30.0,
    ) {
        let enemies: Vec<_> = points
            .iter()
            .enumerate()
            .map(|(index, (x, y))| snapshot(index as u32, Vec2::new(*x as f32, *y as f32)))
            .collect();
        let towers = TowerView::from_snapshots(vec![sniper(range)]);
        let view = EnemyView::from_snapshots(enemies.clone());
        let mut out = Vec::new();
        TowerTargeting::new().handle(&towers, &view, &mut out);

        let in_range: Vec<_> = enemies
            .iter()
            .filter(|enemy| enemy.position.length_squared() <= range * range)
            .collect();
        match in_range
            .iter()
            .map(|enemy| enemy.position.length_squared())
            .reduce(f32::min)
        {
            None => prop_assert!(out.is_empty()),
            Some(nearest) => {
                let expected = in_range
                    .iter()
                    .find(|enemy| enemy.position.length_squared() == nearest)
                    .map(|enemy| enemy.id);
                prop_assert_eq!(out.len(), 1);
                prop_assert_eq!(Some(out[0].enemy), expected);
            }
        }
    }
}

#[test]
fn world_snapshots_drive_targeting() {
    let mut world = World::new(GameConfig::default(), Difficulty::Normal, 11);
    let mut events = Vec::new();
    world::apply(
        &mut world,
        Command::PlaceTower {
            kind: TowerKind::Arrow,
            position: Vec2::new(128.0, 420.0),
        },
        &mut events,
    )
    .expect("placement");
    for _ in 0..2 {
        world::apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Basic,
                wave: 1,
            },
            &mut events,
        )
        .expect("spawn");
        world::apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(500),
            },
            &mut events,
        )
        .expect("tick");
    }

    let mut targets = Vec::new();
    TowerTargeting::new().handle(
        &query::tower_view(&world),
        &query::enemy_view(&world),
        &mut targets,
    );

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].tower, TowerId::new(0));
    assert_eq!(targets[0].enemy, EnemyId::new(0), "the leading enemy is nearer");
    assert!(targets[0].aim.x > 60.0, "aim leads the walking enemy");
}
