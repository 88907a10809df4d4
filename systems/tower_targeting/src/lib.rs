#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Single-target towers pick the nearest enemy within range; ties keep the
//! enemy that spawned first. Area towers target every enemy within range.
//! Each assignment carries a lead aim point that anticipates the enemy's
//! movement during the projectile's flight.

use glam::Vec2;
use tower_siege_core::{
    EnemyId, EnemyView, TargetingMode, TowerSnapshot, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    enemy_workspace: Vec<EnemyCandidate>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Assignments follow tower identifier order, and within an
    /// area tower, enemy spawn order.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();

        if towers.is_empty() || enemies.is_empty() {
            return;
        }

        self.prepare_enemy_workspace(enemies);

        for tower in towers.iter() {
            match tower.targeting {
                TargetingMode::Single => {
                    if let Some(candidate) = self.nearest_in_range(tower) {
                        out.push(candidate.assignment(tower));
                    }
                }
                TargetingMode::Area => {
                    out.extend(
                        self.enemy_workspace
                            .iter()
                            .filter(|candidate| candidate.in_range_of(tower))
                            .map(|candidate| candidate.assignment(tower)),
                    );
                }
            }
        }
    }

    fn prepare_enemy_workspace(&mut self, enemies: &EnemyView) {
        self.enemy_workspace.clear();
        self.enemy_workspace.reserve(enemies.len());
        self.enemy_workspace
            .extend(enemies.iter().map(|snapshot| EnemyCandidate {
                id: snapshot.id,
                position: snapshot.position,
                velocity: snapshot.velocity,
            }));
    }

    fn nearest_in_range(&self, tower: &TowerSnapshot) -> Option<&EnemyCandidate> {
        let mut best: Option<(f32, &EnemyCandidate)> = None;
        for candidate in &self.enemy_workspace {
            let distance_sq = candidate.position.distance_squared(tower.position);
            if distance_sq > tower.range * tower.range {
                continue;
            }
            // strict comparison keeps the earliest spawned enemy on ties
            if best.map_or(true, |(closest, _)| distance_sq < closest) {
                best = Some((distance_sq, candidate));
            }
        }
        best.map(|(_, candidate)| candidate)
    }
}

#[derive(Clone, Copy, Debug)]
struct EnemyCandidate {
    id: EnemyId,
    position: Vec2,
    velocity: Vec2,
}

impl EnemyCandidate {
    fn in_range_of(&self, tower: &TowerSnapshot) -> bool {
        self.position.distance_squared(tower.position) <= tower.range * tower.range
    }

    fn assignment(&self, tower: &TowerSnapshot) -> TowerTarget {
        TowerTarget {
            tower: tower.id,
            enemy: self.id,
            aim: lead_aim(tower.position, tower.projectile_speed, self.position, self.velocity),
        }
    }
}

/// Predicted interception point: `position + velocity * (distance / speed)`.
#[must_use]
pub fn lead_aim(origin: Vec2, projectile_speed: f32, position: Vec2, velocity: Vec2) -> Vec2 {
    if projectile_speed <= 0.0 {
        return position;
    }
    let flight = origin.distance(position) / projectile_speed;
    position + velocity * flight
}
