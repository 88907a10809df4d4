//! Projectiles in flight between a tower and its target.

use std::{collections::BTreeMap, time::Duration};

use tower_siege_core::{EnemyId, ProjectileEffect, ProjectileId, TowerId};

/// Projectile that lands once its flight time elapses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) tower: TowerId,
    pub(crate) target: EnemyId,
    pub(crate) damage: f32,
    pub(crate) effect: ProjectileEffect,
    remaining: Duration,
}

#[derive(Debug)]
pub(crate) struct ProjectileQueue {
    in_flight: BTreeMap<ProjectileId, Projectile>,
    next_projectile_id: ProjectileId,
}

impl ProjectileQueue {
    pub(crate) fn new() -> Self {
        Self {
            in_flight: BTreeMap::new(),
            next_projectile_id: ProjectileId::new(0),
        }
    }

    pub(crate) fn launch(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        damage: f32,
        effect: ProjectileEffect,
        flight: Duration,
    ) -> ProjectileId {
        let id = self.next_projectile_id;
        self.next_projectile_id = ProjectileId::new(id.get().wrapping_add(1));
        let _ = self.in_flight.insert(
            id,
            Projectile {
                id,
                tower,
                target,
                damage,
                effect,
                remaining: flight,
            },
        );
        id
    }

    /// Moves every projectile forward by `dt` and returns those that landed,
    /// in launch order.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<Projectile> {
        let mut landed = Vec::new();
        self.in_flight.retain(|_, projectile| {
            projectile.remaining = projectile.remaining.saturating_sub(dt);
            if projectile.remaining.is_zero() {
                landed.push(*projectile);
                false
            } else {
                true
            }
        });
        landed
    }

    pub(crate) fn len(&self) -> usize {
        self.in_flight.len()
    }

    pub(crate) fn clear(&mut self) {
        self.in_flight.clear();
        self.next_projectile_id = ProjectileId::new(0);
    }
}
