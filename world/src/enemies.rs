//! Live enemies walking the path, with their status effects.

use std::{collections::BTreeMap, time::Duration};

use tower_siege_core::{
    CombatConfig, EnemyId, EnemyKind, EnemySnapshot, EnemyStats, ProjectileEffect, TowerId,
};

use crate::path::Path;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Burn {
    per_second: f32,
    remaining: Duration,
    source: Option<TowerId>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Slow {
    factor: f32,
    remaining: Duration,
}

/// Outcome of moving an enemy through one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct EnemyStep {
    /// Health removed by an active burn.
    pub(crate) burned: f32,
    /// Shockwaves released during the tick.
    pub(crate) shockwaves: u32,
    /// Whether the enemy reached the end of the path.
    pub(crate) escaped: bool,
}

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) stats: EnemyStats,
    pub(crate) health: f32,
    /// Distance walked along the path.
    pub(crate) distance: f32,
    burn: Option<Burn>,
    slow: Option<Slow>,
    shockwave_in: Option<Duration>,
}

impl Enemy {
    pub(crate) fn new(id: EnemyId, kind: EnemyKind, stats: EnemyStats, combat: &CombatConfig) -> Self {
        Self {
            id,
            kind,
            stats,
            health: stats.health,
            distance: 0.0,
            burn: None,
            slow: None,
            shockwave_in: stats.boss.then(|| shockwave_interval(combat)),
        }
    }

    pub(crate) fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Movement speed after slows.
    pub(crate) fn speed(&self) -> f32 {
        self.stats.speed * self.slow.map_or(1.0, |slow| slow.factor)
    }

    /// Tower whose burn is currently eating the enemy.
    pub(crate) fn burn_source(&self) -> Option<TowerId> {
        self.burn.and_then(|burn| burn.source)
    }

    /// Removes up to `amount` health and returns how much was removed.
    pub(crate) fn damage(&mut self, amount: f32) -> f32 {
        let removed = amount.max(0.0).min(self.health);
        self.health -= removed;
        removed
    }

    /// Attaches the status effect carried by a projectile hit.
    ///
    /// A new burn or slow replaces the running one. Bosses shrug off slows.
    pub(crate) fn apply_effect(
        &mut self,
        effect: ProjectileEffect,
        hit_damage: f32,
        source: TowerId,
        combat: &CombatConfig,
    ) {
        match effect {
            ProjectileEffect::Fire => {
                self.burn = Some(Burn {
                    per_second: hit_damage * combat.burn_fraction,
                    remaining: Duration::from_millis(u64::from(combat.burn_duration_ms)),
                    source: Some(source),
                });
            }
            ProjectileEffect::Ice if !self.stats.boss => {
                self.slow = Some(Slow {
                    factor: combat.slow_factor,
                    remaining: Duration::from_millis(u64::from(combat.slow_duration_ms)),
                });
            }
            ProjectileEffect::Ice | ProjectileEffect::Normal | ProjectileEffect::Critical => {}
        }
    }

    /// Regenerates, burns, walks and counts down the shockwave.
    ///
    /// An enemy killed by its burn does not move in the same tick.
    pub(crate) fn step(&mut self, dt: Duration, path_length: f32, combat: &CombatConfig) -> EnemyStep {
        let mut step = EnemyStep::default();
        let seconds = dt.as_secs_f32();

        if self.stats.boss {
            self.health = (self.health + combat.boss_regen_per_second * seconds).min(self.stats.health);
        }

        if let Some(burn) = self.burn.as_mut() {
            let burning = dt.min(burn.remaining);
            burn.remaining -= burning;
            let amount = burn.per_second * burning.as_secs_f32();
            step.burned = self.damage(amount);
            if self.burn.is_some_and(|burn| burn.remaining.is_zero()) {
                self.burn = None;
            }
        }
        if self.is_dead() {
            return step;
        }

        self.distance += self.speed() * seconds;
        if let Some(slow) = self.slow.as_mut() {
            slow.remaining = slow.remaining.saturating_sub(dt);
            if slow.remaining.is_zero() {
                self.slow = None;
            }
        }
        if self.distance >= path_length {
            self.distance = path_length;
            step.escaped = true;
            return step;
        }

        if let Some(countdown) = self.shockwave_in.as_mut() {
            let interval = shockwave_interval(combat);
            let mut left = dt;
            while left >= *countdown {
                left -= *countdown;
                *countdown = interval;
                step.shockwaves += 1;
            }
            *countdown -= left;
        }
        step
    }

    pub(crate) fn snapshot(&self, path: &Path) -> EnemySnapshot {
        let length = path.length();
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            position: path.position_at(self.distance),
            velocity: path.heading_at(self.distance) * self.speed(),
            health: self.health,
            max_health: self.stats.health,
            progress: if length > 0.0 {
                (self.distance / length).clamp(0.0, 1.0)
            } else {
                1.0
            },
            flying: self.stats.flying,
            boss: self.stats.boss,
        }
    }
}

fn shockwave_interval(combat: &CombatConfig) -> Duration {
    Duration::from_millis(u64::from(combat.boss_shockwave_interval_ms.max(1)))
}

/// Registry of live enemies keyed by spawn-ordered identifiers.
#[derive(Debug)]
pub(crate) struct EnemyRegistry {
    entries: BTreeMap<EnemyId, Enemy>,
    next_enemy_id: EnemyId,
}

impl EnemyRegistry {
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_enemy_id: EnemyId::new(0),
        }
    }

    pub(crate) fn spawn(&mut self, kind: EnemyKind, stats: EnemyStats, combat: &CombatConfig) -> EnemyId {
        let id = self.next_enemy_id;
        self.next_enemy_id = EnemyId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Enemy::new(id, kind, stats, combat));
        id
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn remove(&mut self, id: EnemyId) -> Option<Enemy> {
        self.entries.remove(&id)
    }

    /// Reports whether `id` was issued but already died or escaped.
    pub(crate) fn is_resolved(&self, id: EnemyId) -> bool {
        id < self.next_enemy_id && !self.entries.contains_key(&id)
    }

    pub(crate) fn ids(&self) -> Vec<EnemyId> {
        self.entries.keys().copied().collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_enemy_id = EnemyId::new(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use tower_siege_core::GameConfig;

    fn enemy(kind: EnemyKind) -> (Enemy, CombatConfig) {
        let config = GameConfig::default();
        let stats = config
            .enemy(kind)
            .expect("enemy stats")
            .scaled(&config.waves, &config.difficulty(Default::default()), 1);
        (
            Enemy::new(EnemyId::new(0), kind, stats, &config.combat),
            config.combat,
        )
    }

    #[test]
    fn walking_past_the_end_escapes() {
        let (mut basic, combat) = enemy(EnemyKind::Basic);
        let step = basic.step(Duration::from_secs(1), 100.0, &combat);
        assert!(!step.escaped);
        assert_eq!(basic.distance, 60.0);

        let step = basic.step(Duration::from_secs(1), 100.0, &combat);
        assert!(step.escaped);
        assert_eq!(basic.distance, 100.0);
    }

    #[test]
    fn ice_halves_speed_until_it_wears_off() {
        let (mut basic, combat) = enemy(EnemyKind::Basic);
        basic.apply_effect(ProjectileEffect::Ice, 5.0, TowerId::new(1), &combat);
        assert_eq!(basic.speed(), 30.0);

        let _ = basic.step(Duration::from_secs(2), 1_000.0, &combat);
        assert_eq!(basic.distance, 60.0);
        assert_eq!(basic.speed(), 60.0);
    }

    #[test]
    fn bosses_ignore_slows() {
        let (mut boss, combat) = enemy(EnemyKind::Boss);
        boss.apply_effect(ProjectileEffect::Ice, 5.0, TowerId::new(1), &combat);
        assert_eq!(boss.speed(), boss.stats.speed);
    }

    #[test]
    fn burn_deals_a_fraction_of_the_hit_per_second() {
        let (mut tank, combat) = enemy(EnemyKind::Tank);
        tank.apply_effect(ProjectileEffect::Fire, 50.0, TowerId::new(3), &combat);
        assert_eq!(tank.burn_source(), Some(TowerId::new(3)));

        let step = tank.step(Duration::from_secs(1), 1_000.0, &combat);
        assert!((step.burned - 10.0).abs() < 1e-3);

        let step = tank.step(Duration::from_secs(5), 1_000.0, &combat);
        assert!((step.burned - 20.0).abs() < 1e-3, "burn stops after its duration");
        assert_eq!(tank.burn_source(), None);
    }

    #[test]
    fn boss_regenerates_and_releases_shockwaves() {
        let (mut boss, combat) = enemy(EnemyKind::Boss);
        let _ = boss.damage(100.0);
        let step = boss.step(Duration::from_secs(2), 10_000.0, &combat);
        assert_eq!(boss.health, boss.stats.health - 90.0);
        assert_eq!(step.shockwaves, 0);

        let step = boss.step(Duration::from_secs(4), 10_000.0, &combat);
        assert_eq!(step.shockwaves, 1);
        let step = boss.step(Duration::from_secs(13), 10_000.0, &combat);
        assert_eq!(step.shockwaves, 2);
    }

    #[test]
    fn snapshot_reports_progress_and_velocity() {
        let (mut fast, combat) = enemy(EnemyKind::Fast);
        let path = Path::new(vec![Vec2::ZERO, Vec2::new(240.0, 0.0)]);
        let _ = fast.step(Duration::from_secs(1), path.length(), &combat);
        let snapshot = fast.snapshot(&path);
        assert_eq!(snapshot.position, Vec2::new(120.0, 0.0));
        assert_eq!(snapshot.velocity, Vec2::new(120.0, 0.0));
        assert_eq!(snapshot.progress, 0.5);
    }

    #[test]
    fn resolved_ids_are_distinguished_from_unknown_ones() {
        let config = GameConfig::default();
        let stats = config
            .enemy(EnemyKind::Basic)
            .expect("basic")
            .scaled(&config.waves, &config.difficulty(Default::default()), 1);
        let mut registry = EnemyRegistry::new();
        let first = registry.spawn(EnemyKind::Basic, stats, &config.combat);
        assert!(!registry.is_resolved(first));
        assert!(registry.remove(first).is_some());
        assert!(registry.is_resolved(first));
        assert!(!registry.is_resolved(EnemyId::new(9)));
    }
}
