#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Tower Siege.
//!
//! The world owns every tower, enemy and projectile together with the
//! player's ledger. It only changes through [`apply`], which executes one
//! [`Command`] and reports what happened as [`Event`] values.

mod enemies;
mod ledger;
mod path;
mod projectiles;
mod towers;

use std::time::Duration;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{
    ActionError, Command, Difficulty, DifficultyModifiers, EnemyId, EnemyKind, ErrorKind, Event,
    GameConfig, ProjectileEffect, TowerId, TowerKind, UpgradeRequest,
};

use enemies::EnemyRegistry;
use path::Path;
use projectiles::ProjectileQueue;
use towers::{Tower, TowerRegistry};

pub use ledger::Ledger;
pub use towers::TowerStats;

/// Represents the authoritative Tower Siege world state.
#[derive(Debug)]
pub struct World {
    config: GameConfig,
    difficulty: Difficulty,
    modifiers: DifficultyModifiers,
    seed: u64,
    rng: ChaCha8Rng,
    path: Path,
    ledger: Ledger,
    towers: TowerRegistry,
    enemies: EnemyRegistry,
    projectiles: ProjectileQueue,
    clock: Duration,
    tick_index: u64,
}

impl World {
    /// Creates a world for the provided configuration and difficulty.
    ///
    /// `seed` drives item drops so that runs replay exactly.
    #[must_use]
    pub fn new(config: GameConfig, difficulty: Difficulty, seed: u64) -> Self {
        let modifiers = config.difficulty(difficulty);
        let ledger = Ledger::new(
            modifiers.starting_gold,
            modifiers.starting_lives,
            config.economy.interest_rate,
        );
        let path = Path::new(config.playfield.path.clone());
        Self {
            config,
            difficulty,
            modifiers,
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
            path,
            ledger,
            towers: TowerRegistry::new(),
            enemies: EnemyRegistry::new(),
            projectiles: ProjectileQueue::new(),
            clock: Duration::ZERO,
            tick_index: 0,
        }
    }

    fn ensure_playing(&self) -> Result<(), ActionError> {
        if self.ledger.is_game_over() {
            return Err(ActionError::GameOver);
        }
        Ok(())
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.clock = self.clock.saturating_add(dt);
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        let path_length = self.path.length();
        for id in self.enemies.ids() {
            let Some(enemy) = self.enemies.get_mut(id) else {
                continue;
            };
            let burn_source = enemy.burn_source();
            let step = enemy.step(dt, path_length, &self.config.combat);
            let dead = enemy.is_dead();
            let origin = self.path.position_at(enemy.distance);

            if step.burned > 0.0 {
                if let Some(tower) = burn_source.and_then(|tower| self.towers.get_mut(tower)) {
                    tower.stats.damage_dealt += step.burned;
                }
            }

            if dead {
                self.kill_enemy(id, burn_source, out_events);
            } else if step.escaped {
                self.escape_enemy(id, out_events);
            } else {
                for _ in 0..step.shockwaves {
                    self.release_shockwave(id, origin, out_events);
                }
            }
        }

        self.land_projectiles(dt, out_events);
    }

    fn land_projectiles(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        for projectile in self.projectiles.advance(dt) {
            let Some(enemy) = self.enemies.get_mut(projectile.target) else {
                tracing::trace!(
                    projectile = projectile.id.get(),
                    enemy = projectile.target.get(),
                    "projectile fizzled on a resolved enemy"
                );
                continue;
            };

            let removed = enemy.damage(projectile.damage);
            enemy.apply_effect(
                projectile.effect,
                projectile.damage,
                projectile.tower,
                &self.config.combat,
            );
            let dead = enemy.is_dead();
            out_events.push(Event::ProjectileHit {
                projectile: projectile.id,
                enemy: projectile.target,
                damage: removed,
            });
            if let Some(tower) = self.towers.get_mut(projectile.tower) {
                tower.stats.damage_dealt += removed;
            }
            if dead {
                self.kill_enemy(projectile.target, Some(projectile.tower), out_events);
            }
        }
    }

    fn kill_enemy(&mut self, id: EnemyId, killer: Option<TowerId>, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(id) else {
            return;
        };
        let position = self.path.position_at(enemy.distance);
        tracing::debug!(enemy = id.get(), kind = %enemy.kind, "enemy died");
        out_events.push(Event::EnemyDied {
            enemy: id,
            kind: enemy.kind,
            reward: enemy.stats.reward,
            killer,
            position,
        });
        if let Some(tower) = killer.and_then(|tower| self.towers.get_mut(tower)) {
            tower.stats.kills = tower.stats.kills.saturating_add(1);
        }
        self.ledger.add_gold(enemy.stats.reward, out_events);
        self.ledger.add_score(enemy.stats.score, out_events);

        let chance = self.config.combat.item_drop_chance.clamp(0.0, 1.0);
        if enemy.stats.boss || self.rng.gen_bool(chance) {
            out_events.push(Event::ItemDropped { enemy: id, position });
        }
    }

    fn escape_enemy(&mut self, id: EnemyId, out_events: &mut Vec<Event>) {
        let Some(enemy) = self.enemies.remove(id) else {
            return;
        };
        tracing::debug!(enemy = id.get(), kind = %enemy.kind, damage = enemy.stats.damage, "enemy escaped");
        out_events.push(Event::EnemyEscaped {
            enemy: id,
            kind: enemy.kind,
            damage: enemy.stats.damage,
        });
        self.ledger.take_damage(enemy.stats.damage, out_events);
    }

    fn release_shockwave(&mut self, boss: EnemyId, origin: Vec2, out_events: &mut Vec<Event>) {
        let struck = self
            .towers
            .within(origin, self.config.combat.boss_shockwave_radius);
        tracing::debug!(boss = boss.get(), towers = struck.len(), "boss shockwave");
        for tower in struck {
            let _ = self.damage_tower(tower, self.config.combat.boss_shockwave_damage, out_events);
        }
    }

    fn damage_tower(&mut self, id: TowerId, amount: f32, out_events: &mut Vec<Event>) -> bool {
        let Some(tower) = self.towers.get_mut(id) else {
            return false;
        };
        let health = tower.take_damage(amount);
        out_events.push(Event::TowerDamaged { tower: id, health });
        if health <= 0.0 {
            let _ = self.towers.remove(id);
            tracing::debug!(tower = id.get(), "tower destroyed");
            out_events.push(Event::TowerDestroyed { tower: id });
        }
        true
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        position: Vec2,
        out_events: &mut Vec<Event>,
    ) -> Result<TowerId, ActionError> {
        self.ensure_playing()?;
        let playfield = &self.config.playfield;
        let radius = playfield.tower_radius;
        let inside = (radius..=playfield.width - radius).contains(&position.x)
            && (radius..=playfield.height - radius).contains(&position.y);
        if !inside {
            return Err(ActionError::OutOfBounds(position));
        }
        if let Some(occupant) = self.towers.overlapping(position, 2.0 * radius) {
            return Err(ActionError::Occupied(occupant));
        }
        if self.path.distance_to(position) < playfield.path_clearance {
            return Err(ActionError::OnPath);
        }
        if self.towers.len() >= playfield.max_towers {
            return Err(ActionError::NoFreeSlots(playfield.max_towers));
        }

        let definition = *self.config.tower(kind)?;
        let available = self.ledger.gold();
        if !self.ledger.spend_gold(definition.cost, out_events) {
            return Err(ActionError::InsufficientGold {
                required: definition.cost,
                available,
            });
        }

        let tower = self.towers.insert(kind, position, definition);
        tracing::debug!(tower = tower.get(), %kind, x = position.x, y = position.y, "tower placed");
        out_events.push(Event::TowerPlaced {
            tower,
            kind,
            position,
            cost: definition.cost,
        });
        Ok(tower)
    }

    fn upgrade_tower(
        &mut self,
        id: TowerId,
        request: UpgradeRequest,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let current = self.towers.get(id).ok_or(ActionError::UnknownTower(id))?;
        let cost = self.upgrade_cost(current, request);
        let mut upgraded = current.clone();
        let upgrade = upgraded.apply_upgrade(request)?;

        let available = self.ledger.gold();
        if !self.ledger.spend_gold(cost, out_events) {
            return Err(ActionError::InsufficientGold {
                required: cost,
                available,
            });
        }
        if let Some(tower) = self.towers.get_mut(id) {
            *tower = upgraded;
        }
        tracing::debug!(tower = id.get(), ?upgrade, cost, "tower upgraded");
        out_events.push(Event::TowerUpgraded {
            tower: id,
            upgrade,
            cost,
        });
        Ok(())
    }

    fn upgrade_cost(&self, tower: &Tower, request: UpgradeRequest) -> u32 {
        let economy = &self.config.economy;
        match request {
            UpgradeRequest::Axis(axis) => {
                economy.axis_upgrade_cost(tower.cost, tower.levels.level(axis))
            }
            UpgradeRequest::Tier => economy.tier_upgrade_cost(tower.cost, tower.tier.get()),
            UpgradeRequest::Power(_) => economy.special_power_cost,
        }
    }

    fn sell_tower(&mut self, id: TowerId, out_events: &mut Vec<Event>) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let tower = self.towers.remove(id).ok_or(ActionError::UnknownTower(id))?;
        let refund = self.config.economy.refund_for(tower.cost);
        self.ledger.add_gold(refund, out_events);
        tracing::debug!(tower = id.get(), refund, "tower sold");
        out_events.push(Event::TowerSold { tower: id, refund });
        Ok(())
    }

    fn fire_projectile(
        &mut self,
        tower: TowerId,
        target: EnemyId,
        aim: Vec2,
        damage: f32,
        effect: ProjectileEffect,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        self.ensure_playing()?;
        if self.enemies.get(target).is_none() {
            return Err(ActionError::UnknownEnemy(target));
        }
        let shooter = self
            .towers
            .get_mut(tower)
            .ok_or(ActionError::UnknownTower(tower))?;

        let flight_seconds = shooter.position.distance(aim) / shooter.base.projectile_speed;
        let flight = Duration::try_from_secs_f32(flight_seconds).unwrap_or(Duration::ZERO);
        shooter.record_shot(self.clock);

        let projectile = self
            .projectiles
            .launch(tower, target, damage, effect, flight);
        out_events.push(Event::ProjectileFired {
            projectile,
            tower,
            target,
            aim,
            effect,
        });
        Ok(())
    }

    fn spawn_enemy(
        &mut self,
        kind: EnemyKind,
        wave: u32,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        self.ensure_playing()?;
        let stats = self
            .config
            .enemy(kind)?
            .scaled(&self.config.waves, &self.modifiers, wave);
        let enemy = self.enemies.spawn(kind, stats, &self.config.combat);
        tracing::debug!(enemy = enemy.get(), %kind, wave, health = stats.health, "enemy spawned");
        out_events.push(Event::EnemySpawned {
            enemy,
            kind,
            health: stats.health,
            reward: stats.reward,
        });
        Ok(())
    }

    fn report_terminal(
        &mut self,
        enemy: EnemyId,
        died: bool,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ActionError> {
        if self.enemies.get(enemy).is_some() {
            if died {
                self.kill_enemy(enemy, None, out_events);
            } else {
                self.escape_enemy(enemy, out_events);
            }
            return Ok(());
        }
        if self.enemies.is_resolved(enemy) {
            tracing::debug!(enemy = enemy.get(), "ignoring report for a resolved enemy");
            return Ok(());
        }
        Err(ActionError::UnknownEnemy(enemy))
    }

    fn restart(&mut self, out_events: &mut Vec<Event>) {
        self.ledger.reset(
            self.modifiers.starting_gold,
            self.modifiers.starting_lives,
            out_events,
        );
        self.towers.clear();
        self.enemies.clear();
        self.projectiles.clear();
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.clock = Duration::ZERO;
        self.tick_index = 0;
        tracing::info!(difficulty = ?self.difficulty, "world restarted");
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// A rejected command leaves the world untouched, reports
/// [`Event::ActionRejected`] and returns the error.
pub fn apply(
    world: &mut World,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), ActionError> {
    let result = match command {
        Command::Tick { dt } => {
            world.tick(dt, out_events);
            Ok(())
        }
        Command::AdvanceWave { wave } => {
            if wave < 1 {
                Err(ActionError::InvalidWaveNumber(wave))
            } else {
                world.ledger.set_wave_number(wave, out_events);
                Ok(())
            }
        }
        Command::PayWaveBonus { wave } => {
            let bonus = world.config.economy.wave_clear_reward(wave);
            world.ledger.add_gold(bonus, out_events);
            tracing::debug!(wave, bonus, "wave clear bonus paid");
            Ok(())
        }
        Command::SpawnEnemy { kind, wave } => world.spawn_enemy(kind, wave, out_events),
        Command::PlaceTower { kind, position } => {
            world.place_tower(kind, position, out_events).map(|_| ())
        }
        Command::UpgradeTower { tower, request } => world.upgrade_tower(tower, request, out_events),
        Command::SellTower { tower } => world.sell_tower(tower, out_events),
        Command::DamageTower { tower, amount } => {
            if world.damage_tower(tower, amount, out_events) {
                Ok(())
            } else {
                Err(ActionError::UnknownTower(tower))
            }
        }
        Command::FireProjectile {
            tower,
            target,
            aim,
            damage,
            effect,
        } => world.fire_projectile(tower, target, aim, damage, effect, out_events),
        Command::ReportEnemyDeath { enemy } => world.report_terminal(enemy, true, out_events),
        Command::ReportEnemyEscape { enemy } => world.report_terminal(enemy, false, out_events),
        Command::Restart => {
            world.restart(out_events);
            Ok(())
        }
    };

    if let Err(error) = &result {
        reject(error, out_events);
    }
    result
}

/// Places a tower like [`Command::PlaceTower`] and returns its identifier.
pub fn place_tower(
    world: &mut World,
    kind: TowerKind,
    position: Vec2,
    out_events: &mut Vec<Event>,
) -> Result<TowerId, ActionError> {
    let placed = world.place_tower(kind, position, out_events);
    if let Err(error) = &placed {
        reject(error, out_events);
    }
    placed
}

fn reject(error: &ActionError, out_events: &mut Vec<Event>) {
    if error.kind() == ErrorKind::InvariantViolation {
        tracing::error!(%error, "command aborted");
    } else {
        tracing::warn!(%error, "command rejected");
    }
    out_events.push(Event::ActionRejected {
        error: error.clone(),
    });
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use glam::Vec2;
    use tower_siege_core::{
        Difficulty, EnemyId, EnemySnapshot, EnemyView, GameConfig, SpecialPower, Tier, TowerId,
        TowerKind, TowerView, UpgradeLevels,
    };

    use super::{Ledger, TowerStats, World};

    /// Provides read-only access to the player's ledger.
    #[must_use]
    pub fn ledger(world: &World) -> &Ledger {
        &world.ledger
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &GameConfig {
        &world.config
    }

    /// Difficulty the world was created with.
    #[must_use]
    pub fn difficulty(world: &World) -> Difficulty {
        world.difficulty
    }

    /// Simulated time elapsed since creation or the last restart.
    #[must_use]
    pub fn clock(world: &World) -> Duration {
        world.clock
    }

    /// Number of ticks processed since creation or the last restart.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures a read-only view of the towers with their derived stats.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(world.clock))
                .collect(),
        )
    }

    /// Captures a read-only view of the live enemies.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .map(|enemy| enemy.snapshot(&world.path))
                .collect(),
        )
    }

    /// Snapshot of a single live enemy.
    #[must_use]
    pub fn enemy(world: &World, id: EnemyId) -> Option<EnemySnapshot> {
        world.enemies.get(id).map(|enemy| enemy.snapshot(&world.path))
    }

    /// Number of live enemies.
    #[must_use]
    pub fn live_enemies(world: &World) -> usize {
        world.enemies.len()
    }

    /// Number of projectiles still in flight.
    #[must_use]
    pub fn projectiles_in_flight(world: &World) -> usize {
        world.projectiles.len()
    }

    /// Detailed description of a tower, including its upgrade state.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerDetails> {
        world.towers.get(id).map(|tower| TowerDetails {
            id,
            kind: tower.kind,
            position: tower.position,
            cost: tower.cost,
            tier: tower.tier,
            levels: tower.levels,
            power: tower.power,
            health: tower.health,
            max_health: tower.max_health,
            range: tower.range(),
            damage: tower.damage(),
            cooldown: tower.cooldown(),
            stats: tower.stats,
        })
    }

    /// Every tower's details in identifier order.
    #[must_use]
    pub fn towers(world: &World) -> Vec<TowerDetails> {
        world
            .towers
            .iter()
            .filter_map(|entry| tower(world, entry.id))
            .collect()
    }

    /// Full description of one tower.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct TowerDetails {
        /// Identifier allocated by the world.
        pub id: TowerId,
        /// Kind of tower.
        pub kind: TowerKind,
        /// Centre of the tower.
        pub position: Vec2,
        /// Gold paid for the placement.
        pub cost: u32,
        /// Current tier.
        pub tier: Tier,
        /// Current upgrade levels.
        pub levels: UpgradeLevels,
        /// Installed special power.
        pub power: Option<SpecialPower>,
        /// Remaining health.
        pub health: f32,
        /// Maximum health at the current tier.
        pub max_health: f32,
        /// Effective range.
        pub range: f32,
        /// Effective damage per projectile.
        pub damage: f32,
        /// Effective cooldown between shots.
        pub cooldown: Duration,
        /// Lifetime combat totals.
        pub stats: TowerStats,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::UpgradeAxis;

    fn world() -> World {
        World::new(GameConfig::default(), Difficulty::Normal, 7)
    }

    #[test]
    fn spawned_enemies_start_at_the_path_origin() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SpawnEnemy {
                kind: EnemyKind::Tank,
                wave: 1,
            },
            &mut events,
        )
        .expect("spawn");

        let view = query::enemy_view(&world);
        let tank = view.iter().next().expect("one enemy");
        assert_eq!(tank.position, Vec2::new(0.0, 384.0));
        assert_eq!(tank.health, 150.0);
        assert_eq!(
            events,
            vec![Event::EnemySpawned {
                enemy: EnemyId::new(0),
                kind: EnemyKind::Tank,
                health: 150.0,
                reward: 25,
            }]
        );
    }

    #[test]
    fn rejected_upgrade_neither_spends_nor_mutates() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::PlaceTower {
                kind: TowerKind::Sniper,
                position: Vec2::new(400.0, 300.0),
            },
            &mut events,
        )
        .expect("placement");
        let tower = TowerId::new(0);
        for _ in 0..2 {
            apply(
                &mut world,
                Command::UpgradeTower {
                    tower,
                    request: UpgradeRequest::Axis(UpgradeAxis::Damage),
                },
                &mut events,
            )
            .expect("affordable upgrade");
        }
        assert_eq!(query::ledger(&world).gold(), 0);

        events.clear();
        let result = apply(
            &mut world,
            Command::UpgradeTower {
                tower,
                request: UpgradeRequest::Tier,
            },
            &mut events,
        );
        assert_eq!(
            result,
            Err(ActionError::InsufficientGold {
                required: 200,
                available: 0
            })
        );
        let details = query::tower(&world, tower).expect("tower");
        assert_eq!(details.tier.get(), 1);
        assert_eq!(details.levels.level(UpgradeAxis::Damage), 2);
        assert_eq!(
            events,
            vec![Event::ActionRejected {
                error: ActionError::InsufficientGold {
                    required: 200,
                    available: 0
                }
            }]
        );
    }
}
