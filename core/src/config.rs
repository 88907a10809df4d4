//! Static game configuration.
//!
//! A [`GameConfig`] is constructed once at startup, either from the built-in
//! defaults or from a TOML document, validated, and then handed by reference
//! to every component that needs tuning data. Nothing mutates it afterwards.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ActionError, Difficulty, EnemyKind, ProjectileEffect, TargetingMode, TowerKind};

/// Errors raised while loading or validating a [`GameConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration at {}", path.display())]
    Io {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: io::Error,
    },
    /// The configuration document is not valid TOML for this schema.
    #[error("failed to parse configuration toml")]
    Parse(#[from] toml::de::Error),
    /// The tower table lacks a declared kind.
    #[error("tower table has no entry for {0}")]
    MissingTower(TowerKind),
    /// The enemy table lacks a declared kind.
    #[error("enemy table has no entry for {0}")]
    MissingEnemy(EnemyKind),
    /// The difficulty table lacks a declared preset.
    #[error("difficulty table has no entry for {0:?}")]
    MissingDifficulty(Difficulty),
    /// A value is outside its permitted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Complete static configuration surface.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Base stats per tower kind.
    pub towers: BTreeMap<TowerKind, TowerDefinition>,
    /// Base stats per enemy kind.
    pub enemies: BTreeMap<EnemyKind, EnemyDefinition>,
    /// Wave composition, scaling and pacing.
    pub waves: WaveScaling,
    /// Economy tuning.
    pub economy: EconomyConfig,
    /// Multipliers per difficulty preset.
    pub difficulty: BTreeMap<Difficulty, DifficultyModifiers>,
    /// Status effect and boss ability tuning.
    pub combat: CombatConfig,
    /// Playfield geometry and placement rules.
    pub playfield: PlayfieldConfig,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            towers: default_towers(),
            enemies: default_enemies(),
            waves: WaveScaling::default(),
            economy: EconomyConfig::default(),
            difficulty: default_difficulty(),
            combat: CombatConfig::default(),
            playfield: PlayfieldConfig::default(),
        }
    }
}

impl GameConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// Top-level sections that are omitted keep their defaults; sections that
    /// are present replace the defaults wholesale.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates the configuration file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Checks table completeness and value ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for kind in TowerKind::ALL {
            let definition = self.towers.get(&kind).ok_or(ConfigError::MissingTower(kind))?;
            if definition.cooldown_ms == 0 {
                return invalid(format!("tower {kind} cooldown_ms must be positive"));
            }
            if definition.projectile_speed <= 0.0 {
                return invalid(format!("tower {kind} projectile_speed must be positive"));
            }
            if definition.health <= 0.0 {
                return invalid(format!("tower {kind} health must be positive"));
            }
        }
        for kind in EnemyKind::ALL {
            let definition = self.enemies.get(&kind).ok_or(ConfigError::MissingEnemy(kind))?;
            if definition.health <= 0.0 {
                return invalid(format!("enemy {kind} health must be positive"));
            }
        }
        for difficulty in Difficulty::ALL {
            let _ = self
                .difficulty
                .get(&difficulty)
                .ok_or(ConfigError::MissingDifficulty(difficulty))?;
        }
        self.waves.validate()?;
        self.economy.validate()?;
        self.playfield.validate()
    }

    /// Looks up the base stats for a tower kind.
    pub fn tower(&self, kind: TowerKind) -> Result<&TowerDefinition, ActionError> {
        self.towers
            .get(&kind)
            .ok_or(ActionError::MissingTowerConfig(kind))
    }

    /// Looks up the base stats for an enemy kind.
    pub fn enemy(&self, kind: EnemyKind) -> Result<&EnemyDefinition, ActionError> {
        self.enemies
            .get(&kind)
            .ok_or(ActionError::MissingEnemyConfig(kind))
    }

    /// Modifiers for the provided difficulty, neutral when the table lacks it.
    #[must_use]
    pub fn difficulty(&self, difficulty: Difficulty) -> DifficultyModifiers {
        self.difficulty
            .get(&difficulty)
            .copied()
            .unwrap_or_default()
    }
}

fn invalid(message: String) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message))
}

/// Base stats for one tower kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerDefinition {
    /// Single-target or area targeting.
    pub targeting: TargetingMode,
    /// Damage per projectile before upgrades.
    pub damage: f32,
    /// Targeting range in world units before upgrades.
    pub range: f32,
    /// Milliseconds between shots before upgrades.
    pub cooldown_ms: u32,
    /// Gold cost of placement.
    pub cost: u32,
    /// Structural health at tier 1.
    pub health: f32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Effect carried by projectiles when no special power is installed.
    pub effect: ProjectileEffect,
}

/// Base stats for one enemy kind.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyDefinition {
    /// Health on wave 1.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Lives removed when the enemy escapes.
    pub damage: u32,
    /// Gold paid on wave 1 when the enemy dies.
    pub reward: u32,
    /// Score granted when the enemy dies.
    pub score: u64,
    /// Whether the enemy flies.
    #[serde(default)]
    pub flying: bool,
    /// Whether the enemy has boss abilities.
    #[serde(default)]
    pub boss: bool,
}

impl EnemyDefinition {
    /// Stats of an enemy of this kind spawned in `wave`.
    ///
    /// Health grows by `health_multiplier^(wave - 1)` and the reward by
    /// `gold_multiplier^(wave - 1)`; both are then scaled by the difficulty.
    #[must_use]
    pub fn scaled(
        &self,
        scaling: &WaveScaling,
        modifiers: &DifficultyModifiers,
        wave: u32,
    ) -> EnemyStats {
        let health_growth = WaveScaling::growth(scaling.health_multiplier, wave);
        let gold_growth = WaveScaling::growth(scaling.gold_multiplier, wave);
        EnemyStats {
            health: self.health * health_growth as f32 * modifiers.enemy_health,
            speed: self.speed * modifiers.enemy_speed,
            damage: self.damage,
            reward: floor_u32(
                f64::from(self.reward) * gold_growth * decimal(modifiers.gold_reward),
            ),
            score: self.score,
            flying: self.flying,
            boss: self.boss,
        }
    }
}

/// Wave-scaled stats of a concrete enemy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Maximum health.
    pub health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Lives removed on escape.
    pub damage: u32,
    /// Gold paid on death.
    pub reward: u32,
    /// Score granted on death.
    pub score: u64,
    /// Whether the enemy flies.
    pub flying: bool,
    /// Whether the enemy has boss abilities.
    pub boss: bool,
}

/// Composition band applied to waves up to an inclusive threshold.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveBand {
    /// Highest wave number covered by the band; `None` covers every later wave.
    #[serde(default)]
    pub up_to: Option<u32>,
    /// Fraction of the base count assigned to each enemy kind.
    pub shares: BTreeMap<EnemyKind, f32>,
}

impl WaveBand {
    fn new(up_to: Option<u32>, shares: &[(EnemyKind, f32)]) -> Self {
        Self {
            up_to,
            shares: shares.iter().copied().collect(),
        }
    }

    fn covers(&self, wave: u32) -> bool {
        self.up_to.map_or(true, |limit| wave <= limit)
    }
}

/// Wave composition, scaling and pacing constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveScaling {
    /// Enemies in wave 1 before the band split.
    pub base_enemy_count: u32,
    /// Growth of the enemy count per wave.
    pub count_multiplier: f32,
    /// Growth of enemy health per wave.
    pub health_multiplier: f32,
    /// Growth of enemy gold rewards per wave.
    pub gold_multiplier: f32,
    /// Bosses join every wave divisible by this number.
    pub boss_interval: u32,
    /// From this wave on, two bosses join instead of one.
    pub double_boss_from: u32,
    /// Composition bands ordered by ascending threshold.
    pub bands: Vec<WaveBand>,
    /// Number of waves in a full game.
    pub max_waves: u32,
    /// Milliseconds between individual spawns.
    pub spawn_interval_ms: u32,
    /// Milliseconds before the first wave starts.
    pub initial_delay_ms: u32,
    /// Milliseconds between a wave completing and the next one starting.
    pub inter_wave_delay_ms: u32,
}

impl Default for WaveScaling {
    fn default() -> Self {
        Self {
            base_enemy_count: 10,
            count_multiplier: 1.2,
            health_multiplier: 1.15,
            gold_multiplier: 1.1,
            boss_interval: 5,
            double_boss_from: 15,
            bands: vec![
                WaveBand::new(Some(3), &[(EnemyKind::Basic, 1.0)]),
                WaveBand::new(Some(6), &[(EnemyKind::Basic, 0.6), (EnemyKind::Fast, 0.4)]),
                WaveBand::new(
                    Some(10),
                    &[
                        (EnemyKind::Basic, 0.4),
                        (EnemyKind::Fast, 0.3),
                        (EnemyKind::Tank, 0.3),
                    ],
                ),
                WaveBand::new(
                    Some(15),
                    &[
                        (EnemyKind::Basic, 0.3),
                        (EnemyKind::Fast, 0.3),
                        (EnemyKind::Tank, 0.2),
                        (EnemyKind::Flying, 0.2),
                    ],
                ),
                WaveBand::new(
                    None,
                    &[
                        (EnemyKind::Basic, 0.2),
                        (EnemyKind::Fast, 0.3),
                        (EnemyKind::Tank, 0.3),
                        (EnemyKind::Flying, 0.2),
                    ],
                ),
            ],
            max_waves: 30,
            spawn_interval_ms: 800,
            initial_delay_ms: 3_000,
            inter_wave_delay_ms: 5_000,
        }
    }
}

impl WaveScaling {
    /// Band covering the provided wave number.
    #[must_use]
    pub fn band_for(&self, wave: u32) -> Option<&WaveBand> {
        self.bands.iter().find(|band| band.covers(wave))
    }

    /// Per-wave growth factor `multiplier^(wave - 1)`.
    #[must_use]
    pub fn growth(multiplier: f32, wave: u32) -> f64 {
        let exponent = i32::try_from(wave.saturating_sub(1)).unwrap_or(i32::MAX);
        decimal(multiplier).powi(exponent)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.base_enemy_count == 0 {
            return invalid("waves.base_enemy_count must be positive".to_owned());
        }
        for (name, value) in [
            ("count_multiplier", self.count_multiplier),
            ("health_multiplier", self.health_multiplier),
            ("gold_multiplier", self.gold_multiplier),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return invalid(format!("waves.{name} must be finite and positive"));
            }
        }
        if self.boss_interval == 0 {
            return invalid("waves.boss_interval must be positive".to_owned());
        }
        if self.max_waves == 0 {
            return invalid("waves.max_waves must be positive".to_owned());
        }
        if self.spawn_interval_ms == 0 {
            return invalid("waves.spawn_interval_ms must be positive".to_owned());
        }
        if self.bands.last().map_or(true, |band| band.up_to.is_some()) {
            return invalid("waves.bands must end with an open-ended band".to_owned());
        }
        let mut previous = 0;
        for band in &self.bands {
            if let Some(limit) = band.up_to {
                if limit <= previous {
                    return invalid("waves.bands thresholds must ascend".to_owned());
                }
                previous = limit;
            }
            if band
                .shares
                .values()
                .any(|share| !(0.0..=1.0).contains(share))
            {
                return invalid("waves.bands shares must lie in [0, 1]".to_owned());
            }
        }
        Ok(())
    }
}

/// Economy tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// Fraction of held gold paid as interest when a new wave starts.
    pub interest_rate: f32,
    /// Fraction of the placement cost refunded when selling.
    pub sell_refund: f32,
    /// Axis upgrade cost per level, as a fraction of the placement cost.
    pub upgrade_cost_factor: f32,
    /// Tier upgrade cost per current tier, as a fraction of the placement cost.
    pub tier_cost_factor: f32,
    /// Flat cost of a special power.
    pub special_power_cost: u32,
    /// Flat bonus paid when a wave completes.
    pub wave_clear_bonus: u32,
    /// Additional wave-clear bonus per wave number.
    pub wave_clear_bonus_per_wave: u32,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            interest_rate: 0.1,
            sell_refund: 0.7,
            upgrade_cost_factor: 0.5,
            tier_cost_factor: 1.0,
            special_power_cost: 150,
            wave_clear_bonus: 20,
            wave_clear_bonus_per_wave: 5,
        }
    }
}

impl EconomyConfig {
    /// Gold refunded for selling a tower that cost `cost`.
    #[must_use]
    pub fn refund_for(&self, cost: u32) -> u32 {
        apply_rate(u64::from(cost), self.sell_refund)
    }

    /// Gold required to raise an axis currently at `level`.
    #[must_use]
    pub fn axis_upgrade_cost(&self, tower_cost: u32, level: u8) -> u32 {
        apply_rate(
            u64::from(tower_cost) * u64::from(level + 1),
            self.upgrade_cost_factor,
        )
    }

    /// Gold required to raise a tower currently at `tier`.
    #[must_use]
    pub fn tier_upgrade_cost(&self, tower_cost: u32, tier: u8) -> u32 {
        apply_rate(u64::from(tower_cost) * u64::from(tier), self.tier_cost_factor)
    }

    /// Gold granted when `wave` completes.
    #[must_use]
    pub fn wave_clear_reward(&self, wave: u32) -> u32 {
        self.wave_clear_bonus
            .saturating_add(self.wave_clear_bonus_per_wave.saturating_mul(wave))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("interest_rate", self.interest_rate),
            ("upgrade_cost_factor", self.upgrade_cost_factor),
            ("tier_cost_factor", self.tier_cost_factor),
        ] {
            if !value.is_finite() || value < 0.0 {
                return invalid(format!("economy.{name} must be finite and not negative"));
            }
        }
        if !self.sell_refund.is_finite() || !(0.0..=1.0).contains(&self.sell_refund) {
            return invalid("economy.sell_refund must lie in [0, 1]".to_owned());
        }
        Ok(())
    }
}

/// Fixed-point scale of configured rates: one unit is a basis point.
pub const BASIS_POINTS: u64 = 10_000;

/// Slack allowed below an integer before [`floor_u32`] rounds down.
const FLOOR_TOLERANCE: f64 = 1e-9;

/// Configured rate in basis points, rounded to the nearest point.
///
/// Negative or non-finite rates count as zero.
#[must_use]
pub fn basis_points(rate: f32) -> u64 {
    let points = (f64::from(rate) * BASIS_POINTS as f64).round();
    if points.is_nan() || points <= 0.0 {
        return 0;
    }
    // float-to-int casts saturate
    points as u64
}

/// Configured rate as the decimal it was written as, at basis-point precision.
#[must_use]
pub fn decimal(rate: f32) -> f64 {
    basis_points(rate) as f64 / BASIS_POINTS as f64
}

/// `floor(amount * rate)` in integer arithmetic, saturating at `u32::MAX`.
#[must_use]
pub fn apply_rate(amount: u64, rate: f32) -> u32 {
    let scaled = u128::from(amount) * u128::from(basis_points(rate)) / u128::from(BASIS_POINTS);
    u32::try_from(scaled).unwrap_or(u32::MAX)
}

/// Floors a non-negative amount, saturating at `u32::MAX`.
#[must_use]
pub fn floor_u32(amount: f64) -> u32 {
    if amount.is_nan() || amount <= 0.0 {
        return 0;
    }
    // float-to-int casts saturate
    (amount + FLOOR_TOLERANCE).floor() as u32
}

/// One row of the difficulty table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyModifiers {
    /// Multiplier applied to enemy health.
    pub enemy_health: f32,
    /// Multiplier applied to enemy speed.
    pub enemy_speed: f32,
    /// Multiplier applied to enemy gold rewards.
    pub gold_reward: f32,
    /// Gold at the start of a game.
    pub starting_gold: u32,
    /// Lives at the start of a game.
    pub starting_lives: u32,
}

impl Default for DifficultyModifiers {
    fn default() -> Self {
        Self {
            enemy_health: 1.0,
            enemy_speed: 1.0,
            gold_reward: 1.0,
            starting_gold: 500,
            starting_lives: 20,
        }
    }
}

/// Status effect and boss ability tuning.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Burn damage per second as a fraction of the igniting hit.
    pub burn_fraction: f32,
    /// Milliseconds a burn lasts.
    pub burn_duration_ms: u32,
    /// Speed factor applied while slowed.
    pub slow_factor: f32,
    /// Milliseconds a slow lasts.
    pub slow_duration_ms: u32,
    /// Health regenerated per second by bosses.
    pub boss_regen_per_second: f32,
    /// Milliseconds between boss shockwaves.
    pub boss_shockwave_interval_ms: u32,
    /// Radius of a boss shockwave in world units.
    pub boss_shockwave_radius: f32,
    /// Damage dealt to each tower inside a shockwave.
    pub boss_shockwave_damage: f32,
    /// Probability that a killed non-boss enemy drops an item.
    pub item_drop_chance: f64,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            burn_fraction: 0.2,
            burn_duration_ms: 3_000,
            slow_factor: 0.5,
            slow_duration_ms: 2_000,
            boss_regen_per_second: 5.0,
            boss_shockwave_interval_ms: 6_000,
            boss_shockwave_radius: 120.0,
            boss_shockwave_damage: 25.0,
            item_drop_chance: 0.1,
        }
    }
}

/// Playfield geometry and placement rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayfieldConfig {
    /// Width of the playfield in world units.
    pub width: f32,
    /// Height of the playfield in world units.
    pub height: f32,
    /// Waypoints enemies walk through, from spawn to exit.
    pub path: Vec<Vec2>,
    /// Footprint radius of a tower; towers must be two radii apart.
    pub tower_radius: f32,
    /// Minimum distance between a tower centre and the path.
    pub path_clearance: f32,
    /// Maximum number of towers on the field.
    pub max_towers: usize,
}

impl Default for PlayfieldConfig {
    fn default() -> Self {
        Self {
            width: 1_024.0,
            height: 768.0,
            path: vec![
                Vec2::new(0.0, 384.0),
                Vec2::new(256.0, 384.0),
                Vec2::new(256.0, 160.0),
                Vec2::new(640.0, 160.0),
                Vec2::new(640.0, 600.0),
                Vec2::new(1_024.0, 600.0),
            ],
            tower_radius: 20.0,
            path_clearance: 30.0,
            max_towers: 24,
        }
    }
}

impl PlayfieldConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.path.len() < 2 {
            return invalid("playfield.path needs at least two waypoints".to_owned());
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return invalid("playfield dimensions must be positive".to_owned());
        }
        Ok(())
    }
}

fn default_towers() -> BTreeMap<TowerKind, TowerDefinition> {
    let tower = |targeting, damage, range, cooldown_ms, cost, projectile_speed, effect| {
        TowerDefinition {
            targeting,
            damage,
            range,
            cooldown_ms,
            cost,
            health: 100.0,
            projectile_speed,
            effect,
        }
    };
    BTreeMap::from([
        (
            TowerKind::Arrow,
            tower(TargetingMode::Single, 10.0, 150.0, 1_000, 100, 400.0, ProjectileEffect::Normal),
        ),
        (
            TowerKind::Sniper,
            tower(TargetingMode::Single, 40.0, 300.0, 2_000, 200, 800.0, ProjectileEffect::Normal),
        ),
        (
            TowerKind::Cannon,
            tower(TargetingMode::Area, 25.0, 120.0, 1_500, 150, 300.0, ProjectileEffect::Normal),
        ),
        (
            TowerKind::Frost,
            tower(TargetingMode::Area, 6.0, 100.0, 1_200, 175, 350.0, ProjectileEffect::Ice),
        ),
    ])
}

fn default_enemies() -> BTreeMap<EnemyKind, EnemyDefinition> {
    let enemy = |health, speed, damage, reward, score| EnemyDefinition {
        health,
        speed,
        damage,
        reward,
        score,
        flying: false,
        boss: false,
    };
    BTreeMap::from([
        (EnemyKind::Basic, enemy(50.0, 60.0, 1, 10, 10)),
        (EnemyKind::Fast, enemy(30.0, 120.0, 1, 12, 15)),
        (EnemyKind::Tank, enemy(150.0, 35.0, 2, 25, 30)),
        (
            EnemyKind::Flying,
            EnemyDefinition {
                flying: true,
                ..enemy(40.0, 80.0, 1, 15, 20)
            },
        ),
        (
            EnemyKind::Boss,
            EnemyDefinition {
                boss: true,
                ..enemy(1_000.0, 25.0, 10, 200, 500)
            },
        ),
    ])
}

fn default_difficulty() -> BTreeMap<Difficulty, DifficultyModifiers> {
    BTreeMap::from([
        (
            Difficulty::Easy,
            DifficultyModifiers {
                enemy_health: 0.8,
                enemy_speed: 0.9,
                gold_reward: 1.2,
                starting_gold: 650,
                starting_lives: 30,
            },
        ),
        (Difficulty::Normal, DifficultyModifiers::default()),
        (
            Difficulty::Hard,
            DifficultyModifiers {
                enemy_health: 1.3,
                enemy_speed: 1.1,
                gold_reward: 0.9,
                starting_gold: 400,
                starting_lives: 10,
            },
        ),
    ])
}
