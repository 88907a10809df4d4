#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Siege simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems and
//! presentation layers to react to. Systems consume immutable snapshots such
//! as [`TowerView`] and [`EnemyView`] and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub mod config;
mod error;
pub mod stats;

pub use config::{
    CombatConfig, ConfigError, DifficultyModifiers, EconomyConfig, EnemyDefinition, EnemyStats,
    GameConfig, PlayfieldConfig, TowerDefinition, WaveBand, WaveScaling,
};
pub use error::{ActionError, ErrorKind};
pub use stats::{StatRangeError, Tier, UpgradeLevels};

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an enemy. Identifiers grow in spawn order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EnemyId(u32);

impl EnemyId {
    /// Creates a new enemy identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an in-flight projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectileId(u32);

impl ProjectileId {
    /// Creates a new projectile identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TowerKind {
    /// Cheap single-target tower with a fast cadence.
    Arrow,
    /// Long range single-target tower with heavy, slow shots.
    Sniper,
    /// Area tower that shells every enemy in range.
    Cannon,
    /// Area tower whose projectiles slow their targets.
    Frost,
}

impl TowerKind {
    /// Every tower kind in declaration order.
    pub const ALL: [TowerKind; 4] = [Self::Arrow, Self::Sniper, Self::Cannon, Self::Frost];

    /// Lowercase name used in configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Arrow => "arrow",
            Self::Sniper => "sniper",
            Self::Cannon => "cannon",
            Self::Frost => "frost",
        }
    }
}

impl fmt::Display for TowerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Types of enemies that waves are composed of.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnemyKind {
    /// Baseline enemy.
    Basic,
    /// Fragile but quick enemy.
    Fast,
    /// Slow enemy with a large health pool.
    Tank,
    /// Airborne enemy.
    Flying,
    /// Boss inserted every fifth wave.
    Boss,
}

impl EnemyKind {
    /// Every enemy kind in declaration order.
    pub const ALL: [EnemyKind; 5] = [
        Self::Basic,
        Self::Fast,
        Self::Tank,
        Self::Flying,
        Self::Boss,
    ];

    /// Lowercase name used in configuration files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Fast => "fast",
            Self::Tank => "tank",
            Self::Flying => "flying",
            Self::Boss => "boss",
        }
    }
}

impl fmt::Display for EnemyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a tower selects enemies when it is ready to fire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetingMode {
    /// Fires at the nearest enemy within range.
    Single,
    /// Fires at every enemy within range.
    Area,
}

/// One-time modifier applied to a tower's projectiles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecialPower {
    /// Projectiles ignite their target.
    Fire,
    /// Projectiles slow their target.
    Ice,
    /// Projectiles carry bonus damage.
    Critical,
}

impl fmt::Display for SpecialPower {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fire => "fire",
            Self::Ice => "ice",
            Self::Critical => "critical",
        })
    }
}

/// Effect carried by a projectile when it strikes an enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectileEffect {
    /// Plain damage.
    Normal,
    /// Damage followed by a burn.
    Fire,
    /// Damage followed by a slow.
    Ice,
    /// Damage boosted by the critical power.
    Critical,
}

impl From<SpecialPower> for ProjectileEffect {
    fn from(power: SpecialPower) -> Self {
        match power {
            SpecialPower::Fire => Self::Fire,
            SpecialPower::Ice => Self::Ice,
            SpecialPower::Critical => Self::Critical,
        }
    }
}

/// Independent upgrade tracks available on every tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeAxis {
    /// Shortens the firing cooldown.
    Speed,
    /// Extends the targeting range.
    Range,
    /// Raises the projectile damage.
    Damage,
}

impl UpgradeAxis {
    /// Every upgrade axis in declaration order.
    pub const ALL: [UpgradeAxis; 3] = [Self::Speed, Self::Range, Self::Damage];
}

impl fmt::Display for UpgradeAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Speed => "speed",
            Self::Range => "range",
            Self::Damage => "damage",
        })
    }
}

/// Upgrade purchase requested for a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeRequest {
    /// Raises a single upgrade axis by one level.
    Axis(UpgradeAxis),
    /// Raises the tower tier by one.
    Tier,
    /// Installs a special power.
    Power(SpecialPower),
}

/// Upgrade that was applied to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppliedUpgrade {
    /// Upgrade axis raised to the contained level.
    Axis {
        /// Axis that was raised.
        axis: UpgradeAxis,
        /// Level reached after the upgrade.
        level: u8,
    },
    /// Tier raised to the contained value.
    Tier(Tier),
    /// Special power installed on the tower.
    Power(SpecialPower),
}

/// Difficulty preset selecting a row of the difficulty table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    /// Softer enemies and a larger purse.
    Easy,
    /// Baseline tuning.
    #[default]
    Normal,
    /// Tougher enemies and a smaller purse.
    Hard,
}

impl Difficulty {
    /// Every difficulty in declaration order.
    pub const ALL: [Difficulty; 3] = [Self::Easy, Self::Normal, Self::Hard];
}

/// Group of identical enemies within a wave composition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveGroup {
    /// Enemy type contained in the group.
    pub kind: EnemyKind,
    /// Number of enemies in the group.
    pub count: u32,
}

impl WaveGroup {
    /// Creates a new group.
    #[must_use]
    pub const fn new(kind: EnemyKind, count: u32) -> Self {
        Self { kind, count }
    }
}

/// Composition of a single wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wave {
    number: u32,
    groups: Vec<WaveGroup>,
    total_enemies: u32,
}

impl Wave {
    /// Creates a wave from its groups. The total is recomputed from the groups.
    #[must_use]
    pub fn new(number: u32, groups: Vec<WaveGroup>) -> Self {
        let total_enemies = groups
            .iter()
            .fold(0u32, |total, group| total.saturating_add(group.count));
        Self {
            number,
            groups,
            total_enemies,
        }
    }

    /// One-based wave number.
    #[must_use]
    pub const fn number(&self) -> u32 {
        self.number
    }

    /// Groups composing the wave in generation order.
    #[must_use]
    pub fn groups(&self) -> &[WaveGroup] {
        &self.groups
    }

    /// Sum of all group counts.
    #[must_use]
    pub const fn total_enemies(&self) -> u32 {
        self.total_enemies
    }

    /// Flattens the groups into one entry per enemy, preserving group order.
    #[must_use]
    pub fn flatten(&self) -> Vec<EnemyKind> {
        let mut flattened = Vec::with_capacity(self.total_enemies as usize);
        for group in &self.groups {
            for _ in 0..group.count {
                flattened.push(group.kind);
            }
        }
        flattened
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Advances the ledger's wave counter, applying interest where due.
    AdvanceWave {
        /// Wave number that is about to start.
        wave: u32,
    },
    /// Pays the bonus for clearing the provided wave.
    PayWaveBonus {
        /// Wave that was cleared.
        wave: u32,
    },
    /// Requests that a new enemy enter the path.
    SpawnEnemy {
        /// Type of enemy to create.
        kind: EnemyKind,
        /// Wave the enemy belongs to, used for stat scaling.
        wave: u32,
    },
    /// Requests placement of a tower at the provided position.
    PlaceTower {
        /// Type of tower to construct.
        kind: TowerKind,
        /// Centre of the tower in world units.
        position: Vec2,
    },
    /// Requests an upgrade purchase for an existing tower.
    UpgradeTower {
        /// Tower receiving the upgrade.
        tower: TowerId,
        /// Upgrade being purchased.
        request: UpgradeRequest,
    },
    /// Requests that a tower be sold for a partial refund.
    SellTower {
        /// Tower to sell.
        tower: TowerId,
    },
    /// Applies external damage to a tower.
    DamageTower {
        /// Tower being damaged.
        tower: TowerId,
        /// Amount of health removed.
        amount: f32,
    },
    /// Launches a projectile from a tower at an enemy.
    FireProjectile {
        /// Tower that fires.
        tower: TowerId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
        /// Predicted interception point.
        aim: Vec2,
        /// Damage applied on impact.
        damage: f32,
        /// Effect applied on impact.
        effect: ProjectileEffect,
    },
    /// Reports that the host engine observed an enemy dying.
    ReportEnemyDeath {
        /// Enemy that died.
        enemy: EnemyId,
    },
    /// Reports that the host engine observed an enemy reaching the path end.
    ReportEnemyEscape {
        /// Enemy that escaped.
        enemy: EnemyId,
    },
    /// Resets the world to its starting state.
    Restart,
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Announces that a wave started spawning.
    WaveStarted {
        /// Wave number that started.
        wave: u32,
        /// Groups composing the wave.
        composition: Vec<WaveGroup>,
    },
    /// Announces that every enemy of a wave died or escaped.
    WaveCompleted {
        /// Wave number that completed.
        wave: u32,
    },
    /// Announces that the final configured wave completed.
    AllWavesCompleted,
    /// Confirms that an enemy entered the path.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Wave-scaled maximum health.
        health: f32,
        /// Wave-scaled gold reward.
        reward: u32,
    },
    /// Confirms that an enemy was killed.
    EnemyDied {
        /// Enemy that died.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Gold paid out for the kill.
        reward: u32,
        /// Tower credited with the kill, if any.
        killer: Option<TowerId>,
        /// Position at the time of death.
        position: Vec2,
    },
    /// Confirms that an enemy reached the end of the path.
    EnemyEscaped {
        /// Enemy that escaped.
        enemy: EnemyId,
        /// Type of the enemy.
        kind: EnemyKind,
        /// Lives removed from the player.
        damage: u32,
    },
    /// Announces that a killed enemy dropped an item.
    ItemDropped {
        /// Enemy that dropped the item.
        enemy: EnemyId,
        /// Position where the item fell.
        position: Vec2,
    },
    /// Confirms that a tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Centre of the tower.
        position: Vec2,
        /// Gold spent on the placement.
        cost: u32,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Tower that was sold.
        tower: TowerId,
        /// Gold refunded to the player.
        refund: u32,
    },
    /// Confirms that an upgrade was applied.
    TowerUpgraded {
        /// Tower that was upgraded.
        tower: TowerId,
        /// Upgrade that was applied.
        upgrade: AppliedUpgrade,
        /// Gold spent on the upgrade.
        cost: u32,
    },
    /// Reports damage taken by a tower.
    TowerDamaged {
        /// Tower that took damage.
        tower: TowerId,
        /// Health remaining after the hit.
        health: f32,
    },
    /// Reports that a tower ran out of health.
    TowerDestroyed {
        /// Tower that was destroyed.
        tower: TowerId,
    },
    /// Confirms that a projectile was launched.
    ProjectileFired {
        /// Identifier assigned to the projectile.
        projectile: ProjectileId,
        /// Tower that fired.
        tower: TowerId,
        /// Enemy the projectile homes in on.
        target: EnemyId,
        /// Predicted interception point.
        aim: Vec2,
        /// Effect carried by the projectile.
        effect: ProjectileEffect,
    },
    /// Confirms that a projectile struck its target.
    ProjectileHit {
        /// Projectile that landed.
        projectile: ProjectileId,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Health actually removed by the impact.
        damage: f32,
    },
    /// Reports a change in the player's gold.
    GoldChanged {
        /// Gold after the change.
        new: u32,
        /// Gold before the change.
        old: u32,
    },
    /// Reports a change in the player's lives.
    LivesChanged {
        /// Lives after the change.
        new: u32,
        /// Lives before the change.
        old: u32,
    },
    /// Reports a change in the player's score.
    ScoreChanged {
        /// Score after the change.
        new: u64,
        /// Score before the change.
        old: u64,
    },
    /// Reports interest paid when advancing to a new wave.
    InterestEarned {
        /// Gold paid as interest.
        amount: u32,
    },
    /// Terminal notification emitted once when lives reach zero.
    GameOver {
        /// Score at the moment the game ended.
        final_score: u64,
    },
    /// Reports that a requested action failed.
    ActionRejected {
        /// Reason the action failed.
        error: ActionError,
    },
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// How the tower picks its targets.
    pub targeting: TargetingMode,
    /// Centre of the tower.
    pub position: Vec2,
    /// Derived range in world units.
    pub range: f32,
    /// Derived damage per projectile.
    pub damage: f32,
    /// Projectile travel speed in world units per second.
    pub projectile_speed: f32,
    /// Effect applied by the tower's projectiles.
    pub effect: ProjectileEffect,
    /// Time left until the cooldown elapses; zero when ready.
    pub ready_in: Duration,
}

/// Read-only snapshot describing all towers.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot for the provided tower.
    #[must_use]
    pub fn get(&self, tower: TowerId) -> Option<&TowerSnapshot> {
        self.snapshots
            .binary_search_by_key(&tower, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of towers captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no towers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Identifier assigned to the enemy.
    pub id: EnemyId,
    /// Type of the enemy.
    pub kind: EnemyKind,
    /// Current position in world units.
    pub position: Vec2,
    /// Current velocity in world units per second.
    pub velocity: Vec2,
    /// Remaining health.
    pub health: f32,
    /// Maximum health.
    pub max_health: f32,
    /// Fraction of the path covered, in `0..=1`.
    pub progress: f32,
    /// Whether the enemy flies.
    pub flying: bool,
    /// Whether the enemy is a boss.
    pub boss: bool,
}

/// Read-only snapshot describing all live enemies.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view; snapshots are ordered by identifier.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured enemies in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of enemies captured by the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view contains no enemies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Target assignment produced by the targeting system.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower that should fire.
    pub tower: TowerId,
    /// Enemy selected as the target.
    pub enemy: EnemyId,
    /// Lead position the projectile should be aimed at.
    pub aim: Vec2,
}
