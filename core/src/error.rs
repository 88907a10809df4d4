//! Failures reported by player and engine actions.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{EnemyId, SpecialPower, TowerId, TowerKind, UpgradeAxis};

/// Broad classification of an [`ActionError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The caller supplied something malformed or referred to something missing.
    InvalidArgument,
    /// The player lacks the gold, slots or headroom the action needs.
    InsufficientResources,
    /// Static configuration is missing an entry for a declared type.
    InvariantViolation,
}

/// Reasons an action can be rejected.
///
/// Every variant renders a short human-readable message through `Display`
/// suitable for a transient on-screen notification.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum ActionError {
    /// Wave numbers start at 1.
    #[error("wave number must be at least 1, got {0}")]
    InvalidWaveNumber(u32),
    /// No tower with the provided identifier exists.
    #[error("tower {} does not exist", .0.get())]
    UnknownTower(TowerId),
    /// No live enemy with the provided identifier exists.
    #[error("enemy {} does not exist", .0.get())]
    UnknownEnemy(EnemyId),
    /// The requested position lies outside the playfield.
    #[error("position ({}, {}) is outside the playfield", .0.x, .0.y)]
    OutOfBounds(Vec2),
    /// The requested position is too close to an existing tower.
    #[error("position overlaps tower {}", .0.get())]
    Occupied(TowerId),
    /// The requested position is too close to the enemy path.
    #[error("towers cannot be placed on the enemy path")]
    OnPath,
    /// A wave is already spawning or still has live enemies.
    #[error("wave {0} is still in progress")]
    WaveInProgress(u32),
    /// The game ended; only a restart is accepted.
    #[error("the game is over")]
    GameOver,
    /// The player cannot afford the action.
    #[error("not enough gold: need {required}, have {available}")]
    InsufficientGold {
        /// Gold the action costs.
        required: u32,
        /// Gold the player holds.
        available: u32,
    },
    /// Every tower slot is taken.
    #[error("all {0} tower slots are in use")]
    NoFreeSlots(usize),
    /// The tower reached the highest tier.
    #[error("tower is already at the maximum tier")]
    MaxTierReached,
    /// The upgrade axis reached its highest level.
    #[error("{0} upgrade is already at the maximum level")]
    MaxLevelReached(UpgradeAxis),
    /// A special power can only be installed once.
    #[error("tower already has the {0} power")]
    PowerAlreadySet(SpecialPower),
    /// Configuration lacks stats for a tower kind.
    #[error("no configuration entry for tower kind {0}")]
    MissingTowerConfig(TowerKind),
    /// Configuration lacks stats for an enemy kind.
    #[error("no configuration entry for enemy kind {0}")]
    MissingEnemyConfig(crate::EnemyKind),
}

impl ActionError {
    /// Classifies the error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidWaveNumber(_)
            | Self::UnknownTower(_)
            | Self::UnknownEnemy(_)
            | Self::OutOfBounds(_)
            | Self::Occupied(_)
            | Self::OnPath
            | Self::WaveInProgress(_)
            | Self::GameOver => ErrorKind::InvalidArgument,
            Self::InsufficientGold { .. }
            | Self::NoFreeSlots(_)
            | Self::MaxTierReached
            | Self::MaxLevelReached(_)
            | Self::PowerAlreadySet(_) => ErrorKind::InsufficientResources,
            Self::MissingTowerConfig(_) | Self::MissingEnemyConfig(_) => {
                ErrorKind::InvariantViolation
            }
        }
    }
}
