//! Derived tower statistics.
//!
//! Towers only store their base definition, tier, upgrade levels and special
//! power. Every combat-relevant number is recomputed from those inputs with
//! the functions in this module so the stored state can never drift from the
//! formulas.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{SpecialPower, UpgradeAxis};

/// Highest level any upgrade axis can reach.
pub const MAX_UPGRADE_LEVEL: u8 = 5;

/// Cooldown reduction granted by each speed level, as a fraction of the base.
pub const COOLDOWN_REDUCTION_PER_LEVEL: f32 = 0.2;

/// Range added by each range level, in world units.
pub const RANGE_BONUS_PER_LEVEL: f32 = 40.0;

/// Damage added by each damage level, as a fraction of the base.
pub const DAMAGE_BONUS_PER_LEVEL: f32 = 0.3;

/// Extra damage granted by the critical power, as a fraction of the base.
pub const CRITICAL_BONUS: f32 = 0.5;

const TIER_MULTIPLIERS: [f32; 5] = [1.0, 1.25, 1.5, 2.0, 2.5];

/// Tower-wide power level in `1..=5`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Tier(u8);

/// Rejected tier or upgrade level outside its valid range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum StatRangeError {
    /// Tier outside `1..=5`.
    #[error("tier {0} is outside 1..=5")]
    Tier(u8),
    /// Upgrade level above the cap.
    #[error("upgrade level {0} exceeds the cap")]
    Level(u8),
}

impl Tier {
    /// Tier assigned to freshly placed towers.
    pub const MIN: Tier = Tier(1);
    /// Highest reachable tier.
    pub const MAX: Tier = Tier(5);

    /// Creates a tier, returning `None` outside `1..=5`.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if value >= Self::MIN.0 && value <= Self::MAX.0 {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Numeric tier value.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Multiplier applied to damage, range, cooldown and tower health.
    #[must_use]
    pub const fn multiplier(self) -> f32 {
        match self.0 {
            0 | 1 => TIER_MULTIPLIERS[0],
            2 => TIER_MULTIPLIERS[1],
            3 => TIER_MULTIPLIERS[2],
            4 => TIER_MULTIPLIERS[3],
            _ => TIER_MULTIPLIERS[4],
        }
    }

    /// The following tier, or `None` at the cap.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        Self::new(self.0.saturating_add(1))
    }

    /// Reports whether the tier reached the cap.
    #[must_use]
    pub const fn is_max(self) -> bool {
        self.0 == Self::MAX.0
    }
}

impl Default for Tier {
    fn default() -> Self {
        Self::MIN
    }
}

impl TryFrom<u8> for Tier {
    type Error = StatRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(StatRangeError::Tier(value))
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.0
    }
}

/// Per-axis upgrade counters, each in `0..=MAX_UPGRADE_LEVEL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawUpgradeLevels")]
pub struct UpgradeLevels {
    speed: u8,
    range: u8,
    damage: u8,
}

impl UpgradeLevels {
    /// Creates levels from explicit values, returning `None` if any exceeds the cap.
    #[must_use]
    pub const fn new(speed: u8, range: u8, damage: u8) -> Option<Self> {
        if speed > MAX_UPGRADE_LEVEL || range > MAX_UPGRADE_LEVEL || damage > MAX_UPGRADE_LEVEL {
            return None;
        }
        Some(Self {
            speed,
            range,
            damage,
        })
    }

    /// Current level of the provided axis.
    #[must_use]
    pub const fn level(&self, axis: UpgradeAxis) -> u8 {
        match axis {
            UpgradeAxis::Speed => self.speed,
            UpgradeAxis::Range => self.range,
            UpgradeAxis::Damage => self.damage,
        }
    }

    /// Returns the levels with `axis` raised by one, or `None` at the cap.
    #[must_use]
    pub const fn raised(self, axis: UpgradeAxis) -> Option<Self> {
        let current = self.level(axis);
        if current >= MAX_UPGRADE_LEVEL {
            return None;
        }
        let mut next = self;
        match axis {
            UpgradeAxis::Speed => next.speed = current + 1,
            UpgradeAxis::Range => next.range = current + 1,
            UpgradeAxis::Damage => next.damage = current + 1,
        }
        Some(next)
    }
}

#[derive(Deserialize)]
struct RawUpgradeLevels {
    speed: u8,
    range: u8,
    damage: u8,
}

impl TryFrom<RawUpgradeLevels> for UpgradeLevels {
    type Error = StatRangeError;

    fn try_from(raw: RawUpgradeLevels) -> Result<Self, Self::Error> {
        Self::new(raw.speed, raw.range, raw.damage).ok_or(StatRangeError::Level(
            raw.speed.max(raw.range).max(raw.damage),
        ))
    }
}

/// Cooldown between shots in milliseconds.
///
/// `base * (1 - 0.2 * speed) / tier_multiplier`, clamped at zero.
#[must_use]
pub fn effective_cooldown_ms(base_cooldown_ms: f32, speed_level: u8, tier: Tier) -> f32 {
    let reduction = 1.0 - COOLDOWN_REDUCTION_PER_LEVEL * f32::from(speed_level);
    (base_cooldown_ms * reduction / tier.multiplier()).max(0.0)
}

/// Targeting range in world units: `(base + 40 * range) * tier_multiplier`.
#[must_use]
pub fn effective_range(base_range: f32, range_level: u8, tier: Tier) -> f32 {
    (base_range + RANGE_BONUS_PER_LEVEL * f32::from(range_level)) * tier.multiplier()
}

/// Damage per projectile.
///
/// `base * (1 + 0.3 * damage)`, plus `base * 0.5` with the critical power,
/// all scaled by the tier multiplier.
#[must_use]
pub fn effective_damage(
    base_damage: f32,
    damage_level: u8,
    tier: Tier,
    power: Option<SpecialPower>,
) -> f32 {
    let mut damage = base_damage * (1.0 + DAMAGE_BONUS_PER_LEVEL * f32::from(damage_level));
    if power == Some(SpecialPower::Critical) {
        damage += base_damage * CRITICAL_BONUS;
    }
    damage * tier.multiplier()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn tier_multipliers_follow_lookup_table() {
        let expected = [1.0, 1.25, 1.5, 2.0, 2.5];
        for (value, multiplier) in (1..=5).zip(expected) {
            let tier = Tier::new(value).expect("tier in range");
            assert!((tier.multiplier() - multiplier).abs() < f32::EPSILON);
        }
        assert!(Tier::new(0).is_none());
        assert!(Tier::new(6).is_none());
        assert!(Tier::MAX.next().is_none());
        assert!(Tier::MAX.is_max());
    }

    #[test]
    fn out_of_range_tiers_do_not_deserialize() {
        for value in [0u8, 6, u8::MAX] {
            let bytes = bincode::serialize(&value).expect("serialize");
            assert!(bincode::deserialize::<Tier>(&bytes).is_err(), "tier {value}");
        }
        let bytes = bincode::serialize(&3u8).expect("serialize");
        let tier: Tier = bincode::deserialize(&bytes).expect("tier 3");
        assert_eq!(tier.get(), 3);
        assert_eq!(bincode::serialize(&tier).expect("serialize"), bytes);
        assert_eq!(Tier::try_from(0), Err(StatRangeError::Tier(0)));
    }

    #[test]
    fn over_cap_levels_do_not_deserialize() {
        let bytes = bincode::serialize(&(1u8, 6u8, 0u8)).expect("serialize");
        assert!(bincode::deserialize::<UpgradeLevels>(&bytes).is_err());
        let bytes = bincode::serialize(&(1u8, 5u8, 0u8)).expect("serialize");
        let levels: UpgradeLevels = bincode::deserialize(&bytes).expect("levels");
        assert_eq!(levels.level(UpgradeAxis::Range), 5);
    }

    #[test]
    fn speed_two_at_tier_one_shortens_cooldown_to_six_hundred() {
        let cooldown = effective_cooldown_ms(1_000.0, 2, Tier::MIN);
        assert!((cooldown - 600.0).abs() < 1e-3, "cooldown was {cooldown}");
    }

    #[test]
    fn critical_power_adds_half_base_damage() {
        let plain = effective_damage(20.0, 0, Tier::MIN, None);
        let critical = effective_damage(20.0, 0, Tier::MIN, Some(SpecialPower::Critical));
        let fire = effective_damage(20.0, 0, Tier::MIN, Some(SpecialPower::Fire));
        assert!((plain - 20.0).abs() < f32::EPSILON);
        assert!((critical - 30.0).abs() < f32::EPSILON);
        assert!((fire - plain).abs() < f32::EPSILON);
    }

    #[test]
    fn range_scales_with_level_and_tier() {
        let tier = Tier::new(3).expect("tier");
        let range = effective_range(100.0, 2, tier);
        assert!((range - 270.0).abs() < 1e-3);
    }

    #[test]
    fn raising_an_axis_stops_at_the_cap() {
        let mut levels = UpgradeLevels::default();
        for expected in 1..=MAX_UPGRADE_LEVEL {
            levels = levels.raised(UpgradeAxis::Damage).expect("below cap");
            assert_eq!(levels.level(UpgradeAxis::Damage), expected);
        }
        assert!(levels.raised(UpgradeAxis::Damage).is_none());
        assert_eq!(levels.level(UpgradeAxis::Speed), 0);
        assert!(UpgradeLevels::new(6, 0, 0).is_none());
    }

    proptest! {
        #[test]
        fn stats_are_monotonic_in_their_level(
            tier in 1u8..=5,
            level in 0u8..MAX_UPGRADE_LEVEL,
            base in 1.0f32..500.0,
        ) {
            let tier = Tier::new(tier).expect("tier");
            prop_assert!(effective_damage(base, level + 1, tier, None)
                >= effective_damage(base, level, tier, None));
            prop_assert!(effective_range(base, level + 1, tier)
                >= effective_range(base, level, tier));
            prop_assert!(effective_cooldown_ms(base, level + 1, tier)
                <= effective_cooldown_ms(base, level, tier));
        }
    }
}
