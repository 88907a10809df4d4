//! Authoritative tower state management utilities.

use std::{collections::BTreeMap, time::Duration};

use glam::Vec2;
use tower_siege_core::{
    stats::{effective_cooldown_ms, effective_damage, effective_range},
    ActionError, AppliedUpgrade, ProjectileEffect, SpecialPower, TargetingMode, Tier,
    TowerDefinition, TowerId, TowerKind, TowerSnapshot, UpgradeAxis, UpgradeLevels,
    UpgradeRequest,
};

/// Running totals a tower accumulates over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TowerStats {
    /// Projectiles launched.
    pub shots_fired: u32,
    /// Enemies killed by the tower's projectiles or burns.
    pub kills: u32,
    /// Health removed from enemies.
    pub damage_dealt: f32,
}

/// Tower stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Tower {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) position: Vec2,
    /// Gold paid for the placement; refunds derive from it.
    pub(crate) cost: u32,
    pub(crate) base: TowerDefinition,
    pub(crate) tier: Tier,
    pub(crate) levels: UpgradeLevels,
    pub(crate) power: Option<SpecialPower>,
    pub(crate) last_shot: Option<Duration>,
    pub(crate) health: f32,
    pub(crate) max_health: f32,
    pub(crate) stats: TowerStats,
}

impl Tower {
    pub(crate) fn new(id: TowerId, kind: TowerKind, position: Vec2, base: TowerDefinition) -> Self {
        Self {
            id,
            kind,
            position,
            cost: base.cost,
            base,
            tier: Tier::MIN,
            levels: UpgradeLevels::default(),
            power: None,
            last_shot: None,
            health: base.health,
            max_health: base.health,
            stats: TowerStats::default(),
        }
    }

    pub(crate) fn range(&self) -> f32 {
        effective_range(self.base.range, self.levels.level(UpgradeAxis::Range), self.tier)
    }

    pub(crate) fn damage(&self) -> f32 {
        effective_damage(
            self.base.damage,
            self.levels.level(UpgradeAxis::Damage),
            self.tier,
            self.power,
        )
    }

    pub(crate) fn cooldown(&self) -> Duration {
        let millis = effective_cooldown_ms(
            self.base.cooldown_ms as f32,
            self.levels.level(UpgradeAxis::Speed),
            self.tier,
        );
        // microsecond rounding keeps 600.00002 ms at exactly 600 ms
        Duration::from_micros((f64::from(millis) * 1_000.0).round() as u64)
    }

    pub(crate) fn effect(&self) -> ProjectileEffect {
        self.power.map_or(self.base.effect, ProjectileEffect::from)
    }

    pub(crate) fn targeting(&self) -> TargetingMode {
        self.base.targeting
    }

    /// Time until the tower may fire again; zero when ready or never fired.
    pub(crate) fn ready_in(&self, now: Duration) -> Duration {
        match self.last_shot {
            None => Duration::ZERO,
            Some(last_shot) => self
                .cooldown()
                .saturating_sub(now.saturating_sub(last_shot)),
        }
    }

    pub(crate) fn record_shot(&mut self, now: Duration) {
        self.last_shot = Some(now);
        self.stats.shots_fired = self.stats.shots_fired.saturating_add(1);
    }

    /// Raises one upgrade axis, returning the level reached.
    pub(crate) fn upgrade(&mut self, axis: UpgradeAxis) -> Result<u8, ActionError> {
        self.levels = self
            .levels
            .raised(axis)
            .ok_or(ActionError::MaxLevelReached(axis))?;
        Ok(self.levels.level(axis))
    }

    /// Raises the tier by one and rescales the maximum health.
    ///
    /// Current health keeps its value.
    pub(crate) fn upgrade_tier(&mut self) -> Result<Tier, ActionError> {
        let next = self.tier.next().ok_or(ActionError::MaxTierReached)?;
        self.tier = next;
        self.max_health = self.base.health * next.multiplier();
        Ok(next)
    }

    /// Installs a special power; a tower holds at most one, forever.
    pub(crate) fn set_special_power(&mut self, power: SpecialPower) -> Result<(), ActionError> {
        if let Some(existing) = self.power {
            return Err(ActionError::PowerAlreadySet(existing));
        }
        self.power = Some(power);
        Ok(())
    }

    /// Applies an upgrade request, leaving the tower untouched on failure.
    pub(crate) fn apply_upgrade(
        &mut self,
        request: UpgradeRequest,
    ) -> Result<AppliedUpgrade, ActionError> {
        match request {
            UpgradeRequest::Axis(axis) => self
                .upgrade(axis)
                .map(|level| AppliedUpgrade::Axis { axis, level }),
            UpgradeRequest::Tier => self.upgrade_tier().map(AppliedUpgrade::Tier),
            UpgradeRequest::Power(power) => self
                .set_special_power(power)
                .map(|()| AppliedUpgrade::Power(power)),
        }
    }

    /// Removes health, clamping at zero, and returns what remains.
    pub(crate) fn take_damage(&mut self, amount: f32) -> f32 {
        self.health = (self.health - amount.max(0.0)).max(0.0);
        self.health
    }

    pub(crate) fn snapshot(&self, now: Duration) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            targeting: self.targeting(),
            position: self.position,
            range: self.range(),
            damage: self.damage(),
            projectile_speed: self.base.projectile_speed,
            effect: self.effect(),
            ready_in: self.ready_in(now),
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    pub(crate) fn insert(&mut self, kind: TowerKind, position: Vec2, base: TowerDefinition) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        let _ = self.entries.insert(id, Tower::new(id, kind, position, base));
        id
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    /// First tower whose centre lies closer than `distance` to `position`.
    pub(crate) fn overlapping(&self, position: Vec2, distance: f32) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.position.distance(position) < distance)
            .map(|tower| tower.id)
    }

    /// Towers whose centre lies within `radius` of `origin`, in identifier order.
    pub(crate) fn within(&self, origin: Vec2, radius: f32) -> Vec<TowerId> {
        self.entries
            .values()
            .filter(|tower| tower.position.distance(origin) <= radius)
            .map(|tower| tower.id)
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.next_tower_id = TowerId::new(0);
    }
}
