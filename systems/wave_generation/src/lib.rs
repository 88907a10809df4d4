#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave composition and spawn order generation.

use rand::{seq::SliceRandom, Rng};
use tower_siege_core::{
    config::{apply_rate, floor_u32},
    ActionError, EnemyKind, Wave, WaveGroup, WaveScaling,
};

/// Upper bound on the scaled enemy count of a single wave.
///
/// Counts grow geometrically, so late waves would otherwise ask for
/// hundreds of millions of spawn queue entries.
pub const MAX_BASE_COUNT: u32 = 10_000;

/// Pure system that derives wave compositions from the scaling rules.
#[derive(Clone, Debug)]
pub struct WaveGeneration {
    scaling: WaveScaling,
}

impl WaveGeneration {
    /// Creates a generator that follows the provided scaling rules.
    #[must_use]
    pub fn new(scaling: WaveScaling) -> Self {
        Self { scaling }
    }

    /// Scaling rules the generator follows.
    #[must_use]
    pub fn scaling(&self) -> &WaveScaling {
        &self.scaling
    }

    /// Composes wave `wave_number`.
    ///
    /// The result depends only on the wave number and the scaling rules.
    /// Wave numbers start at 1; zero is rejected.
    pub fn generate(&self, wave_number: u32) -> Result<Wave, ActionError> {
        if wave_number < 1 {
            return Err(ActionError::InvalidWaveNumber(wave_number));
        }

        let base_count = self.base_count(wave_number);
        let mut groups: Vec<WaveGroup> = self
            .scaling
            .band_for(wave_number)
            .map(|band| {
                band.shares
                    .iter()
                    .map(|(kind, share)| {
                        WaveGroup::new(*kind, apply_rate(u64::from(base_count), *share))
                    })
                    .filter(|group| group.count > 0)
                    .collect()
            })
            .unwrap_or_default();

        if groups.is_empty() {
            tracing::debug!(
                wave = wave_number,
                base_count,
                "band split floored to nothing, falling back to a single basic enemy"
            );
            groups.push(WaveGroup::new(EnemyKind::Basic, 1));
        }

        if wave_number % self.scaling.boss_interval == 0 {
            let bosses = if wave_number >= self.scaling.double_boss_from {
                2
            } else {
                1
            };
            groups.push(WaveGroup::new(EnemyKind::Boss, bosses));
        }

        Ok(Wave::new(wave_number, groups))
    }

    /// `floor(base_enemy_count * count_multiplier^(wave - 1))`, capped at
    /// [`MAX_BASE_COUNT`].
    #[must_use]
    pub fn base_count(&self, wave_number: u32) -> u32 {
        let growth = WaveScaling::growth(self.scaling.count_multiplier, wave_number);
        floor_u32(f64::from(self.scaling.base_enemy_count) * growth).min(MAX_BASE_COUNT)
    }
}

/// Flattens the wave into one entry per enemy and shuffles it uniformly.
///
/// The shuffle is a Fisher-Yates pass driven by `rng`, so a seeded generator
/// reproduces the same order.
pub fn spawn_queue<R>(wave: &Wave, rng: &mut R) -> Vec<EnemyKind>
where
    R: Rng + ?Sized,
{
    let mut queue = wave.flatten();
    queue.shuffle(rng);
    queue
}
