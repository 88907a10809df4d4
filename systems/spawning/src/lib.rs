#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawning system responsible for emitting enemy spawn commands.
//!
//! A wave handed to [`Spawning::start`] is flattened and shuffled into a spawn
//! queue. The first enemy leaves immediately; the rest follow one per spawn
//! interval on a repeating logical timer. The system also tracks how many of
//! the wave's enemies are still alive so it can report completion.

use std::{collections::VecDeque, time::Duration};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tower_siege_core::{ActionError, Command, EnemyKind, Wave};
use tower_siege_system_timers::{TimerId, TimerQueue};
use tower_siege_system_wave_generation::spawn_queue;

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    spawn_interval: Duration,
    rng_seed: u64,
}

impl Config {
    /// Creates a new configuration using the provided spawn cadence and seed.
    #[must_use]
    pub const fn new(spawn_interval: Duration, rng_seed: u64) -> Self {
        Self {
            spawn_interval,
            rng_seed,
        }
    }
}

/// Whether the spawner is currently dispatching a queue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpawnState {
    /// No enemies are waiting to be dispatched.
    Idle,
    /// The spawn queue still holds enemies.
    Spawning,
}

/// Pure system that dispatches the enemies of one wave at a fixed cadence.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
    timers: TimerQueue<()>,
    timer: Option<TimerId>,
    state: SpawnState,
    wave: Option<u32>,
    queue: VecDeque<EnemyKind>,
    remaining: u32,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            rng: ChaCha8Rng::seed_from_u64(config.rng_seed),
            timers: TimerQueue::new(),
            timer: None,
            state: SpawnState::Idle,
            wave: None,
            queue: VecDeque::new(),
            remaining: 0,
        }
    }

    /// Begins dispatching `wave`, emitting its first spawn command into `out`.
    ///
    /// Rejected while a previous wave is still spawning or still has live
    /// enemies; the rejected wave is not queued.
    pub fn start(&mut self, wave: &Wave, out: &mut Vec<Command>) -> Result<(), ActionError> {
        if let Some(current) = self.wave_in_progress() {
            tracing::warn!(
                requested = wave.number(),
                current,
                "wave start rejected while another wave is in progress"
            );
            return Err(ActionError::WaveInProgress(current));
        }

        self.queue = spawn_queue(wave, &mut self.rng).into();
        self.remaining = wave.total_enemies();
        self.wave = Some(wave.number());
        self.state = SpawnState::Spawning;
        tracing::debug!(
            wave = wave.number(),
            enemies = self.remaining,
            "spawn queue prepared"
        );

        self.dispatch_next(out);
        if self.state == SpawnState::Spawning {
            self.timer = Some(
                self.timers
                    .schedule_repeating(self.config.spawn_interval, ()),
            );
        }
        Ok(())
    }

    /// Advances the spawn timer, emitting one command per elapsed interval.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Command>) {
        let mut fired = Vec::new();
        self.timers.advance(dt, &mut fired);
        for _ in fired {
            if self.state != SpawnState::Spawning {
                break;
            }
            self.dispatch_next(out);
        }
    }

    /// Records that one enemy of the current wave died or escaped.
    pub fn on_enemy_terminal(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }

    /// Reports whether the current wave is fully dispatched and resolved.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.wave.is_some()
            && self.state == SpawnState::Idle
            && self.queue.is_empty()
            && self.remaining == 0
    }

    /// Returns the completed wave number once, clearing it for the next wave.
    pub fn take_completed(&mut self) -> Option<u32> {
        if !self.is_complete() {
            return None;
        }
        self.wave.take()
    }

    /// Stops dispatching: cancels the spawn timer and drops queued enemies.
    ///
    /// Enemies already spawned still count toward completion. Calling this
    /// again, or after the queue drained on its own, changes nothing.
    pub fn cancel(&mut self) {
        if let Some(timer) = self.timer.take() {
            if self.timers.cancel(timer) {
                tracing::debug!(dropped = self.queue.len(), "spawn timer cancelled");
            }
        }
        let dropped = u32::try_from(self.queue.len()).unwrap_or(u32::MAX);
        self.remaining = self.remaining.saturating_sub(dropped);
        self.queue.clear();
        self.state = SpawnState::Idle;
    }

    /// Forgets every wave and reseeds the shuffle generator.
    pub fn reset(&mut self) {
        self.cancel();
        self.timers.reset();
        self.rng = ChaCha8Rng::seed_from_u64(self.config.rng_seed);
        self.wave = None;
        self.remaining = 0;
    }

    /// Current dispatch state.
    #[must_use]
    pub const fn state(&self) -> SpawnState {
        self.state
    }

    /// Wave currently being dispatched or resolved.
    #[must_use]
    pub const fn wave(&self) -> Option<u32> {
        self.wave
    }

    /// Enemies of the current wave that have not died or escaped yet,
    /// including those still queued.
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Enemies still waiting in the spawn queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    fn wave_in_progress(&self) -> Option<u32> {
        if self.state == SpawnState::Spawning || self.remaining > 0 {
            self.wave
        } else {
            None
        }
    }

    fn dispatch_next(&mut self, out: &mut Vec<Command>) {
        let Some(wave) = self.wave else {
            return;
        };

        if let Some(kind) = self.queue.pop_front() {
            tracing::trace!(wave, %kind, "dispatching enemy");
            out.push(Command::SpawnEnemy { kind, wave });
        }

        if self.queue.is_empty() {
            self.state = SpawnState::Idle;
            if let Some(timer) = self.timer.take() {
                let _ = self.timers.cancel(timer);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tower_siege_core::WaveGroup;

    #[test]
    fn single_enemy_wave_never_arms_the_timer() {
        let mut spawning = Spawning::new(Config::new(Duration::from_millis(500), 3));
        let wave = Wave::new(1, vec![WaveGroup::new(EnemyKind::Basic, 1)]);
        let mut out = Vec::new();

        spawning.start(&wave, &mut out).expect("idle spawner accepts");

        assert_eq!(out.len(), 1);
        assert!(spawning.timer.is_none());
        assert_eq!(spawning.state(), SpawnState::Idle);
        assert!(spawning.timers.is_empty());
    }
}
