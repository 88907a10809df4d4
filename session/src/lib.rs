#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Composition root that drives one Tower Siege game.
//!
//! A [`Session`] owns the world together with the pure systems and wires
//! them into the per-tick pipeline:
//!
//! 1. spawns due this tick, then session timers (initial countdown,
//!    inter-wave delay) which may start a wave and its first spawn
//! 2. enemy movement, status effects and projectile hits
//! 3. targeting and firing
//! 4. terminal bookkeeping and the wave-completion check
//!
//! Every event produced along the way is published on the [`EventBus`] once
//! the inbound call finishes.

mod bus;

use std::time::Duration;

use glam::Vec2;
use tower_siege_core::{
    ActionError, Command, ConfigError, Difficulty, EnemyId, Event, GameConfig, TowerId,
    TowerKind, TowerTarget, UpgradeRequest,
};
use tower_siege_system_spawning::{self as spawning, Spawning};
use tower_siege_system_timers::{Fired, TimerId, TimerQueue};
use tower_siege_system_tower_combat::TowerCombat;
use tower_siege_system_tower_targeting::TowerTargeting;
use tower_siege_system_wave_generation::WaveGeneration;
use tower_siege_world::{self as world, query, World};

pub use bus::{EventBus, SubscriptionId};

const SPAWN_SEED_SALT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Tunables of a single session.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSettings {
    /// Difficulty row applied to enemies and the starting purse.
    pub difficulty: Difficulty,
    /// Seed for spawn order shuffles and item drops.
    pub seed: u64,
    /// Delay before the first wave.
    pub initial_delay: Duration,
    /// Delay between a completed wave and the next one.
    pub inter_wave_delay: Duration,
    /// Delay between consecutive spawns within a wave.
    pub spawn_interval: Duration,
    /// Last wave; completing it wins the game.
    pub max_waves: u32,
}

impl SessionSettings {
    /// Reads the timing and wave limit from the configuration.
    #[must_use]
    pub fn from_config(config: &GameConfig, difficulty: Difficulty, seed: u64) -> Self {
        let waves = &config.waves;
        Self {
            difficulty,
            seed,
            initial_delay: Duration::from_millis(u64::from(waves.initial_delay_ms)),
            inter_wave_delay: Duration::from_millis(u64::from(waves.inter_wave_delay_ms)),
            spawn_interval: Duration::from_millis(u64::from(waves.spawn_interval_ms)),
            max_waves: waves.max_waves,
        }
    }
}

/// Coarse lifecycle of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for the countdown before `next_wave`.
    Countdown {
        /// Wave that starts when the countdown ends.
        next_wave: u32,
    },
    /// A wave is spawning or still has live enemies.
    Wave {
        /// Wave in progress.
        number: u32,
    },
    /// Every configured wave was cleared.
    Victory,
    /// The player ran out of lives.
    GameOver,
}

impl Phase {
    /// Reports whether the session stopped simulating.
    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Victory | Self::GameOver)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SessionTimer {
    StartWave(u32),
}

/// One game from the first countdown to victory or defeat.
#[derive(Debug)]
pub struct Session {
    settings: SessionSettings,
    world: World,
    generation: WaveGeneration,
    spawning: Spawning,
    targeting: TowerTargeting,
    combat: TowerCombat,
    timers: TimerQueue<SessionTimer>,
    countdown: Option<TimerId>,
    phase: Phase,
    bus: EventBus,
    pending: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<TowerTarget>,
}

impl Session {
    /// Validates the configuration and arms the countdown to wave 1.
    pub fn new(config: GameConfig, settings: SessionSettings) -> Result<Self, ConfigError> {
        config.validate()?;
        let generation = WaveGeneration::new(config.waves.clone());
        let world = World::new(config, settings.difficulty, settings.seed);
        let spawning = Spawning::new(spawning::Config::new(
            settings.spawn_interval,
            settings.seed ^ SPAWN_SEED_SALT,
        ));
        let mut session = Self {
            settings,
            world,
            generation,
            spawning,
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(),
            timers: TimerQueue::new(),
            countdown: None,
            phase: Phase::Countdown { next_wave: 1 },
            bus: EventBus::new(),
            pending: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
        };
        session.arm_countdown(1, settings.initial_delay);
        Ok(session)
    }

    /// Registers a listener for every event the session publishes.
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Removes a listener. Returns `false` if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Settings the session runs with.
    #[must_use]
    pub const fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Read-only access to the simulated world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// Enemies of the current wave that are queued or alive.
    #[must_use]
    pub fn remaining_enemies(&self) -> u32 {
        self.spawning.remaining()
    }

    /// Advances the simulation by `dt`.
    ///
    /// Does nothing once the session reached victory or game over.
    pub fn on_tick(&mut self, dt: Duration) {
        if self.phase.is_finished() {
            return;
        }

        self.spawning.advance(dt, &mut self.commands);
        self.dispatch_queued();

        let mut fired = Vec::new();
        self.timers.advance(dt, &mut fired);
        for Fired { payload, .. } in fired {
            match payload {
                SessionTimer::StartWave(wave) => {
                    self.countdown = None;
                    if let Err(error) = self.start_wave(wave) {
                        tracing::error!(%error, wave, "scheduled wave failed to start");
                    }
                }
            }
        }

        let _ = self.dispatch(Command::Tick { dt });

        if !self.phase.is_finished() {
            let towers = query::tower_view(&self.world);
            let enemies = query::enemy_view(&self.world);
            self.targeting.handle(&towers, &enemies, &mut self.targets);
            self.combat.handle(&towers, &self.targets, &mut self.commands);
            self.dispatch_queued();
        }

        self.finish();
    }

    /// Reports that the host observed `enemy` dying.
    pub fn on_enemy_died(&mut self, enemy: EnemyId) -> Result<(), ActionError> {
        let result = self.dispatch(Command::ReportEnemyDeath { enemy });
        self.finish();
        result
    }

    /// Reports that the host observed `enemy` reaching the end of the path.
    pub fn on_enemy_reached_end(&mut self, enemy: EnemyId) -> Result<(), ActionError> {
        let result = self.dispatch(Command::ReportEnemyEscape { enemy });
        self.finish();
        result
    }

    /// Places a tower paid from the ledger's gold and returns its identifier.
    pub fn on_placement_requested(
        &mut self,
        kind: TowerKind,
        position: Vec2,
    ) -> Result<TowerId, ActionError> {
        let placed = world::place_tower(&mut self.world, kind, position, &mut self.pending);
        self.finish();
        placed
    }

    /// Buys an axis upgrade, a tier-up or a special power for `tower`.
    pub fn on_upgrade_requested(
        &mut self,
        tower: TowerId,
        request: UpgradeRequest,
    ) -> Result<(), ActionError> {
        let result = self.dispatch(Command::UpgradeTower { tower, request });
        self.finish();
        result
    }

    /// Sells `tower` for a partial refund.
    pub fn on_sell_requested(&mut self, tower: TowerId) -> Result<(), ActionError> {
        let result = self.dispatch(Command::SellTower { tower });
        self.finish();
        result
    }

    /// Applies external damage to `tower`.
    pub fn on_tower_damaged(&mut self, tower: TowerId, amount: f32) -> Result<(), ActionError> {
        let result = self.dispatch(Command::DamageTower { tower, amount });
        self.finish();
        result
    }

    /// Starts the pending wave without waiting for its countdown.
    ///
    /// Rejected while a wave is in progress or once the game finished.
    pub fn skip_to_next_wave(&mut self) -> Result<u32, ActionError> {
        let result = match self.phase {
            Phase::Countdown { next_wave } => {
                let started = self.start_wave(next_wave).map(|()| next_wave);
                if started.is_ok() {
                    if let Some(timer) = self.countdown.take() {
                        let _ = self.timers.cancel(timer);
                    }
                }
                started
            }
            Phase::Wave { number } => Err(ActionError::WaveInProgress(number)),
            Phase::Victory | Phase::GameOver => Err(ActionError::GameOver),
        };
        if let Err(error) = &result {
            tracing::warn!(%error, "wave skip rejected");
            self.pending.push(Event::ActionRejected {
                error: error.clone(),
            });
        }
        self.finish();
        result
    }

    /// Resets the world and the wave lifecycle to the first countdown.
    pub fn restart(&mut self) {
        let _ = self.dispatch(Command::Restart);
        self.spawning.reset();
        self.timers.reset();
        self.countdown = None;
        self.phase = Phase::Countdown { next_wave: 1 };
        self.arm_countdown(1, self.settings.initial_delay);
        tracing::info!("session restarted");
        self.finish();
    }

    fn arm_countdown(&mut self, wave: u32, delay: Duration) {
        self.countdown = Some(self.timers.schedule(delay, SessionTimer::StartWave(wave)));
        self.phase = Phase::Countdown { next_wave: wave };
    }

    fn start_wave(&mut self, number: u32) -> Result<(), ActionError> {
        let wave = self.generation.generate(number)?;
        let mut spawns = Vec::new();
        self.spawning.start(&wave, &mut spawns)?;

        self.phase = Phase::Wave { number };
        let _ = self.dispatch(Command::AdvanceWave { wave: number });
        tracing::info!(
            wave = number,
            enemies = wave.total_enemies(),
            "wave started"
        );
        self.pending.push(Event::WaveStarted {
            wave: number,
            composition: wave.groups().to_vec(),
        });
        self.commands.extend(spawns);
        self.dispatch_queued();
        Ok(())
    }

    fn dispatch_queued(&mut self) {
        let queued = std::mem::take(&mut self.commands);
        for command in queued {
            let _ = self.dispatch(command);
        }
    }

    /// Applies one command and updates the bookkeeping that depends on its
    /// events.
    fn dispatch(&mut self, command: Command) -> Result<(), ActionError> {
        let spawn = matches!(command, Command::SpawnEnemy { .. });
        let start = self.pending.len();
        let result = world::apply(&mut self.world, command, &mut self.pending);
        if spawn && result.is_err() {
            // the enemy never existed, so it can no longer hold the wave open
            self.spawning.on_enemy_terminal();
        }

        let mut game_over = false;
        for event in &self.pending[start..] {
            match event {
                Event::EnemyDied { .. } | Event::EnemyEscaped { .. } => {
                    self.spawning.on_enemy_terminal();
                }
                Event::GameOver { .. } => game_over = true,
                _ => {}
            }
        }
        if game_over {
            self.enter_game_over();
        }
        result
    }

    fn enter_game_over(&mut self) {
        self.phase = Phase::GameOver;
        self.spawning.cancel();
        if let Some(timer) = self.countdown.take() {
            let _ = self.timers.cancel(timer);
        }
        tracing::info!(
            score = query::ledger(&self.world).score(),
            "game over"
        );
    }

    fn check_completion(&mut self) {
        if self.phase.is_finished() {
            return;
        }
        let Some(wave) = self.spawning.take_completed() else {
            return;
        };

        tracing::info!(wave, "wave completed");
        self.pending.push(Event::WaveCompleted { wave });
        let _ = self.dispatch(Command::PayWaveBonus { wave });

        if wave >= self.settings.max_waves {
            self.phase = Phase::Victory;
            tracing::info!(waves = wave, "all waves completed");
            self.pending.push(Event::AllWavesCompleted);
        } else {
            self.arm_countdown(wave + 1, self.settings.inter_wave_delay);
        }
    }

    fn finish(&mut self) {
        self.check_completion();
        for event in std::mem::take(&mut self.pending) {
            self.bus.publish(&event);
        }
    }
}
