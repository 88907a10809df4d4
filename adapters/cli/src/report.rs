use std::fmt;

use serde::Serialize;
use tower_siege_core::Event;
use tower_siege_session::{Phase, Session};
use tower_siege_world::query;

/// How a headless run ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum Outcome {
    /// Every configured wave was cleared.
    Victory,
    /// The player ran out of lives.
    GameOver,
    /// The tick limit was reached first.
    TickLimit,
}

impl Outcome {
    pub(crate) fn of(phase: Phase) -> Self {
        match phase {
            Phase::Victory => Self::Victory,
            Phase::GameOver => Self::GameOver,
            Phase::Countdown { .. } | Phase::Wave { .. } => Self::TickLimit,
        }
    }
}

/// Counts of the events observed on the session bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub(crate) struct Tally {
    pub(crate) waves_completed: u32,
    pub(crate) enemies_spawned: u32,
    pub(crate) enemies_killed: u32,
    pub(crate) enemies_escaped: u32,
    pub(crate) items_dropped: u32,
    pub(crate) projectiles_fired: u32,
    pub(crate) towers_destroyed: u32,
    pub(crate) interest_earned: u32,
    pub(crate) actions_rejected: u32,
}

impl Tally {
    pub(crate) fn record(&mut self, event: &Event) {
        match event {
            Event::WaveCompleted { .. } => self.waves_completed += 1,
            Event::EnemySpawned { .. } => self.enemies_spawned += 1,
            Event::EnemyDied { .. } => self.enemies_killed += 1,
            Event::EnemyEscaped { .. } => self.enemies_escaped += 1,
            Event::ItemDropped { .. } => self.items_dropped += 1,
            Event::ProjectileFired { .. } => self.projectiles_fired += 1,
            Event::TowerDestroyed { .. } => self.towers_destroyed += 1,
            Event::InterestEarned { amount } => self.interest_earned += amount,
            Event::ActionRejected { .. } => self.actions_rejected += 1,
            _ => {}
        }
    }
}

/// Final state of one surviving tower.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct TowerSummary {
    pub(crate) id: u32,
    pub(crate) kind: String,
    pub(crate) position: [f32; 2],
    pub(crate) tier: u8,
    pub(crate) shots_fired: u32,
    pub(crate) kills: u32,
    pub(crate) damage_dealt: f32,
}

/// Everything printed at the end of a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Summary {
    pub(crate) outcome: Outcome,
    pub(crate) seed: u64,
    pub(crate) ticks: u64,
    pub(crate) elapsed_secs: f32,
    pub(crate) wave: u32,
    pub(crate) gold: u32,
    pub(crate) lives: u32,
    pub(crate) score: u64,
    pub(crate) events: Tally,
    pub(crate) towers: Vec<TowerSummary>,
}

impl Summary {
    pub(crate) fn collect(session: &Session, ticks: u64, events: Tally) -> Self {
        let world = session.world();
        let ledger = query::ledger(world);
        let towers = query::towers(world)
            .into_iter()
            .map(|tower| TowerSummary {
                id: tower.id.get(),
                kind: tower.kind.name().to_owned(),
                position: tower.position.to_array(),
                tier: tower.tier.get(),
                shots_fired: tower.stats.shots_fired,
                kills: tower.stats.kills,
                damage_dealt: tower.stats.damage_dealt,
            })
            .collect();

        Self {
            outcome: Outcome::of(session.phase()),
            seed: session.settings().seed,
            ticks,
            elapsed_secs: query::clock(world).as_secs_f32(),
            wave: ledger.wave(),
            gold: ledger.gold(),
            lives: ledger.lives(),
            score: ledger.score(),
            events,
            towers,
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Outcome::Victory => "victory",
            Outcome::GameOver => "game over",
            Outcome::TickLimit => "tick limit reached",
        };
        writeln!(
            f,
            "{outcome} after {} ticks ({:.1}s, seed {})",
            self.ticks, self.elapsed_secs, self.seed
        )?;
        writeln!(
            f,
            "wave {}  gold {}  lives {}  score {}",
            self.wave, self.gold, self.lives, self.score
        )?;
        let events = &self.events;
        writeln!(
            f,
            "enemies: {} spawned, {} killed, {} escaped, {} items dropped",
            events.enemies_spawned,
            events.enemies_killed,
            events.enemies_escaped,
            events.items_dropped
        )?;
        writeln!(
            f,
            "waves cleared {}  projectiles {}  interest {}  rejected actions {}",
            events.waves_completed,
            events.projectiles_fired,
            events.interest_earned,
            events.actions_rejected
        )?;
        for tower in &self.towers {
            writeln!(
                f,
                "  tower {:>3} {:<6} at ({:.0}, {:.0}) tier {}: {} shots, {} kills, {:.0} damage",
                tower.id,
                tower.kind,
                tower.position[0],
                tower.position[1],
                tower.tier,
                tower.shots_fired,
                tower.kills,
                tower.damage_dealt
            )?;
        }
        if events.towers_destroyed > 0 {
            writeln!(f, "  {} towers destroyed", events.towers_destroyed)?;
        }
        Ok(())
    }
}
