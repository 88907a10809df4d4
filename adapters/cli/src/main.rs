#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs a headless Tower Siege game.

mod layout;
mod report;

use std::{cell::RefCell, path::PathBuf, rc::Rc, time::Duration};

use anyhow::{ensure, Context, Result};
use clap::{Parser, ValueEnum};
use layout::TowerPlacement;
use report::{Summary, Tally};
use tower_siege_core::{Difficulty, GameConfig};
use tower_siege_session::{Session, SessionSettings};

/// Command-line arguments accepted by the headless driver.
#[derive(Debug, Parser)]
#[command(name = "tower-siege", about = "Runs a headless Tower Siege game")]
struct CliArgs {
    /// TOML file overriding the built-in tuning.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed for spawn shuffles and item drops.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Difficulty preset.
    #[arg(long, value_enum, default_value_t = DifficultyArg::Normal)]
    difficulty: DifficultyArg,
    /// Simulated milliseconds per tick.
    #[arg(long, default_value_t = 50)]
    tick_ms: u64,
    /// Stop after this many ticks even if the game is still running.
    #[arg(long, default_value_t = 100_000)]
    max_ticks: u64,
    /// Tower to build before the first wave, as KIND@X,Y. Repeatable.
    #[arg(long = "tower", value_name = "KIND@X,Y")]
    towers: Vec<TowerPlacement>,
    /// Print the summary as JSON.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum DifficultyArg {
    Easy,
    Normal,
    Hard,
}

impl From<DifficultyArg> for Difficulty {
    fn from(value: DifficultyArg) -> Self {
        match value {
            DifficultyArg::Easy => Self::Easy,
            DifficultyArg::Normal => Self::Normal,
            DifficultyArg::Hard => Self::Hard,
        }
    }
}

/// Entry point for the Tower Siege command-line interface.
fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = CliArgs::parse();
    ensure!(args.tick_ms > 0, "--tick-ms must be positive");

    let config = match &args.config {
        Some(path) => GameConfig::load(path)
            .with_context(|| format!("failed to load configuration from {}", path.display()))?,
        None => GameConfig::default(),
    };
    let settings = SessionSettings::from_config(&config, args.difficulty.into(), args.seed);
    let mut session = Session::new(config, settings).context("invalid game configuration")?;

    let tally = Rc::new(RefCell::new(Tally::default()));
    let recorder = Rc::clone(&tally);
    let _ = session.subscribe(move |event| recorder.borrow_mut().record(event));

    for placement in &args.towers {
        let tower = session
            .on_placement_requested(placement.kind, placement.position)
            .with_context(|| {
                format!(
                    "could not place {} tower at ({}, {})",
                    placement.kind, placement.position.x, placement.position.y
                )
            })?;
        tracing::debug!(tower = tower.get(), kind = %placement.kind, "tower built");
    }

    let dt = Duration::from_millis(args.tick_ms);
    let mut ticks = 0;
    while ticks < args.max_ticks && !session.phase().is_finished() {
        session.on_tick(dt);
        ticks += 1;
    }

    let events = *tally.borrow();
    let summary = Summary::collect(&session, ticks, events);
    if args.json {
        let json = serde_json::to_string_pretty(&summary).context("failed to encode summary")?;
        println!("{json}");
    } else {
        print!("{summary}");
    }
    Ok(())
}
