#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that emits projectile firing commands from targeting data.

use tower_siege_core::{Command, TowerTarget, TowerView};

/// Tower combat system that queues firing commands for ready towers.
#[derive(Debug, Default)]
pub struct TowerCombat {
    scratch: Vec<Command>,
}

impl TowerCombat {
    /// Creates a new tower combat system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits `Command::FireProjectile` entries for towers ready to fire.
    ///
    /// Damage and effect come from the tower snapshot so that upgrades and
    /// special powers apply to every projectile. Area towers produce one
    /// command per assignment within the same tick.
    pub fn handle(&mut self, towers: &TowerView, tower_targets: &[TowerTarget], out: &mut Vec<Command>) {
        if tower_targets.is_empty() || towers.is_empty() {
            return;
        }

        self.scratch.clear();

        for target in tower_targets {
            let Some(snapshot) = towers.get(target.tower) else {
                continue;
            };
            if !snapshot.ready_in.is_zero() {
                continue;
            }
            self.scratch.push(Command::FireProjectile {
                tower: target.tower,
                target: target.enemy,
                aim: target.aim,
                damage: snapshot.damage,
                effect: snapshot.effect,
            });
        }

        if self.scratch.is_empty() {
            return;
        }

        out.reserve(self.scratch.len());
        out.append(&mut self.scratch);
    }
}
