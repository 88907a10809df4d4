//! Gold, lives, score and wave counters of the player.

use tower_siege_core::{config::apply_rate, Event};

/// Economy ledger tracking the player's resources.
///
/// Every mutation reports the change through the provided event buffer.
/// Lives are clamped at zero and the transition to zero emits
/// [`Event::GameOver`] exactly once.
#[derive(Clone, Debug, PartialEq)]
pub struct Ledger {
    gold: u32,
    lives: u32,
    score: u64,
    wave: u32,
    interest_rate: f32,
    game_over: bool,
}

impl Ledger {
    /// Creates a ledger holding the starting resources.
    #[must_use]
    pub fn new(starting_gold: u32, starting_lives: u32, interest_rate: f32) -> Self {
        Self {
            gold: starting_gold,
            lives: starting_lives,
            score: 0,
            wave: 0,
            interest_rate,
            game_over: starting_lives == 0,
        }
    }

    /// Gold currently held.
    #[must_use]
    pub const fn gold(&self) -> u32 {
        self.gold
    }

    /// Lives left.
    #[must_use]
    pub const fn lives(&self) -> u32 {
        self.lives
    }

    /// Accumulated score.
    #[must_use]
    pub const fn score(&self) -> u64 {
        self.score
    }

    /// Last wave number recorded; zero before the first wave.
    #[must_use]
    pub const fn wave(&self) -> u32 {
        self.wave
    }

    /// Reports whether the lives ran out.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Debits `amount` if the player can afford it.
    ///
    /// Returns `false` and leaves the ledger untouched otherwise.
    pub fn spend_gold(&mut self, amount: u32, out: &mut Vec<Event>) -> bool {
        if self.gold < amount {
            return false;
        }
        self.set_gold(self.gold - amount, out);
        true
    }

    /// Credits `amount` gold.
    pub fn add_gold(&mut self, amount: u32, out: &mut Vec<Event>) {
        self.set_gold(self.gold.saturating_add(amount), out);
    }

    /// Adds `amount` to the score.
    pub fn add_score(&mut self, amount: u64, out: &mut Vec<Event>) {
        let old = self.score;
        self.score = self.score.saturating_add(amount);
        if self.score != old {
            out.push(Event::ScoreChanged {
                new: self.score,
                old,
            });
        }
    }

    /// Removes `amount` lives, clamping at zero.
    pub fn take_damage(&mut self, amount: u32, out: &mut Vec<Event>) {
        let old = self.lives;
        self.lives = self.lives.saturating_sub(amount);
        if self.lives != old {
            out.push(Event::LivesChanged {
                new: self.lives,
                old,
            });
        }
        if self.lives == 0 && !self.game_over {
            self.game_over = true;
            tracing::info!(final_score = self.score, "lives exhausted");
            out.push(Event::GameOver {
                final_score: self.score,
            });
        }
    }

    /// Records the wave about to start.
    ///
    /// Advancing to a wave past the first pays `floor(gold * interest_rate)`.
    pub fn set_wave_number(&mut self, wave: u32, out: &mut Vec<Event>) {
        let advancing = wave > self.wave;
        self.wave = wave;
        if !advancing || wave <= 1 {
            return;
        }

        let interest = apply_rate(u64::from(self.gold), self.interest_rate);
        if interest == 0 {
            return;
        }
        self.add_gold(interest, out);
        tracing::debug!(wave, interest, "interest paid");
        out.push(Event::InterestEarned { amount: interest });
    }

    /// Restores the starting resources, reporting every counter that moved.
    pub fn reset(&mut self, starting_gold: u32, starting_lives: u32, out: &mut Vec<Event>) {
        self.set_gold(starting_gold, out);

        let old_lives = self.lives;
        self.lives = starting_lives;
        if self.lives != old_lives {
            out.push(Event::LivesChanged {
                new: self.lives,
                old: old_lives,
            });
        }

        let old_score = self.score;
        self.score = 0;
        if old_score != 0 {
            out.push(Event::ScoreChanged { new: 0, old: old_score });
        }

        self.wave = 0;
        self.game_over = starting_lives == 0;
    }

    fn set_gold(&mut self, gold: u32, out: &mut Vec<Event>) {
        let old = self.gold;
        self.gold = gold;
        if gold != old {
            out.push(Event::GoldChanged { new: gold, old });
        }
    }
}
