//! Per-question countdown and the forced ruling when it runs out

use super::{ArenaVerdict, Game, Phase};
use crate::types::ChallengeResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TurnTimer {
    /// Seconds granted per question
    pub duration: u32,
    pub remaining: u32,
    pub running: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Nothing is on the clock
    Idle,
    Running { remaining: u32 },
    /// Hit zero on this tick; the timer has already stopped itself
    Expired,
}

impl TurnTimer {
    pub fn new(duration: u32) -> Self {
        Self {
            duration,
            remaining: duration,
            running: false,
        }
    }

    /// Rewind to the full duration and run
    pub fn start(&mut self) {
        self.remaining = self.duration;
        self.running = true;
    }

    /// Rewind to the full duration and halt
    pub fn reset(&mut self) {
        self.remaining = self.duration;
        self.running = false;
    }

    pub fn tick(&mut self) -> TickOutcome {
        if !self.running {
            return TickOutcome::Idle;
        }

        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining: self.remaining,
            }
        }
    }
}

impl Game {
    /// Advance the clock by one second. On expiry the question is ruled wrong for
    /// whoever is answering, exactly as if the host had said so.
    pub fn tick(&mut self) -> TickOutcome {
        let outcome = self.timer.tick();
        if outcome != TickOutcome::Expired {
            return outcome;
        }

        let answering = matches!(
            self.phase,
            Phase::ArenaActive {
                active: Some(_),
                ..
            }
        );
        let defending = matches!(
            self.phase,
            Phase::ChallengeResolve {
                target: Some(_),
                ..
            }
        );

        let forced = if answering {
            self.adjudicate(ArenaVerdict::Wrong)
        } else if defending {
            self.resolve_challenge(ChallengeResult::Wrong)
        } else {
            tracing::warn!("Timer expired during {}, ignoring", self.phase.name());
            return outcome;
        };

        match forced {
            Ok(()) => tracing::info!("Time up, now {}", self.phase.name()),
            Err(e) => tracing::warn!("Forced ruling on expiry was rejected: {}", e),
        }
        outcome
    }
}
