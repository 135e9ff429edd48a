//! Point values and the only code paths that touch a player's score, wrong-answer
//! count or passes.

use super::{Game, GameError, GameResult};
use crate::types::PlayerId;

pub const POINTS_CORRECT: i32 = 10;
pub const POINTS_WRONG: i32 = -10;
pub const POINTS_PASS: i32 = -5;

pub const OPEN_FLOOR_CORRECT: i32 = 10;
pub const OPEN_FLOOR_WRONG: i32 = -5;

/// Opponents a challenger may take on for one question
pub const MAX_CHALLENGES: u8 = 2;
/// Opponent fends off the first challenge
pub const DEFENSE_FIRST: i32 = 10;
/// Opponent fends off the second challenge
pub const DEFENSE_SECOND: i32 = 20;
/// Challenger's cost when an opponent defends successfully
pub const CHALLENGE_REBUFFED: i32 = -10;
/// Opponent misses: opponent loses, challenger collects
pub const CHALLENGE_MISS: i32 = -10;
pub const CHALLENGE_MISS_BOUNTY: i32 = 10;
/// Opponent passes: half the stakes of a miss
pub const CHALLENGE_PASS: i32 = -5;
pub const CHALLENGE_PASS_BOUNTY: i32 = 5;

pub const FINAL_BASE: i32 = 10;
pub const FINAL_PER_CHALLENGE: i32 = 10;
pub const FINAL_WRONG: i32 = -10;

/// Reward for the opponent who defends on the given challenge attempt (1-based)
pub fn defense_reward(attempt: u8) -> i32 {
    if attempt == MAX_CHALLENGES {
        DEFENSE_SECOND
    } else {
        DEFENSE_FIRST
    }
}

/// Challenger's payout for a correct final answer after `count` opponents failed
pub fn final_payout(count: u8) -> i32 {
    FINAL_BASE + FINAL_PER_CHALLENGE * i32::from(count)
}

impl Game {
    pub(crate) fn award(&mut self, player_id: PlayerId, delta: i32) {
        if let Some(player) = self.player_mut(player_id) {
            player.score += delta;
        }
    }

    /// Score change for a miss; also counts the wrong answer
    pub(crate) fn penalize(&mut self, player_id: PlayerId, delta: i32) {
        if let Some(player) = self.player_mut(player_id) {
            player.score += delta;
            player.wrong_answers += 1;
        }
    }

    /// Spend one of the player's passes. Fails without touching anything if none remain.
    pub(crate) fn spend_pass(&mut self, player_id: PlayerId, delta: i32) -> GameResult<()> {
        let player = self
            .player_mut(player_id)
            .ok_or(GameError::UnknownPlayer(player_id))?;
        if player.passes_left == 0 {
            return Err(GameError::NoPassesLeft(player_id));
        }

        player.passes_left -= 1;
        player.total_passes_used += 1;
        player.score += delta;
        Ok(())
    }
}
