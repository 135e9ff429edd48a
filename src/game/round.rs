//! Tournament lifecycle: roster setup, round rollover, eliminations and the final ranking

use super::{default_name, Game, GameError, GameResult, Phase};
use crate::types::{Player, PlayerId, MIN_PLAYERS};
use std::cmp::Reverse;

impl Game {
    /// Replace the placeholder roster and open round 1
    pub fn start_tournament(&mut self, names: Vec<String>) -> GameResult<()> {
        if self.phase != Phase::Setup {
            return Err(self.wrong_phase("start tournament"));
        }
        if names.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers(MIN_PLAYERS));
        }

        let passes = self.config.starting_passes;
        self.players = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let name = name.trim();
                let name = if name.is_empty() {
                    default_name(i)
                } else {
                    name.to_string()
                };
                Player::new(i as PlayerId, name, passes)
            })
            .collect();
        self.round = 1;
        self.current_player_index = 0;
        self.eliminated.clear();
        self.phase = Phase::RoundStart { pending: None };
        self.timer.reset();

        tracing::info!(
            "Tournament {} started with {} players",
            self.id,
            self.players.len()
        );
        Ok(())
    }

    /// Knock a player out of open floor and challenge eligibility until the round ends
    pub fn eliminate_player(&mut self, player_id: PlayerId) -> GameResult<()> {
        if matches!(self.phase, Phase::Setup | Phase::Winner) {
            return Err(self.wrong_phase("eliminate player"));
        }
        if self.player(player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id));
        }
        let on_the_clock = matches!(
            self.phase,
            Phase::ChallengeResolve { target: Some(t), .. } if t == player_id
        );
        if player_id == self.current_player().id
            || on_the_clock
            || self.eliminated.contains(&player_id)
        {
            return Err(GameError::IneligiblePlayer(player_id));
        }

        self.eliminated.insert(player_id);
        tracing::info!("Player {} eliminated for round {}", player_id, self.round);
        Ok(())
    }

    /// Roll over from `RoundEnd` into the next round, or to `Winner` after the last one
    pub fn next_round(&mut self) -> GameResult<()> {
        if self.phase != Phase::RoundEnd {
            return Err(self.wrong_phase("advance round"));
        }

        self.round += 1;
        self.current_player_index = 0;
        self.eliminated.clear();
        self.answer_revealed = false;
        self.timer.reset();

        if self.round > self.config.max_rounds {
            tracing::info!("All {} rounds played", self.config.max_rounds);
            self.phase = Phase::Winner;
        } else {
            tracing::info!("Round {} begins", self.round);
            self.phase = Phase::RoundStart { pending: None };
        }
        Ok(())
    }

    /// End the tournament early from the round summary
    pub fn finish_tournament(&mut self) -> GameResult<()> {
        if self.phase != Phase::RoundEnd {
            return Err(self.wrong_phase("finish tournament"));
        }
        self.timer.reset();
        self.phase = Phase::Winner;
        tracing::info!("Tournament finished after round {}", self.round);
        Ok(())
    }

    /// Highest score first; ties go to fewer wrong answers, then fewer passes used
    pub fn standings(&self) -> Vec<Player> {
        let mut ranked = self.players.clone();
        ranked.sort_by_key(|p| (Reverse(p.score), p.wrong_answers, p.total_passes_used));
        ranked
    }
}
