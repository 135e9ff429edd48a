//! Open floor: after a miss or pass anyone else may take the question

use super::{Game, GameError, GameResult, Phase};
use super::{OPEN_FLOOR_CORRECT, OPEN_FLOOR_WRONG};
use crate::types::PlayerId;

impl Game {
    /// Players the host may still call on for the open question
    pub fn open_floor_candidates(&self) -> Vec<PlayerId> {
        let Phase::OpenFloor { failed, .. } = &self.phase else {
            return Vec::new();
        };
        let holder = self.current_player().id;

        self.players
            .iter()
            .map(|p| p.id)
            .filter(|id| *id != holder && !self.eliminated.contains(id) && !failed.contains(id))
            .collect()
    }

    /// Rule on one open floor attempt
    pub fn open_floor_attempt(&mut self, player_id: PlayerId, correct: bool) -> GameResult<()> {
        let already_failed = match &self.phase {
            Phase::OpenFloor { failed, .. } => failed.contains(&player_id),
            _ => return Err(self.wrong_phase("judge open floor attempt")),
        };
        if self.player(player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id));
        }
        if already_failed
            || player_id == self.current_player().id
            || self.eliminated.contains(&player_id)
        {
            return Err(GameError::IneligiblePlayer(player_id));
        }

        if correct {
            tracing::info!("Player {} took the open floor", player_id);
            self.award(player_id, OPEN_FLOOR_CORRECT);
            self.advance_turn();
        } else {
            self.penalize(player_id, OPEN_FLOOR_WRONG);
            if let Phase::OpenFloor { failed, .. } = &mut self.phase {
                failed.insert(player_id);
            }
        }
        Ok(())
    }

    /// End an open floor nobody claimed. No points change hands.
    pub fn close_floor(&mut self) -> GameResult<()> {
        if !matches!(self.phase, Phase::OpenFloor { .. }) {
            return Err(self.wrong_phase("close open floor"));
        }
        tracing::info!("Open floor closed unanswered");
        self.advance_turn();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::ArenaVerdict;
    use super::*;

    fn game_on_open_floor(players: usize) -> Game {
        let mut game = game_in_arena(players);
        game.adjudicate(ArenaVerdict::Wrong).unwrap();
        game
    }

    #[test]
    fn test_open_floor_correct_awards_and_advances() {
        let mut game = game_on_open_floor(3);
        game.open_floor_attempt(2, true).unwrap();

        assert_eq!(game.player(2).unwrap().score, 10);
        assert_eq!(game.current_player_index, 1);
        assert_eq!(game.phase, Phase::RoundStart { pending: None });
    }

    #[test]
    fn test_open_floor_miss_bars_retry() {
        let mut game = game_on_open_floor(3);
        game.open_floor_attempt(1, false).unwrap();

        let p = game.player(1).unwrap();
        assert_eq!(p.score, -5);
        assert_eq!(p.wrong_answers, 1);
        assert!(matches!(game.phase, Phase::OpenFloor { .. }));

        let before = game.clone();
        assert_eq!(
            game.open_floor_attempt(1, true),
            Err(GameError::IneligiblePlayer(1))
        );
        assert_eq!(game, before);
        assert_eq!(game.open_floor_candidates(), vec![2]);
    }

    #[test]
    fn test_turn_holder_and_eliminated_cannot_answer() {
        let mut game = game_on_open_floor(4);
        game.eliminate_player(3).unwrap();

        assert_eq!(
            game.open_floor_attempt(0, true),
            Err(GameError::IneligiblePlayer(0))
        );
        assert_eq!(
            game.open_floor_attempt(3, true),
            Err(GameError::IneligiblePlayer(3))
        );
        assert_eq!(
            game.open_floor_attempt(42, true),
            Err(GameError::UnknownPlayer(42))
        );
        assert_eq!(game.open_floor_candidates(), vec![1, 2]);
    }

    #[test]
    fn test_close_floor_advances_without_scoring() {
        let mut game = game_on_open_floor(2);
        game.open_floor_attempt(1, false).unwrap();
        assert!(game.open_floor_candidates().is_empty());

        game.close_floor().unwrap();
        assert_eq!(game.current_player_index, 1);
        assert_eq!(game.player(1).unwrap().score, -5);
        assert_eq!(game.player(0).unwrap().score, -10);
    }
}
