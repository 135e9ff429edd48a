//! The challenge sub-protocol: the turn-holder bets that up to two opponents
//! miss the active question, then answers it themselves.

use super::{defense_reward, final_payout, Game, GameError, GameResult, Phase};
use super::{
    CHALLENGE_MISS, CHALLENGE_MISS_BOUNTY, CHALLENGE_PASS, CHALLENGE_PASS_BOUNTY,
    CHALLENGE_REBUFFED, FINAL_WRONG, MAX_CHALLENGES,
};
use crate::types::{ChallengeRecord, ChallengeResult, PlayerId};
use serde::{Deserialize, Serialize};

/// Bookkeeping for one challenge sub-protocol. Only exists inside the challenge phases.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Challenge {
    /// Opponents that failed so far (0..=MAX_CHALLENGES)
    pub count: u8,
    pub history: Vec<ChallengeRecord>,
}

impl Challenge {
    pub fn has_challenged(&self, player_id: PlayerId) -> bool {
        self.history.iter().any(|r| r.target_id == player_id)
    }

    pub fn can_escalate(&self) -> bool {
        self.count < MAX_CHALLENGES
    }
}

impl Game {
    /// Opponents the turn-holder may still challenge on this question
    pub fn challenge_candidates(&self) -> Vec<PlayerId> {
        let history = self.challenge().map(|c| c.history.as_slice()).unwrap_or_default();
        let holder = self.current_player().id;

        self.players
            .iter()
            .map(|p| p.id)
            .filter(|id| {
                *id != holder
                    && !self.eliminated.contains(id)
                    && !history.iter().any(|r| r.target_id == *id)
            })
            .collect()
    }

    /// Put an opponent on the clock for challenge attempt `count + 1`
    pub fn choose_challenge_target(&mut self, player_id: PlayerId) -> GameResult<()> {
        let challenge = match &self.phase {
            Phase::ChallengeTarget { challenge, .. } => challenge,
            _ => return Err(self.wrong_phase("choose challenge target")),
        };
        if !challenge.can_escalate() {
            return Err(GameError::ChallengeLimit);
        }
        if challenge.has_challenged(player_id) {
            return Err(GameError::AlreadyChallenged(player_id));
        }
        if self.player(player_id).is_none() {
            return Err(GameError::UnknownPlayer(player_id));
        }
        if player_id == self.current_player().id || self.eliminated.contains(&player_id) {
            return Err(GameError::IneligiblePlayer(player_id));
        }

        self.morph(|phase| match phase {
            Phase::ChallengeTarget {
                board,
                active,
                challenge,
            } => Phase::ChallengeResolve {
                board,
                active,
                challenge,
                target: Some(player_id),
            },
            other => other,
        });
        self.timer.start();

        tracing::info!(
            "{} challenges player {}",
            self.current_player().name,
            player_id
        );
        Ok(())
    }

    /// Rule on the targeted opponent's answer
    pub fn resolve_challenge(&mut self, result: ChallengeResult) -> GameResult<()> {
        let (target, attempt) = match &self.phase {
            Phase::ChallengeResolve {
                challenge,
                target: Some(target),
                ..
            } => (*target, challenge.count + 1),
            _ => return Err(self.wrong_phase("resolve challenge")),
        };
        let challenger = self.current_player().id;

        match result {
            ChallengeResult::Correct => {
                self.award(target, defense_reward(attempt));
                self.award(challenger, CHALLENGE_REBUFFED);
                tracing::info!("Player {} fended off challenge {}", target, attempt);
                self.mark_active_used();
                self.advance_turn();
                return Ok(());
            }
            ChallengeResult::Wrong => {
                self.penalize(target, CHALLENGE_MISS);
                self.award(challenger, CHALLENGE_MISS_BOUNTY);
            }
            ChallengeResult::Pass => {
                self.spend_pass(target, CHALLENGE_PASS)?;
                self.award(challenger, CHALLENGE_PASS_BOUNTY);
            }
        }

        if let Phase::ChallengeResolve {
            challenge,
            target: slot,
            ..
        } = &mut self.phase
        {
            challenge.count += 1;
            challenge.history.push(ChallengeRecord {
                target_id: target,
                result,
            });
            *slot = None;
        }
        self.timer.reset();

        tracing::info!("Player {} failed challenge {} ({:?})", target, attempt, result);
        Ok(())
    }

    /// From the banner between challenges, pick another opponent
    pub fn challenge_again(&mut self) -> GameResult<()> {
        match &self.phase {
            Phase::ChallengeResolve {
                challenge,
                target: None,
                ..
            } if challenge.can_escalate() => {}
            Phase::ChallengeResolve { target: None, .. } => return Err(GameError::ChallengeLimit),
            _ => return Err(self.wrong_phase("challenge again")),
        }
        if self.challenge_candidates().is_empty() {
            return Err(GameError::ChallengeLimit);
        }

        self.morph(|phase| match phase {
            Phase::ChallengeResolve {
                board,
                active,
                challenge,
                ..
            } => Phase::ChallengeTarget {
                board,
                active,
                challenge,
            },
            other => other,
        });
        Ok(())
    }

    /// Stop challenging and let the turn-holder answer for the pot
    pub fn proceed_to_final(&mut self) -> GameResult<()> {
        let ready = match &self.phase {
            Phase::ChallengeTarget { challenge, .. }
            | Phase::ChallengeResolve {
                challenge,
                target: None,
                ..
            } => challenge.count > 0,
            _ => false,
        };
        if !ready {
            return Err(self.wrong_phase("proceed to final answer"));
        }

        self.morph(|phase| match phase {
            Phase::ChallengeTarget {
                board,
                active,
                challenge,
            }
            | Phase::ChallengeResolve {
                board,
                active,
                challenge,
                ..
            } => Phase::ChallengeFinal {
                board,
                active,
                challenge,
            },
            other => other,
        });
        self.timer.reset();
        Ok(())
    }

    /// Rule on the challenger's own answer. Either way the turn ends.
    pub fn final_answer(&mut self, correct: bool) -> GameResult<()> {
        let count = match &self.phase {
            Phase::ChallengeFinal { challenge, .. } => challenge.count,
            _ => return Err(self.wrong_phase("judge final answer")),
        };
        let challenger = self.current_player().id;

        if correct {
            self.award(challenger, final_payout(count));
        } else {
            self.penalize(challenger, FINAL_WRONG);
        }
        tracing::info!(
            "Final answer after {} challenge(s): {}",
            count,
            if correct { "correct" } else { "wrong" }
        );

        self.mark_active_used();
        self.advance_turn();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::super::ArenaVerdict;
    use super::*;

    fn game_in_challenge(players: usize) -> Game {
        let mut game = game_in_arena(players);
        game.adjudicate(ArenaVerdict::Challenge).unwrap();
        game
    }

    fn scores(game: &Game) -> Vec<i32> {
        game.players.iter().map(|p| p.score).collect()
    }

    #[test]
    fn test_first_defense_pays_ten() {
        let mut game = game_in_challenge(3);
        game.choose_challenge_target(1).unwrap();
        assert!(game.timer.running);

        game.resolve_challenge(ChallengeResult::Correct).unwrap();
        assert_eq!(scores(&game), vec![-10, 10, 0]);
        assert!(game.challenge().is_none());
        assert_eq!(game.current_player_index, 1);
        assert_eq!(game.used_questions.len(), 1);
    }

    #[test]
    fn test_second_defense_pays_twenty() {
        let mut game = game_in_challenge(3);
        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        assert_eq!(scores(&game), vec![10, -10, 0]);

        game.challenge_again().unwrap();
        game.choose_challenge_target(2).unwrap();
        game.resolve_challenge(ChallengeResult::Correct).unwrap();

        assert_eq!(scores(&game), vec![0, -10, 20]);
        assert!(matches!(game.phase, Phase::RoundStart { .. }));
    }

    #[test]
    fn test_failed_defense_records_history_and_pauses() {
        let mut game = game_in_challenge(3);
        game.choose_challenge_target(2).unwrap();
        game.resolve_challenge(ChallengeResult::Pass).unwrap();

        let challenge = game.challenge().unwrap();
        assert_eq!(challenge.count, 1);
        assert_eq!(
            challenge.history,
            vec![ChallengeRecord {
                target_id: 2,
                result: ChallengeResult::Pass
            }]
        );
        assert!(matches!(
            game.phase,
            Phase::ChallengeResolve { target: None, .. }
        ));
        assert!(!game.timer.running);

        let p = game.player(2).unwrap();
        assert_eq!(p.score, -5);
        assert_eq!(p.passes_left, 1);
        assert_eq!(game.player(0).unwrap().score, 5);
        assert!(game.used_questions.is_empty());
    }

    #[test]
    fn test_defender_pass_without_passes_is_a_no_op() {
        let mut game = game_in_challenge(3);
        game.players[1].passes_left = 0;
        game.choose_challenge_target(1).unwrap();

        let before = game.clone();
        assert_eq!(
            game.resolve_challenge(ChallengeResult::Pass),
            Err(GameError::NoPassesLeft(1))
        );
        assert_eq!(game, before);
    }

    #[test]
    fn test_target_guards() {
        let mut game = game_in_challenge(4);
        game.eliminate_player(3).unwrap();

        let before = game.clone();
        assert_eq!(
            game.choose_challenge_target(0),
            Err(GameError::IneligiblePlayer(0))
        );
        assert_eq!(
            game.choose_challenge_target(3),
            Err(GameError::IneligiblePlayer(3))
        );
        assert_eq!(game, before);

        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.challenge_again().unwrap();
        assert_eq!(
            game.choose_challenge_target(1),
            Err(GameError::AlreadyChallenged(1))
        );
        assert_eq!(game.challenge_candidates(), vec![2]);
    }

    #[test]
    fn test_escalation_stops_after_two_failures() {
        let mut game = game_in_challenge(4);
        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.challenge_again().unwrap();
        game.choose_challenge_target(2).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();

        assert_eq!(game.challenge_again(), Err(GameError::ChallengeLimit));
        game.proceed_to_final().unwrap();
        assert!(matches!(game.phase, Phase::ChallengeFinal { .. }));
    }

    #[test]
    fn test_no_second_challenge_without_another_opponent() {
        let mut game = game_in_challenge(2);
        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();

        let before = game.clone();
        assert_eq!(game.challenge_again(), Err(GameError::ChallengeLimit));
        assert_eq!(game, before);

        game.proceed_to_final().unwrap();
        game.final_answer(true).unwrap();
        assert_eq!(game.player(0).unwrap().score, 30);
    }

    #[test]
    fn test_final_pays_thirty_after_two_failed_opponents() {
        let mut game = game_in_challenge(3);
        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.challenge_again().unwrap();
        game.choose_challenge_target(2).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.proceed_to_final().unwrap();

        let before = game.player(0).unwrap().score;
        game.final_answer(true).unwrap();

        assert_eq!(game.player(0).unwrap().score - before, 30);
        assert_eq!(game.current_player_index, 1);
        assert!(game.challenge().is_none());
        assert_eq!(game.used_questions.len(), 1);
    }

    #[test]
    fn test_wrong_final_costs_ten_and_ends_turn() {
        let mut game = game_in_challenge(2);
        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.proceed_to_final().unwrap();
        game.final_answer(false).unwrap();

        let p = game.player(0).unwrap();
        assert_eq!(p.score, 0);
        assert_eq!(p.wrong_answers, 1);
        assert_eq!(game.current_player_index, 1);
    }

    #[test]
    fn test_cannot_skip_to_final_before_any_failure() {
        let mut game = game_in_challenge(3);
        let before = game.clone();
        assert!(game.proceed_to_final().is_err());
        assert_eq!(game, before);

        game.choose_challenge_target(1).unwrap();
        game.resolve_challenge(ChallengeResult::Wrong).unwrap();
        game.challenge_again().unwrap();
        game.proceed_to_final().unwrap();
        assert!(matches!(game.phase, Phase::ChallengeFinal { .. }));
    }
}
