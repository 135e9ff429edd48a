//! Category pick, question staging and the current player's own attempt

use super::{Board, Challenge, Game, GameError, GameResult, Phase};
use super::{POINTS_CORRECT, POINTS_PASS, POINTS_WRONG};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Host's ruling on the turn-holder's attempt at the active question
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArenaVerdict {
    Correct,
    Wrong,
    Pass,
    Challenge,
}

/// Identifies one question fetch. A completion is only merged while the game is
/// still waiting on this exact ticket.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FetchTicket {
    pub game_id: GameId,
    pub seq: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingFetch {
    pub ticket: FetchTicket,
    pub category: Category,
}

impl Game {
    /// Lock in a category for the current player and enter the loading state.
    /// The caller runs the provider and reports back with the returned ticket.
    pub fn begin_fetch(&mut self, category: Category) -> GameResult<FetchTicket> {
        match &self.phase {
            Phase::RoundStart { pending: None } => {}
            Phase::RoundStart { pending: Some(_) } => return Err(GameError::Loading),
            _ => return Err(self.wrong_phase("select category")),
        }

        self.fetch_seq += 1;
        let ticket = FetchTicket {
            game_id: self.id.clone(),
            seq: self.fetch_seq,
        };
        self.phase = Phase::RoundStart {
            pending: Some(PendingFetch {
                ticket: ticket.clone(),
                category,
            }),
        };
        self.timer.reset();

        tracing::info!(
            "{} picked {} (fetch #{})",
            self.current_player().name,
            category,
            ticket.seq
        );
        Ok(ticket)
    }

    /// Resolve the pending fetch's category, or reject a completion that no longer applies
    fn claim_fetch(&self, ticket: &FetchTicket) -> GameResult<Category> {
        match &self.phase {
            Phase::RoundStart {
                pending: Some(pending),
            } if pending.ticket == *ticket => Ok(pending.category),
            _ => Err(GameError::StaleBatch(ticket.seq)),
        }
    }

    /// Stage a fetched batch. Questions already shown this tournament are dropped
    /// unless that would leave nothing to play.
    pub fn install_batch(&mut self, ticket: &FetchTicket, batch: Vec<Question>) -> GameResult<()> {
        let category = self.claim_fetch(ticket)?;

        if batch.is_empty() {
            self.phase = Phase::RoundStart { pending: None };
            return Err(GameError::ProviderFailure(
                "provider returned an empty batch".to_string(),
            ));
        }

        let fresh: Vec<Question> = batch
            .iter()
            .filter(|q| !self.used_questions.contains(&q.text))
            .cloned()
            .collect();

        let questions = if fresh.is_empty() {
            tracing::warn!(
                "Every {} question was already used, replaying the full batch",
                category
            );
            batch
        } else {
            fresh
        };

        self.phase = Phase::ArenaActive {
            board: Board {
                category,
                questions,
            },
            active: None,
        };
        self.timer.reset();
        Ok(())
    }

    /// Drop the loading state after a provider failure so the host can pick again
    pub fn abandon_fetch(&mut self, ticket: &FetchTicket) -> GameResult<()> {
        self.claim_fetch(ticket)?;
        self.phase = Phase::RoundStart { pending: None };
        Ok(())
    }

    /// Back out of a staged batch before any question was opened
    pub fn reselect_category(&mut self) -> GameResult<()> {
        if !matches!(self.phase, Phase::ArenaActive { active: None, .. }) {
            return Err(self.wrong_phase("reselect category"));
        }
        self.phase = Phase::RoundStart { pending: None };
        self.timer.reset();
        Ok(())
    }

    /// Open one staged question and start the clock
    pub fn select_question(&mut self, index: usize) -> GameResult<()> {
        let staged = match &self.phase {
            Phase::ArenaActive {
                board,
                active: None,
            } => board.questions.len(),
            _ => return Err(self.wrong_phase("select question")),
        };
        if index >= staged {
            return Err(GameError::InvalidQuestionIndex(index));
        }

        if let Phase::ArenaActive { active, .. } = &mut self.phase {
            *active = Some(index);
        }
        self.answer_revealed = false;
        self.timer.start();
        Ok(())
    }

    /// Rule on the turn-holder's attempt at the active question
    pub fn adjudicate(&mut self, verdict: ArenaVerdict) -> GameResult<()> {
        let active = match &self.phase {
            Phase::ArenaActive {
                active: Some(active),
                ..
            } => *active,
            _ => return Err(self.wrong_phase("adjudicate")),
        };
        let player_id = self.current_player().id;
        let name = self.current_player().name.clone();
        if verdict == ArenaVerdict::Challenge && self.challenge_candidates().is_empty() {
            return Err(GameError::ChallengeLimit);
        }

        match verdict {
            ArenaVerdict::Correct => {
                self.mark_active_used();
                self.award(player_id, POINTS_CORRECT);
                self.advance_turn();
            }
            ArenaVerdict::Wrong => {
                self.mark_active_used();
                self.penalize(player_id, POINTS_WRONG);
                self.open_floor(active);
            }
            ArenaVerdict::Pass => {
                self.spend_pass(player_id, POINTS_PASS)?;
                self.mark_active_used();
                self.open_floor(active);
            }
            ArenaVerdict::Challenge => {
                self.morph(|phase| match phase {
                    Phase::ArenaActive { board, .. } => Phase::ChallengeTarget {
                        board,
                        active,
                        challenge: Challenge::default(),
                    },
                    other => other,
                });
                self.timer.reset();
            }
        }

        tracing::info!(
            "{} ruled {:?}, now {}",
            name,
            verdict,
            self.phase.name()
        );
        Ok(())
    }

    fn open_floor(&mut self, active: usize) {
        self.morph(|phase| match phase {
            Phase::ArenaActive { board, .. } => Phase::OpenFloor {
                board,
                active,
                failed: BTreeSet::new(),
            },
            other => other,
        });
        self.timer.reset();
    }

    /// Show the host the answer to the active question. Only sets the reveal flag.
    pub fn reveal_answer(&mut self) -> GameResult<String> {
        let answer = self
            .active_question()
            .map(|q| q.answer.clone())
            .ok_or_else(|| self.wrong_phase("reveal answer"))?;
        self.answer_revealed = true;
        Ok(answer)
    }
}
