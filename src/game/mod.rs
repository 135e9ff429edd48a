//! Round/turn state machine for a Know or Knockout tournament
//!
//! `Game` owns the authoritative tournament state. Host actions go through the
//! transition methods spread across this module's files; each one either commits a
//! complete transition or returns a `GameError` and leaves the state untouched.
//! Nothing here awaits: the question fetch is split into `begin_fetch` and
//! `install_batch`/`abandon_fetch` so the session layer can run the provider call
//! outside the state lock.

mod arena;
mod challenge;
mod open_floor;
mod round;
mod score;
mod timer;

#[cfg(test)]
pub(crate) mod fixtures;

pub use arena::{ArenaVerdict, FetchTicket, PendingFetch};
pub use challenge::Challenge;
pub use score::*;
pub use timer::{TickOutcome, TurnTimer};

use crate::types::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Result type for state machine transitions
pub type GameResult<T> = Result<T, GameError>;

/// Reasons a host action was rejected. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("Cannot {action} during {phase}")]
    WrongPhase {
        action: &'static str,
        phase: &'static str,
    },

    #[error("Questions are still loading")]
    Loading,

    #[error("Another host action is still being applied")]
    ActionPending,

    #[error("Player {0} not found")]
    UnknownPlayer(PlayerId),

    #[error("Player {0} has no passes left")]
    NoPassesLeft(PlayerId),

    #[error("Player {0} is not eligible for this question")]
    IneligiblePlayer(PlayerId),

    #[error("Player {0} was already challenged on this question")]
    AlreadyChallenged(PlayerId),

    #[error("No more opponents may be challenged on this question")]
    ChallengeLimit,

    #[error("No staged question at index {0}")]
    InvalidQuestionIndex(usize),

    #[error("A tournament needs at least {0} players")]
    NotEnoughPlayers(usize),

    #[error("Discarded stale question batch from fetch #{0}")]
    StaleBatch(u64),

    #[error("Question provider failed: {0}")]
    ProviderFailure(String),
}

/// The questions staged for one player's category pick
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Board {
    pub category: Category,
    pub questions: Vec<Question>,
}

/// Tournament phase. Each variant carries exactly the data that exists in that phase:
/// a challenge record only lives inside the three challenge phases, an active
/// question index only once the player has picked one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "phase", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Setup,
    RoundStart {
        pending: Option<PendingFetch>,
    },
    ArenaActive {
        board: Board,
        active: Option<usize>,
    },
    OpenFloor {
        board: Board,
        active: usize,
        /// Players who already missed this question on the open floor
        failed: BTreeSet<PlayerId>,
    },
    ChallengeTarget {
        board: Board,
        active: usize,
        challenge: Challenge,
    },
    /// `target: None` is the banner between two challenges
    ChallengeResolve {
        board: Board,
        active: usize,
        challenge: Challenge,
        target: Option<PlayerId>,
    },
    ChallengeFinal {
        board: Board,
        active: usize,
        challenge: Challenge,
    },
    RoundEnd,
    Winner,
}

impl Phase {
    pub fn name(&self) -> &'static str {
        match self {
            Phase::Setup => "SETUP",
            Phase::RoundStart { .. } => "ROUND_START",
            Phase::ArenaActive { .. } => "ARENA_ACTIVE",
            Phase::OpenFloor { .. } => "OPEN_FLOOR",
            Phase::ChallengeTarget { .. } => "CHALLENGE_TARGET",
            Phase::ChallengeResolve { .. } => "CHALLENGE_RESOLVE",
            Phase::ChallengeFinal { .. } => "CHALLENGE_FINAL",
            Phase::RoundEnd => "ROUND_END",
            Phase::Winner => "WINNER",
        }
    }

    fn board(&self) -> Option<&Board> {
        match self {
            Phase::ArenaActive { board, .. }
            | Phase::OpenFloor { board, .. }
            | Phase::ChallengeTarget { board, .. }
            | Phase::ChallengeResolve { board, .. }
            | Phase::ChallengeFinal { board, .. } => Some(board),
            _ => None,
        }
    }

    fn active(&self) -> Option<usize> {
        match self {
            Phase::ArenaActive { active, .. } => *active,
            Phase::OpenFloor { active, .. }
            | Phase::ChallengeTarget { active, .. }
            | Phase::ChallengeResolve { active, .. }
            | Phase::ChallengeFinal { active, .. } => Some(*active),
            _ => None,
        }
    }
}

/// Every action the host can take once the tournament exists.
/// Category selection is not listed: it suspends on the question provider and
/// goes through `begin_fetch`/`install_batch` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostAction {
    StartTournament { names: Vec<String> },
    ReselectCategory,
    SelectQuestion { index: usize },
    Adjudicate { verdict: ArenaVerdict },
    OpenFloorAttempt { player_id: PlayerId, correct: bool },
    CloseFloor,
    ChallengeTarget { player_id: PlayerId },
    ChallengeAgain,
    ProceedToFinal,
    ResolveChallenge { result: ChallengeResult },
    FinalAnswer { correct: bool },
    RevealAnswer,
    EliminatePlayer { player_id: PlayerId },
    NextRound,
    FinishTournament,
}

impl HostAction {
    pub fn name(&self) -> &'static str {
        match self {
            HostAction::StartTournament { .. } => "start tournament",
            HostAction::ReselectCategory => "reselect category",
            HostAction::SelectQuestion { .. } => "select question",
            HostAction::Adjudicate { .. } => "adjudicate",
            HostAction::OpenFloorAttempt { .. } => "judge open floor attempt",
            HostAction::CloseFloor => "close open floor",
            HostAction::ChallengeTarget { .. } => "choose challenge target",
            HostAction::ChallengeAgain => "challenge again",
            HostAction::ProceedToFinal => "proceed to final answer",
            HostAction::ResolveChallenge { .. } => "resolve challenge",
            HostAction::FinalAnswer { .. } => "judge final answer",
            HostAction::RevealAnswer => "reveal answer",
            HostAction::EliminatePlayer { .. } => "eliminate player",
            HostAction::NextRound => "advance round",
            HostAction::FinishTournament => "finish tournament",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    /// Bumped once per committed transition so clients can drop stale snapshots
    pub version: u64,
    pub config: GameConfig,
    pub phase: Phase,
    pub round: u32,
    pub players: Vec<Player>,
    pub current_player_index: usize,
    pub timer: TurnTimer,
    /// Knocked out for the rest of the round; cleared by `next_round`
    pub eliminated: BTreeSet<PlayerId>,
    /// Question texts already shown this tournament. Never shrinks.
    pub used_questions: BTreeSet<String>,
    pub answer_revealed: bool,
    #[serde(default)]
    fetch_seq: u64,
}

impl Game {
    /// Fresh tournament in `Setup` with a placeholder roster
    pub fn new(config: GameConfig) -> Self {
        let players = (0..DEFAULT_ROSTER_SIZE)
            .map(|i| Player::new(i as PlayerId, default_name(i), config.starting_passes))
            .collect();

        Self {
            id: ulid::Ulid::new().to_string(),
            version: 1,
            timer: TurnTimer::new(config.round_seconds),
            config,
            phase: Phase::Setup,
            round: 1,
            players,
            current_player_index: 0,
            eliminated: BTreeSet::new(),
            used_questions: BTreeSet::new(),
            answer_revealed: false,
            fetch_seq: 0,
        }
    }

    /// Apply a synchronous host action. Nothing is accepted while a batch is loading.
    pub fn apply(&mut self, action: HostAction) -> GameResult<()> {
        if self.is_loading() {
            return Err(GameError::Loading);
        }

        match action {
            HostAction::StartTournament { names } => self.start_tournament(names),
            HostAction::ReselectCategory => self.reselect_category(),
            HostAction::SelectQuestion { index } => self.select_question(index),
            HostAction::Adjudicate { verdict } => self.adjudicate(verdict),
            HostAction::OpenFloorAttempt { player_id, correct } => {
                self.open_floor_attempt(player_id, correct)
            }
            HostAction::CloseFloor => self.close_floor(),
            HostAction::ChallengeTarget { player_id } => self.choose_challenge_target(player_id),
            HostAction::ChallengeAgain => self.challenge_again(),
            HostAction::ProceedToFinal => self.proceed_to_final(),
            HostAction::ResolveChallenge { result } => self.resolve_challenge(result),
            HostAction::FinalAnswer { correct } => self.final_answer(correct),
            HostAction::RevealAnswer => self.reveal_answer().map(|_| ()),
            HostAction::EliminatePlayer { player_id } => self.eliminate_player(player_id),
            HostAction::NextRound => self.next_round(),
            HostAction::FinishTournament => self.finish_tournament(),
        }
    }

    pub fn current_player(&self) -> &Player {
        &self.players[self.current_player_index]
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::RoundStart { pending: Some(_) })
    }

    pub fn selected_category(&self) -> Option<Category> {
        match &self.phase {
            Phase::RoundStart {
                pending: Some(pending),
            } => Some(pending.category),
            phase => phase.board().map(|b| b.category),
        }
    }

    pub fn questions(&self) -> &[Question] {
        self.phase
            .board()
            .map(|b| b.questions.as_slice())
            .unwrap_or_default()
    }

    pub fn active_question_index(&self) -> Option<usize> {
        self.phase.active()
    }

    pub fn active_question(&self) -> Option<&Question> {
        let index = self.phase.active()?;
        self.phase.board()?.questions.get(index)
    }

    pub fn challenge(&self) -> Option<&Challenge> {
        match &self.phase {
            Phase::ChallengeTarget { challenge, .. }
            | Phase::ChallengeResolve { challenge, .. }
            | Phase::ChallengeFinal { challenge, .. } => Some(challenge),
            _ => None,
        }
    }

    pub(crate) fn wrong_phase(&self, action: &'static str) -> GameError {
        GameError::WrongPhase {
            action,
            phase: self.phase.name(),
        }
    }

    /// Rebuild the phase from the previous one by value, moving the board along
    pub(crate) fn morph(&mut self, f: impl FnOnce(Phase) -> Phase) {
        let previous = std::mem::replace(&mut self.phase, Phase::Setup);
        self.phase = f(previous);
    }

    pub(crate) fn mark_active_used(&mut self) {
        if let Some(text) = self.active_question().map(|q| q.text.clone()) {
            self.used_questions.insert(text);
        }
    }

    /// Hand the turn to the next player, or close the round after the last one
    pub(crate) fn advance_turn(&mut self) {
        self.answer_revealed = false;
        self.timer.reset();

        let next = self.current_player_index + 1;
        if next >= self.players.len() {
            tracing::info!("Round {} complete", self.round);
            self.phase = Phase::RoundEnd;
            return;
        }

        self.current_player_index = next;
        self.phase = Phase::RoundStart { pending: None };
        tracing::debug!(
            "Turn passes to {} (round {})",
            self.current_player().name,
            self.round
        );
    }
}

pub(crate) fn default_name(index: usize) -> String {
    format!("Player {}", index + 1)
}
