use crate::game::{ArenaVerdict, Game, HostAction};
use crate::types::*;
use serde::{Deserialize, Serialize};

/// Wire protocol version announced in `Welcome`
pub const PROTOCOL_VERSION: &str = "1.0";

/// Who is on the other end of a socket
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The host device driving the tournament
    Host,
    /// Read-only presentation screen
    Display,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh `State` snapshot
    Sync,
    // Host-only messages
    StartTournament {
        names: Vec<String>,
    },
    SelectCategory {
        category: Category,
    },
    ReselectCategory,
    SelectQuestion {
        index: usize,
    },
    Adjudicate {
        verdict: ArenaVerdict,
    },
    OpenFloorAttempt {
        player_id: PlayerId,
        correct: bool,
    },
    CloseFloor,
    ChallengeTarget {
        player_id: PlayerId,
    },
    ChallengeAgain,
    ProceedToFinal,
    ResolveChallenge {
        result: ChallengeResult,
    },
    FinalAnswer {
        correct: bool,
    },
    RevealAnswer,
    EliminatePlayer {
        player_id: PlayerId,
    },
    NextRound,
    FinishTournament,
    Restart,
}

impl ClientMessage {
    /// The state machine action this message maps to, if it is a plain host action
    pub fn host_action(&self) -> Option<HostAction> {
        let action = match self {
            ClientMessage::StartTournament { names } => HostAction::StartTournament {
                names: names.clone(),
            },
            ClientMessage::ReselectCategory => HostAction::ReselectCategory,
            ClientMessage::SelectQuestion { index } => HostAction::SelectQuestion { index: *index },
            ClientMessage::Adjudicate { verdict } => HostAction::Adjudicate { verdict: *verdict },
            ClientMessage::OpenFloorAttempt { player_id, correct } => {
                HostAction::OpenFloorAttempt {
                    player_id: *player_id,
                    correct: *correct,
                }
            }
            ClientMessage::CloseFloor => HostAction::CloseFloor,
            ClientMessage::ChallengeTarget { player_id } => HostAction::ChallengeTarget {
                player_id: *player_id,
            },
            ClientMessage::ChallengeAgain => HostAction::ChallengeAgain,
            ClientMessage::ProceedToFinal => HostAction::ProceedToFinal,
            ClientMessage::ResolveChallenge { result } => {
                HostAction::ResolveChallenge { result: *result }
            }
            ClientMessage::FinalAnswer { correct } => HostAction::FinalAnswer { correct: *correct },
            ClientMessage::RevealAnswer => HostAction::RevealAnswer,
            ClientMessage::EliminatePlayer { player_id } => HostAction::EliminatePlayer {
                player_id: *player_id,
            },
            ClientMessage::NextRound => HostAction::NextRound,
            ClientMessage::FinishTournament => HostAction::FinishTournament,
            ClientMessage::Sync | ClientMessage::SelectCategory { .. } | ClientMessage::Restart => {
                return None
            }
        };
        Some(action)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        game: Game,
        server_now: String,
    },
    /// Full snapshot after every committed transition
    State {
        game: Game,
    },
    /// Countdown update; not sent for the tick that expires the clock
    Tick {
        remaining: u32,
    },
    /// Host asked to see the answer to the active question
    Answer {
        answer: String,
    },
    /// Final ranking, sent when the tournament reaches `Winner`
    Standings {
        players: Vec<Player>,
    },
    Error {
        code: String,
        msg: String,
    },
}
