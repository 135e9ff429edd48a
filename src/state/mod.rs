mod lock;
mod session;

pub use lock::{ActionGuard, ActionLock};

use crate::game::{Game, Phase};
use crate::protocol::ServerMessage;
use crate::questions::QuestionProvider;
use crate::types::GameConfig;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Shared application state: one tournament, its question source and the
/// channel every connected screen listens on
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<RwLock<Game>>,
    pub provider: Arc<dyn QuestionProvider>,
    /// Broadcast channel for sending messages to all clients
    pub broadcast: broadcast::Sender<ServerMessage>,
    pub config: GameConfig,
    in_flight: Arc<ActionLock>,
}

impl AppState {
    pub fn new(config: GameConfig, provider: Arc<dyn QuestionProvider>) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            game: Arc::new(RwLock::new(Game::new(config.clone()))),
            provider,
            broadcast: tx,
            config,
            in_flight: Arc::new(ActionLock::default()),
        }
    }

    /// Copy of the current tournament
    pub async fn snapshot(&self) -> Game {
        self.game.read().await.clone()
    }

    /// Whether a host action is being applied right now
    pub fn action_pending(&self) -> bool {
        self.in_flight.is_held()
    }

    /// Commit point for every transition: bump the version and tell every client
    fn publish_state(&self, game: &mut Game) {
        game.version += 1;

        // Ignore send errors (no receivers connected is fine)
        let _ = self.broadcast.send(ServerMessage::State { game: game.clone() });
        if game.phase == Phase::Winner {
            let _ = self.broadcast.send(ServerMessage::Standings {
                players: game.standings(),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::StaticDeck;

    #[tokio::test]
    async fn test_new_state_holds_a_setup_game() {
        let deck = StaticDeck::load().unwrap();
        let state = AppState::new(GameConfig::default(), Arc::new(deck));

        let game = state.snapshot().await;
        assert_eq!(game.phase, Phase::Setup);
        assert_eq!(game.version, 1);
        assert!(!state.action_pending());
    }
}
