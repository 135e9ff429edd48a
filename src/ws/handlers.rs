//! WebSocket message dispatch
//!
//! Game rejections are never sent back: an action that does not fit the current
//! phase is dropped and the host simply keeps seeing the unchanged state.

use crate::protocol::{ClientMessage, Role, ServerMessage};
use crate::state::AppState;
use std::sync::Arc;

/// Return early with an error unless the socket belongs to the host
macro_rules! check_host {
    ($role:expr, $action:expr) => {
        if $role != Role::Host {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only host can {}", $action),
            });
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    role: Role,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Sync => Some(ServerMessage::State {
            game: state.snapshot().await,
        }),

        ClientMessage::SelectCategory { category } => {
            check_host!(role, "select categories");
            // The provider may take seconds; keep the socket loop free meanwhile
            let state = state.clone();
            tokio::spawn(async move {
                let _ = state.select_category(category).await;
            });
            None
        }

        ClientMessage::Restart => {
            check_host!(role, "restart the tournament");
            let _ = state.restart().await;
            None
        }

        other => {
            let action = other.host_action()?;
            check_host!(role, action.name());
            let _ = state.perform(action).await;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ArenaVerdict, HostAction, Phase};
    use crate::questions::StaticDeck;
    use crate::types::{Category, GameConfig};

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            GameConfig::default(),
            Arc::new(StaticDeck::load().unwrap()),
        ))
    }

    #[tokio::test]
    async fn test_display_cannot_drive_the_game() {
        let state = test_state();
        let result = handle_message(
            ClientMessage::StartTournament {
                names: vec!["A".into(), "B".into()],
            },
            Role::Display,
            &state,
        )
        .await;

        match result {
            Some(ServerMessage::Error { code, msg }) => {
                assert_eq!(code, "UNAUTHORIZED");
                assert_eq!(msg, "Only host can start tournament");
            }
            other => panic!("expected error, got {:?}", other),
        }
        assert_eq!(state.snapshot().await.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn test_sync_returns_snapshot_for_any_role() {
        let state = test_state();
        let result = handle_message(ClientMessage::Sync, Role::Display, &state).await;
        assert!(matches!(result, Some(ServerMessage::State { .. })));
    }

    #[tokio::test]
    async fn test_rejected_action_is_silent() {
        let state = test_state();
        let result = handle_message(
            ClientMessage::Adjudicate {
                verdict: ArenaVerdict::Correct,
            },
            Role::Host,
            &state,
        )
        .await;

        assert!(result.is_none());
        assert_eq!(state.snapshot().await.version, 1);
    }

    #[tokio::test]
    async fn test_category_pick_runs_in_background() {
        let state = test_state();
        state
            .perform(HostAction::StartTournament {
                names: vec!["A".into(), "B".into()],
            })
            .await
            .unwrap();
        let mut rx = state.broadcast.subscribe();

        let result = handle_message(
            ClientMessage::SelectCategory {
                category: Category::Technology,
            },
            Role::Host,
            &state,
        )
        .await;
        assert!(result.is_none());

        // Loading snapshot, then the staged board
        for _ in 0..2 {
            assert!(matches!(rx.recv().await.unwrap(), ServerMessage::State { .. }));
        }
        let game = state.snapshot().await;
        assert_eq!(game.selected_category(), Some(Category::Technology));
        assert_eq!(game.questions().len(), 5);
    }
}
