//! Host-facing operations on the shared tournament

use super::AppState;
use crate::game::{Game, GameError, GameResult, HostAction, TickOutcome};
use crate::protocol::ServerMessage;
use crate::types::Category;

impl AppState {
    /// Apply one host action under the in-flight lock. Rejections leave the game
    /// untouched and are only logged.
    pub async fn perform(&self, action: HostAction) -> GameResult<()> {
        let Some(_guard) = self.in_flight.try_acquire() else {
            tracing::debug!("Dropped {}: another action is in flight", action.name());
            return Err(GameError::ActionPending);
        };

        let mut game = self.game.write().await;
        let name = action.name();

        let revealed = match action {
            HostAction::RevealAnswer if !game.is_loading() => game.reveal_answer().map(Some),
            action => game.apply(action).map(|_| None),
        };

        let answer = match revealed {
            Ok(answer) => answer,
            Err(e) => {
                tracing::debug!("Rejected {}: {}", name, e);
                return Err(e);
            }
        };

        self.publish_state(&mut game);
        if let Some(answer) = answer {
            let _ = self.broadcast.send(ServerMessage::Answer { answer });
        }
        Ok(())
    }

    /// Lock in a category for the current player and load its batch. The provider
    /// runs outside the state lock; a completion that arrives after the tournament
    /// moved on is discarded.
    pub async fn select_category(&self, category: Category) -> GameResult<()> {
        let (ticket, used) = {
            let Some(_guard) = self.in_flight.try_acquire() else {
                tracing::debug!("Dropped category pick: another action is in flight");
                return Err(GameError::ActionPending);
            };
            let mut game = self.game.write().await;
            let ticket = game.begin_fetch(category).inspect_err(|e| {
                tracing::debug!("Rejected category pick: {}", e);
            })?;
            self.publish_state(&mut game);
            (ticket, game.used_questions.clone())
        };

        let fetched = self.provider.fetch(category, &used).await;

        let mut game = self.game.write().await;
        let outcome = match fetched {
            Ok(batch) => game.install_batch(&ticket, batch),
            Err(e) => {
                tracing::warn!("Question provider {} failed: {}", self.provider.name(), e);
                game.abandon_fetch(&ticket)
                    .and(Err(GameError::ProviderFailure(e.to_string())))
            }
        };

        match &outcome {
            Err(GameError::StaleBatch(seq)) => {
                tracing::warn!("Discarding {} batch from stale fetch #{}", category, seq);
                return outcome;
            }
            Err(GameError::ProviderFailure(reason)) => {
                tracing::warn!("No {} batch available: {}", category, reason);
            }
            _ => tracing::info!("{} questions staged", category),
        }

        self.publish_state(&mut game);
        outcome
    }

    /// Advance the turn clock by one second
    pub async fn tick(&self) -> TickOutcome {
        let mut game = self.game.write().await;
        let outcome = game.tick();

        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::Running { remaining } => {
                let _ = self.broadcast.send(ServerMessage::Tick { remaining });
            }
            TickOutcome::Expired => self.publish_state(&mut game),
        }
        outcome
    }

    /// Throw the tournament away and start over in `Setup`
    pub async fn restart(&self) -> GameResult<()> {
        let Some(_guard) = self.in_flight.try_acquire() else {
            return Err(GameError::ActionPending);
        };

        let mut game = self.game.write().await;
        let version = game.version;
        *game = Game::new(self.config.clone());
        game.version = version;
        tracing::info!("Tournament restarted as {}", game.id);

        self.publish_state(&mut game);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ArenaVerdict, Phase};
    use crate::questions::{ProviderError, ProviderResult, QuestionProvider, StaticDeck};
    use crate::types::{GameConfig, Question, ROUND_TIME};
    use async_trait::async_trait;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Deck that can be told to fail or to wait for a go signal
    struct Gated {
        deck: StaticDeck,
        fail: bool,
        release: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl QuestionProvider for Gated {
        async fn fetch(
            &self,
            category: Category,
            used: &BTreeSet<String>,
        ) -> ProviderResult<Vec<Question>> {
            if let Some(release) = &self.release {
                release.notified().await;
            }
            if self.fail {
                return Err(ProviderError::ApiError("quota exhausted".to_string()));
            }
            self.deck.fetch(category, used).await
        }

        fn name(&self) -> &str {
            "gated"
        }
    }

    fn state_with(fail: bool, release: Option<Arc<Notify>>) -> AppState {
        let provider = Gated {
            deck: StaticDeck::load().unwrap(),
            fail,
            release,
        };
        AppState::new(GameConfig::default(), Arc::new(provider))
    }

    async fn started(state: &AppState) {
        state
            .perform(HostAction::StartTournament {
                names: vec!["Asha".into(), "Ben".into(), "Chen".into()],
            })
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_perform_commits_and_broadcasts() {
        let state = state_with(false, None);
        let mut rx = state.broadcast.subscribe();
        started(&state).await;

        let game = state.snapshot().await;
        assert_eq!(game.version, 2);
        match rx.recv().await.unwrap() {
            ServerMessage::State { game } => assert_eq!(game.players[1].name, "Ben"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rejected_action_changes_nothing() {
        let state = state_with(false, None);
        let before = state.snapshot().await;

        let err = state.perform(HostAction::NextRound).await.unwrap_err();
        assert!(matches!(err, GameError::WrongPhase { .. }));
        assert_eq!(state.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_action_in_flight_drops_the_next_one() {
        let state = state_with(false, None);
        let _held = state.in_flight.try_acquire().unwrap();

        let err = state
            .perform(HostAction::StartTournament {
                names: vec!["A".into(), "B".into()],
            })
            .await
            .unwrap_err();
        assert_eq!(err, GameError::ActionPending);
        assert_eq!(state.snapshot().await.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn test_select_category_stages_deck_batch() {
        let state = state_with(false, None);
        started(&state).await;

        state.select_category(Category::Geography).await.unwrap();
        let game = state.snapshot().await;
        assert!(matches!(game.phase, Phase::ArenaActive { active: None, .. }));
        assert_eq!(game.questions()[4].answer, "New Delhi");
        assert!(!state.action_pending());
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_round_start() {
        let state = state_with(true, None);
        started(&state).await;

        let err = state.select_category(Category::Geography).await.unwrap_err();
        assert!(matches!(err, GameError::ProviderFailure(_)));
        let game = state.snapshot().await;
        assert_eq!(game.phase, Phase::RoundStart { pending: None });
        assert_eq!(game.current_player_index, 0);
    }

    #[tokio::test]
    async fn test_late_batch_after_restart_is_discarded() {
        let release = Arc::new(Notify::new());
        let state = state_with(false, Some(release.clone()));
        started(&state).await;

        let pick = tokio::spawn({
            let state = state.clone();
            async move { state.select_category(Category::History).await }
        });
        while !state.snapshot().await.is_loading() {
            tokio::task::yield_now().await;
        }

        state.restart().await.unwrap();
        release.notify_one();

        let result = pick.await.unwrap();
        assert!(matches!(result, Err(GameError::StaleBatch(_))));
        assert_eq!(state.snapshot().await.phase, Phase::Setup);
    }

    #[tokio::test]
    async fn test_actions_are_refused_while_loading() {
        let release = Arc::new(Notify::new());
        let state = state_with(false, Some(release.clone()));
        started(&state).await;

        let pick = tokio::spawn({
            let state = state.clone();
            async move { state.select_category(Category::Sports).await }
        });
        while !state.snapshot().await.is_loading() {
            tokio::task::yield_now().await;
        }

        assert_eq!(
            state.perform(HostAction::RevealAnswer).await,
            Err(GameError::Loading)
        );
        release.notify_one();
        pick.await.unwrap().unwrap();
        assert!(!state.snapshot().await.is_loading());
    }

    #[tokio::test]
    async fn test_reveal_broadcasts_answer() {
        let state = state_with(false, None);
        started(&state).await;
        state.select_category(Category::Science).await.unwrap();
        state
            .perform(HostAction::SelectQuestion { index: 4 })
            .await
            .unwrap();

        let mut rx = state.broadcast.subscribe();
        state.perform(HostAction::RevealAnswer).await.unwrap();

        assert!(matches!(rx.recv().await.unwrap(), ServerMessage::State { .. }));
        match rx.recv().await.unwrap() {
            ServerMessage::Answer { answer } => assert_eq!(answer, "Oxygen"),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_tick_expiry_forces_wrong() {
        let state = state_with(false, None);
        started(&state).await;
        state.select_category(Category::Science).await.unwrap();
        state
            .perform(HostAction::SelectQuestion { index: 0 })
            .await
            .unwrap();

        assert_eq!(
            state.tick().await,
            TickOutcome::Running {
                remaining: ROUND_TIME - 1
            }
        );
        for _ in 1..ROUND_TIME - 1 {
            state.tick().await;
        }
        assert_eq!(state.tick().await, TickOutcome::Expired);

        let game = state.snapshot().await;
        assert!(matches!(game.phase, Phase::OpenFloor { .. }));
        assert_eq!(game.players[0].score, -10);
        assert_eq!(state.tick().await, TickOutcome::Idle);
    }

    #[tokio::test]
    async fn test_restart_clears_used_questions() {
        let state = state_with(false, None);
        started(&state).await;
        state.select_category(Category::Science).await.unwrap();
        state
            .perform(HostAction::SelectQuestion { index: 0 })
            .await
            .unwrap();
        state
            .perform(HostAction::Adjudicate {
                verdict: ArenaVerdict::Correct,
            })
            .await
            .unwrap();
        let old = state.snapshot().await;
        assert_eq!(old.used_questions.len(), 1);

        state.restart().await.unwrap();
        let fresh = state.snapshot().await;
        assert_ne!(fresh.id, old.id);
        assert!(fresh.used_questions.is_empty());
        assert!(fresh.version > old.version);
    }
}
