//! Read-only HTTP endpoints for presentation screens

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use crate::game::Game;
use crate::state::AppState;
use crate::types::{Category, Player};

/// One tile on the category picker
#[derive(Debug, Clone, Serialize)]
pub struct CategoryInfo {
    pub name: Category,
    pub cover_image_url: &'static str,
}

/// Current tournament snapshot.
///
/// GET /api/state
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<Game> {
    Json(state.snapshot().await)
}

/// Players ranked by score, then fewest wrong answers, then fewest passes used.
///
/// GET /api/standings
pub async fn get_standings(State(state): State<Arc<AppState>>) -> Json<Vec<Player>> {
    Json(state.game.read().await.standings())
}

/// GET /api/categories
pub async fn list_categories() -> Json<Vec<CategoryInfo>> {
    Json(
        Category::ALL
            .into_iter()
            .map(|name| CategoryInfo {
                name,
                cover_image_url: name.cover_image_url(),
            })
            .collect(),
    )
}
