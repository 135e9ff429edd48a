//! Shared builders for the state machine tests

use super::Game;
use crate::types::{Category, GameConfig, Question, QuestionType};

/// One question of each type, texts unique per category
pub fn sample_batch(category: Category) -> Vec<Question> {
    QuestionType::ALL
        .iter()
        .map(|kind| Question {
            text: format!("{} {} question", category, kind),
            answer: format!("{} answer", kind),
            category,
            kind: *kind,
            image_url: None,
        })
        .collect()
}

/// Tournament started with `players` named players, first turn awaiting a category
pub fn started_game(players: usize) -> Game {
    let mut game = Game::new(GameConfig::default());
    let names = (0..players).map(|i| format!("P{}", i)).collect();
    game.start_tournament(names).unwrap();
    game
}

/// Pick Cuisine for the current player and open the first unused question
pub fn play_arena_turn(game: &mut Game) {
    let ticket = game.begin_fetch(Category::Cuisine).unwrap();
    game.install_batch(&ticket, sample_batch(Category::Cuisine))
        .unwrap();
    game.select_question(0).unwrap();
}

/// First player's turn with question 0 open and the clock running
pub fn game_in_arena(players: usize) -> Game {
    let mut game = started_game(players);
    play_arena_turn(&mut game);
    game
}
