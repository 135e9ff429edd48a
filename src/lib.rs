// Public API for integration tests and potential library usage

pub mod api;
pub mod auth;
pub mod clock;
pub mod game;
pub mod protocol;
pub mod questions;
pub mod state;
pub mod types;
pub mod ws;
