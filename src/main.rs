use axum::{middleware, routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use knockout::{api, auth, clock, questions, state::AppState, types::GameConfig, ws};

#[tokio::main]
async fn main() {
    // Load .env file if present (before any env var reads)
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "knockout=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Know or Knockout...");

    let auth_config = Arc::new(auth::AuthConfig::from_env());

    let game_config = GameConfig::from_env();
    tracing::info!(
        "{} rounds, {}s per question, {} passes each",
        game_config.max_rounds,
        game_config.round_seconds,
        game_config.starting_passes
    );

    let bank = match questions::ProviderConfig::from_env().build_bank() {
        Ok(bank) => bank,
        Err(e) => {
            tracing::error!("Failed to initialize question sources: {}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(AppState::new(game_config, Arc::new(bank)));
    clock::spawn_turn_clock(state.clone());

    let ws_routes = Router::new()
        .route("/ws", get(ws::ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config.clone(),
            auth::host_ws_auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/api/state", get(api::get_state))
        .route("/api/standings", get(api::get_standings))
        .route("/api/categories", get(api::list_categories));

    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    let app = Router::new()
        .merge(ws_routes)
        .merge(api_routes)
        .fallback_service(ServeDir::new(static_dir))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.trim().parse().ok())
        .unwrap_or(6573);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
