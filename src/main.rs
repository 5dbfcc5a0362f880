use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use movielist_server::config::Config;
use movielist_server::db::open_database;
use movielist_server::routes::{
    add_movie, current_session, delete_movie, health_check, list_movies, movie_count,
    movie_details, sign_in, sign_out, sign_up,
};
use movielist_server::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "movielist_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Movie List Server...");

    // Load configuration
    let config = Config::from_env().map_err(|e| anyhow::anyhow!(e))?;

    tracing::info!(
        "Environment: {}, Server: {}",
        config.environment,
        config.server_address()
    );

    // Open the embedded database
    let db = open_database(&config.database_path)?;

    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(
            config
                .allowed_origins
                .iter()
                .map(|s| s.parse::<axum::http::HeaderValue>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow::anyhow!("Invalid ALLOWED_ORIGINS entry: {e}"))?,
        )
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::DELETE,
        ])
        .allow_headers(Any);

    // Create app state
    let state = AppState::new(db, config.clone());

    // Log auth activity from the registry's notification stream
    let mut auth_events = state.sessions.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = auth_events.recv().await {
            tracing::info!("Auth event: {:?}", event);
        }
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/api/movies", get(list_movies).post(add_movie))
        .route("/api/movies/count", get(movie_count))
        .route(
            "/api/movies/:id",
            axum::routing::delete(delete_movie),
        )
        .route("/api/movies/:id/details", get(movie_details))
        .route("/api/auth/signup", post(sign_up))
        .route("/api/auth/signin", post(sign_in))
        .route("/api/auth/signout", post(sign_out))
        .route("/api/auth/session", get(current_session))
        .layer(cors)
        .with_state(state);

    // Start server
    let addr: SocketAddr = config.server_address().parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
