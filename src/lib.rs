//! Movie List Server Library
//!
//! This module exports the core types and functions for testing and reuse.

pub mod auth;
pub mod cache;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod feed;
pub mod models;
pub mod omdb;
pub mod routes;
pub mod store;

pub use auth::SessionRegistry;
pub use cache::SnapshotCache;
pub use config::Config;
pub use db::{open_database, Db};
pub use error::{AppError, Result};
pub use feed::{start_feed, FeedEvent, FeedHandle};
pub use omdb::OmdbClient;
pub use store::MovieStore;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub config: Config,
    pub store: MovieStore,
    pub cache: SnapshotCache,
    pub sessions: SessionRegistry,
    pub omdb: OmdbClient,
}

impl AppState {
    /// Wire up the shared components for the given database and configuration
    pub fn new(db: Db, config: Config) -> Self {
        let store = MovieStore::new(db.clone());
        let cache = SnapshotCache::new(config.cache_dir.clone(), config.cache_ttl_minutes);
        let sessions = SessionRegistry::new(
            db.clone(),
            config.session_secret_key.clone(),
            config.password_pepper.clone(),
            config.owner_emails.clone(),
        );
        let omdb = OmdbClient::new(config.omdb_base_url.clone(), config.omdb_api_key.clone());

        Self {
            db,
            config,
            store,
            cache,
            sessions,
            omdb,
        }
    }
}
