use std::env;

use crate::constants::DEFAULT_CACHE_TTL_MINUTES;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub database_path: String,
    pub cache_dir: String,
    pub cache_ttl_minutes: u64,
    pub allowed_origins: Vec<String>,
    pub omdb_api_key: String,
    pub omdb_base_url: String,
    pub owner_emails: Vec<String>,
    pub session_secret_key: String,
    pub password_pepper: String,
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|_| "Invalid SERVER_PORT")?;

        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/movielist.db".to_string());

        let cache_dir = env::var("CACHE_DIR").unwrap_or_else(|_| "./data/cache".to_string());

        let cache_ttl_minutes = env::var("CACHE_TTL_MINUTES")
            .unwrap_or_else(|_| DEFAULT_CACHE_TTL_MINUTES.to_string())
            .parse()
            .map_err(|_| "Invalid CACHE_TTL_MINUTES")?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .collect();

        let omdb_api_key =
            env::var("OMDB_API_KEY").map_err(|_| "OMDB_API_KEY must be set for detail lookups")?;

        let omdb_base_url =
            env::var("OMDB_BASE_URL").unwrap_or_else(|_| "https://www.omdbapi.com/".to_string());

        // Accounts granted the owner role at sign-up; everyone else is a viewer
        let owner_emails = env::var("OWNER_EMAILS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let session_secret_key = env::var("SESSION_SECRET_KEY")
            .map_err(|_| "SESSION_SECRET_KEY must be set for session token signing")?;

        let password_pepper = env::var("PASSWORD_PEPPER")
            .map_err(|_| "PASSWORD_PEPPER must be set for password hashing")?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        Ok(Config {
            server_host,
            server_port,
            database_path,
            cache_dir,
            cache_ttl_minutes,
            allowed_origins,
            omdb_api_key,
            omdb_base_url,
            owner_emails,
            session_secret_key,
            password_pepper,
            environment,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
