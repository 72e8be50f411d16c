use std::env;

use log::warn;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_DATABASE_URL: &str = "sqlite:eatvote.db";
pub const DEFAULT_SEARCH_API_URL: &str = "https://openapi.naver.com/v1/search/local.json";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub search_api_url: String,
    pub search_client_id: Option<String>,
    pub search_client_secret: Option<String>,
    pub map_client_id: Option<String>,
}

impl Config {
    /// Load configuration from environment variables, falling back to
    /// defaults fit for local use (port 3000, a SQLite file next to the
    /// binary, the provider's public search endpoint).
    pub fn from_env() -> Self {
        let port = match env::var("EATVOTE_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("Invalid EATVOTE_PORT value {raw:?}: {e}; using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let config = Self {
            port,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string()),
            search_api_url: env::var("SEARCH_API_URL")
                .unwrap_or_else(|_| DEFAULT_SEARCH_API_URL.to_string()),
            search_client_id: optional("SEARCH_CLIENT_ID"),
            search_client_secret: optional("SEARCH_CLIENT_SECRET"),
            map_client_id: optional("MAP_CLIENT_ID"),
        };

        if config.search_client_id.is_none() || config.search_client_secret.is_none() {
            warn!("SEARCH_CLIENT_ID/SEARCH_CLIENT_SECRET not set; place search will be unavailable");
        }

        config
    }
}

// Unset and empty are treated the same so a blank line in .env does not count
// as a configured credential.
fn optional(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}
