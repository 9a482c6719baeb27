//! Runtime configuration, read from the environment (and `.env` if present).

use std::env;
use std::str::FromStr;

const DEFAULT_DATABASE_URL: &str = "sqlite://gotta-go.db?mode=rwc";
const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:3000";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_address: String,
    /// Whether posting a message triggers a simulated reply by default.
    pub auto_reply: bool,
}

impl AppConfig {
    pub fn from_env() -> AppConfig {
        dotenvy::dotenv().ok();

        AppConfig {
            database_url: env::var("DATABASE_URL").unwrap_or(DEFAULT_DATABASE_URL.to_owned()),
            bind_address: env::var("BIND_ADDRESS").unwrap_or(DEFAULT_BIND_ADDRESS.to_owned()),
            auto_reply: env::var("AUTO_REPLY")
                .ok()
                .and_then(|s| bool::from_str(&s).ok())
                .unwrap_or(true),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_url: DEFAULT_DATABASE_URL.to_owned(),
            bind_address: DEFAULT_BIND_ADDRESS.to_owned(),
            auto_reply: true,
        }
    }
}
