//! Application configuration loaded from environment variables.

use std::str::FromStr;

use chrono::Duration;

use crate::errors::{AdminError, Result};

#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file
    pub database_url: String,
    /// Port for the REST API server
    pub api_port: u16,
    /// Public domain used when building referral share links
    pub public_domain: String,
    /// How long a buyer's reservation holds a ticket, in minutes
    pub reservation_minutes: i64,
    /// How often (in seconds) to reset lapsed reservations; 0 disables the sweep
    pub sweep_interval_secs: u64,
    /// Where unauthorised requests to admin routes are redirected
    pub login_path: String,
    /// Messaging provider endpoint; notifications are skipped when unset
    pub whatsapp_api_url: Option<String>,
    pub whatsapp_api_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            database_url: env_var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:./raffles.db".to_string()),
            api_port: parse_or("API_PORT", 3001)?,
            public_domain: env_var("PUBLIC_DOMAIN")
                .unwrap_or_else(|_| "localhost:3000".to_string()),
            reservation_minutes: parse_or("RESERVATION_MINUTES", 15)?,
            sweep_interval_secs: parse_or("SWEEP_INTERVAL_SECS", 60)?,
            login_path: env_var("LOGIN_PATH").unwrap_or_else(|_| "/login".to_string()),
            whatsapp_api_url: optional("WHATSAPP_API_URL"),
            whatsapp_api_token: optional("WHATSAPP_API_TOKEN"),
        })
    }

    pub fn reservation_window(&self) -> Duration {
        Duration::minutes(self.reservation_minutes)
    }
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| AdminError::Config(format!("Missing env var: {key}")))
}

fn optional(key: &str) -> Option<String> {
    env_var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> Result<T> {
    match env_var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AdminError::Config(format!("Invalid {key}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Configuration for tests: in-memory database, no messaging provider.
    pub fn for_tests() -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            api_port: 0,
            public_domain: "rifas.example.com".to_string(),
            reservation_minutes: 15,
            sweep_interval_secs: 0,
            login_path: "/login".to_string(),
            whatsapp_api_url: None,
            whatsapp_api_token: None,
        }
    }
}
