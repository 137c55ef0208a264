use anyhow::{Context, Result};
use std::env;
use std::time::Duration;

/// Process-level settings read once at start-up.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database_url: String,
    pub database_max_connections: u32,
    pub port: u16,
    pub skip_migrations: bool,
    pub allowed_origins: Vec<String>,
    pub introspection_enabled: bool,
    pub league: LeagueSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:3000,http://localhost:3001".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 30),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("PORT must be a valid port number")?,
            skip_migrations: env::var("SKIP_MIGRATIONS")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(false),
            allowed_origins,
            introspection_enabled: env::var("GQL_INTROSPECTION")
                .map(|v| v == "true")
                .unwrap_or(false),
            league: LeagueSettings::from_env(),
        })
    }
}

/// Tunables for the ranking engine.
#[derive(Clone, Debug)]
pub struct LeagueSettings {
    /// Admission attempts before `GroupFull` reaches the caller.
    pub allocation_max_attempts: u32,
    pub allocation_backoff: Duration,
    /// Friend rankings resolved in parallel.
    pub following_lookup_concurrency: usize,
}

impl Default for LeagueSettings {
    fn default() -> Self {
        Self {
            allocation_max_attempts: 3,
            allocation_backoff: Duration::from_millis(25),
            following_lookup_concurrency: 8,
        }
    }
}

impl LeagueSettings {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            allocation_max_attempts: parse_or(
                "ALLOCATION_MAX_ATTEMPTS",
                defaults.allocation_max_attempts,
            )
            .max(1),
            allocation_backoff: Duration::from_millis(parse_or(
                "ALLOCATION_BACKOFF_MS",
                defaults.allocation_backoff.as_millis() as u64,
            )),
            following_lookup_concurrency: parse_or(
                "FOLLOWING_LOOKUP_CONCURRENCY",
                defaults.following_lookup_concurrency,
            )
            .max(1),
        }
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}
