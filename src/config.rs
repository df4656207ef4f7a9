use crate::auth::{Role, UserAccount};
use std::{env, net::SocketAddr, str::FromStr};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid environment variable format for {0}: {1}")]
    InvalidVar(String, String),
}

#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    /// Prefix for hypermedia links. Empty means links are relative.
    pub public_base_url: String,
    /// Mounts the CSV import and HTML pages under `/jotd`.
    pub demo: bool,
    pub users: Vec<UserAccount>,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidVar(name.into(), e.to_string()))
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors, relies on env vars otherwise)
        dotenvy::dotenv().ok();

        let bind_address = parse_var("BIND_ADDRESS", "0.0.0.0:3000")?;
        let database_url = var_or("DATABASE_URL", "sqlite://jokes.db?mode=rwc");
        if database_url.trim().is_empty() {
            return Err(ConfigError::MissingVar("DATABASE_URL".into()));
        }
        let database_max_connections = parse_var("DATABASE_MAX_CONNECTIONS", "5")?;
        let public_base_url = var_or("PUBLIC_BASE_URL", "").trim_end_matches('/').to_string();
        let demo = parse_var("JOTD_DEMO", "false")?;

        let users = vec![
            UserAccount::new(
                var_or("JOTD_USER_NAME", "user"),
                var_or("JOTD_USER_PASSWORD", "secret"),
                Role::User,
            ),
            UserAccount::new(
                var_or("JOTD_ADMIN_NAME", "admin"),
                var_or("JOTD_ADMIN_PASSWORD", "secret"),
                Role::Admin,
            ),
        ];

        Ok(Config {
            bind_address,
            database_url,
            database_max_connections,
            public_base_url,
            demo,
            users,
        })
    }
}
