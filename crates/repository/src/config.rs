//! Storage configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MARKETPLACE_DATABASE_URL` - Connection string for the selected backend
//!   (falls back to `DATABASE_URL`)
//!
//! ## Optional
//! - `MARKETPLACE_BACKEND` - `postgres` or `mongodb` (default: postgres)
//! - `MARKETPLACE_MONGO_DATABASE` - `MongoDB` database name (default: marketplace)
//! - `MARKETPLACE_DB_MAX_CONNECTIONS` - Pool ceiling (default: 10)
//! - `MARKETPLACE_DB_MIN_CONNECTIONS` - Idle connections kept open (default: 2)
//! - `MARKETPLACE_DB_ACQUIRE_TIMEOUT_SECS` - Wait for a free connection (default: 10)

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Which store backs the repositories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Postgres,
    MongoDb,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Postgres => "postgres",
            Self::MongoDb => "mongodb",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mongodb" | "mongo" => Ok(Self::MongoDb),
            other => Err(format!("expected `postgres` or `mongodb`, got `{other}`")),
        }
    }
}

/// Connection settings shared by both backends.
#[derive(Clone)]
pub struct StorageConfig {
    pub backend: Backend,
    /// `postgres://` or `mongodb://` connection string.
    pub database_url: SecretString,
    /// Database name used when `backend` is [`Backend::MongoDb`].
    pub mongo_database: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("backend", &self.backend)
            .field("database_url", &"[REDACTED]")
            .field("mongo_database", &self.mongo_database)
            .field("max_connections", &self.max_connections)
            .field("min_connections", &self.min_connections)
            .field("acquire_timeout", &self.acquire_timeout)
            .finish()
    }
}

impl StorageConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the database URL is missing or a numeric
    /// setting does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Same as [`StorageConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let backend = env.parse_or("MARKETPLACE_BACKEND", Backend::Postgres)?;
        let database_url = env.database_url("MARKETPLACE_DATABASE_URL")?;
        let mongo_database = env.get_or_default("MARKETPLACE_MONGO_DATABASE", "marketplace");
        let max_connections = env.parse_or("MARKETPLACE_DB_MAX_CONNECTIONS", 10_u32)?;
        let min_connections = env.parse_or("MARKETPLACE_DB_MIN_CONNECTIONS", 2_u32)?;
        let acquire_timeout_secs = env.parse_or("MARKETPLACE_DB_ACQUIRE_TIMEOUT_SECS", 10_u64)?;

        if min_connections > max_connections {
            return Err(ConfigError::InvalidEnvVar(
                "MARKETPLACE_DB_MIN_CONNECTIONS".to_owned(),
                format!("{min_connections} exceeds max connections {max_connections}"),
            ));
        }

        Ok(Self {
            backend,
            database_url,
            mongo_database,
            max_connections,
            min_connections,
            acquire_timeout: Duration::from_secs(acquire_timeout_secs),
        })
    }

    /// Configuration with default pool settings for the given connection string.
    #[must_use]
    pub fn new(backend: Backend, database_url: impl Into<String>) -> Self {
        Self {
            backend,
            database_url: SecretString::from(database_url.into()),
            mongo_database: "marketplace".to_owned(),
            max_connections: 10,
            min_connections: 2,
            acquire_timeout: Duration::from_secs(10),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    /// Get database URL with fallback to generic `DATABASE_URL`.
    fn database_url(&self, primary_key: &str) -> Result<SecretString, ConfigError> {
        (self.0)(primary_key)
            .or_else(|| (self.0)("DATABASE_URL"))
            .map(SecretString::from)
            .ok_or_else(|| ConfigError::MissingEnvVar(primary_key.to_owned()))
    }

    fn get_or_default(&self, key: &str, default: &str) -> String {
        (self.0)(key).unwrap_or_else(|| default.to_owned())
    }

    fn parse_or<T>(&self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        match (self.0)(key) {
            Some(raw) => raw
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string())),
            None => Ok(default),
        }
    }
}
