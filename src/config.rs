use std::env;

use crate::auth::HashCost;

/// Server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to listen on
    pub port: u16,
    /// Bind address (0.0.0.0 for LAN, 127.0.0.1 for localhost)
    pub bind_addr: String,
    /// SQLite database URL
    pub database_url: String,
    /// Secret used to sign session tokens
    pub session_secret: String,
    /// Argon2 cost parameters for password hashing
    pub hash_cost: HashCost,
    /// CORS allowed origins (comma-separated in env var)
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        // SECURITY: Require an explicit signing secret and database URL - no defaults
        let session_secret = env::var("SESSION_SECRET")
            .map_err(|_| ConfigError::MissingEnvVar("SESSION_SECRET".to_string()))?;

        if session_secret.len() < 32 {
            return Err(ConfigError::InvalidValue(
                "SESSION_SECRET must be at least 32 characters".to_string(),
            ));
        }

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnvVar("DATABASE_URL".to_string()))?;

        let default_cost = HashCost::default();

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .map_err(|_| ConfigError::InvalidPort)?,
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string()),
            database_url,
            session_secret,
            hash_cost: HashCost {
                memory_kib: env_u32("HASH_MEMORY_KIB", default_cost.memory_kib),
                iterations: env_u32("HASH_ITERATIONS", default_cost.iterations),
                parallelism: env_u32("HASH_PARALLELISM", default_cost.parallelism),
            },
            cors_origins: env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| {
                    vec![
                        "http://localhost:3000".to_string(),
                        "http://127.0.0.1:3000".to_string(),
                    ]
                }),
        })
    }

    /// Get the full bind address (addr:port)
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

fn env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid port number")]
    InvalidPort,
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}
