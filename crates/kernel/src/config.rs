//! Configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// PostgreSQL connection URL. When None, content is kept in memory.
    pub database_url: Option<String>,

    /// Maximum database connections in pool (default: 10).
    pub database_max_connections: u32,

    /// HS256 secret used to verify bearer tokens.
    pub jwt_secret: String,

    /// Required `iss` claim, if set.
    pub jwt_issuer: Option<String>,

    /// Category directory seed (default: ./config/categories.toml).
    pub categories_file: PathBuf,

    /// CORS allowed origins (comma-separated, default: "*").
    pub cors_allowed_origins: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let database_url = env::var("DATABASE_URL").ok().filter(|v| !v.trim().is_empty());

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .context("DATABASE_MAX_CONNECTIONS must be a valid u32")?;

        let jwt_secret =
            env::var("JWT_SECRET").context("JWT_SECRET environment variable is required")?;
        if jwt_secret.len() < 16 {
            anyhow::bail!("JWT_SECRET must be at least 16 bytes");
        }

        let jwt_issuer = env::var("JWT_ISSUER").ok().filter(|v| !v.trim().is_empty());

        let categories_file = env::var("CATEGORIES_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("./config/categories.toml"));

        let cors_allowed_origins = env::var("CORS_ALLOWED_ORIGINS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["*".to_string()]);

        Ok(Self {
            port,
            database_url,
            database_max_connections,
            jwt_secret,
            jwt_issuer,
            categories_file,
            cors_allowed_origins,
        })
    }

    /// Configuration for tests: in-memory store, no issuer check.
    pub fn for_tests(jwt_secret: impl Into<String>) -> Self {
        Self {
            port: 0,
            database_url: None,
            database_max_connections: 1,
            jwt_secret: jwt_secret.into(),
            jwt_issuer: None,
            categories_file: PathBuf::from("./config/categories.toml"),
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}
