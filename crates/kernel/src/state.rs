//! Application state shared across all handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::Config;
use crate::content::{
    CategoryRegistry, ContentRepository, ContentService, MemoryContentStore, PgContentStore,
};
use crate::db;
use crate::metrics::Metrics;
use crate::middleware::TokenVerifier;

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// Content lifecycle operations.
    content: ContentService,

    /// Bearer token verifier.
    tokens: TokenVerifier,

    /// Prometheus metrics.
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create application state from configuration.
    ///
    /// Connects to PostgreSQL and applies migrations when `DATABASE_URL` is
    /// set; otherwise content lives in memory for the life of the process.
    pub async fn new(config: &Config) -> Result<Self> {
        let repo: Arc<dyn ContentRepository> = match &config.database_url {
            Some(url) => {
                let pool = db::create_pool(url, config.database_max_connections)
                    .await
                    .context("failed to create database pool")?;
                db::run_migrations(&pool)
                    .await
                    .context("failed to run migrations")?;
                info!("using PostgreSQL content store");
                Arc::new(PgContentStore::new(pool))
            }
            None => {
                warn!("DATABASE_URL not set; content is kept in memory and lost on restart");
                Arc::new(MemoryContentStore::new())
            }
        };

        let categories = if config.categories_file.exists() {
            CategoryRegistry::load(&config.categories_file)?
        } else {
            warn!(
                path = %config.categories_file.display(),
                "category file not found; every submission will fail category validation"
            );
            CategoryRegistry::default()
        };

        let tokens = TokenVerifier::new(config.jwt_secret.as_bytes(), config.jwt_issuer.as_deref());

        Ok(Self::from_parts(repo, categories, tokens))
    }

    /// Assemble state from already-built parts.
    pub fn from_parts(
        repo: Arc<dyn ContentRepository>,
        categories: CategoryRegistry,
        tokens: TokenVerifier,
    ) -> Self {
        let metrics = Arc::new(Metrics::new());
        let content = ContentService::new(repo, categories, metrics.clone());
        Self {
            inner: Arc::new(AppStateInner {
                content,
                tokens,
                metrics,
            }),
        }
    }

    /// Get the content service.
    pub fn content(&self) -> &ContentService {
        &self.inner.content
    }

    /// Get the bearer token verifier.
    pub fn tokens(&self) -> &TokenVerifier {
        &self.inner.tokens
    }

    /// Get the metrics registry.
    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    /// Check if the content store is reachable.
    pub async fn store_healthy(&self) -> bool {
        self.inner.content.healthy().await
    }
}
