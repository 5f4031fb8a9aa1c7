//! Startup wiring for CLI commands: build the shared application context
//! from configuration.

use std::sync::Arc;

use crate::config::Config;
use crate::generation::{GenerationPipeline, PipelineSettings};
use crate::llm::{factory, LlmClient};
use crate::scheduler::inventory::InventorySettings;
use crate::scheduler::GenerationWorker;
use crate::selector::AdaptiveSelector;
use crate::storage::{self, DbPool};
use crate::workflow::{AnswerService, DrillService};

/// Errors that can occur during startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// Configuration is invalid or missing.
    #[error("configuration error: {0}")]
    Config(#[from] crate::error::ConfigError),

    /// Database initialization failed.
    #[error("database error: {0}")]
    Database(#[from] crate::error::StorageError),

    /// LLM backend construction failed.
    #[error("LLM backend error: {0}")]
    Llm(#[from] crate::error::LlmError),
}

/// Everything a command needs, wired once.
pub struct AppContext {
    pub config: Config,
    pub pool: DbPool,
    pub client: Arc<dyn LlmClient>,
    pub pipeline: GenerationPipeline,
    pub drills: DrillService,
    pub answers: AnswerService,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext").finish_non_exhaustive()
    }
}

impl AppContext {
    /// Initialize the database, LLM client, and services from config.
    pub async fn build(config: Config) -> Result<Self, StartupError> {
        let pool = storage::init_db(&config.storage.db_path).await?;
        let client = factory::create_client(&config.llm)?;

        let pipeline = GenerationPipeline::new(
            pool.clone(),
            client.clone(),
            PipelineSettings::from_config(&config),
        );
        let inventory = InventorySettings::from_config(&config.adaptive);
        let selector = AdaptiveSelector::new(
            pool.clone(),
            pipeline.clone(),
            i64::from(config.adaptive.default_slider),
        );
        let drills = DrillService::new(pool.clone(), selector, inventory.clone());
        let answers = AnswerService::new(pool.clone(), inventory);

        Ok(Self {
            config,
            pool,
            client,
            pipeline,
            drills,
            answers,
        })
    }

    /// Build the background worker from this context.
    pub fn worker(&self) -> GenerationWorker {
        GenerationWorker::new(
            self.pool.clone(),
            self.pipeline.clone(),
            &self.config.scheduler,
        )
    }
}

/// Format the banner printed when the worker starts.
pub fn format_startup_banner(config: &Config) -> String {
    format!(
        "Lexprep v{version}\n\
         Backend: {backend} | Worker tick: {tick}s | Daily budget: {budget} cents\n\
         Press Ctrl+C to stop.",
        version = env!("CARGO_PKG_VERSION"),
        backend = config.llm.provider,
        tick = config.scheduler.worker_interval_secs,
        budget = config.generation.daily_cost_limit_cents,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mock_config(db_path: &str) -> Config {
        let mut config = Config::default();
        config.llm.provider = "mock".to_string();
        config.storage.db_path = db_path.to_string();
        config
    }

    #[tokio::test]
    async fn build_context_with_mock_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("app.db");
        let config = mock_config(db_path.to_str().expect("utf8"));

        let ctx = AppContext::build(config).await.expect("build");
        assert_eq!(ctx.client.name(), "mock");
    }

    #[tokio::test]
    async fn build_context_requires_api_key_for_anthropic() {
        let dir = tempfile::tempdir().expect("tempdir");
        let db_path = dir.path().join("app.db");
        let mut config = Config::default();
        config.storage.db_path = db_path.to_string_lossy().to_string();
        config.llm.provider = "anthropic".to_string();
        config.llm.api_key = None;

        let err = AppContext::build(config).await.unwrap_err();
        assert!(matches!(err, StartupError::Llm(_)));
    }

    #[test]
    fn banner_names_backend_and_budget() {
        let config = mock_config("/tmp/x.db");
        let banner = format_startup_banner(&config);
        assert!(banner.contains("Lexprep v"));
        assert!(banner.contains("Backend: mock"));
        assert!(banner.contains("500 cents"));
        assert!(banner.contains("Ctrl+C"));
    }
}
