use std::sync::Arc;

use parley_agent::{LlmClient, LlmError, OpenAiCompatibleClient};
use parley_core::config::{AppConfig, ConfigError, LoadOptions};
use parley_core::prompts::PromptError;
use parley_db::{connect_with_config, migrations, DbPool};
use thiserror::Error;
use tracing::info;

use crate::state::AppState;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub state: AppState,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
    #[error("model client setup failed: {0}")]
    Llm(#[from] LlmError),
    #[error("prompt templates failed to load: {0}")]
    Prompt(#[from] PromptError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

/// Connects the store, applies migrations and wires the model client for an already
/// loaded configuration.
pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        provider = config.llm.provider.as_str(),
        "starting application bootstrap"
    );
    config.validate()?;

    let db_pool =
        connect_with_config(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let client = OpenAiCompatibleClient::from_config(&config.llm)?;
    info!(
        event_name = "system.bootstrap.llm_ready",
        correlation_id = "bootstrap",
        endpoint = client.endpoint(),
        "model client configured"
    );
    let llm: Arc<dyn LlmClient> = Arc::new(client);
    let state = AppState::new(db_pool.clone(), llm)?;

    Ok(Application { config, db_pool, state })
}
