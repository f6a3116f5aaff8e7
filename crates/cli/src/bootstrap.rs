use std::sync::Arc;

use stockroom_agent::executor::OperationExecutor;
use stockroom_agent::guardrails::GuardrailPolicy;
use stockroom_agent::llm::{CollaboratorError, ModelCollaborator};
use stockroom_agent::openai::OpenAiCompatibleClient;
use stockroom_agent::runtime::AgentRuntime;
use stockroom_agent::tools::{ManageInventoryTool, ToolRegistry};
use stockroom_core::config::{AppConfig, ConfigError, LoadOptions};
use stockroom_core::errors::ApplicationError;
use stockroom_db::{
    connect_with_settings, ensure_schema, inspect_store, DbPool, SqlInventoryRepository,
    StoreOrigin,
};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub store: Arc<SqlInventoryRepository>,
    pub store_origin: StoreOrigin,
    pub agent_runtime: AgentRuntime,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("model client setup failed: {0}")]
    Collaborator(#[source] CollaboratorError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database schema setup failed: {0}")]
    Schema(#[source] sqlx::Error),
}

impl From<BootstrapError> for ApplicationError {
    fn from(value: BootstrapError) -> Self {
        match value {
            BootstrapError::Config(error) => Self::Configuration(error.to_string()),
            BootstrapError::Collaborator(error) => Self::Collaborator(error.to_string()),
            error @ (BootstrapError::DatabaseConnect(_) | BootstrapError::Schema(_)) => {
                Self::Persistence(error.to_string())
            }
        }
    }
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let collaborator =
        OpenAiCompatibleClient::from_config(&config.llm).map_err(BootstrapError::Collaborator)?;
    info!(
        event_name = "system.bootstrap.collaborator_ready",
        correlation_id = "bootstrap",
        endpoint = collaborator.endpoint(),
        model = %config.llm.model,
        "model collaborator configured"
    );
    bootstrap_with_collaborator(config, Arc::new(collaborator)).await
}

/// Wires store, tools and runtime around an already-built collaborator.
pub async fn bootstrap_with_collaborator(
    config: AppConfig,
    collaborator: Arc<dyn ModelCollaborator>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let store_origin = inspect_store(&config.database.url);
    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        store_origin = %store_origin,
        "database connection established"
    );

    ensure_schema(&db_pool).await.map_err(BootstrapError::Schema)?;
    info!(
        event_name = "system.bootstrap.schema_ready",
        correlation_id = "bootstrap",
        "inventory table ready"
    );

    let store = Arc::new(SqlInventoryRepository::new(db_pool.clone()));
    let mut tools = ToolRegistry::default();
    tools.register(ManageInventoryTool::new(OperationExecutor::new(store.clone())));
    let agent_runtime =
        AgentRuntime::new(collaborator, tools, GuardrailPolicy::from(&config.agent));

    Ok(Application { config, db_pool, store, store_origin, agent_runtime })
}
