pub mod analyze;
pub mod config;
pub mod doctor;
pub mod generate;
pub mod migrate;
pub mod negotiation;
pub mod seed;

use std::sync::Arc;

use parley_agent::{
    ContractDrafter, LlmClient, NegotiationAssistant, NegotiationSession, OpenAiCompatibleClient,
};
use parley_core::config::{AppConfig, LoadOptions};
use parley_core::domain::profile::UserId;
use parley_core::errors::ApplicationError;
use parley_core::prompts::PromptBuilder;
use parley_db::repositories::{
    ContractRepository, MessageRepository, NegotiationRepository, SqlContractRepository,
    SqlMessageRepository, SqlNegotiationRepository,
};
use parley_db::{connect_with_config, migrations, DbPool};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

/// Error class, message and exit code of a failed command.
pub(crate) type Failure = (&'static str, String, u8);

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub exit_code: u8,
    pub output: String,
}

#[derive(Debug, Serialize)]
struct CommandOutcome {
    command: String,
    status: String,
    error_class: Option<String>,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl CommandResult {
    pub fn success(command: &str, message: impl Into<String>) -> Self {
        Self::success_with_data(command, message, None)
    }

    pub fn success_with_data(
        command: &str,
        message: impl Into<String>,
        data: Option<Value>,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "ok".to_string(),
            error_class: None,
            message: message.into(),
            data,
        };
        Self { exit_code: 0, output: serialize_payload(payload) }
    }

    pub fn failure(
        command: &str,
        error_class: &str,
        message: impl Into<String>,
        exit_code: u8,
    ) -> Self {
        let payload = CommandOutcome {
            command: command.to_string(),
            status: "error".to_string(),
            error_class: Some(error_class.to_string()),
            message: message.into(),
            data: None,
        };
        Self { exit_code, output: serialize_payload(payload) }
    }

    pub(crate) fn from_failure(command: &str, (error_class, message, exit_code): Failure) -> Self {
        Self::failure(command, error_class, message, exit_code)
    }
}

fn serialize_payload(payload: CommandOutcome) -> String {
    serde_json::to_string(&payload).unwrap_or_else(|error| {
        format!(
            "{{\"command\":\"unknown\",\"status\":\"error\",\
             \"error_class\":\"serialization\",\"message\":\"{}\"}}",
            error.to_string().replace('\\', "\\\\").replace('"', "\\\"")
        )
    })
}

pub(crate) fn load_config(command: &str) -> Result<AppConfig, CommandResult> {
    AppConfig::load(LoadOptions::default()).map_err(|error| {
        CommandResult::failure(
            command,
            "config_validation",
            format!("configuration issue: {error}"),
            2,
        )
    })
}

pub(crate) fn build_runtime(command: &str) -> Result<tokio::runtime::Runtime, CommandResult> {
    tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
        CommandResult::failure(
            command,
            "runtime_init",
            format!("failed to initialize async runtime: {error}"),
            3,
        )
    })
}

/// Connects and brings the schema up to date.
pub(crate) async fn open_store(config: &AppConfig) -> Result<DbPool, Failure> {
    let pool = connect_with_config(&config.database)
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;
    migrations::run_pending(&pool).await.map_err(|error| ("migration", error.to_string(), 5u8))?;
    Ok(pool)
}

pub(crate) fn application_failure(error: ApplicationError) -> Failure {
    match error {
        ApplicationError::Domain(domain) => ("validation", domain.to_string(), 7),
        ApplicationError::Integration(message) => ("upstream", message, 8),
        ApplicationError::NotFound(message) => ("not_found", message, 9),
        ApplicationError::Persistence(message) => ("persistence", message, 9),
        ApplicationError::Configuration(message) => ("configuration", message, 2),
    }
}

pub(crate) fn parse_user(raw: &str) -> Result<UserId, Failure> {
    UserId::parse(raw).map_err(|error| ("validation", error.to_string(), 7u8))
}

pub(crate) fn correlation_id(command: &str) -> String {
    format!("cli-{command}-{}", Uuid::new_v4().simple())
}

/// Store-backed workflows around one model client, opened per command invocation.
pub(crate) struct Workbench {
    pub pool: DbPool,
    pub negotiations: Arc<dyn NegotiationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub assistant: Arc<NegotiationAssistant>,
    pub drafter: ContractDrafter,
}

impl Workbench {
    pub async fn open(config: &AppConfig) -> Result<Self, Failure> {
        let pool = open_store(config).await?;
        let llm = model_client(config)?;
        let prompts = prompt_builder()?;

        let negotiations: Arc<dyn NegotiationRepository> =
            Arc::new(SqlNegotiationRepository::new(pool.clone()));
        let messages: Arc<dyn MessageRepository> =
            Arc::new(SqlMessageRepository::new(pool.clone()));
        let contracts: Arc<dyn ContractRepository> =
            Arc::new(SqlContractRepository::new(pool.clone()));

        Ok(Self {
            assistant: Arc::new(NegotiationAssistant::new(
                llm.clone(),
                negotiations.clone(),
                messages.clone(),
                prompts.clone(),
            )),
            drafter: ContractDrafter::new(llm, contracts, prompts),
            negotiations,
            messages,
            pool,
        })
    }

    pub fn session(&self, user_id: UserId) -> NegotiationSession {
        NegotiationSession::new(
            user_id,
            self.negotiations.clone(),
            self.messages.clone(),
            self.assistant.clone(),
        )
    }
}

pub(crate) fn model_client(config: &AppConfig) -> Result<Arc<dyn LlmClient>, Failure> {
    let client = OpenAiCompatibleClient::from_config(&config.llm)
        .map_err(|error| ("configuration", error.to_string(), 2u8))?;
    Ok(Arc::new(client))
}

pub(crate) fn prompt_builder() -> Result<Arc<PromptBuilder>, Failure> {
    PromptBuilder::new().map(Arc::new).map_err(|error| ("configuration", error.to_string(), 2u8))
}
