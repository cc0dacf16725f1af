use std::sync::Arc;

use parley_agent::{ContractAnalyzer, ContractDrafter, LlmClient, NegotiationAssistant};
use parley_core::prompts::{PromptBuilder, PromptError};
use parley_db::repositories::{
    ContractRepository, MessageRepository, NegotiationRepository, ProfileRepository,
    SqlContractRepository, SqlMessageRepository, SqlNegotiationRepository, SqlProfileRepository,
};
use parley_db::DbPool;

/// Shared handles for every route. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub negotiations: Arc<dyn NegotiationRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub contracts: Arc<dyn ContractRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub assistant: Arc<NegotiationAssistant>,
    pub drafter: Arc<ContractDrafter>,
    pub analyzer: Arc<ContractAnalyzer>,
}

impl AppState {
    /// Wires SQL-backed repositories and the workflows around one model client.
    pub fn new(db_pool: DbPool, llm: Arc<dyn LlmClient>) -> Result<Self, PromptError> {
        let prompts = Arc::new(PromptBuilder::new()?);
        let negotiations: Arc<dyn NegotiationRepository> =
            Arc::new(SqlNegotiationRepository::new(db_pool.clone()));
        let messages: Arc<dyn MessageRepository> =
            Arc::new(SqlMessageRepository::new(db_pool.clone()));
        let contracts: Arc<dyn ContractRepository> =
            Arc::new(SqlContractRepository::new(db_pool.clone()));
        let profiles: Arc<dyn ProfileRepository> = Arc::new(SqlProfileRepository::new(db_pool));

        Ok(Self {
            assistant: Arc::new(NegotiationAssistant::new(
                llm.clone(),
                negotiations.clone(),
                messages.clone(),
                prompts.clone(),
            )),
            drafter: Arc::new(ContractDrafter::new(
                llm.clone(),
                contracts.clone(),
                prompts.clone(),
            )),
            analyzer: Arc::new(ContractAnalyzer::new(llm, prompts)),
            negotiations,
            messages,
            contracts,
            profiles,
        })
    }
}
