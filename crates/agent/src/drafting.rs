use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use parley_core::domain::contract::{
    Contract, ContractDraftRequest, GeneratedContract, NewContract, CONTRACT_DISCLAIMER,
};
use parley_core::domain::profile::UserId;
use parley_core::errors::ApplicationError;
use parley_core::prompts::PromptBuilder;
use parley_db::repositories::ContractRepository;

use crate::llm::LlmClient;

pub struct ContractDrafter {
    llm: Arc<dyn LlmClient>,
    contracts: Arc<dyn ContractRepository>,
    prompts: Arc<PromptBuilder>,
}

impl ContractDrafter {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        contracts: Arc<dyn ContractRepository>,
        prompts: Arc<PromptBuilder>,
    ) -> Self {
        Self { llm, contracts, prompts }
    }

    /// Drafts a contract. Nothing is persisted; see [`ContractDrafter::save`].
    pub async fn generate(
        &self,
        request: ContractDraftRequest,
        correlation_id: &str,
    ) -> Result<GeneratedContract, ApplicationError> {
        request.validate()?;

        let prompt = self
            .prompts
            .contract(&request)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let contract = self.llm.complete(&prompt).await.map_err(|error| {
            warn!(
                event_name = "drafting.upstream_failed",
                correlation_id,
                error = %error,
                "contract generation failed"
            );
            ApplicationError::Integration(error.to_string())
        })?;

        let contract_type = request.contract_type.clone().unwrap_or_default();
        info!(
            event_name = "drafting.generated",
            correlation_id,
            contract_type = contract_type.as_str(),
            parties = request.parties.len(),
            "contract generated"
        );

        Ok(GeneratedContract {
            contract,
            jurisdiction: request.jurisdiction().to_string(),
            contract_type,
            timestamp: Utc::now(),
            disclaimer: CONTRACT_DISCLAIMER.to_string(),
        })
    }

    /// Stores a generated contract as a draft snapshot owned by `user_id`.
    pub async fn save(
        &self,
        user_id: &UserId,
        input: NewContract,
        correlation_id: &str,
    ) -> Result<Contract, ApplicationError> {
        let contract = Contract::snapshot(user_id.clone(), input, Utc::now())?;
        self.contracts.save(contract.clone()).await.map_err(|error| {
            warn!(
                event_name = "drafting.save_failed",
                correlation_id,
                error = %error,
                "contract save failed"
            );
            ApplicationError::Persistence(error.to_string())
        })?;

        info!(
            event_name = "drafting.saved",
            correlation_id,
            contract_id = %contract.id,
            "contract saved"
        );
        Ok(contract)
    }
}
