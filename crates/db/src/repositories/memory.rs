use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use parley_core::domain::contract::Contract;
use parley_core::domain::negotiation::{
    MessageId, Negotiation, NegotiationId, NegotiationMessage, NewMessage,
};
use parley_core::domain::profile::{Profile, UserId};

use super::{
    ContractRepository, MessageRepository, NegotiationRepository, ProfileRepository,
    RepositoryError,
};

/// Negotiations and their messages behind one lock so appends can check the parent exists.
#[derive(Default)]
pub struct InMemoryNegotiationStore {
    state: RwLock<NegotiationState>,
}

#[derive(Default)]
struct NegotiationState {
    negotiations: Vec<Negotiation>,
    messages: Vec<NegotiationMessage>,
}

#[async_trait::async_trait]
impl NegotiationRepository for InMemoryNegotiationStore {
    async fn create(&self, negotiation: Negotiation) -> Result<(), RepositoryError> {
        let mut state = self.state.write().await;
        if state.negotiations.iter().any(|existing| existing.id == negotiation.id) {
            return Err(RepositoryError::Constraint(format!(
                "negotiation {} already exists",
                negotiation.id
            )));
        }
        state.negotiations.push(negotiation);
        Ok(())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &NegotiationId,
    ) -> Result<Option<Negotiation>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .negotiations
            .iter()
            .find(|negotiation| &negotiation.id == id && &negotiation.user_id == user_id)
            .cloned())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Negotiation>, RepositoryError> {
        let state = self.state.read().await;
        let mut owned: Vec<Negotiation> = state
            .negotiations
            .iter()
            .rev()
            .filter(|negotiation| &negotiation.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        if let Some(limit) = limit {
            owned.truncate(limit as usize);
        }
        Ok(owned)
    }
}

#[async_trait::async_trait]
impl MessageRepository for InMemoryNegotiationStore {
    async fn append(&self, message: NewMessage) -> Result<NegotiationMessage, RepositoryError> {
        let mut state = self.state.write().await;
        if !state.negotiations.iter().any(|negotiation| negotiation.id == message.negotiation_id) {
            return Err(RepositoryError::Constraint(format!(
                "negotiation {} does not exist",
                message.negotiation_id
            )));
        }

        let stored = NegotiationMessage {
            id: MessageId::generate(),
            negotiation_id: message.negotiation_id,
            sender_type: message.sender_type,
            message: message.message,
            message_type: message.message_type,
            created_at: Utc::now(),
        };
        state.messages.push(stored.clone());
        Ok(stored)
    }

    async fn list_for_negotiation(
        &self,
        negotiation_id: &NegotiationId,
    ) -> Result<Vec<NegotiationMessage>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state
            .messages
            .iter()
            .filter(|message| &message.negotiation_id == negotiation_id)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryContractRepository {
    contracts: RwLock<Vec<Contract>>,
}

#[async_trait::async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn save(&self, contract: Contract) -> Result<(), RepositoryError> {
        let mut contracts = self.contracts.write().await;
        contracts.push(contract);
        Ok(())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Contract>, RepositoryError> {
        let contracts = self.contracts.read().await;
        let mut owned: Vec<Contract> = contracts
            .iter()
            .rev()
            .filter(|contract| &contract.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        Ok(owned)
    }
}

#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileRepository {
    pub async fn insert(&self, profile: Profile) {
        let mut profiles = self.profiles.write().await;
        profiles.insert(profile.user_id.0.clone(), profile);
    }
}

#[async_trait::async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let profiles = self.profiles.read().await;
        Ok(profiles.get(&user_id.0).cloned())
    }
}
