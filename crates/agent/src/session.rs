//! Per-user negotiation session.
//!
//! Tracks which negotiation is selected and its transcript. The lifecycle is
//! `NoSelection -> Loading -> Idle <-> InFlight`; selecting another negotiation always
//! discards the in-memory transcript and reloads it from the store.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use parley_core::domain::negotiation::{
    AssistantReply, AssistantRequest, Negotiation, NegotiationContext, NegotiationId,
    NegotiationMessage, NewNegotiation, Strategy,
};
use parley_core::domain::profile::UserId;
use parley_core::errors::{ApplicationError, DomainError};
use parley_db::repositories::{MessageRepository, NegotiationRepository};

use crate::assistant::NegotiationAssistant;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SessionState {
    NoSelection,
    Loading(NegotiationId),
    Idle(NegotiationId),
    InFlight(NegotiationId),
}

pub struct NegotiationSession {
    user_id: UserId,
    negotiations: Arc<dyn NegotiationRepository>,
    messages: Arc<dyn MessageRepository>,
    assistant: Arc<NegotiationAssistant>,
    state: SessionState,
    selected: Option<Negotiation>,
    transcript: Vec<NegotiationMessage>,
    strategy: Strategy,
}

impl NegotiationSession {
    pub fn new(
        user_id: UserId,
        negotiations: Arc<dyn NegotiationRepository>,
        messages: Arc<dyn MessageRepository>,
        assistant: Arc<NegotiationAssistant>,
    ) -> Self {
        Self {
            user_id,
            negotiations,
            messages,
            assistant,
            state: SessionState::NoSelection,
            selected: None,
            transcript: Vec::new(),
            strategy: Strategy::default(),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn selected(&self) -> Option<&Negotiation> {
        self.selected.as_ref()
    }

    pub fn transcript(&self) -> &[NegotiationMessage] {
        &self.transcript
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        self.strategy = strategy;
    }

    /// The caller's negotiations, newest first. Store failures read as an empty list.
    pub async fn negotiations(&self, limit: Option<u32>) -> Vec<Negotiation> {
        match self.negotiations.list_for_user(&self.user_id, limit).await {
            Ok(negotiations) => negotiations,
            Err(error) => {
                warn!(
                    event_name = "session.list_failed",
                    user_id = %self.user_id,
                    error = %error,
                    "negotiation list unavailable"
                );
                Vec::new()
            }
        }
    }

    /// Creates a draft negotiation and selects it.
    pub async fn create(&mut self, input: NewNegotiation) -> Result<Negotiation, ApplicationError> {
        let negotiation = Negotiation::draft(self.user_id.clone(), input, Utc::now())?;
        self.negotiations
            .create(negotiation.clone())
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;
        self.select(&negotiation.id).await?;
        Ok(negotiation)
    }

    pub async fn select(&mut self, id: &NegotiationId) -> Result<(), ApplicationError> {
        self.transcript.clear();
        self.selected = None;
        self.state = SessionState::Loading(id.clone());

        let found = self
            .negotiations
            .find_for_user(&self.user_id, id)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()));
        let negotiation = match found {
            Ok(Some(negotiation)) => negotiation,
            Ok(None) => {
                self.state = SessionState::NoSelection;
                return Err(ApplicationError::NotFound(format!("negotiation {id}")));
            }
            Err(error) => {
                self.state = SessionState::NoSelection;
                return Err(error);
            }
        };

        self.selected = Some(negotiation);
        self.reload().await;
        self.state = SessionState::Idle(id.clone());
        Ok(())
    }

    /// Sends one message for the selected negotiation and reloads the transcript.
    pub async fn send(&mut self, text: &str) -> Result<AssistantReply, ApplicationError> {
        let negotiation_id = match &self.state {
            SessionState::Idle(id) => id.clone(),
            SessionState::InFlight(_) => {
                return Err(DomainError::validation(
                    "userMessage",
                    "Please wait for the current reply before sending another message.",
                )
                .into());
            }
            SessionState::NoSelection | SessionState::Loading(_) => {
                return Err(
                    DomainError::validation("negotiation", "Please select a negotiation.").into()
                );
            }
        };

        let request = AssistantRequest {
            negotiation_id: Some(negotiation_id.clone()),
            user_message: text.to_string(),
            negotiation_context: self
                .selected
                .as_ref()
                .map(|negotiation| NegotiationContext::Summary(negotiation.summary())),
            strategy: self.strategy,
        };
        request.validate()?;

        self.state = SessionState::InFlight(negotiation_id.clone());
        let correlation_id = format!("session-{negotiation_id}-{}", Utc::now().timestamp_millis());
        let outcome = self.assistant.respond(Some(&self.user_id), request, &correlation_id).await;

        self.reload().await;
        self.state = SessionState::Idle(negotiation_id);
        outcome
    }

    async fn reload(&mut self) {
        let Some(negotiation) = &self.selected else {
            self.transcript.clear();
            return;
        };

        self.transcript = match self.messages.list_for_negotiation(&negotiation.id).await {
            Ok(messages) => messages,
            Err(error) => {
                warn!(
                    event_name = "session.reload_failed",
                    negotiation_id = %negotiation.id,
                    error = %error,
                    "transcript unavailable"
                );
                Vec::new()
            }
        };
    }
}
