use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use parley_core::domain::negotiation::{
    AssistantReply, AssistantRequest, NegotiationId, NegotiationMessage, NewMessage,
};
use parley_core::domain::profile::UserId;
use parley_core::errors::ApplicationError;
use parley_core::prompts::PromptBuilder;
use parley_db::repositories::{MessageRepository, NegotiationRepository};

use crate::llm::LlmClient;

/// Negotiation advisor. When the request names a negotiation, the stored transcript feeds
/// the prompt and the exchange is appended afterwards.
pub struct NegotiationAssistant {
    llm: Arc<dyn LlmClient>,
    negotiations: Arc<dyn NegotiationRepository>,
    messages: Arc<dyn MessageRepository>,
    prompts: Arc<PromptBuilder>,
}

impl NegotiationAssistant {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        negotiations: Arc<dyn NegotiationRepository>,
        messages: Arc<dyn MessageRepository>,
        prompts: Arc<PromptBuilder>,
    ) -> Self {
        Self { llm, negotiations, messages, prompts }
    }

    /// A named negotiation must belong to `caller`; otherwise the request fails as not found
    /// before the model is called. Requests without a negotiation need no caller.
    pub async fn respond(
        &self,
        caller: Option<&UserId>,
        request: AssistantRequest,
        correlation_id: &str,
    ) -> Result<AssistantReply, ApplicationError> {
        request.validate()?;

        let history = match &request.negotiation_id {
            Some(negotiation_id) => {
                self.ensure_owned(caller, negotiation_id, correlation_id).await?;
                self.history(negotiation_id, correlation_id).await
            }
            None => Vec::new(),
        };

        let prompt = self
            .prompts
            .negotiation(&request, &history)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let ai_response = self.llm.complete(&prompt).await.map_err(|error| {
            warn!(
                event_name = "assistant.upstream_failed",
                correlation_id,
                error = %error,
                "negotiation advice failed"
            );
            ApplicationError::Integration(error.to_string())
        })?;

        // Written only after the upstream call succeeded: user turn first, then the reply.
        if let Some(negotiation_id) = &request.negotiation_id {
            for message in [
                NewMessage::user(negotiation_id.clone(), request.user_message.clone()),
                NewMessage::ai(negotiation_id.clone(), ai_response.clone()),
            ] {
                self.messages.append(message).await.map_err(|error| {
                    warn!(
                        event_name = "assistant.append_failed",
                        correlation_id,
                        negotiation_id = %negotiation_id,
                        error = %error,
                        "transcript append failed"
                    );
                    ApplicationError::Persistence(error.to_string())
                })?;
            }
        }

        info!(
            event_name = "assistant.responded",
            correlation_id,
            strategy = request.strategy.as_str(),
            persisted = request.negotiation_id.is_some(),
            "negotiation advice produced"
        );

        Ok(AssistantReply { ai_response, strategy: request.strategy, timestamp: Utc::now() })
    }

    async fn ensure_owned(
        &self,
        caller: Option<&UserId>,
        negotiation_id: &NegotiationId,
        correlation_id: &str,
    ) -> Result<(), ApplicationError> {
        let not_found = || ApplicationError::NotFound(format!("negotiation {negotiation_id}"));
        let Some(caller) = caller else {
            return Err(not_found());
        };

        match self.negotiations.find_for_user(caller, negotiation_id).await {
            Ok(Some(_)) => Ok(()),
            Ok(None) => {
                warn!(
                    event_name = "assistant.negotiation_not_found",
                    correlation_id,
                    negotiation_id = %negotiation_id,
                    user_id = %caller,
                    "negotiation unknown for caller"
                );
                Err(not_found())
            }
            Err(error) => Err(ApplicationError::Persistence(error.to_string())),
        }
    }

    /// Read failures degrade to an empty transcript.
    async fn history(
        &self,
        negotiation_id: &NegotiationId,
        correlation_id: &str,
    ) -> Vec<NegotiationMessage> {
        match self.messages.list_for_negotiation(negotiation_id).await {
            Ok(history) => history,
            Err(error) => {
                warn!(
                    event_name = "assistant.history_unavailable",
                    correlation_id,
                    negotiation_id = %negotiation_id,
                    error = %error,
                    "continuing without transcript"
                );
                Vec::new()
            }
        }
    }
}
