//! Prompt assembly for the hosted model.
//!
//! Each feature renders a system instruction and a user instruction from a fixed
//! template. Caller input is embedded verbatim; nothing here talks to the network.

use serde::Serialize;
use tera::{Context, Tera};
use thiserror::Error;

use crate::domain::analysis::AnalysisRequest;
use crate::domain::contract::ContractDraftRequest;
use crate::domain::negotiation::{AssistantRequest, NegotiationMessage};

pub const NEGOTIATION_TEMPERATURE: f32 = 0.7;
pub const DRAFTING_TEMPERATURE: f32 = 0.2;
pub const ANALYSIS_TEMPERATURE: f32 = 0.3;

const NEGOTIATION_SYSTEM: &str = "\
You are a seasoned negotiation advisor with working knowledge of business law, contract \
structure, and deal strategy. Help the user move this negotiation forward with professionalism \
and strategic insight.

Negotiation Strategy: {{ strategy }}
Context: {{ context }}

Previous conversation:
{{ history }}

Offer strategic advice, propose concrete responses, point out leverage, and steer toward \
outcomes that create value for every party. Stay professional and ethical.";

const DRAFTING_SYSTEM: &str = "\
You are a legal drafting assistant specializing in commercial contracts. Produce professional, \
comprehensive contracts with the clauses, definitions, and protections appropriate for the \
jurisdiction and contract type.

Drafting guidance for a {{ display_name }}: {{ guidance }}

Format the document with numbered sections and signature blocks, and state that the draft \
must be reviewed by a qualified attorney before use.";

const DRAFTING_USER: &str = "\
Generate a {{ contract_type }} contract with the following details:

Parties: {{ parties }}
Terms: {{ terms }}
Jurisdiction: {{ jurisdiction }}
{% if custom_requirements %}Additional Requirements: {{ custom_requirements }}
{% endif %}
Please create a comprehensive, professional contract document.";

const ANALYSIS_SYSTEM: &str = "\
You are a contract review assistant. Produce a {{ analysis_type }} analysis of the contract \
supplied by the user: summarize the agreement, list each party's key obligations and deadlines, \
flag risky or unusual clauses, note missing protections, and recommend points to negotiate. \
Answer in plain text with clear headings.";

const ANALYSIS_USER: &str = "{{ contract_text }}";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptKind {
    Negotiation,
    Drafting,
    Analysis,
}

impl PromptKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negotiation => "negotiation",
            Self::Drafting => "drafting",
            Self::Analysis => "analysis",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChatPrompt {
    pub kind: PromptKind,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt template failed: {0}")]
    Template(#[from] tera::Error),
    #[error("prompt input could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct PromptBuilder {
    templates: Tera,
}

impl PromptBuilder {
    pub fn new() -> Result<Self, PromptError> {
        let mut templates = Tera::default();
        templates.add_raw_templates(vec![
            ("negotiation_system.txt", NEGOTIATION_SYSTEM),
            ("drafting_system.txt", DRAFTING_SYSTEM),
            ("drafting_user.txt", DRAFTING_USER),
            ("analysis_system.txt", ANALYSIS_SYSTEM),
            ("analysis_user.txt", ANALYSIS_USER),
        ])?;
        Ok(Self { templates })
    }

    /// Advisor prompt: the transcript goes into the system instruction, the new message is
    /// the user instruction.
    pub fn negotiation(
        &self,
        request: &AssistantRequest,
        history: &[NegotiationMessage],
    ) -> Result<ChatPrompt, PromptError> {
        let transcript =
            history.iter().map(NegotiationMessage::transcript_line).collect::<Vec<_>>().join("\n");

        let mut context = Context::new();
        context.insert("strategy", request.strategy.as_str());
        context.insert("context", &request.rendered_context());
        context.insert("history", &transcript);

        Ok(ChatPrompt {
            kind: PromptKind::Negotiation,
            system: self.templates.render("negotiation_system.txt", &context)?,
            user: request.user_message.clone(),
            temperature: NEGOTIATION_TEMPERATURE,
        })
    }

    pub fn contract(&self, request: &ContractDraftRequest) -> Result<ChatPrompt, PromptError> {
        let contract_type = request.contract_type.clone().unwrap_or_default();

        let mut system_context = Context::new();
        system_context.insert("display_name", contract_type.display_name());
        system_context.insert("guidance", contract_type.drafting_guidance());

        let mut user_context = Context::new();
        user_context.insert("contract_type", contract_type.as_str());
        user_context.insert("parties", &serde_json::to_string(&request.parties)?);
        user_context.insert("terms", &serde_json::to_string(&request.terms)?);
        user_context.insert("jurisdiction", request.jurisdiction());
        user_context.insert("custom_requirements", &request.custom_requirements());

        Ok(ChatPrompt {
            kind: PromptKind::Drafting,
            system: self.templates.render("drafting_system.txt", &system_context)?,
            user: self.templates.render("drafting_user.txt", &user_context)?,
            temperature: DRAFTING_TEMPERATURE,
        })
    }

    pub fn analysis(&self, request: &AnalysisRequest) -> Result<ChatPrompt, PromptError> {
        let mut system_context = Context::new();
        system_context.insert("analysis_type", request.analysis_type.as_str());

        let mut user_context = Context::new();
        user_context.insert("contract_text", &request.contract_text);

        Ok(ChatPrompt {
            kind: PromptKind::Analysis,
            system: self.templates.render("analysis_system.txt", &system_context)?,
            user: self.templates.render("analysis_user.txt", &user_context)?,
            temperature: ANALYSIS_TEMPERATURE,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::{PromptBuilder, PromptKind, DRAFTING_TEMPERATURE, NEGOTIATION_TEMPERATURE};
    use crate::domain::analysis::AnalysisRequest;
    use crate::domain::contract::{ContractDraftRequest, ContractTerms, ContractType, Party};
    use crate::domain::negotiation::{
        AssistantRequest, MessageId, MessageKind, NegotiationContext, NegotiationId,
        NegotiationMessage, SenderRole, Strategy,
    };

    fn message(sender: SenderRole, text: &str) -> NegotiationMessage {
        NegotiationMessage {
            id: MessageId::generate(),
            negotiation_id: NegotiationId("neg-1".to_string()),
            sender_type: sender,
            message: text.to_string(),
            message_type: MessageKind::default(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn negotiation_prompt_embeds_strategy_context_and_transcript() {
        let builder = PromptBuilder::new().expect("templates");
        let request = AssistantRequest {
            user_message: "They countered at 90k. Next step?".to_string(),
            negotiation_context: Some(NegotiationContext::Text("Vendor renewal".to_string())),
            strategy: Strategy::Aggressive,
            ..AssistantRequest::default()
        };
        let history = vec![
            message(SenderRole::User, "Opening offer is 80k"),
            message(SenderRole::Ai, "Anchor high & justify it"),
        ];

        let prompt = builder.negotiation(&request, &history).expect("prompt");

        assert_eq!(prompt.kind, PromptKind::Negotiation);
        assert_eq!(prompt.temperature, NEGOTIATION_TEMPERATURE);
        assert_eq!(prompt.user, "They countered at 90k. Next step?");
        assert!(prompt.system.contains("Negotiation Strategy: aggressive"));
        assert!(prompt.system.contains("Context: Vendor renewal"));
        assert!(prompt.system.contains(
            "Previous conversation:\nuser: Opening offer is 80k\nai: Anchor high & justify it"
        ));
    }

    #[test]
    fn negotiation_prompt_without_context_uses_general_context() {
        let builder = PromptBuilder::new().expect("templates");
        let request =
            AssistantRequest { user_message: "Hi".to_string(), ..AssistantRequest::default() };

        let prompt = builder.negotiation(&request, &[]).expect("prompt");

        assert!(prompt.system.contains("Negotiation Strategy: balanced"));
        assert!(prompt.system.contains("Context: General business negotiation"));
    }

    #[test]
    fn contract_prompt_serializes_parties_and_terms_verbatim() {
        let builder = PromptBuilder::new().expect("templates");
        let request = ContractDraftRequest {
            contract_type: Some(ContractType::ServiceAgreement),
            parties: vec![Party::named("Acme Corp"), Party::named("Jane Doe")],
            terms: ContractTerms {
                payment_amount: Some("$5,000".to_string()),
                ..ContractTerms::default()
            },
            jurisdiction: None,
            custom_requirements: Some("Include a non-solicitation clause".to_string()),
        };

        let prompt = builder.contract(&request).expect("prompt");

        assert_eq!(prompt.kind, PromptKind::Drafting);
        assert_eq!(prompt.temperature, DRAFTING_TEMPERATURE);
        assert!(prompt.user.starts_with("Generate a service_agreement contract"));
        assert!(prompt.user.contains(r#""name":"Acme Corp""#));
        assert!(prompt.user.contains(r#"Terms: {"paymentAmount":"$5,000"}"#));
        assert!(prompt.user.contains("Jurisdiction: United States"));
        assert!(prompt.user.contains("Additional Requirements: Include a non-solicitation clause"));
        assert!(prompt.system.contains("Service Agreement"));
    }

    #[test]
    fn contract_prompt_selects_guidance_by_contract_type() {
        let builder = PromptBuilder::new().expect("templates");
        let nda = ContractDraftRequest {
            contract_type: Some(ContractType::Nda),
            parties: vec![Party::named("Acme Corp")],
            ..ContractDraftRequest::default()
        };

        let prompt = builder.contract(&nda).expect("prompt");

        assert!(prompt.system.contains(ContractType::Nda.drafting_guidance()));
        assert!(!prompt.user.contains("Additional Requirements"));
    }

    #[test]
    fn analysis_prompt_forwards_full_text() {
        let builder = PromptBuilder::new().expect("templates");
        let text = "1. Term. This agreement lasts <12> months.";

        let prompt = builder.analysis(&AnalysisRequest::full(text)).expect("prompt");

        assert_eq!(prompt.kind, PromptKind::Analysis);
        assert_eq!(prompt.user, text);
        assert!(prompt.system.contains("full analysis"));
    }
}
