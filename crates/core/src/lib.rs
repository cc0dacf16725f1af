pub mod config;
pub mod domain;
pub mod errors;
pub mod prompts;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LlmConfig, LlmProvider, LoadOptions};
pub use domain::analysis::{AnalysisRequest, AnalysisType, ContractAnalysis};
pub use domain::contract::{
    Contract, ContractDraftRequest, ContractId, ContractType, GeneratedContract, NewContract,
    Party, CONTRACT_DISCLAIMER,
};
pub use domain::negotiation::{
    AssistantReply, AssistantRequest, Negotiation, NegotiationId, NegotiationMessage,
    NewMessage, NewNegotiation, SenderRole, Strategy,
};
pub use domain::profile::{Profile, UserId};
pub use errors::{ApplicationError, DomainError, InterfaceError};
pub use prompts::{ChatPrompt, PromptBuilder, PromptError, PromptKind};
