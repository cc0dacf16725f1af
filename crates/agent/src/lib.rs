//! Assistant workflows on top of a hosted chat-completion model.
//!
//! - `llm` - the outbound client (`LlmClient`) and its OpenAI-compatible implementation
//! - `assistant` - negotiation advice with transcript persistence
//! - `drafting` - contract generation and saving
//! - `analysis` - contract review for pasted or uploaded text
//! - `session` - the per-user negotiation session state machine
//!
//! The model only produces text. Validation, ownership and persistence are decided here
//! before and after the single upstream call.

pub mod analysis;
pub mod assistant;
pub mod drafting;
pub mod llm;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis::ContractAnalyzer;
pub use assistant::NegotiationAssistant;
pub use drafting::ContractDrafter;
pub use llm::{LlmClient, LlmError, OpenAiCompatibleClient};
pub use session::{NegotiationSession, SessionState};
