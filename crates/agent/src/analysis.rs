use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use parley_core::domain::analysis::{validate_upload, AnalysisRequest, ContractAnalysis};
use parley_core::errors::{ApplicationError, DomainError};
use parley_core::prompts::PromptBuilder;

use crate::llm::LlmClient;

/// Contract review. The analysis text is returned as-is and never persisted.
pub struct ContractAnalyzer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptBuilder>,
}

impl ContractAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptBuilder>) -> Self {
        Self { llm, prompts }
    }

    pub async fn analyze(
        &self,
        request: AnalysisRequest,
        correlation_id: &str,
    ) -> Result<ContractAnalysis, ApplicationError> {
        request.validate()?;

        let prompt = self
            .prompts
            .analysis(&request)
            .map_err(|error| ApplicationError::Configuration(error.to_string()))?;

        let analysis = self.llm.complete(&prompt).await.map_err(|error| {
            warn!(
                event_name = "analysis.upstream_failed",
                correlation_id,
                error = %error,
                "contract analysis failed"
            );
            ApplicationError::Integration(error.to_string())
        })?;

        info!(
            event_name = "analysis.completed",
            correlation_id,
            input_chars = request.contract_text.chars().count(),
            "contract analyzed"
        );

        Ok(ContractAnalysis {
            analysis,
            analysis_type: request.analysis_type,
            timestamp: Utc::now(),
        })
    }

    /// Reads a plain-text upload and analyzes its full contents. Anything but `.txt` is
    /// rejected before the file is opened.
    pub async fn analyze_file(
        &self,
        path: &Path,
        correlation_id: &str,
    ) -> Result<ContractAnalysis, ApplicationError> {
        validate_upload(path)?;
        let contract_text = tokio::fs::read_to_string(path).await.map_err(|error| {
            DomainError::validation(
                "file",
                format!("Could not read {}: {error}", path.display()),
            )
        })?;
        self.analyze(AnalysisRequest::full(contract_text), correlation_id).await
    }
}
