use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

pub const UNSUPPORTED_UPLOAD_NOTICE: &str = "Please upload a text (.txt) file.";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    #[default]
    Full,
}

impl AnalysisType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Full => "full",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[serde(default)]
    pub contract_text: String,
    #[serde(default)]
    pub analysis_type: AnalysisType,
}

impl AnalysisRequest {
    pub fn full(contract_text: impl Into<String>) -> Self {
        Self { contract_text: contract_text.into(), analysis_type: AnalysisType::Full }
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.contract_text.trim().is_empty() {
            return Err(DomainError::validation(
                "contractText",
                "Please enter or paste contract text to analyze.",
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractAnalysis {
    pub analysis: String,
    pub analysis_type: AnalysisType,
    pub timestamp: DateTime<Utc>,
}

/// Only plain-text uploads are accepted; the check depends on the file name alone,
/// so repeating the same upload always produces the same outcome.
pub fn validate_upload(path: &Path) -> Result<(), DomainError> {
    let is_text = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("txt"))
        .unwrap_or(false);

    if is_text {
        Ok(())
    } else {
        Err(DomainError::validation("file", UNSUPPORTED_UPLOAD_NOTICE))
    }
}
