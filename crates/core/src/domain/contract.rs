use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::profile::UserId;
use crate::errors::DomainError;

pub const CONTRACT_DISCLAIMER: &str =
    "This contract is AI-generated and should be reviewed by a qualified attorney before use.";
pub const DEFAULT_JURISDICTION: &str = "United States";

const MISSING_FIELDS_NOTICE: &str = "Please fill in contract type and all party names.";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Contract family; selects the drafting guidance used in the prompt.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractType {
    Nda,
    ServiceAgreement,
    Partnership,
    Employment,
    #[default]
    General,
    Other(String),
}

impl ContractType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Nda => "nda",
            Self::ServiceAgreement => "service_agreement",
            Self::Partnership => "partnership",
            Self::Employment => "employment",
            Self::General => "general",
            Self::Other(value) => value,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Nda => "Non-Disclosure Agreement (NDA)",
            Self::ServiceAgreement => "Service Agreement",
            Self::Partnership => "Partnership Agreement",
            Self::Employment => "Employment Contract",
            Self::General => "General Contract",
            Self::Other(value) => value,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.as_str().trim().is_empty()
    }

    /// Type-specific drafting guidance appended to the system prompt.
    pub fn drafting_guidance(&self) -> &'static str {
        match self {
            Self::Nda => {
                "Define confidential information precisely, list the permitted uses and exclusions, \
                 set the confidentiality term, and cover return or destruction of materials."
            }
            Self::ServiceAgreement => {
                "Describe the scope of services and deliverables, acceptance criteria, payment \
                 schedule, service levels, intellectual property ownership, and termination rights."
            }
            Self::Partnership => {
                "Set out capital contributions, profit and loss allocation, management and voting \
                 rights, admission and withdrawal of partners, and dissolution."
            }
            Self::Employment => {
                "Cover position and duties, compensation and benefits, working hours, probation, \
                 confidentiality, restrictive covenants permitted in the jurisdiction, and termination."
            }
            Self::General | Self::Other(_) => {
                "Include recitals, definitions, obligations of each party, payment terms, \
                 warranties, limitation of liability, dispute resolution, and termination."
            }
        }
    }
}

impl From<String> for ContractType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "nda" => Self::Nda,
            "service_agreement" => Self::ServiceAgreement,
            "partnership" => Self::Partnership,
            "employment" => Self::Employment,
            "general" => Self::General,
            _ => Self::Other(value.trim().to_string()),
        }
    }
}

impl From<ContractType> for String {
    fn from(value: ContractType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ContractType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Party {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub address: String,
}

impl Party {
    pub fn named(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Self::default() }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractTerms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_terms: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deliverables: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractDraftRequest {
    #[serde(default)]
    pub contract_type: Option<ContractType>,
    #[serde(default)]
    pub parties: Vec<Party>,
    #[serde(default)]
    pub terms: ContractTerms,
    #[serde(default)]
    pub jurisdiction: Option<String>,
    #[serde(default)]
    pub custom_requirements: Option<String>,
}

impl ContractDraftRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        let missing_type = self.contract_type.as_ref().map(ContractType::is_blank).unwrap_or(true);
        if missing_type {
            return Err(DomainError::validation("contractType", MISSING_FIELDS_NOTICE));
        }
        if self.parties.is_empty() {
            return Err(DomainError::validation(
                "parties",
                "Contract type and parties are required",
            ));
        }
        if let Some(index) = self.parties.iter().position(|party| party.name.trim().is_empty()) {
            return Err(DomainError::validation(
                format!("parties[{index}].name"),
                MISSING_FIELDS_NOTICE,
            ));
        }
        Ok(())
    }

    pub fn jurisdiction(&self) -> &str {
        self.jurisdiction
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_JURISDICTION)
    }

    pub fn custom_requirements(&self) -> Option<&str> {
        self.custom_requirements.as_deref().map(str::trim).filter(|value| !value.is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContract {
    pub contract: String,
    pub contract_type: ContractType,
    pub jurisdiction: String,
    pub timestamp: DateTime<Utc>,
    pub disclaimer: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContractStatus {
    Draft,
    Other(String),
}

impl ContractStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for ContractStatus {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case("draft") {
            Self::Draft
        } else {
            Self::Other(value)
        }
    }
}

impl From<ContractStatus> for String {
    fn from(value: ContractStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub user_id: UserId,
    pub title: String,
    pub content: String,
    pub contract_type: ContractType,
    pub status: ContractStatus,
    pub created_at: DateTime<Utc>,
}

/// Save request for a generated contract snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewContract {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub contract_type: ContractType,
}

impl NewContract {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.content.trim().is_empty() || self.title.trim().is_empty() {
            let field = if self.content.trim().is_empty() { "content" } else { "title" };
            return Err(DomainError::validation(
                field,
                "Please provide a contract title and generate the contract first.",
            ));
        }
        Ok(())
    }
}

impl Contract {
    pub fn snapshot(
        user_id: UserId,
        input: NewContract,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        input.validate()?;
        Ok(Self {
            id: ContractId::generate(),
            user_id,
            title: input.title.trim().to_string(),
            content: input.content,
            contract_type: input.contract_type,
            status: ContractStatus::Draft,
            created_at,
        })
    }
}

/// File name used when a generated contract is downloaded as plain text.
pub fn download_file_name(title: Option<&str>) -> String {
    let stem = title
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| value.replace(['/', '\\'], "-"))
        .unwrap_or_else(|| "contract".to_string());
    format!("{stem}.txt")
}
