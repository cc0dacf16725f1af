use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::profile::UserId;
use crate::errors::DomainError;

pub const DEFAULT_NEGOTIATION_CONTEXT: &str = "General business negotiation";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NegotiationId(pub String);

impl NegotiationId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for NegotiationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub String);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Negotiation status is free-form in storage; the known values get their own variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NegotiationStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
    Other(String),
}

impl NegotiationStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Other(value) => value,
        }
    }
}

impl From<String> for NegotiationStatus {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "draft" => Self::Draft,
            "active" => Self::Active,
            "completed" => Self::Completed,
            "cancelled" => Self::Cancelled,
            _ => Self::Other(value),
        }
    }
}

impl From<NegotiationStatus> for String {
    fn from(value: NegotiationStatus) -> Self {
        value.as_str().to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Negotiation {
    pub id: NegotiationId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub status: NegotiationStatus,
    pub counterparty_name: Option<String>,
    pub deal_value: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Fields a user supplies when opening a negotiation.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NewNegotiation {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub deal_value: Option<Decimal>,
}

impl NewNegotiation {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("title", "Please enter a negotiation title."));
        }
        Ok(())
    }
}

impl Negotiation {
    /// Builds a freshly created negotiation. New negotiations always start as drafts.
    pub fn draft(
        user_id: UserId,
        input: NewNegotiation,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DomainError> {
        input.validate()?;
        Ok(Self {
            id: NegotiationId::generate(),
            user_id,
            title: input.title.trim().to_string(),
            description: non_blank(input.description),
            status: NegotiationStatus::Draft,
            counterparty_name: non_blank(input.counterparty_name),
            deal_value: input.deal_value,
            created_at,
        })
    }

    pub fn summary(&self) -> NegotiationSummary {
        NegotiationSummary {
            title: self.title.clone(),
            description: self.description.clone(),
            counterparty_name: self.counterparty_name.clone(),
            deal_value: self.deal_value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SenderRole {
    User,
    Ai,
}

impl SenderRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Ai => "ai",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "user" => Some(Self::User),
            "ai" => Some(Self::Ai),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageKind(pub String);

impl Default for MessageKind {
    fn default() -> Self {
        Self("text".to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NegotiationMessage {
    pub id: MessageId,
    pub negotiation_id: NegotiationId,
    pub sender_type: SenderRole,
    pub message: String,
    pub message_type: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl NegotiationMessage {
    pub fn transcript_line(&self) -> String {
        format!("{}: {}", self.sender_type.as_str(), self.message)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewMessage {
    pub negotiation_id: NegotiationId,
    pub sender_type: SenderRole,
    pub message: String,
    pub message_type: MessageKind,
}

impl NewMessage {
    pub fn user(negotiation_id: NegotiationId, message: impl Into<String>) -> Self {
        Self {
            negotiation_id,
            sender_type: SenderRole::User,
            message: message.into(),
            message_type: MessageKind::default(),
        }
    }

    pub fn ai(negotiation_id: NegotiationId, message: impl Into<String>) -> Self {
        Self {
            negotiation_id,
            sender_type: SenderRole::Ai,
            message: message.into(),
            message_type: MessageKind::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    #[default]
    Balanced,
    Aggressive,
    Collaborative,
    Defensive,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Balanced => "balanced",
            Self::Aggressive => "aggressive",
            Self::Collaborative => "collaborative",
            Self::Defensive => "defensive",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "balanced" => Some(Self::Balanced),
            "aggressive" => Some(Self::Aggressive),
            "collaborative" => Some(Self::Collaborative),
            "defensive" => Some(Self::Defensive),
            _ => None,
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationSummary {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub counterparty_name: Option<String>,
    #[serde(default)]
    pub deal_value: Option<Decimal>,
}

impl NegotiationSummary {
    pub fn render(&self) -> String {
        let description = self.description.as_deref().unwrap_or("Not provided");
        let counterparty = self.counterparty_name.as_deref().unwrap_or("Not provided");
        let deal_value =
            self.deal_value.map(format_deal_value).unwrap_or_else(|| "TBD".to_string());
        format!(
            "Negotiation: {}. Description: {description}. Counterparty: {counterparty}. Deal Value: ${deal_value}",
            self.title
        )
    }
}

/// Context sent along with a message: either a structured summary or pre-rendered text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NegotiationContext {
    Summary(NegotiationSummary),
    Text(String),
}

impl NegotiationContext {
    /// Rendered context, or `None` when nothing meaningful was supplied.
    pub fn render(&self) -> Option<String> {
        let rendered = match self {
            Self::Summary(summary) => summary.render(),
            Self::Text(text) => text.trim().to_string(),
        };
        (!rendered.is_empty()).then_some(rendered)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantRequest {
    #[serde(default)]
    pub negotiation_id: Option<NegotiationId>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub negotiation_context: Option<NegotiationContext>,
    #[serde(default)]
    pub strategy: Strategy,
}

impl AssistantRequest {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.user_message.trim().is_empty() {
            return Err(DomainError::validation("userMessage", "User message is required"));
        }
        Ok(())
    }

    pub fn rendered_context(&self) -> String {
        self.negotiation_context
            .as_ref()
            .and_then(NegotiationContext::render)
            .unwrap_or_else(|| DEFAULT_NEGOTIATION_CONTEXT.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantReply {
    pub ai_response: String,
    pub strategy: Strategy,
    pub timestamp: DateTime<Utc>,
}

/// Formats a currency amount with thousands separators and at most two decimals.
pub fn format_deal_value(value: Decimal) -> String {
    let rounded = value.round_dp(2).normalize();
    let digits = rounded.abs().to_string();
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits.as_str(), None),
    };

    let mut grouped = String::with_capacity(digits.len() + whole.len() / 3 + 1);
    for (index, digit) in whole.chars().enumerate() {
        if index > 0 && (whole.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{grouped}")
    } else {
        grouped
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|text| text.trim().to_string()).filter(|text| !text.is_empty())
}
