use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use thiserror::Error;

use parley_core::domain::contract::Contract;
use parley_core::domain::negotiation::{
    Negotiation, NegotiationId, NegotiationMessage, NewMessage,
};
use parley_core::domain::profile::{Profile, UserId};

pub mod contract;
pub mod memory;
pub mod message;
pub mod negotiation;
pub mod profile;

pub use contract::SqlContractRepository;
pub use memory::{InMemoryContractRepository, InMemoryNegotiationStore, InMemoryProfileRepository};
pub use message::SqlMessageRepository;
pub use negotiation::SqlNegotiationRepository;
pub use profile::SqlProfileRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("constraint violation: {0}")]
    Constraint(String),
}

#[async_trait]
pub trait NegotiationRepository: Send + Sync {
    async fn create(&self, negotiation: Negotiation) -> Result<(), RepositoryError>;

    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &NegotiationId,
    ) -> Result<Option<Negotiation>, RepositoryError>;

    /// Newest first. `None` returns every negotiation the user owns.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Negotiation>, RepositoryError>;
}

#[async_trait]
pub trait MessageRepository: Send + Sync {
    /// Stamps the message with a fresh id and the current time.
    async fn append(&self, message: NewMessage) -> Result<NegotiationMessage, RepositoryError>;

    /// Oldest first; equal timestamps keep insertion order.
    async fn list_for_negotiation(
        &self,
        negotiation_id: &NegotiationId,
    ) -> Result<Vec<NegotiationMessage>, RepositoryError>;
}

#[async_trait]
pub trait ContractRepository: Send + Sync {
    async fn save(&self, contract: Contract) -> Result<(), RepositoryError>;

    /// Newest first.
    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Contract>, RepositoryError>;
}

#[async_trait]
pub trait ProfileRepository: Send + Sync {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError>;
}

/// Fixed-width RFC 3339 so that lexical order in SQLite matches time order.
pub(crate) fn encode_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|error| RepositoryError::Decode(format!("invalid timestamp `{value}`: {error}")))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{decode_timestamp, encode_timestamp};

    #[test]
    fn encoded_timestamps_sort_lexically_in_time_order() {
        let earlier = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).single().expect("valid time");
        let later = earlier + chrono::Duration::microseconds(1);

        assert!(encode_timestamp(&earlier) < encode_timestamp(&later));
        assert_eq!(encode_timestamp(&earlier), "2024-01-02T09:00:00.000000Z");
        assert_eq!(decode_timestamp(&encode_timestamp(&later)).expect("decode"), later);
    }

    #[test]
    fn malformed_timestamp_is_a_decode_error() {
        assert!(decode_timestamp("yesterday").is_err());
    }
}
