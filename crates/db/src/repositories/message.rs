use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use parley_core::domain::negotiation::{
    MessageId, MessageKind, NegotiationId, NegotiationMessage, NewMessage, SenderRole,
};

use super::{decode_timestamp, encode_timestamp, MessageRepository, RepositoryError};
use crate::DbPool;

pub struct SqlMessageRepository {
    pool: DbPool,
}

impl SqlMessageRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl MessageRepository for SqlMessageRepository {
    async fn append(&self, message: NewMessage) -> Result<NegotiationMessage, RepositoryError> {
        let stored = NegotiationMessage {
            id: MessageId::generate(),
            negotiation_id: message.negotiation_id,
            sender_type: message.sender_type,
            message: message.message,
            message_type: message.message_type,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO negotiation_messages
                (id, negotiation_id, sender_type, message, message_type, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&stored.id.0)
        .bind(&stored.negotiation_id.0)
        .bind(stored.sender_type.as_str())
        .bind(&stored.message)
        .bind(&stored.message_type.0)
        .bind(encode_timestamp(&stored.created_at))
        .execute(&self.pool)
        .await?;

        Ok(stored)
    }

    async fn list_for_negotiation(
        &self,
        negotiation_id: &NegotiationId,
    ) -> Result<Vec<NegotiationMessage>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, negotiation_id, sender_type, message, message_type, created_at
             FROM negotiation_messages
             WHERE negotiation_id = ?1
             ORDER BY created_at ASC, rowid ASC",
        )
        .bind(&negotiation_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(message_from_row).collect()
    }
}

fn message_from_row(row: &SqliteRow) -> Result<NegotiationMessage, RepositoryError> {
    let sender: String = row.try_get("sender_type")?;
    let sender_type = SenderRole::parse(&sender)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown sender_type `{sender}`")))?;

    Ok(NegotiationMessage {
        id: MessageId(row.try_get("id")?),
        negotiation_id: NegotiationId(row.try_get("negotiation_id")?),
        sender_type,
        message: row.try_get("message")?,
        message_type: MessageKind(row.try_get("message_type")?),
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use parley_core::domain::negotiation::{
        Negotiation, NegotiationId, NewMessage, NewNegotiation, SenderRole,
    };
    use parley_core::domain::profile::UserId;

    use super::SqlMessageRepository;
    use crate::repositories::{
        MessageRepository, NegotiationRepository, RepositoryError, SqlNegotiationRepository,
    };
    use crate::{connect_with_settings, migrations, DbPool};

    async fn setup() -> DbPool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    async fn seeded_negotiation(pool: &DbPool, title: &str) -> NegotiationId {
        let negotiation = Negotiation::draft(
            UserId("user-a".to_string()),
            NewNegotiation { title: title.to_string(), ..NewNegotiation::default() },
            Utc::now(),
        )
        .expect("valid negotiation");
        let id = negotiation.id.clone();
        SqlNegotiationRepository::new(pool.clone()).create(negotiation).await.expect("create");
        id
    }

    #[tokio::test]
    async fn messages_come_back_oldest_first_per_negotiation() {
        let pool = setup().await;
        let first = seeded_negotiation(&pool, "first").await;
        let second = seeded_negotiation(&pool, "second").await;
        let repo = SqlMessageRepository::new(pool);

        repo.append(NewMessage::user(first.clone(), "opening")).await.expect("append");
        repo.append(NewMessage::ai(first.clone(), "advice")).await.expect("append");
        repo.append(NewMessage::user(second.clone(), "elsewhere")).await.expect("append");

        let messages = repo.list_for_negotiation(&first).await.expect("list");
        let senders: Vec<_> = messages.iter().map(|m| m.sender_type).collect();
        let texts: Vec<_> = messages.iter().map(|m| m.message.as_str()).collect();

        assert_eq!(senders, vec![SenderRole::User, SenderRole::Ai]);
        assert_eq!(texts, vec!["opening", "advice"]);
        assert!(messages.iter().all(|m| m.message_type.0 == "text"));
    }

    #[tokio::test]
    async fn append_to_unknown_negotiation_is_rejected() {
        let repo = SqlMessageRepository::new(setup().await);

        let error = repo
            .append(NewMessage::user(NegotiationId("missing".to_string()), "hello"))
            .await
            .expect_err("foreign key violation");

        assert!(matches!(error, RepositoryError::Database(_)));
    }
}
