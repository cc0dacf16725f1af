use std::str::FromStr;

use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use parley_core::domain::negotiation::{Negotiation, NegotiationId, NegotiationStatus};
use parley_core::domain::profile::UserId;

use super::{decode_timestamp, encode_timestamp, NegotiationRepository, RepositoryError};
use crate::DbPool;

const SELECT_COLUMNS: &str =
    "SELECT id, user_id, title, description, status, counterparty_name, deal_value, created_at
     FROM negotiations";

pub struct SqlNegotiationRepository {
    pool: DbPool,
}

impl SqlNegotiationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl NegotiationRepository for SqlNegotiationRepository {
    async fn create(&self, negotiation: Negotiation) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO negotiations
                (id, user_id, title, description, status, counterparty_name, deal_value, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )
        .bind(&negotiation.id.0)
        .bind(&negotiation.user_id.0)
        .bind(&negotiation.title)
        .bind(&negotiation.description)
        .bind(negotiation.status.as_str())
        .bind(&negotiation.counterparty_name)
        .bind(negotiation.deal_value.map(|value| value.to_string()))
        .bind(encode_timestamp(&negotiation.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_for_user(
        &self,
        user_id: &UserId,
        id: &NegotiationId,
    ) -> Result<Option<Negotiation>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?1 AND user_id = ?2"))
            .bind(&id.0)
            .bind(&user_id.0)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(negotiation_from_row).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        limit: Option<u32>,
    ) -> Result<Vec<Negotiation>, RepositoryError> {
        // SQLite treats a negative LIMIT as unbounded.
        let limit = limit.map(i64::from).unwrap_or(-1);
        let rows = sqlx::query(&format!(
            "{SELECT_COLUMNS} WHERE user_id = ?1 ORDER BY created_at DESC, rowid DESC LIMIT ?2"
        ))
        .bind(&user_id.0)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(negotiation_from_row).collect()
    }
}

fn negotiation_from_row(row: &SqliteRow) -> Result<Negotiation, RepositoryError> {
    let deal_value = row
        .try_get::<Option<String>, _>("deal_value")?
        .map(|raw| {
            Decimal::from_str(&raw)
                .map_err(|error| RepositoryError::Decode(format!("invalid deal_value `{raw}`: {error}")))
        })
        .transpose()?;

    Ok(Negotiation {
        id: NegotiationId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: NegotiationStatus::from(row.try_get::<String, _>("status")?),
        counterparty_name: row.try_get("counterparty_name")?,
        deal_value,
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}
