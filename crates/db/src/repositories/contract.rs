use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use parley_core::domain::contract::{Contract, ContractId, ContractStatus, ContractType};
use parley_core::domain::profile::UserId;

use super::{decode_timestamp, encode_timestamp, ContractRepository, RepositoryError};
use crate::DbPool;

pub struct SqlContractRepository {
    pool: DbPool,
}

impl SqlContractRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ContractRepository for SqlContractRepository {
    async fn save(&self, contract: Contract) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO contracts (id, user_id, title, content, contract_type, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(&contract.id.0)
        .bind(&contract.user_id.0)
        .bind(&contract.title)
        .bind(&contract.content)
        .bind(contract.contract_type.as_str())
        .bind(contract.status.as_str())
        .bind(encode_timestamp(&contract.created_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_user(&self, user_id: &UserId) -> Result<Vec<Contract>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, content, contract_type, status, created_at
             FROM contracts
             WHERE user_id = ?1
             ORDER BY created_at DESC, rowid DESC",
        )
        .bind(&user_id.0)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(contract_from_row).collect()
    }
}

fn contract_from_row(row: &SqliteRow) -> Result<Contract, RepositoryError> {
    Ok(Contract {
        id: ContractId(row.try_get("id")?),
        user_id: UserId(row.try_get("user_id")?),
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        contract_type: ContractType::from(row.try_get::<String, _>("contract_type")?),
        status: ContractStatus::from(row.try_get::<String, _>("status")?),
        created_at: decode_timestamp(&row.try_get::<String, _>("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use parley_core::domain::contract::{Contract, ContractStatus, ContractType, NewContract};
    use parley_core::domain::profile::UserId;

    use super::SqlContractRepository;
    use crate::repositories::ContractRepository;
    use crate::{connect_with_settings, migrations};

    fn contract(user: &str, title: &str, contract_type: ContractType, offset: i64) -> Contract {
        let base = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).single().expect("valid time");
        Contract::snapshot(
            UserId(user.to_string()),
            NewContract {
                title: title.to_string(),
                content: format!("{title} body"),
                contract_type,
            },
            base + Duration::minutes(offset),
        )
        .expect("valid contract")
    }

    #[tokio::test]
    async fn saved_contracts_list_newest_first_for_owner() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        let repo = SqlContractRepository::new(pool);

        let older = contract("user-a", "Mutual NDA", ContractType::Nda, 0);
        let newer =
            contract("user-a", "Consulting", ContractType::Other("consulting".to_string()), 5);
        repo.save(older.clone()).await.expect("save older");
        repo.save(newer.clone()).await.expect("save newer");
        repo.save(contract("user-b", "Other", ContractType::General, 9)).await.expect("save");

        let listed = repo.list_for_user(&UserId("user-a".to_string())).await.expect("list");

        assert_eq!(listed, vec![newer, older]);
        assert!(listed.iter().all(|c| c.status == ContractStatus::Draft));
    }
}
