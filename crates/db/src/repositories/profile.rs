use sqlx::Row;

use parley_core::domain::profile::{Profile, ProfileId, UserId};

use super::{ProfileRepository, RepositoryError};
use crate::DbPool;

/// Profiles are provisioned by the auth provider; this side only reads them.
pub struct SqlProfileRepository {
    pool: DbPool,
}

impl SqlProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileRepository for SqlProfileRepository {
    async fn find_by_user(&self, user_id: &UserId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query(
            "SELECT id, user_id, display_name, company_name, role FROM profiles WHERE user_id = ?1",
        )
        .bind(&user_id.0)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(Profile {
            id: ProfileId(row.try_get("id")?),
            user_id: UserId(row.try_get("user_id")?),
            display_name: row.try_get("display_name")?,
            company_name: row.try_get("company_name")?,
            role: row.try_get("role")?,
        }))
    }
}
