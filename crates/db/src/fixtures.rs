use sqlx::Executor;

use crate::connection::DbPool;
use crate::repositories::RepositoryError;

pub const DEMO_USER_ID: &str = "demo-user";

const SEED_PROFILE_IDS: &[&str] = &["profile-demo-001"];
const SEED_NEGOTIATION_IDS: &[&str] = &["neg-demo-001", "neg-demo-002"];
const SEED_MESSAGE_IDS: &[&str] = &["msg-demo-001", "msg-demo-002"];
const SEED_CONTRACT_IDS: &[&str] = &["contract-demo-001"];

/// Deterministic demo workspace: one profile, two negotiations (one with a short
/// exchange) and one saved contract, all owned by [`DEMO_USER_ID`].
pub struct DemoSeedDataset;

impl DemoSeedDataset {
    pub const SQL: &str = include_str!("../../../config/fixtures/demo_seed.sql");

    /// Loads the demo rows. Re-running is a no-op for rows that already exist.
    pub async fn load(pool: &DbPool) -> Result<SeedResult, RepositoryError> {
        let mut tx = pool.begin().await?;
        tx.execute(sqlx::query(Self::SQL)).await?;
        tx.commit().await?;

        Ok(SeedResult {
            user_id: DEMO_USER_ID,
            profiles: SEED_PROFILE_IDS.len(),
            negotiations: SEED_NEGOTIATION_IDS.len(),
            messages: SEED_MESSAGE_IDS.len(),
            contracts: SEED_CONTRACT_IDS.len(),
        })
    }

    pub async fn verify(pool: &DbPool) -> Result<VerificationResult, RepositoryError> {
        let mut checks = Vec::new();
        for (label, table, ids) in Self::seeded_tables() {
            let present: i64 = sqlx::query_scalar(&format!(
                "SELECT COUNT(1) FROM {table} WHERE id IN {}",
                sql_array_from_ids(ids)
            ))
            .fetch_one(pool)
            .await?;
            checks.push((label, present == ids.len() as i64));
        }

        let all_present = checks.iter().all(|(_, present)| *present);
        Ok(VerificationResult { all_present, checks })
    }

    /// Removes the demo rows, children first.
    pub async fn clean(pool: &DbPool) -> Result<(), RepositoryError> {
        let mut tx = pool.begin().await?;
        for (_, table, ids) in Self::seeded_tables().into_iter().rev() {
            sqlx::query(&format!("DELETE FROM {table} WHERE id IN {}", sql_array_from_ids(ids)))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    fn seeded_tables() -> [(&'static str, &'static str, &'static [&'static str]); 4] {
        [
            ("demo-profile", "profiles", SEED_PROFILE_IDS),
            ("demo-negotiations", "negotiations", SEED_NEGOTIATION_IDS),
            ("demo-messages", "negotiation_messages", SEED_MESSAGE_IDS),
            ("demo-contracts", "contracts", SEED_CONTRACT_IDS),
        ]
    }
}

fn sql_array_from_ids(ids: &[&str]) -> String {
    let quoted = ids.iter().map(|id| format!("'{id}'")).collect::<Vec<_>>().join(",");
    format!("({quoted})")
}

#[derive(Debug)]
pub struct SeedResult {
    pub user_id: &'static str,
    pub profiles: usize,
    pub negotiations: usize,
    pub messages: usize,
    pub contracts: usize,
}

#[derive(Debug)]
pub struct VerificationResult {
    pub all_present: bool,
    pub checks: Vec<(&'static str, bool)>,
}
