use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::entities::{category_entity, participation_entity};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};

/// One (category, participation, voter email) approval row. All rows of a
/// voter land in a single transactional batch, so a failed insert leaves
/// nothing behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub participation: Thing,
    pub category: Thing,
    pub voter_email: String,
    pub value: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct VoteTally {
    pub category: Thing,
    pub participation: Thing,
    pub votes: i64,
}

pub struct VoteDbService<'a> {
    pub db: &'a Db,
    pub ctx: &'a Ctx,
}

pub const TABLE_NAME: &str = "vote";
const CATEGORY_TABLE: &str = category_entity::TABLE_NAME;
const PARTICIPATION_TABLE: &str = participation_entity::TABLE_NAME;

impl<'a> VoteDbService<'a> {
    pub fn get_table_name() -> &'static str {
        TABLE_NAME
    }

    pub async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS participation ON TABLE {TABLE_NAME} TYPE record<{PARTICIPATION_TABLE}>;
    DEFINE FIELD IF NOT EXISTS category ON TABLE {TABLE_NAME} TYPE record<{CATEGORY_TABLE}>;
    DEFINE FIELD IF NOT EXISTS voter_email ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS value ON TABLE {TABLE_NAME} TYPE number DEFAULT 1;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now();
    DEFINE INDEX IF NOT EXISTS idx_voter_email ON TABLE {TABLE_NAME} COLUMNS voter_email;
");
        let mutation = self.db.query(sql).await?;
        mutation.check().expect("should mutate vote");

        Ok(())
    }

    pub async fn exists_by_email(&self, email: &str) -> CtxResult<bool> {
        let mut res = self
            .db
            .query(format!(
                "SELECT count() FROM {TABLE_NAME} WHERE voter_email=$email GROUP ALL;"
            ))
            .bind(("email", email.to_string()))
            .await?;
        let count: Option<i64> = res.take("count")?;
        Ok(count.unwrap_or(0) > 0)
    }

    pub async fn count_by_email(&self, email: &str) -> CtxResult<i64> {
        let mut res = self
            .db
            .query(format!(
                "SELECT count() FROM {TABLE_NAME} WHERE voter_email=$email GROUP ALL;"
            ))
            .bind(("email", email.to_string()))
            .await?;
        let count: Option<i64> = res.take("count")?;
        Ok(count.unwrap_or(0))
    }

    /// All rows commit or none do. An empty batch is a no-op.
    pub async fn create_batch(&self, votes: Vec<Vote>) -> CtxResult<Vec<Vote>> {
        if votes.is_empty() {
            return Ok(vec![]);
        }
        let mut res = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                INSERT INTO {TABLE_NAME} $rows; \
                COMMIT TRANSACTION;"
            ))
            .bind(("rows", votes))
            .await?;
        let inserted = res.take::<Vec<Vote>>(0)?;
        Ok(inserted)
    }

    pub async fn tallies(&self) -> CtxResult<Vec<VoteTally>> {
        let mut res = self
            .db
            .query(format!(
                "SELECT category, participation, math::sum(value) AS votes \
                FROM {TABLE_NAME} GROUP BY category, participation;"
            ))
            .await?;
        Ok(res.take::<Vec<VoteTally>>(0)?)
    }
}
