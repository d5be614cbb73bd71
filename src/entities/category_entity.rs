use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxError, CtxResult};
use crate::middleware::utils::db_utils::{get_entity, with_not_found_err, IdentIdName};
use crate::middleware::utils::string_utils::get_str_thing;

/// A named voting bucket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

pub struct CategoryDbService<'a> {
    pub db: &'a Db,
    pub ctx: &'a Ctx,
}

pub const TABLE_NAME: &str = "category";

impl<'a> CategoryDbService<'a> {
    pub fn get_table_name() -> &'static str {
        TABLE_NAME
    }

    pub async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS name ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value))>0;
    DEFINE FIELD IF NOT EXISTS description ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS display_order ON TABLE {TABLE_NAME} TYPE number DEFAULT 0;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS idx_name_unique ON TABLE {TABLE_NAME} COLUMNS name UNIQUE;
");
        let mutation = self.db.query(sql).await?;
        mutation.check().expect("should mutate category");

        Ok(())
    }

    pub async fn create(&self, data: Category) -> CtxResult<Category> {
        self.db
            .create(TABLE_NAME)
            .content(data)
            .await
            .map_err(CtxError::from(self.ctx))
            .map(|v: Option<Category>| v.expect("create returns the record"))
    }

    pub async fn get_by_id(&self, id: &str) -> CtxResult<Category> {
        let thing = get_str_thing(id)?;
        let ident = IdentIdName::Id(thing);
        let opt = get_entity::<Category>(self.db, TABLE_NAME, &ident).await?;
        with_not_found_err(opt, self.ctx, ident.to_string().as_str())
    }

    pub async fn list(&self) -> CtxResult<Vec<Category>> {
        let mut res = self
            .db
            .query(format!(
                "SELECT * FROM {TABLE_NAME} ORDER BY display_order ASC, name ASC;"
            ))
            .await?;
        Ok(res.take::<Vec<Category>>(0)?)
    }

    pub async fn count(&self) -> CtxResult<i64> {
        let mut res = self
            .db
            .query(format!("SELECT count() FROM {TABLE_NAME} GROUP ALL;"))
            .await?;
        let count: Option<i64> = res.take("count")?;
        Ok(count.unwrap_or(0))
    }
}
