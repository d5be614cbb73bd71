use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxError, CtxResult};
use crate::middleware::utils::db_utils::{get_entity, with_not_found_err, IdentIdName};
use crate::middleware::utils::string_utils::get_str_thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum Activity {
    Participation,
    Voting,
}

/// Admin defined window during which an activity accepts public writes.
/// At most one window per activity is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub activity: Activity,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

pub struct PeriodDbService<'a> {
    pub db: &'a Db,
    pub ctx: &'a Ctx,
}

pub const TABLE_NAME: &str = "period_window";

impl<'a> PeriodDbService<'a> {
    pub fn get_table_name() -> &'static str {
        TABLE_NAME
    }

    pub async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS activity ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS start_at ON TABLE {TABLE_NAME} TYPE datetime;
    DEFINE FIELD IF NOT EXISTS end_at ON TABLE {TABLE_NAME} TYPE datetime;
    DEFINE FIELD IF NOT EXISTS active ON TABLE {TABLE_NAME} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS updated_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE time::now();
    DEFINE INDEX IF NOT EXISTS idx_activity ON TABLE {TABLE_NAME} COLUMNS activity;
");
        let mutation = self.db.query(sql).await?;
        mutation.check().expect("should mutate period_window");

        Ok(())
    }

    pub async fn create(&self, data: PeriodWindow) -> CtxResult<PeriodWindow> {
        self.db
            .create(TABLE_NAME)
            .content(data)
            .await
            .map_err(CtxError::from(self.ctx))
            .map(|v: Option<PeriodWindow>| v.expect("create returns the record"))
    }

    pub async fn get_by_id(&self, id: &str) -> CtxResult<PeriodWindow> {
        let thing = get_str_thing(id)?;
        let ident = IdentIdName::Id(thing);
        let opt = get_entity::<PeriodWindow>(self.db, TABLE_NAME, &ident).await?;
        with_not_found_err(opt, self.ctx, ident.to_string().as_str())
    }

    pub async fn update(&self, record: PeriodWindow) -> CtxResult<PeriodWindow> {
        let thing = record.id.clone().ok_or(AppError::Generic {
            description: "Can not update period window without id".to_string(),
        })?;
        let res: Option<PeriodWindow> = self
            .db
            .update((thing.tb.clone(), thing.id.clone().to_raw()))
            .content(record)
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: thing.to_raw(),
            })
        })
    }

    pub async fn list(&self) -> CtxResult<Vec<PeriodWindow>> {
        let mut res = self
            .db
            .query(format!(
                "SELECT * FROM {TABLE_NAME} ORDER BY start_at DESC;"
            ))
            .await?;
        Ok(res.take::<Vec<PeriodWindow>>(0)?)
    }

    pub async fn get_active(&self, activity: Activity) -> CtxResult<Option<PeriodWindow>> {
        let mut res = self
            .db
            .query(format!(
                "SELECT * FROM {TABLE_NAME} WHERE activity=$activity AND active=true \
                ORDER BY updated_at DESC LIMIT 1;"
            ))
            .bind(("activity", activity.to_string()))
            .await?;
        Ok(res.take::<Vec<PeriodWindow>>(0)?.into_iter().next())
    }

    /// Deactivating siblings and activating the target happen in one
    /// transaction so no reader ever observes two active windows.
    pub async fn activate(&self, record: Thing, activity: Activity) -> CtxResult<PeriodWindow> {
        let mut res = self
            .db
            .query(format!(
                "BEGIN TRANSACTION; \
                UPDATE {TABLE_NAME} SET active = false WHERE activity = $activity AND active = true; \
                UPDATE $record SET active = true; \
                COMMIT TRANSACTION;"
            ))
            .bind(("activity", activity.to_string()))
            .bind(("record", record.clone()))
            .await?;
        let updated = res.take::<Vec<PeriodWindow>>(1)?;
        updated.into_iter().next().ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }
}
