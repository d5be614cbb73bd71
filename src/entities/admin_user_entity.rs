use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::opt::PatchOp;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxError, CtxResult};
use crate::middleware::utils::db_utils::{get_entity, with_not_found_err, IdentIdName};
use crate::middleware::utils::string_utils::get_str_thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum AdminRole {
    Admin,
    SuperAdmin,
}

/// Login secret, kept in its own table so a directory row can exist
/// before or after its credential during reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminCredential {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminUser {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,
    pub email: String,
    pub role: AdminRole,
    #[serde(default)]
    pub active: bool,
    pub credential: Option<Thing>,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
}

pub struct AdminUserDbService<'a> {
    pub db: &'a Db,
    pub ctx: &'a Ctx,
}

pub const TABLE_NAME: &str = "admin_user";
pub const CREDENTIAL_TABLE_NAME: &str = "admin_credential";

impl<'a> AdminUserDbService<'a> {
    pub fn get_table_name() -> &'static str {
        TABLE_NAME
    }

    pub async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {CREDENTIAL_TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {CREDENTIAL_TABLE_NAME} TYPE string ASSERT string::len(string::trim($value))>0;
    DEFINE FIELD IF NOT EXISTS password_hash ON TABLE {CREDENTIAL_TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {CREDENTIAL_TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS idx_credential_email ON TABLE {CREDENTIAL_TABLE_NAME} COLUMNS email UNIQUE;

    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {TABLE_NAME} TYPE string ASSERT string::len(string::trim($value))>0;
    DEFINE FIELD IF NOT EXISTS role ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS active ON TABLE {TABLE_NAME} TYPE bool DEFAULT true;
    DEFINE FIELD IF NOT EXISTS credential ON TABLE {TABLE_NAME} TYPE option<record<{CREDENTIAL_TABLE_NAME}>>;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE INDEX IF NOT EXISTS idx_admin_email ON TABLE {TABLE_NAME} COLUMNS email UNIQUE;
");
        let mutation = self.db.query(sql).await?;
        mutation.check().expect("should mutate admin_user");

        Ok(())
    }

    pub async fn create_credential(&self, data: AdminCredential) -> CtxResult<AdminCredential> {
        self.db
            .create(CREDENTIAL_TABLE_NAME)
            .content(data)
            .await
            .map_err(CtxError::from(self.ctx))
            .map(|v: Option<AdminCredential>| v.expect("create returns the record"))
    }

    pub async fn get_credential_by_email(
        &self,
        email: &str,
    ) -> CtxResult<Option<AdminCredential>> {
        let ident = IdentIdName::ColumnIdent {
            column: "email".to_string(),
            val: email.to_string(),
            rec: false,
        };
        get_entity::<AdminCredential>(self.db, CREDENTIAL_TABLE_NAME, &ident).await
    }

    pub async fn create_user(&self, data: AdminUser) -> CtxResult<AdminUser> {
        self.db
            .create(TABLE_NAME)
            .content(data)
            .await
            .map_err(CtxError::from(self.ctx))
            .map(|v: Option<AdminUser>| v.expect("create returns the record"))
    }

    pub async fn get_user_by_id(&self, id: &str) -> CtxResult<AdminUser> {
        let thing = get_str_thing(id)?;
        let ident = IdentIdName::Id(thing);
        let opt = get_entity::<AdminUser>(self.db, TABLE_NAME, &ident).await?;
        with_not_found_err(opt, self.ctx, ident.to_string().as_str())
    }

    pub async fn get_user_by_email(&self, email: &str) -> CtxResult<Option<AdminUser>> {
        let ident = IdentIdName::ColumnIdent {
            column: "email".to_string(),
            val: email.to_string(),
            rec: false,
        };
        get_entity::<AdminUser>(self.db, TABLE_NAME, &ident).await
    }

    pub async fn list_users(&self) -> CtxResult<Vec<AdminUser>> {
        let mut res = self
            .db
            .query(format!("SELECT * FROM {TABLE_NAME} ORDER BY email ASC;"))
            .await?;
        Ok(res.take::<Vec<AdminUser>>(0)?)
    }

    pub async fn set_active(&self, record: Thing, active: bool) -> CtxResult<AdminUser> {
        let res: Option<AdminUser> = self
            .db
            .update((record.tb.clone(), record.id.clone().to_raw()))
            .patch(PatchOp::replace("/active", active))
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }

    /// Credentials with no matching directory row, input of the
    /// reconciliation backfill.
    pub async fn credentials_without_user(&self) -> CtxResult<Vec<AdminCredential>> {
        let mut res = self
            .db
            .query(format!(
                "SELECT * FROM {CREDENTIAL_TABLE_NAME} \
                WHERE email NOTINSIDE (SELECT VALUE email FROM {TABLE_NAME});"
            ))
            .await?;
        Ok(res.take::<Vec<AdminCredential>>(0)?)
    }
}
