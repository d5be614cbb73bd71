use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::opt::PatchOp;
use surrealdb::sql::Thing;

use crate::database::client::Db;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxError, CtxResult};
use crate::middleware::utils::db_utils::{
    get_entity, get_entity_list, with_not_found_err, IdentIdName, Pagination,
};
use crate::middleware::utils::string_utils::get_str_thing;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum ParticipationStatus {
    Draft,
    Pending,
    Approved,
    Rejected,
}

/// One candidacy submission, carried whole through every wizard step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Thing>,

    // identity / legal
    pub establishment_name: String,
    pub candidate_surname: String,
    pub candidate_first_name: String,
    pub acting_capacity: String,
    pub structure_name: String,
    pub commercial_name: Option<String>,
    pub siret: String,
    pub naf_code: String,
    pub email: String,
    pub phone: Option<String>,

    // narrative
    pub activity_description: Option<String>,
    pub clientele: Option<String>,
    pub products: Option<String>,
    pub communication_modes: Option<String>,
    pub strengths_weaknesses: Option<String>,
    pub digital_transition: Option<String>,
    pub disability_inclusion: Option<String>,
    pub disability_needs: Option<String>,
    pub disability_percentage: Option<String>,
    pub disability_support: Option<String>,
    pub participation_reasons: Option<String>,
    pub improvement_axes: Option<String>,

    // category selection
    #[serde(default)]
    pub selected_categories: Vec<String>,

    // attachments
    pub video_url: Option<String>,
    pub fiscal_attestation_url: Option<String>,
    pub registry_extract_url: Option<String>,
    pub signature_url: Option<String>,

    // consents
    #[serde(default)]
    pub candidacy_consent: bool,
    #[serde(default)]
    pub diffusion_authorized: bool,
    #[serde(default)]
    pub regulation_accepted: bool,

    // workflow state
    pub current_step: u8,
    #[serde(default)]
    pub completed: bool,
    pub status: ParticipationStatus,

    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentField {
    Video,
    FiscalAttestation,
    RegistryExtract,
    Signature,
}

impl AttachmentField {
    pub fn json_pointer(&self) -> &'static str {
        match self {
            AttachmentField::Video => "/video_url",
            AttachmentField::FiscalAttestation => "/fiscal_attestation_url",
            AttachmentField::RegistryExtract => "/registry_extract_url",
            AttachmentField::Signature => "/signature_url",
        }
    }
}

pub struct ParticipationDbService<'a> {
    pub db: &'a Db,
    pub ctx: &'a Ctx,
}

pub const TABLE_NAME: &str = "participation";

impl<'a> ParticipationDbService<'a> {
    pub fn get_table_name() -> &'static str {
        TABLE_NAME
    }

    pub async fn mutate_db(&self) -> Result<(), AppError> {
        let sql = format!("
    DEFINE TABLE IF NOT EXISTS {TABLE_NAME} SCHEMAFULL;
    DEFINE FIELD IF NOT EXISTS establishment_name ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS candidate_surname ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS candidate_first_name ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS acting_capacity ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS structure_name ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS commercial_name ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS siret ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS naf_code ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS email ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS phone ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS activity_description ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS clientele ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS products ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS communication_modes ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS strengths_weaknesses ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS digital_transition ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS disability_inclusion ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS disability_needs ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS disability_percentage ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS disability_support ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS participation_reasons ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS improvement_axes ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS selected_categories ON TABLE {TABLE_NAME} TYPE array<string> DEFAULT [];
    DEFINE FIELD IF NOT EXISTS video_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS fiscal_attestation_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS registry_extract_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS signature_url ON TABLE {TABLE_NAME} TYPE option<string>;
    DEFINE FIELD IF NOT EXISTS candidacy_consent ON TABLE {TABLE_NAME} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS diffusion_authorized ON TABLE {TABLE_NAME} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS regulation_accepted ON TABLE {TABLE_NAME} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS current_step ON TABLE {TABLE_NAME} TYPE number DEFAULT 1;
    DEFINE FIELD IF NOT EXISTS completed ON TABLE {TABLE_NAME} TYPE bool DEFAULT false;
    DEFINE FIELD IF NOT EXISTS status ON TABLE {TABLE_NAME} TYPE string;
    DEFINE FIELD IF NOT EXISTS created_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE $before OR time::now();
    DEFINE FIELD IF NOT EXISTS updated_at ON TABLE {TABLE_NAME} TYPE datetime DEFAULT time::now() VALUE time::now();
    DEFINE INDEX IF NOT EXISTS idx_status ON TABLE {TABLE_NAME} COLUMNS status;
    DEFINE INDEX IF NOT EXISTS idx_email ON TABLE {TABLE_NAME} COLUMNS email;
");
        let mutation = self.db.query(sql).await?;
        mutation.check().expect("should mutate participation");

        Ok(())
    }

    pub async fn create(&self, data: Participation) -> CtxResult<Participation> {
        self.db
            .create(TABLE_NAME)
            .content(data)
            .await
            .map_err(CtxError::from(self.ctx))
            .map(|v: Option<Participation>| v.expect("create returns the record"))
    }

    pub async fn get(&self, ident: IdentIdName) -> CtxResult<Participation> {
        let opt = get_entity::<Participation>(self.db, TABLE_NAME, &ident).await?;
        with_not_found_err(opt, self.ctx, ident.to_string().as_str())
    }

    pub async fn get_by_id(&self, id: &str) -> CtxResult<Participation> {
        let thing = get_str_thing(id)?;
        self.get(IdentIdName::Id(thing)).await
    }

    pub async fn update(&self, record: Participation) -> CtxResult<Participation> {
        let thing = record.id.clone().ok_or(AppError::Generic {
            description: "Can not update participation without id".to_string(),
        })?;
        let res: Option<Participation> = self
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

    pub async fn set_current_step(&self, record: Thing, step: u8) -> CtxResult<Participation> {
        let res: Option<Participation> = self
            .db
            .update((record.tb.clone(), record.id.clone().to_raw()))
            .patch(PatchOp::replace("/current_step", step))
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }

    pub async fn set_attachment_url(
        &self,
        record: Thing,
        field: AttachmentField,
        url: &str,
    ) -> CtxResult<Participation> {
        let res: Option<Participation> = self
            .db
            .update((record.tb.clone(), record.id.clone().to_raw()))
            .patch(PatchOp::replace(field.json_pointer(), url.to_string()))
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }

    pub async fn set_status(
        &self,
        record: Thing,
        status: ParticipationStatus,
    ) -> CtxResult<Participation> {
        let res: Option<Participation> = self
            .db
            .update((record.tb.clone(), record.id.clone().to_raw()))
            .patch(PatchOp::replace("/status", status))
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }

    pub async fn mark_completed(&self, record: Thing) -> CtxResult<Participation> {
        let res: Option<Participation> = self
            .db
            .update((record.tb.clone(), record.id.clone().to_raw()))
            .patch(PatchOp::replace("/completed", true))
            .patch(PatchOp::replace("/status", ParticipationStatus::Pending))
            .await
            .map_err(CtxError::from(self.ctx))?;
        res.ok_or_else(|| {
            self.ctx.to_ctx_error(AppError::EntityFailIdNotFound {
                ident: record.to_raw(),
            })
        })
    }

    pub async fn list_by_status(
        &self,
        status: Option<ParticipationStatus>,
        pagination: Option<Pagination>,
    ) -> CtxResult<Vec<Participation>> {
        match status {
            None => {
                let limit = match &pagination {
                    Some(p) => format!(
                        " LIMIT {} START {}",
                        if p.count == 0 { 20 } else { p.count },
                        p.start
                    ),
                    None => String::new(),
                };
                let mut res = self
                    .db
                    .query(format!(
                        "SELECT * FROM {TABLE_NAME} ORDER BY created_at DESC{limit};"
                    ))
                    .await?;
                Ok(res.take::<Vec<Participation>>(0)?)
            }
            Some(status) => {
                let ident = IdentIdName::ColumnIdent {
                    column: "status".to_string(),
                    val: status.to_string(),
                    rec: false,
                };
                get_entity_list::<Participation>(self.db, TABLE_NAME, &ident, pagination).await
            }
        }
    }

    /// Distinct category names referenced by existing candidacies, for the
    /// first-run category bootstrap.
    pub async fn distinct_category_names(&self) -> CtxResult<Vec<String>> {
        let mut res = self
            .db
            .query(format!("SELECT VALUE selected_categories FROM {TABLE_NAME};"))
            .await?;
        let nested = res.take::<Vec<Vec<String>>>(0)?;
        let mut names: Vec<String> = Vec::new();
        for name in nested.into_iter().flatten() {
            if !names.contains(&name) {
                names.push(name);
            }
        }
        Ok(names)
    }
}
