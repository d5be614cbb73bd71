use axum_typed_multipart::FieldData;
use chrono::Utc;
use serde::Deserialize;
use tempfile::NamedTempFile;
use validator::Validate;

use crate::database::client::Db;
use crate::entities::participation_entity::{
    AttachmentField, Participation, ParticipationDbService, ParticipationStatus,
};
use crate::entities::period_entity::Activity;
use crate::interfaces::file_storage::FileStorageInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::services::media_service::{MediaKind, MediaService};
use crate::services::period_service::PeriodService;
use crate::utils::file::convert::{convert_field_file_data, decode_data_url};

pub const LAST_STEP: u8 = 5;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ParticipationInput {
    pub establishment_name: Option<String>,
    pub candidate_surname: Option<String>,
    pub candidate_first_name: Option<String>,
    pub acting_capacity: Option<String>,
    pub structure_name: Option<String>,
    pub commercial_name: Option<String>,
    pub siret: Option<String>,
    pub naf_code: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub phone: Option<String>,

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

    pub selected_categories: Option<Vec<String>>,

    pub candidacy_consent: Option<bool>,
    pub diffusion_authorized: Option<bool>,
    pub regulation_accepted: Option<bool>,
}

/// Checks the data a step must have gathered before the wizard may move
/// past it. Attachments and consents live on the record itself, so the
/// whole record is the input.
pub fn step_requirements(step: u8, p: &Participation) -> Result<(), String> {
    fn filled(value: &str, name: &str) -> Result<(), String> {
        if value.trim().is_empty() {
            Err(format!("{name} is required"))
        } else {
            Ok(())
        }
    }

    match step {
        1 => {
            filled(&p.establishment_name, "establishment_name")?;
            filled(&p.candidate_surname, "candidate_surname")?;
            filled(&p.candidate_first_name, "candidate_first_name")?;
            filled(&p.acting_capacity, "acting_capacity")?;
            filled(&p.structure_name, "structure_name")?;
            filled(&p.siret, "siret")?;
            filled(&p.naf_code, "naf_code")?;
            filled(&p.email, "email")?;
            if !p.candidacy_consent {
                return Err("candidacy consent must be given".to_string());
            }
            Ok(())
        }
        2 => Ok(()),
        3 => {
            if p.selected_categories.is_empty() {
                Err("at least one category must be selected".to_string())
            } else {
                Ok(())
            }
        }
        4 => {
            if p.video_url.is_none() {
                return Err("a presentation video must be uploaded".to_string());
            }
            if !p.diffusion_authorized {
                return Err("diffusion must be authorized".to_string());
            }
            Ok(())
        }
        5 => {
            if !p.regulation_accepted {
                return Err("the regulation must be accepted".to_string());
            }
            if p.signature_url.is_none() {
                return Err("a signature is required".to_string());
            }
            Ok(())
        }
        other => Err(format!("unknown step {other}")),
    }
}

pub struct WizardService<'a, F: FileStorageInterface> {
    participations_repository: ParticipationDbService<'a>,
    period_service: PeriodService<'a>,
    media_service: MediaService<'a, F>,
    ctx: &'a Ctx,
}

impl<'a, F: FileStorageInterface> WizardService<'a, F> {
    pub fn new(db: &'a Db, ctx: &'a Ctx, file_storage: &'a F) -> Self {
        Self {
            participations_repository: ParticipationDbService { db, ctx },
            period_service: PeriodService::new(db, ctx),
            media_service: MediaService::new(file_storage, ctx),
            ctx,
        }
    }

    pub async fn create(&self, input: ParticipationInput) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;
        input.validate().map_err(|e| self.ctx.to_ctx_error(e.into()))?;

        let mut draft = Participation {
            id: None,
            establishment_name: String::new(),
            candidate_surname: String::new(),
            candidate_first_name: String::new(),
            acting_capacity: String::new(),
            structure_name: String::new(),
            commercial_name: None,
            siret: String::new(),
            naf_code: String::new(),
            email: String::new(),
            phone: None,
            activity_description: None,
            clientele: None,
            products: None,
            communication_modes: None,
            strengths_weaknesses: None,
            digital_transition: None,
            disability_inclusion: None,
            disability_needs: None,
            disability_percentage: None,
            disability_support: None,
            participation_reasons: None,
            improvement_axes: None,
            selected_categories: vec![],
            video_url: None,
            fiscal_attestation_url: None,
            registry_extract_url: None,
            signature_url: None,
            candidacy_consent: false,
            diffusion_authorized: false,
            regulation_accepted: false,
            current_step: 1,
            completed: false,
            status: ParticipationStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        apply_input(&mut draft, input);
        self.participations_repository.create(draft).await
    }

    pub async fn get(&self, id: &str) -> CtxResult<Participation> {
        self.participations_repository.get_by_id(id).await
    }

    /// Persists the submitted data and moves to the next step, but only
    /// when the current step's requirements are met.
    pub async fn advance(&self, id: &str, input: ParticipationInput) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;
        input.validate().map_err(|e| self.ctx.to_ctx_error(e.into()))?;

        let mut record = self.participations_repository.get_by_id(id).await?;
        if record.completed {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyCompleted));
        }
        if record.current_step >= LAST_STEP {
            return Err(self.ctx.to_ctx_error(AppError::StepIncomplete {
                step: record.current_step,
                reason: "the last step cannot be advanced past, submit instead".to_string(),
            }));
        }

        apply_input(&mut record, input);
        let step = record.current_step;
        step_requirements(step, &record).map_err(|reason| {
            self.ctx
                .to_ctx_error(AppError::StepIncomplete { step, reason })
        })?;

        record.current_step = step + 1;
        self.participations_repository.update(record).await
    }

    /// Moves one step back without touching any gathered data.
    pub async fn retreat(&self, id: &str) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;

        let record = self.participations_repository.get_by_id(id).await?;
        if record.completed {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyCompleted));
        }
        if record.current_step <= 1 {
            return Err(self.ctx.to_ctx_error(AppError::StepIncomplete {
                step: record.current_step,
                reason: "already at the first step".to_string(),
            }));
        }
        let thing = record.id.clone().expect("loaded record has an id");
        self.participations_repository
            .set_current_step(thing, record.current_step - 1)
            .await
    }

    /// Final submission. Only the last step's requirements are checked
    /// here; earlier steps were validated when they were advanced past.
    pub async fn finalize(&self, id: &str) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;

        let record = self.participations_repository.get_by_id(id).await?;
        if record.completed {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyCompleted));
        }
        step_requirements(LAST_STEP, &record).map_err(|reason| {
            self.ctx.to_ctx_error(AppError::StepIncomplete {
                step: LAST_STEP,
                reason,
            })
        })?;

        let thing = record.id.clone().expect("loaded record has an id");
        self.participations_repository.mark_completed(thing).await
    }

    pub async fn attach_video(
        &self,
        id: &str,
        file: FieldData<NamedTempFile>,
    ) -> CtxResult<Participation> {
        self.attach(id, MediaKind::Video, AttachmentField::Video, file)
            .await
    }

    pub async fn attach_document(
        &self,
        id: &str,
        field: AttachmentField,
        file: FieldData<NamedTempFile>,
    ) -> CtxResult<Participation> {
        self.attach(id, MediaKind::Document, field, file).await
    }

    async fn attach(
        &self,
        id: &str,
        kind: MediaKind,
        field: AttachmentField,
        file: FieldData<NamedTempFile>,
    ) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;

        let record = self.participations_repository.get_by_id(id).await?;
        if record.completed {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyCompleted));
        }
        let thing = record.id.clone().expect("loaded record has an id");
        let upload = convert_field_file_data(file)?;
        let url = self
            .media_service
            .store(kind, &thing.id.to_raw(), upload)
            .await?;
        self.participations_repository
            .set_attachment_url(thing, field, &url)
            .await
    }

    pub async fn attach_signature(&self, id: &str, data_url: &str) -> CtxResult<Participation> {
        self.period_service.guard(Activity::Participation).await?;

        let record = self.participations_repository.get_by_id(id).await?;
        if record.completed {
            return Err(self.ctx.to_ctx_error(AppError::AlreadyCompleted));
        }
        let thing = record.id.clone().expect("loaded record has an id");
        let upload = decode_data_url(data_url)?;
        let url = self
            .media_service
            .store(MediaKind::SignatureImage, &thing.id.to_raw(), upload)
            .await?;
        self.participations_repository
            .set_attachment_url(thing, AttachmentField::Signature, &url)
            .await
    }
}

fn apply_input(record: &mut Participation, input: ParticipationInput) {
    macro_rules! set {
        ($field:ident) => {
            if let Some(value) = input.$field {
                record.$field = value;
            }
        };
        (opt $field:ident) => {
            if input.$field.is_some() {
                record.$field = input.$field;
            }
        };
    }

    set!(establishment_name);
    set!(candidate_surname);
    set!(candidate_first_name);
    set!(acting_capacity);
    set!(structure_name);
    set!(opt commercial_name);
    set!(siret);
    set!(naf_code);
    set!(email);
    set!(opt phone);
    set!(opt activity_description);
    set!(opt clientele);
    set!(opt products);
    set!(opt communication_modes);
    set!(opt strengths_weaknesses);
    set!(opt digital_transition);
    set!(opt disability_inclusion);
    set!(opt disability_needs);
    set!(opt disability_percentage);
    set!(opt disability_support);
    set!(opt participation_reasons);
    set!(opt improvement_axes);
    set!(selected_categories);
    set!(candidacy_consent);
    set!(diffusion_authorized);
    set!(regulation_accepted);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Participation {
        Participation {
            id: None,
            establishment_name: "Boulangerie Martin".to_string(),
            candidate_surname: "Martin".to_string(),
            candidate_first_name: "Claire".to_string(),
            acting_capacity: "Gérante".to_string(),
            structure_name: "SARL Martin".to_string(),
            commercial_name: None,
            siret: "12345678900019".to_string(),
            naf_code: "1071C".to_string(),
            email: "claire@example.fr".to_string(),
            phone: None,
            activity_description: None,
            clientele: None,
            products: None,
            communication_modes: None,
            strengths_weaknesses: None,
            digital_transition: None,
            disability_inclusion: None,
            disability_needs: None,
            disability_percentage: None,
            disability_support: None,
            participation_reasons: None,
            improvement_axes: None,
            selected_categories: vec!["Commerce".to_string()],
            video_url: Some("http://files/video.mp4".to_string()),
            fiscal_attestation_url: None,
            registry_extract_url: None,
            signature_url: Some("http://files/signature.png".to_string()),
            candidacy_consent: true,
            diffusion_authorized: true,
            regulation_accepted: true,
            current_step: 1,
            completed: false,
            status: ParticipationStatus::Draft,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn step_one_requires_identity_and_consent() {
        let mut p = draft();
        assert!(step_requirements(1, &p).is_ok());
        p.candidacy_consent = false;
        assert!(step_requirements(1, &p).is_err());
        p.candidacy_consent = true;
        p.siret = "  ".to_string();
        assert!(step_requirements(1, &p).is_err());
    }

    #[test]
    fn step_two_has_no_requirements() {
        let mut p = draft();
        p.activity_description = None;
        assert!(step_requirements(2, &p).is_ok());
    }

    #[test]
    fn step_three_needs_a_category() {
        let mut p = draft();
        assert!(step_requirements(3, &p).is_ok());
        p.selected_categories.clear();
        assert!(step_requirements(3, &p).is_err());
    }

    #[test]
    fn step_four_needs_video_and_authorization() {
        let mut p = draft();
        assert!(step_requirements(4, &p).is_ok());
        p.video_url = None;
        assert!(step_requirements(4, &p).is_err());
        p.video_url = Some("http://files/video.mp4".to_string());
        p.diffusion_authorized = false;
        assert!(step_requirements(4, &p).is_err());
    }

    #[test]
    fn step_five_needs_regulation_and_signature() {
        let mut p = draft();
        assert!(step_requirements(5, &p).is_ok());
        p.signature_url = None;
        assert!(step_requirements(5, &p).is_err());
        p.signature_url = Some("http://files/signature.png".to_string());
        p.regulation_accepted = false;
        assert!(step_requirements(5, &p).is_err());
    }
}
