use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_typed_multipart::{FieldData, TryFromMultipart, TypedMultipart};
use serde::Deserialize;
use tempfile::NamedTempFile;
use validator::Validate;

use crate::entities::participation_entity::{AttachmentField, Participation};
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::mw_ctx::CtxState;
use crate::middleware::utils::extractor_utils::JsonOrFormValidated;
use crate::services::wizard_service::{ParticipationInput, WizardService};

pub fn routes(upload_max_size_mb: u64) -> Router<Arc<CtxState>> {
    // transport ceiling, the per-kind media limits are enforced after parsing
    let max_bytes_val = (1024 * 1024 * upload_max_size_mb) as usize;
    Router::new()
        .route("/api/participations", post(create_participation))
        .route("/api/participations/:participation_id", get(get_participation))
        .route(
            "/api/participations/:participation_id/advance",
            post(advance_participation),
        )
        .route(
            "/api/participations/:participation_id/retreat",
            post(retreat_participation),
        )
        .route(
            "/api/participations/:participation_id/submit",
            post(submit_participation),
        )
        .route(
            "/api/participations/:participation_id/video",
            post(upload_video),
        )
        .route(
            "/api/participations/:participation_id/documents/:document_kind",
            post(upload_document),
        )
        .route(
            "/api/participations/:participation_id/signature",
            post(upload_signature),
        )
        .layer(DefaultBodyLimit::max(max_bytes_val))
}

#[derive(TryFromMultipart)]
pub struct MediaUploadInput {
    #[form_data(limit = "unlimited")]
    pub file: FieldData<NamedTempFile>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SignatureInput {
    #[validate(length(min = 1, message = "data_url is required"))]
    pub data_url: String,
}

async fn create_participation(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    JsonOrFormValidated(input): JsonOrFormValidated<ParticipationInput>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.create(input).await?))
}

async fn get_participation(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.get(&participation_id).await?))
}

async fn advance_participation(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
    JsonOrFormValidated(input): JsonOrFormValidated<ParticipationInput>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.advance(&participation_id, input).await?))
}

async fn retreat_participation(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.retreat(&participation_id).await?))
}

async fn submit_participation(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.finalize(&participation_id).await?))
}

async fn upload_video(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
    TypedMultipart(input): TypedMultipart<MediaUploadInput>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(service.attach_video(&participation_id, input.file).await?))
}

async fn upload_document(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path((participation_id, document_kind)): Path<(String, String)>,
    TypedMultipart(input): TypedMultipart<MediaUploadInput>,
) -> CtxResult<Json<Participation>> {
    let field = match document_kind.as_str() {
        "fiscal_attestation" => AttachmentField::FiscalAttestation,
        "registry_extract" => AttachmentField::RegistryExtract,
        other => {
            return Err(ctx.to_ctx_error(AppError::Generic {
                description: format!("unknown document kind: {other}"),
            }))
        }
    };
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(
        service
            .attach_document(&participation_id, field, input.file)
            .await?,
    ))
}

async fn upload_signature(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Path(participation_id): Path<String>,
    JsonOrFormValidated(input): JsonOrFormValidated<SignatureInput>,
) -> CtxResult<Json<Participation>> {
    let service = WizardService::new(&state.db.client, &ctx, &state.file_storage);
    Ok(Json(
        service
            .attach_signature(&participation_id, &input.data_url)
            .await?,
    ))
}
