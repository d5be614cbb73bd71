use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::entities::admin_user_entity::AdminUser;
use crate::entities::participation_entity::{
    Participation, ParticipationDbService, ParticipationStatus,
};
use crate::middleware::utils::db_utils::{Pagination, QryOrder};
use crate::middleware::auth_with_admin_access::AuthWithAdminAccess;
use crate::middleware::error::CtxResult;
use crate::middleware::mw_ctx::CtxState;
use crate::middleware::utils::extractor_utils::JsonOrFormValidated;
use crate::services::admin_service::{AdminService, ProvisionAdminInput, ReconcileReport};
use crate::services::export_service::ExportService;

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/admin/participations", get(list_participations))
        .route(
            "/api/admin/participations/:participation_id/approve",
            post(approve_participation),
        )
        .route(
            "/api/admin/participations/:participation_id/reject",
            post(reject_participation),
        )
        .route("/api/admin/export/results.csv", get(export_results_csv))
        .route(
            "/api/admin/export/participations.csv",
            get(export_participations_csv),
        )
        .route("/api/admin/export/archive", get(export_archive))
        .route("/api/admin/users", get(list_admins).post(provision_admin))
        .route("/api/admin/users/reconcile", post(reconcile_admins))
        .route("/api/admin/users/:admin_id/active", post(set_admin_active))
}

#[derive(Debug, Deserialize)]
pub struct ListParticipationsQuery {
    pub status: Option<ParticipationStatus>,
    pub start: Option<u32>,
    pub count: Option<u16>,
}

async fn list_participations(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Query(query): Query<ListParticipationsQuery>,
) -> CtxResult<Json<Vec<Participation>>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;

    let pagination = Pagination {
        order_by: Some("created_at".to_string()),
        order_dir: Some(QryOrder::DESC),
        count: query.count.unwrap_or(50),
        start: query.start.unwrap_or(0),
    };
    let participations = ParticipationDbService {
        db: &state.db.client,
        ctx: &auth_data.ctx,
    }
    .list_by_status(query.status, Some(pagination))
    .await?;
    Ok(Json(participations))
}

async fn approve_participation(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Path(participation_id): Path<String>,
) -> CtxResult<Json<Participation>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;
    Ok(Json(
        admin_service
            .set_participation_status(&participation_id, ParticipationStatus::Approved)
            .await?,
    ))
}

async fn reject_participation(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Path(participation_id): Path<String>,
) -> CtxResult<Json<Participation>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;
    Ok(Json(
        admin_service
            .set_participation_status(&participation_id, ParticipationStatus::Rejected)
            .await?,
    ))
}

async fn export_results_csv(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<impl IntoResponse> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;

    let service = ExportService::new(
        &state.db.client,
        &auth_data.ctx,
        &state.event_sender,
        state.export_header_url.as_deref(),
    );
    let csv_bytes = service.results_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"resultats.csv\"",
            ),
        ],
        csv_bytes,
    ))
}

async fn export_participations_csv(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<impl IntoResponse> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;

    let service = ExportService::new(
        &state.db.client,
        &auth_data.ctx,
        &state.event_sender,
        state.export_header_url.as_deref(),
    );
    let csv_bytes = service.participations_csv().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"participations.csv\"",
            ),
        ],
        csv_bytes,
    ))
}

async fn export_archive(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<impl IntoResponse> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service.require_admin().await?;

    let service = ExportService::new(
        &state.db.client,
        &auth_data.ctx,
        &state.event_sender,
        state.export_header_url.as_deref(),
    );
    let archive = service.archive().await?;
    Ok((
        [
            (header::CONTENT_TYPE, "application/zip"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"candidatures.zip\"",
            ),
        ],
        archive,
    ))
}

async fn list_admins(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<Vec<AdminUser>>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service
        .require_super_admin()
        .await?;
    Ok(Json(admin_service.list().await?))
}

async fn provision_admin(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    JsonOrFormValidated(input): JsonOrFormValidated<ProvisionAdminInput>,
) -> CtxResult<Json<AdminUser>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service
        .require_super_admin()
        .await?;
    Ok(Json(admin_service.provision(input).await?))
}

async fn reconcile_admins(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<ReconcileReport>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service
        .require_super_admin()
        .await?;
    Ok(Json(admin_service.reconcile().await?))
}

#[derive(Debug, Deserialize)]
pub struct SetActiveInput {
    pub active: bool,
}

async fn set_admin_active(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Path(admin_id): Path<String>,
    Json(input): Json<SetActiveInput>,
) -> CtxResult<Json<AdminUser>> {
    let admin_service = AdminService::new(&state.db.client, &auth_data.ctx);
    admin_service
        .require_super_admin()
        .await?;
    Ok(Json(admin_service.set_active(&admin_id, input.active).await?))
}
