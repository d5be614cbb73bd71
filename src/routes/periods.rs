use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::entities::period_entity::{Activity, PeriodWindow};
use crate::middleware::auth_with_admin_access::AuthWithAdminAccess;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::CtxResult;
use crate::middleware::mw_ctx::CtxState;
use crate::middleware::utils::extractor_utils::JsonOrFormValidated;
use crate::services::admin_service::AdminService;
use crate::services::period_service::{PeriodService, PeriodWindowInput};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/periods/status", get(get_status))
        .route("/api/periods", get(list_periods).post(create_period))
        .route("/api/periods/:period_id", post(update_period))
        .route("/api/periods/:period_id/activate", post(activate_period))
}

#[derive(Debug, Serialize)]
pub struct PeriodStatus {
    pub participation_open: bool,
    pub voting_open: bool,
}

async fn get_status(State(state): State<Arc<CtxState>>, ctx: Ctx) -> CtxResult<Json<PeriodStatus>> {
    let service = PeriodService::new(&state.db.client, &ctx);
    Ok(Json(PeriodStatus {
        participation_open: service.is_open(Activity::Participation).await,
        voting_open: service.is_open(Activity::Voting).await,
    }))
}

async fn list_periods(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Json<Vec<PeriodWindow>>> {
    AdminService::new(&state.db.client, &auth_data.ctx)
        .require_admin()
        .await?;
    let service = PeriodService::new(&state.db.client, &auth_data.ctx);
    Ok(Json(service.list().await?))
}

async fn create_period(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    JsonOrFormValidated(input): JsonOrFormValidated<PeriodWindowInput>,
) -> CtxResult<Json<PeriodWindow>> {
    AdminService::new(&state.db.client, &auth_data.ctx)
        .require_admin()
        .await?;
    let service = PeriodService::new(&state.db.client, &auth_data.ctx);
    Ok(Json(service.create(input).await?))
}

async fn update_period(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Path(period_id): Path<String>,
    JsonOrFormValidated(input): JsonOrFormValidated<PeriodWindowInput>,
) -> CtxResult<Json<PeriodWindow>> {
    AdminService::new(&state.db.client, &auth_data.ctx)
        .require_admin()
        .await?;
    let service = PeriodService::new(&state.db.client, &auth_data.ctx);
    Ok(Json(service.update(&period_id, input).await?))
}

async fn activate_period(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
    Path(period_id): Path<String>,
) -> CtxResult<Json<PeriodWindow>> {
    AdminService::new(&state.db.client, &auth_data.ctx)
        .require_admin()
        .await?;
    let service = PeriodService::new(&state.db.client, &auth_data.ctx);
    Ok(Json(service.activate(&period_id).await?))
}
