use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tower_cookies::CookieManagerLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::database::client::Database;
use crate::entities::admin_user_entity::AdminUserDbService;
use crate::entities::category_entity::CategoryDbService;
use crate::entities::participation_entity::ParticipationDbService;
use crate::entities::period_entity::PeriodDbService;
use crate::entities::vote_entity::VoteDbService;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::AppResult;
use crate::middleware::mw_ctx::CtxState;
use crate::routes::{admin, auth, events, participations, periods, votes};
use crate::services::admin_service::AdminService;

pub async fn run_migrations(database: &Database) -> AppResult<()> {
    let db = database.client.clone();
    let c = Ctx::new(Ok("migrations".to_string()), Uuid::new_v4());

    ParticipationDbService { db: &db, ctx: &c }.mutate_db().await?;
    CategoryDbService { db: &db, ctx: &c }.mutate_db().await?;
    VoteDbService { db: &db, ctx: &c }.mutate_db().await?;
    PeriodDbService { db: &db, ctx: &c }.mutate_db().await?;
    AdminUserDbService { db: &db, ctx: &c }.mutate_db().await?;
    Ok(())
}

pub async fn create_default_admin(ctx_state: &CtxState) {
    let c = Ctx::new(Ok("init".to_string()), Uuid::new_v4());
    let admin_service = AdminService::new(&ctx_state.db.client, &c);
    if let Err(err) = admin_service
        .create_default_admin(&ctx_state.start_password)
        .await
    {
        tracing::error!("default admin setup failed: {err:?}");
    }
}

pub fn main_router(ctx_state: &Arc<CtxState>, uploads_dir: &str) -> Router {
    Router::new()
        .route("/hc", get(get_hc))
        .nest_service("/media", ServeDir::new(uploads_dir))
        .merge(auth::routes())
        .merge(participations::routes(ctx_state.upload_max_size_mb))
        .merge(votes::routes())
        .merge(periods::routes())
        .merge(admin::routes())
        .merge(events::routes())
        .with_state(ctx_state.clone())
        .layer(CookieManagerLayer::new())
        .layer(TraceLayer::new_for_http())
}

async fn get_hc() -> Response {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    (StatusCode::OK, format!("v{}", VERSION)).into_response()
}
