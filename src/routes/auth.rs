use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tower_cookies::{Cookie, Cookies};

use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::middleware::mw_ctx::{CtxState, JWT_KEY};
use crate::services::admin_service::{AdminLoginInput, AdminService};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/auth/login", post(login))
        .route("/api/auth/logout", post(logout))
}

async fn login(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    cookies: Cookies,
    Json(body): Json<AdminLoginInput>,
) -> CtxResult<Response> {
    let admin_service = AdminService::new(&state.db.client, &ctx);
    let admin = admin_service.login(body).await?;

    let admin_id = admin
        .id
        .as_ref()
        .map(|id| id.to_raw())
        .ok_or(ctx.to_ctx_error(AppError::AuthenticationFail))?;
    let token = state
        .jwt
        .create_by_login(&admin_id)
        .map_err(|source| ctx.to_ctx_error(AppError::AuthFailJwtInvalid { source }))?;

    cookies.add(
        Cookie::build((JWT_KEY, token))
            // without an explicit path the cookie would only be sent back under /api
            .path("/")
            .http_only(true)
            .into(),
    );

    Ok((StatusCode::OK, Json(json!(admin))).into_response())
}

async fn logout(cookies: Cookies) -> Response {
    cookies.remove(Cookie::build((JWT_KEY, "")).path("/").into());
    StatusCode::OK.into_response()
}
