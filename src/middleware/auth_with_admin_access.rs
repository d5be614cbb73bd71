use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::request::Parts,
    http::StatusCode,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::{
    middleware::mw_ctx::{CtxState, JWT_KEY},
    utils::jwt::TokenType,
};

use super::ctx::Ctx;

/// Rejects any request without a valid admin login cookie. Role checks
/// beyond "is an admin" (super_admin only routes) happen in the handlers.
#[derive(Debug)]
pub struct AuthWithAdminAccess {
    pub admin_id: String,
    pub ctx: Ctx,
}

#[async_trait]
impl FromRequestParts<Arc<CtxState>> for AuthWithAdminAccess {
    type Rejection = StatusCode;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<CtxState>,
    ) -> Result<Self, Self::Rejection> {
        let State(app_state): State<Arc<CtxState>> = State::from_request_parts(parts, state)
            .await
            .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;

        let cookies = CookieJar::from_headers(&parts.headers);

        match cookies.get(JWT_KEY) {
            Some(cookie) => match app_state.jwt.decode_by_type(cookie.value(), TokenType::Login) {
                Ok(claims) => Ok(AuthWithAdminAccess {
                    admin_id: claims.auth.clone(),
                    ctx: Ctx::new(Ok(claims.auth), Uuid::new_v4()),
                }),
                Err(_) => Err(StatusCode::UNAUTHORIZED),
            },
            _ => Err(StatusCode::UNAUTHORIZED),
        }
    }
}
