use std::sync::Arc;

use axum::extract::State;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::middleware::ctx::Ctx;
use crate::middleware::error::CtxResult;
use crate::middleware::mw_ctx::CtxState;
use crate::services::vote_service::{Ballot, SubmitVotesInput, VoteReceipt, VoteService};

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new()
        .route("/api/ballot", get(get_ballot))
        .route("/api/votes", post(submit_votes))
}

async fn get_ballot(State(state): State<Arc<CtxState>>, ctx: Ctx) -> CtxResult<Json<Ballot>> {
    let service = VoteService::new(&state.db.client, &ctx);
    Ok(Json(service.ballot().await?))
}

async fn submit_votes(
    State(state): State<Arc<CtxState>>,
    ctx: Ctx,
    Json(input): Json<SubmitVotesInput>,
) -> CtxResult<Json<VoteReceipt>> {
    let service = VoteService::new(&state.db.client, &ctx);
    Ok(Json(service.submit(input).await?))
}
