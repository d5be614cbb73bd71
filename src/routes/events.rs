use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive};
use axum::response::Sse;
use axum::routing::get;
use axum::Router;
use futures::Stream;
use serde_json::json;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::middleware::auth_with_admin_access::AuthWithAdminAccess;
use crate::middleware::error::CtxResult;
use crate::middleware::mw_ctx::{AppEvent, CtxState};
use crate::services::admin_service::AdminService;

pub fn routes() -> Router<Arc<CtxState>> {
    Router::new().route("/api/admin/events", get(get_events))
}

/// Export progress as a server-sent event stream, one event per stage
/// change. Subscribers joining mid-export see the remaining stages.
async fn get_events(
    auth_data: AuthWithAdminAccess,
    State(state): State<Arc<CtxState>>,
) -> CtxResult<Sse<impl Stream<Item = Result<Event, Infallible>>>> {
    AdminService::new(&state.db.client, &auth_data.ctx)
        .require_admin()
        .await?;

    let rx = state.event_sender.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Err(_) => None,
        Ok(AppEvent::ExportProgress(progress)) => {
            Some(Ok(Event::default().data(json!(progress).to_string())))
        }
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
