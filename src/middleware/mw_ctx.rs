use crate::config::AppConfig;
use crate::database::client::Database;
use crate::interfaces::file_storage::FileStorageInterface;
use crate::utils::jwt::JWT;
use chrono::Duration;
use serde::Serialize;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Serialize)]
pub enum ExportStage {
    Preparing,
    Generating,
    Archiving,
    Completed,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportFailure {
    pub name: String,
    pub reason: String,
}

/// One step of the export pipeline, with the running outcome lists.
/// Completed and Error are terminal.
#[derive(Debug, Clone, Serialize)]
pub struct ExportProgress {
    pub stage: ExportStage,
    pub succeeded: Vec<String>,
    pub failed: Vec<ExportFailure>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub enum AppEvent {
    ExportProgress(ExportProgress),
}

pub struct CtxState {
    pub db: Database,
    pub start_password: String,
    pub is_development: bool,
    pub upload_max_size_mb: u64,
    pub export_header_url: Option<String>,
    pub event_sender: broadcast::Sender<AppEvent>,
    pub jwt: JWT,
    pub file_storage: Arc<dyn FileStorageInterface + Send + Sync>,
}

impl Debug for CtxState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str("CtxState")
    }
}

pub fn create_ctx_state(
    db: Database,
    config: &AppConfig,
    file_storage: Arc<dyn FileStorageInterface + Send + Sync>,
) -> Arc<CtxState> {
    let (event_sender, _) = broadcast::channel(100);
    let ctx_state = CtxState {
        db,
        start_password: config.init_server_password.clone(),
        is_development: config.is_development,
        upload_max_size_mb: config.upload_file_size_max_mb,
        export_header_url: config.export_header_url.clone(),
        jwt: JWT::new(config.jwt_secret.clone(), Duration::days(1)),
        event_sender,
        file_storage,
    };
    Arc::new(ctx_state)
}

pub const JWT_KEY: &str = "jwt";
