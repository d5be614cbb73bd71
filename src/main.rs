use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use concours_server::config::AppConfig;
use concours_server::database::client::{Database, DbConfig};
use concours_server::init;
use concours_server::interfaces::file_storage::FileStorageInterface;
use concours_server::middleware::error::AppResult;
use concours_server::middleware::mw_ctx::create_ctx_state;
use concours_server::utils::file::google_cloud_file_storage::GoogleCloudFileStorage;
use concours_server::utils::file::local_file_storage::LocalFileStorage;

#[tokio::main]
async fn main() -> AppResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    let db = Database::connect(DbConfig {
        url: &config.db_url,
        database: &config.db_database,
        namespace: &config.db_namespace,
        username: config.db_username.as_deref(),
        password: config.db_password.as_deref(),
    })
    .await;

    init::run_migrations(&db).await?;

    let file_storage: Arc<dyn FileStorageInterface + Send + Sync> = if config.is_development {
        Arc::new(LocalFileStorage::new(
            config.uploads_dir.clone(),
            format!("{}/media", config.upload_base_url),
        ))
    } else {
        Arc::new(
            GoogleCloudFileStorage::new(
                &config.gcs_bucket,
                config.gcs_credentials.as_deref(),
                config.gcs_endpoint.as_deref(),
            )
            .await,
        )
    };

    let ctx_state = create_ctx_state(db, &config, file_storage);
    init::create_default_admin(&ctx_state).await;

    let routes_all = init::main_router(&ctx_state, &config.uploads_dir);

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080));
    tracing::info!("->> LISTENING on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind address");
    axum::serve(listener, routes_all.into_make_service())
        .await
        .expect("Server failed");

    Ok(())
}
