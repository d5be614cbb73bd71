#[macro_export]
macro_rules! test_with_server {
    ($name:ident, |$server:ident, $ctx_state:ident, $config:ident| $body:block) => {
        #[tokio::test(flavor = "multi_thread")]
        #[serial_test::serial]
        async fn $name() {
            use axum_test::{TestServer, TestServerConfig};
            use concours_server::config::AppConfig;
            use concours_server::database::client::{Database, DbConfig};
            use concours_server::interfaces::file_storage::FileStorageInterface;
            use concours_server::middleware::mw_ctx::create_ctx_state;
            use concours_server::utils::file::local_file_storage::LocalFileStorage;
            use futures::FutureExt;
            use std::panic::resume_unwind;
            use std::sync::Arc;

            let $config = AppConfig {
                db_namespace: "test".to_string(),
                db_database: "test".to_string(),
                db_password: None,
                db_username: None,
                db_url: "mem://".to_string(),
                jwt_secret: "secret".to_string(),
                upload_file_size_max_mb: 600,
                init_server_password: "test-start-password".to_string(),
                is_development: true,
                uploads_dir: "target/tests_media".to_string(),
                upload_base_url: "http://localhost".to_string(),
                export_header_url: None,
                gcs_bucket: "".to_string(),
                gcs_endpoint: None,
                gcs_credentials: None,
            };

            let $ctx_state = {
                let db = Database::connect(DbConfig {
                    url: &$config.db_url,
                    database: &$config.db_database,
                    namespace: &$config.db_namespace,
                    password: $config.db_password.as_deref(),
                    username: $config.db_username.as_deref(),
                })
                .await;

                concours_server::init::run_migrations(&db).await.unwrap();

                let file_storage: Arc<dyn FileStorageInterface + Send + Sync> =
                    Arc::new(LocalFileStorage::new(
                        $config.uploads_dir.clone(),
                        format!("{}/media", $config.upload_base_url),
                    ));
                create_ctx_state(db, &$config, file_storage)
            };

            concours_server::init::create_default_admin(&$ctx_state).await;

            let routes_all =
                concours_server::init::main_router(&$ctx_state, &$config.uploads_dir);

            let $server = TestServer::new_with_config(
                routes_all,
                TestServerConfig {
                    transport: None,
                    save_cookies: true,
                    expect_success_by_default: false,
                    restrict_requests_with_http_schema: false,
                    default_content_type: None,
                    default_scheme: None,
                },
            )
            .expect("Failed to create test server");

            let test_result = std::panic::AssertUnwindSafe(async {
                (|| async $body)().await;
            })
            .catch_unwind()
            .await;

            $ctx_state
                .clone()
                .db
                .client
                .query(format!("REMOVE DATABASE {};", $config.db_database))
                .await
                .expect("failed to remove database");

            if let Err(panic) = test_result {
                resume_unwind(panic);
            }
        }
    };
}
