use dotenvy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_namespace: String,
    pub db_database: String,
    pub db_password: Option<String>,
    pub db_username: Option<String>,
    pub db_url: String,
    pub jwt_secret: String,
    pub upload_file_size_max_mb: u64,
    pub init_server_password: String,
    pub is_development: bool,
    pub uploads_dir: String,
    pub upload_base_url: String,
    pub export_header_url: Option<String>,
    pub gcs_bucket: String,
    pub gcs_endpoint: Option<String>,
    pub gcs_credentials: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let db_namespace = std::env::var("DB_NAMESPACE").unwrap_or("concours".to_string());
        let db_database = std::env::var("DB_DATABASE").unwrap_or("concours".to_string());
        let db_password = std::env::var("DB_PASSWORD").ok();
        let db_username = std::env::var("DB_USERNAME").ok();
        let db_url = std::env::var("DB_URL").expect("Missing DB_URL in env");

        let jwt_secret = std::env::var("JWT_SECRET").expect("Missing JWT_SECRET in env");

        // transport ceiling for multipart bodies, far above the per-kind media limits
        let upload_file_size_max_mb: u64 = std::env::var("UPLOAD_MAX_SIZE_MB")
            .unwrap_or("5120".to_string())
            .parse()
            .expect("UPLOAD_MAX_SIZE_MB should be number");

        let init_server_password =
            std::env::var("START_PASSWORD").expect("Missing START_PASSWORD in env");

        let is_development = std::env::var("DEVELOPMENT")
            .expect("set DEVELOPMENT env var")
            .eq("true");

        let uploads_dir = std::env::var("UPLOADS_DIRECTORY").unwrap_or("uploads".to_string());
        let upload_base_url =
            std::env::var("UPLOAD_BASE_URL").unwrap_or("http://localhost:8080".to_string());

        let export_header_url = std::env::var("EXPORT_HEADER_URL").ok();

        let gcs_bucket =
            std::env::var("GOOGLE_CLOUD_STORAGE_BUCKET").unwrap_or("concours_storage".to_string());
        let gcs_endpoint = std::env::var("GOOGLE_CLOUD_STORAGE_ENDPOINT")
            .ok()
            .and_then(|v| {
                if !v.is_empty() && v != "https://storage.googleapis.com" {
                    Some(v)
                } else {
                    None
                }
            });
        let gcs_credentials = std::env::var("GOOGLE_CLOUD_STORAGE_CREDENTIALS").ok();

        Self {
            db_namespace,
            db_database,
            db_password,
            db_username,
            db_url,
            jwt_secret,
            upload_file_size_max_mb,
            init_server_password,
            is_development,
            uploads_dir,
            upload_base_url,
            export_header_url,
            gcs_bucket,
            gcs_endpoint,
            gcs_credentials,
        }
    }
}
