use crate::interfaces::file_storage::FileStorageInterface;
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use google_cloud_storage::client::google_cloud_auth::credentials::CredentialsFile;
use google_cloud_storage::{
    client::{Client, ClientConfig},
    http::objects::{
        compose::{ComposeObjectRequest, ComposingTargets},
        delete::DeleteObjectRequest,
        download::Range,
        get::GetObjectRequest,
        upload::{Media, UploadObjectRequest, UploadType},
        Object, SourceObjects,
    },
};

// Objects above the threshold go up in parts; GCS compose accepts at most
// 32 sources per call, so large uploads are composed in rounds.
const CHUNKED_THRESHOLD_BYTES: usize = 100 * 1024 * 1024;
const PART_SIZE_BYTES: usize = 10 * 1024 * 1024;
const PART_CONCURRENCY: usize = 4;
const COMPOSE_BATCH: usize = 32;

pub struct GoogleCloudFileStorage {
    client: Client,
    bucket: String,
}

impl GoogleCloudFileStorage {
    pub async fn new(
        bucket: &str,
        credentials_file: Option<&str>,
        storage_endpoint: Option<&str>,
    ) -> Self {
        let mut config = match credentials_file {
            None => {
                tracing::warn!("storage credentials filepath not set - going anonymous");
                ClientConfig::default().anonymous()
            }
            Some(filepath) => ClientConfig::default()
                .with_credentials(
                    CredentialsFile::new_from_file(filepath.to_string())
                        .await
                        .expect("Credentials file not found"),
                )
                .await
                .expect("Failed to load Google Cloud Storage credentials"),
        };

        if let Some(endpoint) = storage_endpoint {
            config.storage_endpoint = endpoint.to_string();
        }

        GoogleCloudFileStorage {
            bucket: bucket.to_string(),
            client: Client::new(config),
        }
    }

    fn object_name(path: Option<&str>, file_name: &str) -> String {
        match path {
            Some(p) if !p.is_empty() => format!("{}/{}", p, file_name),
            _ => file_name.to_string(),
        }
    }

    async fn upload_single(
        &self,
        bytes: Vec<u8>,
        object_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, String> {
        let req = UploadObjectRequest {
            bucket: self.bucket.clone(),
            ..Default::default()
        };

        let upload_type = UploadType::Simple(Media {
            name: object_name.to_string().into(),
            content_type: content_type
                .unwrap_or("application/octet-stream")
                .to_string()
                .into(),
            content_length: Some(bytes.len() as u64),
        });

        let obj = self
            .client
            .upload_object(&req, bytes, &upload_type)
            .await
            .map_err(|e| e.to_string())?;

        Ok(obj.media_link)
    }

    /// 10MB parts uploaded with bounded concurrency, composed into the final
    /// object, parts removed afterwards. Any part failure aborts the whole
    /// upload and deletes the parts already stored.
    async fn upload_chunked(
        &self,
        bytes: Vec<u8>,
        object_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, String> {
        let part_names: Vec<String> = (0..bytes.len().div_ceil(PART_SIZE_BYTES))
            .map(|i| format!("{object_name}.part{i:04}"))
            .collect();

        let uploads = bytes
            .chunks(PART_SIZE_BYTES)
            .zip(part_names.iter())
            .map(|(chunk, name)| {
                let chunk = chunk.to_vec();
                async move {
                    self.upload_single(chunk, name, Some("application/octet-stream"))
                        .await
                        .map_err(|e| format!("part {name}: {e}"))
                }
            })
            .collect::<Vec<_>>();

        let results: Vec<Result<String, String>> = stream::iter(uploads)
            .buffer_unordered(PART_CONCURRENCY)
            .collect()
            .await;

        if let Some(err) = results.into_iter().find_map(|r| r.err()) {
            self.delete_parts(&part_names).await;
            return Err(err);
        }

        let composed = self
            .compose_rounds(part_names.clone(), object_name, content_type)
            .await;
        self.delete_parts(&part_names).await;

        match composed {
            Ok(obj) => Ok(obj.media_link),
            Err(e) => {
                let _ = self
                    .delete(None, object_name)
                    .await;
                Err(e)
            }
        }
    }

    async fn compose_rounds(
        &self,
        mut sources: Vec<String>,
        object_name: &str,
        content_type: Option<&str>,
    ) -> Result<Object, String> {
        let mut round = 0usize;
        loop {
            let last_round = sources.len() <= COMPOSE_BATCH;
            let mut next: Vec<String> = Vec::new();
            let mut last_obj: Option<Object> = None;

            for (i, batch) in sources.chunks(COMPOSE_BATCH).enumerate() {
                let destination = if last_round {
                    object_name.to_string()
                } else {
                    format!("{object_name}.compose{round}-{i}")
                };
                let req = ComposeObjectRequest {
                    bucket: self.bucket.clone(),
                    destination_object: destination.clone(),
                    composing_targets: ComposingTargets {
                        destination: Some(Object {
                            content_type: content_type.map(|c| c.to_string()),
                            ..Default::default()
                        }),
                        source_objects: batch
                            .iter()
                            .map(|name| SourceObjects {
                                name: name.clone(),
                                ..Default::default()
                            })
                            .collect(),
                    },
                    ..Default::default()
                };
                let obj = self
                    .client
                    .compose_object(&req)
                    .await
                    .map_err(|e| e.to_string())?;
                last_obj = Some(obj);
                next.push(destination);
            }

            if last_round {
                return last_obj.ok_or_else(|| "compose produced no object".to_string());
            }
            // intermediate compose objects become next round's sources
            self.delete_parts(&sources).await;
            sources = next;
            round += 1;
        }
    }

    async fn delete_parts(&self, names: &[String]) {
        for name in names {
            let req = DeleteObjectRequest {
                bucket: self.bucket.clone(),
                object: name.clone(),
                ..Default::default()
            };
            if let Err(e) = self.client.delete_object(&req).await {
                tracing::warn!("failed to clean up part {name}: {e}");
            }
        }
    }
}

#[async_trait]
impl FileStorageInterface for GoogleCloudFileStorage {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: Option<&str>,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, String> {
        let object_name = Self::object_name(path, file_name);

        if bytes.len() > CHUNKED_THRESHOLD_BYTES {
            self.upload_chunked(bytes, &object_name, content_type).await
        } else {
            self.upload_single(bytes, &object_name, content_type).await
        }
    }

    async fn download(&self, path: Option<&str>, file_name: &str) -> Result<Vec<u8>, String> {
        let request_type = GetObjectRequest {
            bucket: self.bucket.clone(),
            object: Self::object_name(path, file_name),
            ..Default::default()
        };

        self.client
            .download_object(&request_type, &Range::default())
            .await
            .map_err(|e| e.to_string())
    }

    async fn delete(&self, path: Option<&str>, file_name: &str) -> Result<(), String> {
        let req = DeleteObjectRequest {
            bucket: self.bucket.clone(),
            object: Self::object_name(path, file_name),
            ..Default::default()
        };
        self.client
            .delete_object(&req)
            .await
            .map_err(|e| e.to_string())
    }
}
