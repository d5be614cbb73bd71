use std::sync::Arc;

use async_trait::async_trait;

/// Seam between the media pipeline and the object store. Candidacy
/// assets are namespaced under the owning record id through `path`.
/// Errors are plain strings so backends stay decoupled from the app
/// error type; callers wrap them into `AppError::FileStorage`.
#[async_trait]
pub trait FileStorageInterface {
    /// Stores the bytes and returns the public url of the object.
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: Option<&str>,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, String>;

    async fn download(&self, path: Option<&str>, file_name: &str) -> Result<Vec<u8>, String>;

    async fn delete(&self, path: Option<&str>, file_name: &str) -> Result<(), String>;
}

// lets Arc<dyn FileStorageInterface> flow into generic services
#[async_trait]
impl<T: FileStorageInterface + Send + Sync + ?Sized> FileStorageInterface for Arc<T> {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        path: Option<&str>,
        file_name: &str,
        content_type: Option<&str>,
    ) -> Result<String, String> {
        (**self).upload(bytes, path, file_name, content_type).await
    }

    async fn download(&self, path: Option<&str>, file_name: &str) -> Result<Vec<u8>, String> {
        (**self).download(path, file_name).await
    }

    async fn delete(&self, path: Option<&str>, file_name: &str) -> Result<(), String> {
        (**self).delete(path, file_name).await
    }
}
