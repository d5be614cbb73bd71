use chrono::Utc;

use crate::interfaces::file_storage::FileStorageInterface;
use crate::middleware::ctx::Ctx;
use crate::middleware::error::{AppError, CtxResult};
use crate::utils::file::convert::FileUpload;

pub const VIDEO_MAX_BYTES: u64 = 500 * 1024 * 1024;
pub const DOCUMENT_MAX_BYTES: u64 = 10 * 1024 * 1024;

const VIDEO_MIME_TYPES: [&str; 3] = ["video/mp4", "video/quicktime", "video/x-msvideo"];
const DOCUMENT_MIME_TYPES: [&str; 3] = ["application/pdf", "image/jpeg", "image/png"];
const SIGNATURE_MIME_TYPES: [&str; 2] = ["image/png", "image/jpeg"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Video,
    Document,
    SignatureImage,
}

impl MediaKind {
    fn max_bytes(&self) -> u64 {
        match self {
            MediaKind::Video => VIDEO_MAX_BYTES,
            MediaKind::Document | MediaKind::SignatureImage => DOCUMENT_MAX_BYTES,
        }
    }

    fn allowed_mime_types(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Video => &VIDEO_MIME_TYPES,
            MediaKind::Document => &DOCUMENT_MIME_TYPES,
            MediaKind::SignatureImage => &SIGNATURE_MIME_TYPES,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Document => "document",
            MediaKind::SignatureImage => "signature",
        }
    }
}

/// Both checks run before a single byte reaches the storage backend.
pub fn validate_upload(kind: MediaKind, upload: &FileUpload) -> Result<(), AppError> {
    let size = upload.data.len() as u64;
    if size > kind.max_bytes() {
        return Err(AppError::FileStorage {
            source: format!(
                "{} exceeds the maximum size of {} bytes",
                kind.label(),
                kind.max_bytes()
            ),
        });
    }

    let content_type = upload.content_type.as_deref().unwrap_or("");
    if !kind.allowed_mime_types().contains(&content_type) {
        return Err(AppError::FileStorage {
            source: format!(
                "unsupported {} content type: {content_type}",
                kind.label()
            ),
        });
    }
    Ok(())
}

pub struct MediaService<'a, F: FileStorageInterface> {
    file_storage: &'a F,
    ctx: &'a Ctx,
}

impl<'a, F: FileStorageInterface> MediaService<'a, F> {
    pub fn new(file_storage: &'a F, ctx: &'a Ctx) -> Self {
        Self { file_storage, ctx }
    }

    /// Validates, then stores under the owning candidacy's namespace.
    /// Returns the public url of the stored object.
    pub async fn store(
        &self,
        kind: MediaKind,
        owner_id: &str,
        upload: FileUpload,
    ) -> CtxResult<String> {
        validate_upload(kind, &upload).map_err(|e| self.ctx.to_ctx_error(e))?;

        let file_name = format!("{}_{}", Utc::now().timestamp_millis(), upload.file_name);
        self.file_storage
            .upload(
                upload.data,
                Some(owner_id),
                &file_name,
                upload.content_type.as_deref(),
            )
            .await
            .map_err(|source| self.ctx.to_ctx_error(AppError::FileStorage { source }))
    }
}
