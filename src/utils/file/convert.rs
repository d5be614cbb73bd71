use std::io::Read;

use axum_typed_multipart::FieldData;
use base64::Engine;
use tempfile::NamedTempFile;

use crate::middleware::error::{AppError, CtxResult};

pub fn sanitize_filename(file_name: &str) -> String {
    let bad_chars = ['/', '\\', ':', '*', '?', '"', '<', '>', '|', ' '];
    let mut result = file_name.to_owned();
    for &ch in &bad_chars {
        result = result.replace(ch, "_");
    }
    result
}

#[derive(Debug)]
pub struct FileUpload {
    pub content_type: Option<String>,
    pub file_name: String,
    pub data: Vec<u8>,
    pub extension: String,
}

pub fn convert_field_file_data(data: FieldData<NamedTempFile>) -> CtxResult<FileUpload> {
    let content_type = data.metadata.content_type;

    let file_name = data.metadata.file_name.ok_or(AppError::Generic {
        description: "File name missing".to_string(),
    })?;

    let extension = file_name
        .split('.')
        .last()
        .ok_or(AppError::Generic {
            description: "File has no extension".to_string(),
        })?
        .to_string();

    let mut buffer = Vec::new();
    let mut file = data.contents.as_file();

    file.read_to_end(&mut buffer)
        .map_err(|e| AppError::Generic {
            description: e.to_string(),
        })?;
    Ok(FileUpload {
        content_type,
        file_name: sanitize_filename(&file_name),
        data: buffer,
        extension,
    })
}

/// Decodes a `data:<mime>;base64,<payload>` URL, the shape signature pads
/// produce, into a binary blob ready for the regular upload path.
pub fn decode_data_url(data_url: &str) -> CtxResult<FileUpload> {
    let rest = data_url.strip_prefix("data:").ok_or(AppError::Generic {
        description: "Not a data URL".to_string(),
    })?;
    let (meta, payload) = rest.split_once(',').ok_or(AppError::Generic {
        description: "Malformed data URL".to_string(),
    })?;
    let mime = meta.strip_suffix(";base64").ok_or(AppError::Generic {
        description: "Only base64 data URLs are supported".to_string(),
    })?;

    let data = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::Generic {
            description: format!("Invalid base64 payload: {e}"),
        })?;

    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        other => {
            return Err(AppError::Generic {
                description: format!("Unsupported signature image type: {other}"),
            }
            .into())
        }
    };

    Ok(FileUpload {
        content_type: Some(mime.to_string()),
        file_name: format!("signature.{extension}"),
        data,
        extension: extension.to_string(),
    })
}
