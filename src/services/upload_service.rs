//! Image uploads stored on local disk and served under `/uploads`.

use std::path::PathBuf;

use uuid::Uuid;

use crate::{config::Config, error::AppError};

/// What an uploaded image is for; decides the subdirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Avatar,
    ServiceImage,
    CategoryIcon,
}

impl UploadKind {
    pub fn dir(&self) -> &'static str {
        match self {
            UploadKind::Avatar => "avatars",
            UploadKind::ServiceImage => "services",
            UploadKind::CategoryIcon => "categories",
        }
    }
}

/// File extension for an accepted image content type.
pub fn extension_for(content_type: &str) -> Result<&'static str, AppError> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        "image/jpeg" | "image/jpg" => Ok("jpg"),
        "image/png" => Ok("png"),
        "image/webp" => Ok("webp"),
        _ => Err(AppError::UnsupportedMediaType(essence)),
    }
}

/// Check the leading bytes agree with the declared type.
fn matches_signature(extension: &str, bytes: &[u8]) -> bool {
    match extension {
        "jpg" => bytes.starts_with(&[0xFF, 0xD8, 0xFF]),
        "png" => bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "webp" => bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP",
        _ => false,
    }
}

/// Validate and write an image, returning its public URL.
///
/// # Errors
///
/// - `InvalidRequest`: empty file
/// - `PayloadTooLarge`: more than `MAX_UPLOAD_BYTES`
/// - `UnsupportedMediaType`: not JPEG, PNG or WebP, or content does not match the type
pub async fn store(
    config: &Config,
    kind: UploadKind,
    content_type: &str,
    bytes: &[u8],
) -> Result<String, AppError> {
    if bytes.is_empty() {
        return Err(AppError::InvalidRequest("Uploaded file is empty".to_string()));
    }
    if bytes.len() > config.max_upload_bytes {
        return Err(AppError::PayloadTooLarge);
    }

    let extension = extension_for(content_type)?;
    if !matches_signature(extension, bytes) {
        return Err(AppError::UnsupportedMediaType(format!(
            "content is not a valid {extension} image"
        )));
    }

    let dir = PathBuf::from(&config.upload_dir).join(kind.dir());
    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|e| AppError::Internal(format!("create upload dir: {e}")))?;

    let file_name = format!("{}.{extension}", Uuid::new_v4());
    tokio::fs::write(dir.join(&file_name), bytes)
        .await
        .map_err(|e| AppError::Internal(format!("write upload: {e}")))?;

    tracing::info!(kind = kind.dir(), file = %file_name, size = bytes.len(), "file_uploaded");
    Ok(format!("{}/{}/{file_name}", config.uploads_base_url(), kind.dir()))
}
