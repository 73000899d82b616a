//! Image upload endpoints.
//!
//! All three accept `multipart/form-data` with a single `file` field and
//! return `{ "url": "..." }` pointing under `/uploads`.

use axum::{
    Extension,
    extract::{
        State,
        multipart::{Multipart, MultipartRejection},
    },
};
use serde::Serialize;

use crate::{
    error::AppError,
    middleware::auth::AuthContext,
    models::user::UpdateProfileRequest,
    response::ApiResponse,
    services::{
        auth_service,
        upload_service::{self, UploadKind},
    },
    state::AppState,
};

const FILE_FIELD: &str = "file";

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Pull the `file` field out of the form, stopping as soon as it exceeds `max_bytes`.
async fn read_file(
    multipart: Result<Multipart, MultipartRejection>,
    max_bytes: usize,
) -> Result<(String, Vec<u8>), AppError> {
    let mut multipart = multipart?;

    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let content_type = field
            .content_type()
            .map(str::to_string)
            .ok_or_else(|| AppError::UnsupportedMediaType("missing content type".to_string()))?;

        let mut bytes = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if bytes.len() + chunk.len() > max_bytes {
                return Err(AppError::PayloadTooLarge);
            }
            bytes.extend_from_slice(&chunk);
        }
        return Ok((content_type, bytes));
    }

    Err(AppError::InvalidRequest(format!(
        "Multipart field '{FILE_FIELD}' is required"
    )))
}

async fn upload(
    state: &AppState,
    kind: UploadKind,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<String, AppError> {
    let (content_type, bytes) = read_file(multipart, state.config.max_upload_bytes).await?;
    upload_service::store(&state.config, kind, &content_type, &bytes).await
}

/// Upload and set the caller's avatar.
pub async fn upload_avatar(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    let url = upload(&state, UploadKind::Avatar, multipart).await?;

    auth_service::update_profile(
        &state.pool,
        auth.user_id,
        UpdateProfileRequest {
            avatar_url: Some(url.clone()),
            ..Default::default()
        },
    )
    .await?;

    Ok(ApiResponse::created(UploadResponse { url }))
}

/// Upload a service image (contractors and admins).
pub async fn upload_service_image(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    if !auth.role.can_publish() {
        return Err(AppError::forbidden());
    }
    let url = upload(&state, UploadKind::ServiceImage, multipart).await?;
    Ok(ApiResponse::created(UploadResponse { url }))
}

/// Upload a category icon (admins).
pub async fn upload_category_icon(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<UploadResponse>, AppError> {
    auth.require_admin()?;
    let url = upload(&state, UploadKind::CategoryIcon, multipart).await?;
    Ok(ApiResponse::created(UploadResponse { url }))
}
