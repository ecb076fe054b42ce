use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::state::AppState;

/// Largest accepted card picture
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Public path prefix of stored uploads
pub const UPLOADS_PATH: &str = "/uploads";

// ============ Request/Response DTOs ============

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub image_url: String,
}

// ============ Handlers ============

/// File extension for an accepted image content type
fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Upload a card picture
///
/// Multipart form with an `image` field (JPEG, PNG or GIF, at most 5 MB).
#[utoipa::path(
    post,
    path = "/api/upload",
    request_body(content_type = "multipart/form-data", description = "Picture in an `image` field"),
    responses(
        (status = 200, description = "Image stored", body = UploadResponse),
        (status = 400, description = "Missing, oversized or unsupported image"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Uploads"
)]
pub async fn upload_image(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("image") {
            continue;
        }

        let extension = field
            .content_type()
            .and_then(image_extension)
            .ok_or_else(|| {
                AppError::Validation("Only JPEG, PNG and GIF images are allowed".to_string())
            })?;
        let bytes = field.bytes().await?;
        if bytes.is_empty() {
            return Err(AppError::Validation("Image is empty".to_string()));
        }
        if bytes.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(
                "Image must be at most 5 MB".to_string(),
            ));
        }

        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        tokio::fs::write(state.config.upload_dir.join(&filename), &bytes)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {}", e)))?;
        tracing::info!(user_id = %user.id, %filename, size = bytes.len(), "Image uploaded");

        return Ok(Json(UploadResponse {
            image_url: format!("{}/{}", UPLOADS_PATH, filename),
        }));
    }

    Err(AppError::Validation("An image field is required".to_string()))
}
