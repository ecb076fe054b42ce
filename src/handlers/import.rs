use axum::{
    extract::{Multipart, State},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};
use crate::handlers::today;
use crate::middlewares::AuthUser;
use crate::models::PremiumFeature;
use crate::repositories::{CardRepository, SubscriptionRepository};
use crate::services::{import, ImportError, RowError, SpreadsheetFormat};
use crate::state::AppState;

/// Largest accepted spreadsheet
pub const MAX_IMPORT_BYTES: usize = 10 * 1024 * 1024;

// ============ Request/Response DTOs ============

#[derive(Debug, Serialize, ToSchema)]
pub struct ImportResponse {
    pub imported: u64,
    /// Rows that were not imported, with the reason
    pub skipped: Vec<RowError>,
}

// ============ Handlers ============

/// Import cards from a spreadsheet (Premium)
///
/// Multipart form with a `file` field holding an `.xlsx`, `.xls` or `.csv`
/// file. Valid rows go to the Main Collection; invalid rows are reported.
#[utoipa::path(
    post,
    path = "/api/import/excel",
    request_body(content_type = "multipart/form-data", description = "Spreadsheet in a `file` field"),
    responses(
        (status = 200, description = "Import summary", body = ImportResponse),
        (status = 400, description = "Missing or unreadable file"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Premium subscription required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Import"
)]
pub async fn import_spreadsheet(
    user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<ImportResponse>> {
    let today = today();
    SubscriptionRepository::require_premium(
        &state.db,
        user.id,
        PremiumFeature::SpreadsheetImport,
        today,
    )
    .await?;

    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let format = field
            .file_name()
            .and_then(SpreadsheetFormat::from_filename)
            .ok_or(ImportError::UnsupportedFormat)?;
        let bytes = field.bytes().await?;
        upload = Some((format, bytes));
        break;
    }

    let (format, bytes) =
        upload.ok_or_else(|| AppError::Validation("A file field is required".to_string()))?;
    if bytes.len() > MAX_IMPORT_BYTES {
        return Err(AppError::Validation(
            "Spreadsheet must be at most 10 MB".to_string(),
        ));
    }

    let rows = tokio::task::spawn_blocking(move || import::read_rows(bytes.to_vec(), format))
        .await
        .map_err(|e| AppError::Internal(format!("Spreadsheet parsing panicked: {}", e)))??;

    let mut inputs = Vec::with_capacity(rows.len());
    let mut skipped = Vec::new();
    for row in &rows {
        match row.to_input(today) {
            Ok(input) => inputs.push(input),
            Err(reason) => skipped.push(RowError {
                row: row.row,
                reason,
            }),
        }
    }

    let imported = CardRepository::create_many(&state.db, user.id, &inputs).await?;
    tracing::info!(
        user_id = %user.id,
        imported,
        skipped = skipped.len(),
        "Spreadsheet imported"
    );

    Ok(Json(ImportResponse { imported, skipped }))
}
