use axum::{
    extract::State,
    Json,
};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppResult;
use crate::handlers::{today, ApiQuery};
use crate::middlewares::AuthUser;
use crate::repositories::CardRepository;
use crate::services::{collection_value_series, compute_stats, CardStats, Timeframe, ValuePoint};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, IntoParams)]
pub struct TimeframeParams {
    /// week, month, year or all (default)
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ValueHistoryResponse {
    pub timeframe: Timeframe,
    pub data: Vec<ValuePoint>,
}

// ============ Handlers ============

/// Investment statistics over a trailing window
#[utoipa::path(
    get,
    path = "/api/statistics",
    params(TimeframeParams),
    responses(
        (status = 200, description = "Statistics", body = CardStats),
        (status = 400, description = "Unknown timeframe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn get_statistics(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TimeframeParams>,
) -> AppResult<Json<CardStats>> {
    let timeframe = params.timeframe.unwrap_or_default();
    let cards = CardRepository::list_all_by_user(&state.db, user.id).await?;

    let stats = compute_stats(&cards, timeframe, today());
    tracing::debug!(
        user_id = %user.id,
        timeframe = timeframe.as_str(),
        cards = cards.len(),
        "Statistics computed"
    );

    Ok(Json(stats))
}

/// Owned collection value over time
#[utoipa::path(
    get,
    path = "/api/statistics/value-history",
    params(TimeframeParams),
    responses(
        (status = 200, description = "Value series", body = ValueHistoryResponse),
        (status = 400, description = "Unknown timeframe"),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Statistics"
)]
pub async fn get_value_history(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<TimeframeParams>,
) -> AppResult<Json<ValueHistoryResponse>> {
    let timeframe = params.timeframe.unwrap_or_default();
    let cards = CardRepository::list_all_by_user(&state.db, user.id).await?;

    let data = collection_value_series(&cards, timeframe, today());

    Ok(Json(ValueHistoryResponse { timeframe, data }))
}
