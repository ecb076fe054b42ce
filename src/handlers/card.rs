use axum::{
    extract::{Path, State},
    Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, AppResult};
use crate::handlers::{today, ApiJson, ApiQuery, PaginationParams};
use crate::middlewares::AuthUser;
use crate::models::{Card, CardInput, CardStatus, GradingCompany, MAIN_COLLECTION_ID};
use crate::repositories::{CardRepository, CollectionRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

/// Full card payload for create and update
#[derive(Debug, Deserialize, ToSchema)]
pub struct CardRequest {
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[schema(value_type = Option<f64>)]
    pub sold_price: Option<Decimal>,
    /// Defaults to `bought`
    pub status: Option<CardStatus>,
    pub bought_date: Date,
    pub sold_date: Option<Date>,
    pub category: Option<String>,
    /// Defaults to the Main Collection on create, unchanged on update
    pub collection_id: Option<i32>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub graded: bool,
    pub grading_company: Option<GradingCompany>,
    #[schema(value_type = Option<f64>)]
    pub grading_value: Option<Decimal>,
}

impl CardRequest {
    fn into_input(self, default_collection: i32) -> CardInput {
        CardInput {
            name: self.name,
            description: self.description,
            price: self.price,
            sold_price: self.sold_price,
            status: self.status.unwrap_or(CardStatus::Bought),
            bought_date: self.bought_date,
            sold_date: self.sold_date,
            category: self.category,
            collection_id: self.collection_id.unwrap_or(default_collection),
            image_url: self.image_url,
            graded: self.graded,
            grading_company: self.grading_company,
            grading_value: self.grading_value,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SellCardRequest {
    #[schema(value_type = f64)]
    pub sold_price: Decimal,
    /// Defaults to today
    pub sold_date: Option<Date>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CardFilterParams {
    /// Restrict to one collection; the Main Collection (1) lists every card
    pub collection_id: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardResponse {
    pub id: i32,
    pub collection_id: i32,
    pub name: String,
    pub description: Option<String>,
    #[schema(value_type = f64)]
    pub price: Decimal,
    #[schema(value_type = Option<f64>)]
    pub sold_price: Option<Decimal>,
    pub status: CardStatus,
    pub bought_date: Date,
    pub sold_date: Option<Date>,
    pub category: Option<String>,
    pub image_url: String,
    pub graded: bool,
    pub grading_company: Option<GradingCompany>,
    #[schema(value_type = Option<f64>)]
    pub grading_value: Option<Decimal>,
    /// Realized profit, sold cards only
    #[schema(value_type = Option<f64>)]
    pub profit: Option<Decimal>,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub updated_at: OffsetDateTime,
}

impl From<Card> for CardResponse {
    fn from(c: Card) -> Self {
        let profit = (c.status == CardStatus::Sold).then(|| c.realized_profit());
        Self {
            id: c.id,
            collection_id: c.collection_id,
            name: c.name,
            description: c.description,
            price: c.price,
            sold_price: c.sold_price,
            status: c.status,
            bought_date: c.bought_date,
            sold_date: c.sold_date,
            category: c.category,
            image_url: c.image_url,
            graded: c.graded,
            grading_company: c.grading_company,
            grading_value: c.grading_value,
            profit,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardListResponse {
    pub data: Vec<CardResponse>,
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
}

// ============ Handlers ============

/// Add a card to the collection
#[utoipa::path(
    post,
    path = "/api/cards",
    request_body = CardRequest,
    responses(
        (status = 200, description = "Card created successfully", body = CardResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Collection not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn create_card(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CardRequest>,
) -> AppResult<Json<CardResponse>> {
    let input = payload.into_input(MAIN_COLLECTION_ID).validate()?;

    let card = CardRepository::create(&state.db, user.id, &input).await?;
    tracing::info!(user_id = %user.id, card_id = card.id, "Card created");

    Ok(Json(card.into()))
}

/// List the user's cards, newest first
#[utoipa::path(
    get,
    path = "/api/cards",
    params(
        CardFilterParams,
        PaginationParams
    ),
    responses(
        (status = 200, description = "List of cards", body = CardListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Collection not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn list_cards(
    user: AuthUser,
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CardFilterParams>,
    ApiQuery(params): ApiQuery<PaginationParams>,
) -> AppResult<Json<CardListResponse>> {
    let (limit, offset) = params.resolve();

    if let Some(collection_id) = filter.collection_id {
        CollectionRepository::find_visible(&state.db, collection_id, user.id).await?;
    }

    let cards =
        CardRepository::list_by_user(&state.db, user.id, filter.collection_id, limit, offset)
            .await?;
    let total = CardRepository::count_by_user(&state.db, user.id, filter.collection_id).await?;

    Ok(Json(CardListResponse {
        data: cards.into_iter().map(|c| c.into()).collect(),
        total,
        limit,
        offset,
    }))
}

/// Get a card by ID
#[utoipa::path(
    get,
    path = "/api/cards/{id}",
    params(
        ("id" = i32, Path, description = "Card ID")
    ),
    responses(
        (status = 200, description = "Card details", body = CardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Card not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn get_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CardResponse>> {
    let card = CardRepository::find_by_id_and_user(&state.db, id, user.id).await?;
    Ok(Json(card.into()))
}

/// Replace a card
#[utoipa::path(
    put,
    path = "/api/cards/{id}",
    params(
        ("id" = i32, Path, description = "Card ID")
    ),
    request_body = CardRequest,
    responses(
        (status = 200, description = "Card updated successfully", body = CardResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Card not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn update_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<CardRequest>,
) -> AppResult<Json<CardResponse>> {
    let existing = CardRepository::find_by_id_and_user(&state.db, id, user.id).await?;
    let input = payload.into_input(existing.collection_id).validate()?;

    let card = CardRepository::update(&state.db, id, user.id, &input).await?;
    Ok(Json(card.into()))
}

/// Mark a card as sold
#[utoipa::path(
    post,
    path = "/api/cards/{id}/sell",
    params(
        ("id" = i32, Path, description = "Card ID")
    ),
    request_body = SellCardRequest,
    responses(
        (status = 200, description = "Card sold", body = CardResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Card not found"),
        (status = 409, description = "Card already sold")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn sell_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<SellCardRequest>,
) -> AppResult<Json<CardResponse>> {
    let card = CardRepository::find_by_id_and_user(&state.db, id, user.id).await?;
    if card.status == CardStatus::Sold {
        return Err(AppError::Conflict("Card is already sold".to_string()));
    }

    let sold_date = payload.sold_date.unwrap_or_else(today);
    let input = card
        .to_input()
        .into_sold(payload.sold_price, sold_date)
        .validate()?;

    let card = CardRepository::update(&state.db, id, user.id, &input).await?;
    tracing::info!(user_id = %user.id, card_id = card.id, "Card sold");

    Ok(Json(card.into()))
}

/// Delete a card
#[utoipa::path(
    delete,
    path = "/api/cards/{id}",
    params(
        ("id" = i32, Path, description = "Card ID")
    ),
    responses(
        (status = 200, description = "Card deleted successfully"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Card not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Cards"
)]
pub async fn delete_card(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<()> {
    CardRepository::delete_by_user(&state.db, id, user.id).await?;
    Ok(())
}
