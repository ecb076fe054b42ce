use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::today;
use crate::middlewares::AuthUser;
use crate::models::{SubscriptionStatus, SubscriptionTier, SubscriptionType, UserSubscription};
use crate::repositories::{CardRepository, SubscriptionRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionTypeResponse {
    pub id: i32,
    pub name: String,
    pub tier: SubscriptionTier,
    #[schema(value_type = f64)]
    pub price: Decimal,
    /// Informational card limit; `None` means unlimited
    pub max_cards: Option<i32>,
}

impl From<SubscriptionType> for SubscriptionTypeResponse {
    fn from(t: SubscriptionType) -> Self {
        Self {
            id: t.id,
            name: t.name,
            tier: t.tier,
            price: t.price,
            max_cards: t.max_cards,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubscriptionResponse {
    pub id: i32,
    #[schema(value_type = String)]
    pub status: SubscriptionStatus,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub subscription_type: SubscriptionTypeResponse,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
}

impl From<UserSubscription> for SubscriptionResponse {
    fn from(s: UserSubscription) -> Self {
        Self {
            id: s.id,
            status: s.status,
            start_date: s.start_date,
            end_date: s.end_date,
            subscription_type: s.subscription_type.into(),
            created_at: s.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentSubscriptionResponse {
    pub is_free_tier: bool,
    /// The plan in effect
    pub subscription_type: SubscriptionTypeResponse,
    /// `None` on the free tier
    pub subscription: Option<SubscriptionResponse>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CardCountResponse {
    pub count: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelSubscriptionResponse {
    pub cancelled: u64,
}

// ============ Handlers ============

/// List subscription plans, cheapest first
#[utoipa::path(
    get,
    path = "/api/subscriptions/types",
    responses(
        (status = 200, description = "Subscription plans", body = Vec<SubscriptionTypeResponse>),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Subscriptions"
)]
pub async fn list_subscription_types(
    _user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<SubscriptionTypeResponse>>> {
    let types = SubscriptionRepository::list_types(&state.db).await?;
    Ok(Json(types.into_iter().map(|t| t.into()).collect()))
}

/// Get the plan currently in effect
#[utoipa::path(
    get,
    path = "/api/subscriptions/current",
    responses(
        (status = 200, description = "Current plan", body = CurrentSubscriptionResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Subscriptions"
)]
pub async fn current_subscription(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CurrentSubscriptionResponse>> {
    let response = match SubscriptionRepository::current(&state.db, user.id, today()).await? {
        Some(subscription) => CurrentSubscriptionResponse {
            is_free_tier: subscription.tier() == SubscriptionTier::Free,
            subscription_type: subscription.subscription_type.clone().into(),
            subscription: Some(subscription.into()),
        },
        None => CurrentSubscriptionResponse {
            is_free_tier: true,
            subscription_type: SubscriptionRepository::find_type(&state.db, SubscriptionTier::Free)
                .await?
                .into(),
            subscription: None,
        },
    };

    Ok(Json(response))
}

/// Count the cards the user owns
#[utoipa::path(
    get,
    path = "/api/subscriptions/card-count",
    responses(
        (status = 200, description = "Number of cards", body = CardCountResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Subscriptions"
)]
pub async fn card_count(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CardCountResponse>> {
    let count = CardRepository::count_by_user(&state.db, user.id, None).await?;
    Ok(Json(CardCountResponse { count }))
}

/// Upgrade to Premium
#[utoipa::path(
    post,
    path = "/api/subscriptions/premium",
    responses(
        (status = 200, description = "Premium subscription started", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Subscriptions"
)]
pub async fn activate_premium(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<SubscriptionResponse>> {
    let subscription = SubscriptionRepository::activate_premium(&state.db, user.id, today()).await?;
    tracing::info!(user_id = %user.id, subscription_id = subscription.id, "Premium activated");

    Ok(Json(subscription.into()))
}

/// Cancel the active subscription, falling back to the free tier
#[utoipa::path(
    post,
    path = "/api/subscriptions/cancel",
    responses(
        (status = 200, description = "Subscriptions cancelled", body = CancelSubscriptionResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Subscriptions"
)]
pub async fn cancel_subscription(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CancelSubscriptionResponse>> {
    let cancelled = SubscriptionRepository::cancel(&state.db, user.id, today()).await?;
    tracing::info!(user_id = %user.id, cancelled, "Subscription cancelled");

    Ok(Json(CancelSubscriptionResponse { cancelled }))
}
