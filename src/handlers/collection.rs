use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::error::AppResult;
use crate::handlers::{today, validate_optional, validate_required, ApiJson};
use crate::middlewares::AuthUser;
use crate::models::{Collection, CreateCollection, PremiumFeature, UpdateCollection};
use crate::repositories::{CollectionRepository, SubscriptionRepository};
use crate::state::AppState;

// ============ Request/Response DTOs ============

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCollectionRequest {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCollectionRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionResponse {
    pub id: i32,
    pub name: String,
    pub description: Option<String>,
    /// The shared Main Collection, read-only
    pub is_main: bool,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String)]
    pub created_at: OffsetDateTime,
}

impl From<Collection> for CollectionResponse {
    fn from(c: Collection) -> Self {
        Self {
            is_main: c.is_main(),
            id: c.id,
            name: c.name,
            description: c.description,
            created_at: c.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CollectionListResponse {
    pub data: Vec<CollectionResponse>,
    pub total: u64,
}

// ============ Handlers ============

/// Create a new collection (Premium)
#[utoipa::path(
    post,
    path = "/api/collections",
    request_body = CreateCollectionRequest,
    responses(
        (status = 200, description = "Collection created successfully", body = CollectionResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Premium subscription required")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Collections"
)]
pub async fn create_collection(
    user: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateCollectionRequest>,
) -> AppResult<Json<CollectionResponse>> {
    validate_required(&payload.name, "Name", 100)?;
    validate_optional(&payload.description, "Description", 1000)?;

    SubscriptionRepository::require_premium(
        &state.db,
        user.id,
        PremiumFeature::CreateCollection,
        today(),
    )
    .await?;

    let create_collection = CreateCollection {
        name: payload.name.trim().to_string(),
        description: payload.description,
    };

    let collection = CollectionRepository::create(&state.db, user.id, &create_collection).await?;
    tracing::info!(user_id = %user.id, collection_id = collection.id, "Collection created");

    Ok(Json(collection.into()))
}

/// List the Main Collection followed by the user's own collections
#[utoipa::path(
    get,
    path = "/api/collections",
    responses(
        (status = 200, description = "List of collections", body = CollectionListResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Collections"
)]
pub async fn list_collections(
    user: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<CollectionListResponse>> {
    let collections = CollectionRepository::list_for_user(&state.db, user.id).await?;

    Ok(Json(CollectionListResponse {
        total: collections.len() as u64,
        data: collections.into_iter().map(|c| c.into()).collect(),
    }))
}

/// Get a collection by ID
#[utoipa::path(
    get,
    path = "/api/collections/{id}",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection details", body = CollectionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Collection not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Collections"
)]
pub async fn get_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<CollectionResponse>> {
    let collection = CollectionRepository::find_visible(&state.db, id, user.id).await?;
    Ok(Json(collection.into()))
}

/// Update a collection
#[utoipa::path(
    put,
    path = "/api/collections/{id}",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    request_body = UpdateCollectionRequest,
    responses(
        (status = 200, description = "Collection updated successfully", body = CollectionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The Main Collection cannot be modified"),
        (status = 404, description = "Collection not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Collections"
)]
pub async fn update_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    ApiJson(payload): ApiJson<UpdateCollectionRequest>,
) -> AppResult<Json<CollectionResponse>> {
    if let Some(name) = &payload.name {
        validate_required(name, "Name", 100)?;
    }
    validate_optional(&payload.description, "Description", 1000)?;

    let update_collection = UpdateCollection {
        name: payload.name.map(|name| name.trim().to_string()),
        description: payload.description,
    };

    let collection =
        CollectionRepository::update(&state.db, id, user.id, &update_collection).await?;
    Ok(Json(collection.into()))
}

/// Delete an empty collection
#[utoipa::path(
    delete,
    path = "/api/collections/{id}",
    params(
        ("id" = i32, Path, description = "Collection ID")
    ),
    responses(
        (status = 200, description = "Collection deleted successfully"),
        (status = 400, description = "Collection still contains cards"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "The Main Collection cannot be deleted"),
        (status = 404, description = "Collection not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Collections"
)]
pub async fn delete_collection(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<()> {
    CollectionRepository::delete_by_user(&state.db, id, user.id).await?;
    Ok(())
}
