// Library crate for the card tracker API
// Exports modules for use by the server binary and tests

pub mod config;
pub mod entity;
pub mod error;
pub mod handlers;
pub mod middlewares;
pub mod models;
pub mod repositories;
pub mod services;
pub mod state;

use axum::{
    extract::DefaultBodyLimit,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::handlers::{
    activate_premium, cancel_subscription, card_count, create_card, create_collection,
    current_subscription, delete_card, delete_collection, get_card, get_collection,
    get_statistics, get_value_history, import_spreadsheet, list_cards, list_categories,
    list_collections, list_subscription_types, login, me, register, sell_card, update_card,
    update_collection, upload_image, MAX_IMAGE_BYTES, MAX_IMPORT_BYTES, UPLOADS_PATH,
};
use crate::middlewares::auth_middleware;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the application router with the given state
pub fn build_router(state: AppState) -> Router {
    // Protected routes (require authentication)
    let protected_routes = Router::new()
        // Auth
        .route("/api/auth/me", get(me))
        // Cards
        .route("/api/cards", get(list_cards).post(create_card))
        .route(
            "/api/cards/{id}",
            get(get_card).put(update_card).delete(delete_card),
        )
        .route("/api/cards/{id}/sell", post(sell_card))
        // Collections
        .route(
            "/api/collections",
            get(list_collections).post(create_collection),
        )
        .route(
            "/api/collections/{id}",
            get(get_collection)
                .put(update_collection)
                .delete(delete_collection),
        )
        // Subscriptions
        .route("/api/subscriptions/types", get(list_subscription_types))
        .route("/api/subscriptions/current", get(current_subscription))
        .route("/api/subscriptions/card-count", get(card_count))
        .route("/api/subscriptions/premium", post(activate_premium))
        .route("/api/subscriptions/cancel", post(cancel_subscription))
        // Statistics
        .route("/api/statistics", get(get_statistics))
        .route("/api/statistics/value-history", get(get_value_history))
        // Uploads and import
        .route(
            "/api/upload",
            post(upload_image).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES + MULTIPART_OVERHEAD)),
        )
        .route(
            "/api/import/excel",
            post(import_spreadsheet)
                .layer(DefaultBodyLimit::max(MAX_IMPORT_BYTES + MULTIPART_OVERHEAD)),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let middleware = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origin));

    Router::new()
        .route("/", get(|| async { "Card tracker API" }))
        // Public routes
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/categories", get(list_categories))
        .nest_service(UPLOADS_PATH, ServeDir::new(&state.config.upload_dir))
        // Protected routes
        .merge(protected_routes)
        .layer(middleware)
        .with_state(state)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    match HeaderValue::from_str(origin) {
        Ok(origin) => cors.allow_origin(origin),
        Err(_) => {
            tracing::warn!(origin, "Ignoring invalid CORS origin");
            cors
        }
    }
}
