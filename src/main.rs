use anyhow::Context;
use tracing_subscriber::EnvFilter;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use card_tracker::config::Config;
use card_tracker::handlers::{
    AuthResponse, CancelSubscriptionResponse, CardCountResponse, CardListResponse, CardRequest,
    CardResponse, CategoryResponse, CollectionListResponse, CollectionResponse,
    CreateCollectionRequest, CurrentSubscriptionResponse, ImportResponse, LoginRequest,
    RegisterRequest, SellCardRequest, SubscriptionResponse, SubscriptionTypeResponse,
    UpdateCollectionRequest, UploadResponse, ValueHistoryResponse,
};
use card_tracker::models::{CardStatus, GradingCompany, SubscriptionTier, UserResponse};
use card_tracker::services::statistics::{
    CategoryInvestment, CategoryProfit, CategoryRoi, MonthlySales,
};
use card_tracker::services::{CardStats, RowError, Timeframe, ValuePoint};
use card_tracker::state::AppState;
use card_tracker::{build_router, handlers};

/// Security scheme for Bearer token
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::register,
        handlers::auth::login,
        handlers::auth::me,
        handlers::card::create_card,
        handlers::card::list_cards,
        handlers::card::get_card,
        handlers::card::update_card,
        handlers::card::sell_card,
        handlers::card::delete_card,
        handlers::collection::create_collection,
        handlers::collection::list_collections,
        handlers::collection::get_collection,
        handlers::collection::update_collection,
        handlers::collection::delete_collection,
        handlers::category::list_categories,
        handlers::subscription::list_subscription_types,
        handlers::subscription::current_subscription,
        handlers::subscription::card_count,
        handlers::subscription::activate_premium,
        handlers::subscription::cancel_subscription,
        handlers::statistics::get_statistics,
        handlers::statistics::get_value_history,
        handlers::upload::upload_image,
        handlers::import::import_spreadsheet,
    ),
    components(schemas(
        RegisterRequest,
        LoginRequest,
        AuthResponse,
        UserResponse,
        CardRequest,
        SellCardRequest,
        CardResponse,
        CardListResponse,
        CardStatus,
        GradingCompany,
        CreateCollectionRequest,
        UpdateCollectionRequest,
        CollectionResponse,
        CollectionListResponse,
        CategoryResponse,
        SubscriptionTier,
        SubscriptionTypeResponse,
        SubscriptionResponse,
        CurrentSubscriptionResponse,
        CardCountResponse,
        CancelSubscriptionResponse,
        Timeframe,
        CardStats,
        CategoryProfit,
        CategoryInvestment,
        CategoryRoi,
        MonthlySales,
        ValuePoint,
        ValueHistoryResponse,
        UploadResponse,
        ImportResponse,
        RowError,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Cards", description = "Card management endpoints"),
        (name = "Collections", description = "Collection management endpoints"),
        (name = "Categories", description = "Card categories"),
        (name = "Subscriptions", description = "Free and Premium plans"),
        (name = "Statistics", description = "Investment statistics and collection value history"),
        (name = "Uploads", description = "Card picture uploads"),
        (name = "Import", description = "Spreadsheet import")
    )
)]
struct ApiDoc;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|format| format.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration (also reads .env, so do it before reading LOG_FORMAT)
    let config = Config::from_env().context("Failed to load configuration")?;
    init_tracing();

    let addr = config.server_addr();

    // Initialize application state (migrations, pool, upload directory)
    tracing::info!("Connecting to database...");
    let state = AppState::new(config)
        .await
        .context("Failed to initialize application state")?;
    tracing::info!("Database connection established");

    // Build the main application router
    let app = build_router(state)
        // Add Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    tracing::info!("Server started on http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}
