pub mod auth;
pub mod card;
pub mod category;
pub mod collection;
pub mod common;
pub mod import;
pub mod statistics;
pub mod subscription;
pub mod upload;

pub use auth::{login, me, register, AuthResponse, LoginRequest, RegisterRequest};
pub use card::{
    create_card, delete_card, get_card, list_cards, sell_card, update_card, CardListResponse,
    CardRequest, CardResponse, SellCardRequest,
};
pub use category::{list_categories, CategoryResponse};
pub use collection::{
    create_collection, delete_collection, get_collection, list_collections, update_collection,
    CollectionListResponse, CollectionResponse, CreateCollectionRequest, UpdateCollectionRequest,
};
pub use common::{
    today, validate_optional, validate_required, ApiJson, ApiQuery, PaginationParams,
};
pub use import::{import_spreadsheet, ImportResponse, MAX_IMPORT_BYTES};
pub use statistics::{get_statistics, get_value_history, ValueHistoryResponse};
pub use subscription::{
    activate_premium, cancel_subscription, card_count, current_subscription,
    list_subscription_types, CancelSubscriptionResponse, CardCountResponse,
    CurrentSubscriptionResponse, SubscriptionResponse, SubscriptionTypeResponse,
};
pub use upload::{upload_image, UploadResponse, MAX_IMAGE_BYTES, UPLOADS_PATH};
