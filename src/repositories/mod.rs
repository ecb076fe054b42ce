pub mod card;
pub mod category;
pub mod collection;
pub mod subscription;
pub mod user;

pub use card::CardRepository;
pub use category::CategoryRepository;
pub use collection::CollectionRepository;
pub use subscription::SubscriptionRepository;
pub use user::UserRepository;

use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use crate::error::AppResult;

/// Base repository trait for lookups by primary key
#[async_trait]
pub trait Repository<T, Id = Uuid>
where
    T: Send + Sync,
    Id: Send + 'static,
{
    /// Find entity by ID, regardless of owner
    async fn find_by_id(db: &DatabaseConnection, id: Id) -> AppResult<T>;
}
