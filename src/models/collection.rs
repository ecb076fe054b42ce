use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// The shared, always-present grouping of every card a user owns
pub const MAIN_COLLECTION_ID: i32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Collection {
    pub id: i32,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub created_at: OffsetDateTime,
}

impl Collection {
    pub fn is_main(&self) -> bool {
        self.id == MAIN_COLLECTION_ID
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCollection {
    pub name: Option<String>,
    pub description: Option<String>,
}
