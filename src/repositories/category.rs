use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

use crate::entity::category::{self, Column, Entity as CategoryEntity};
use crate::error::AppResult;
use crate::models::Category;

/// Read access to the seeded category list
pub struct CategoryRepository;

impl CategoryRepository {
    /// All categories, by name
    pub async fn list(db: &DatabaseConnection) -> AppResult<Vec<Category>> {
        let models = CategoryEntity::find()
            .order_by_asc(Column::Name)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }
}

impl From<category::Model> for Category {
    fn from(m: category::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            created_at: m.created_at,
        }
    }
}
