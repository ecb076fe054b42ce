use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::entity::collection::{self, ActiveModel, Column, Entity as CollectionEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Collection, CreateCollection, UpdateCollection, MAIN_COLLECTION_ID};
use crate::repositories::{CardRepository, Repository};

/// Collection repository for database operations
pub struct CollectionRepository;

#[async_trait]
impl Repository<Collection, i32> for CollectionRepository {
    async fn find_by_id(db: &DatabaseConnection, id: i32) -> AppResult<Collection> {
        let model = CollectionEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection".to_string()))?;

        Ok(model.into())
    }
}

impl CollectionRepository {
    /// Create a new collection owned by the user
    pub async fn create(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: &CreateCollection,
    ) -> AppResult<Collection> {
        let model = ActiveModel {
            user_id: Set(Some(user_id)),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            created_at: Set(time::OffsetDateTime::now_utc()),
            ..Default::default()
        };

        let result = model.insert(db).await?;
        Ok(result.into())
    }

    /// Find a collection the user may see: the Main Collection or one they own
    pub async fn find_visible(
        db: &DatabaseConnection,
        id: i32,
        user_id: Uuid,
    ) -> AppResult<Collection> {
        let collection = Self::find_by_id(db, id).await?;
        if !collection.is_main() && collection.user_id != Some(user_id) {
            return Err(AppError::NotFound("Collection".to_string()));
        }
        Ok(collection)
    }

    /// Main Collection first, then the user's own in creation order
    pub async fn list_for_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<Collection>> {
        let models = CollectionEntity::find()
            .filter(
                Condition::any()
                    .add(Column::Id.eq(MAIN_COLLECTION_ID))
                    .add(Column::UserId.eq(user_id)),
            )
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Update collection (with ownership check); the Main Collection is read-only
    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        user_id: Uuid,
        input: &UpdateCollection,
    ) -> AppResult<Collection> {
        let model = Self::find_owned(db, id, user_id).await?;

        let mut active: ActiveModel = model.into();

        if let Some(name) = &input.name {
            active.name = Set(name.clone());
        }
        if let Some(description) = &input.description {
            active.description = Set(Some(description.clone()));
        }

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Delete an empty collection (with ownership check)
    pub async fn delete_by_user(db: &DatabaseConnection, id: i32, user_id: Uuid) -> AppResult<()> {
        let model = Self::find_owned(db, id, user_id).await?;

        if CardRepository::count_in_collection(db, id).await? > 0 {
            return Err(AppError::Validation(
                "Collection still contains cards".to_string(),
            ));
        }

        let active: ActiveModel = model.into();
        active.delete(db).await?;

        Ok(())
    }

    /// Fetch a collection for modification
    async fn find_owned(
        db: &DatabaseConnection,
        id: i32,
        user_id: Uuid,
    ) -> AppResult<collection::Model> {
        if id == MAIN_COLLECTION_ID {
            return Err(AppError::Forbidden(
                "The Main Collection cannot be modified".to_string(),
            ));
        }

        CollectionEntity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Collection".to_string()))
    }
}

impl From<collection::Model> for Collection {
    fn from(m: collection::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            name: m.name,
            description: m.description,
            created_at: m.created_at,
        }
    }
}
