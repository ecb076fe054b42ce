use async_trait::async_trait;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set,
};
use uuid::Uuid;

use crate::entity::card::{self, ActiveModel, Column, Entity as CardEntity};
use crate::error::{AppError, AppResult};
use crate::models::{Card, CardInput, DEFAULT_IMAGE_URL, MAIN_COLLECTION_ID};
use crate::repositories::{CollectionRepository, Repository};

/// Card repository for database operations
pub struct CardRepository;

#[async_trait]
impl Repository<Card, i32> for CardRepository {
    async fn find_by_id(db: &DatabaseConnection, id: i32) -> AppResult<Card> {
        let model = CardEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Card".to_string()))?;

        Ok(model.into())
    }
}

impl CardRepository {
    /// Create a card from validated input
    pub async fn create(
        db: &DatabaseConnection,
        user_id: Uuid,
        input: &CardInput,
    ) -> AppResult<Card> {
        CollectionRepository::find_visible(db, input.collection_id, user_id).await?;

        let result = Self::new_active_model(user_id, input).insert(db).await?;
        Ok(result.into())
    }

    /// Insert many validated cards into the Main Collection in one statement
    pub async fn create_many(
        db: &DatabaseConnection,
        user_id: Uuid,
        inputs: &[CardInput],
    ) -> AppResult<u64> {
        if inputs.is_empty() {
            return Ok(0);
        }

        let models = inputs
            .iter()
            .map(|input| Self::new_active_model(user_id, input));
        CardEntity::insert_many(models).exec(db).await?;

        Ok(inputs.len() as u64)
    }

    /// Find card by ID; another user's card is reported as not found
    pub async fn find_by_id_and_user(
        db: &DatabaseConnection,
        id: i32,
        user_id: Uuid,
    ) -> AppResult<Card> {
        let card = Self::find_by_id(db, id).await?;
        if card.user_id != user_id {
            return Err(AppError::NotFound("Card".to_string()));
        }
        Ok(card)
    }

    /// List a user's cards, newest first.
    ///
    /// The Main Collection is a view of every card, so `None` and
    /// `Some(MAIN_COLLECTION_ID)` list the same thing.
    pub async fn list_by_user(
        db: &DatabaseConnection,
        user_id: Uuid,
        collection_id: Option<i32>,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<Card>> {
        let models = Self::scoped(user_id, collection_id)
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .offset(offset)
            .limit(limit)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Count a user's cards, scoped like [`CardRepository::list_by_user`]
    pub async fn count_by_user(
        db: &DatabaseConnection,
        user_id: Uuid,
        collection_id: Option<i32>,
    ) -> AppResult<u64> {
        let count = Self::scoped(user_id, collection_id).count(db).await?;
        Ok(count)
    }

    /// Every card the user owns, in purchase order. Input of the statistics
    pub async fn list_all_by_user(db: &DatabaseConnection, user_id: Uuid) -> AppResult<Vec<Card>> {
        let models = CardEntity::find()
            .filter(Column::UserId.eq(user_id))
            .order_by_asc(Column::BoughtDate)
            .order_by_asc(Column::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// Replace every editable field of a card (with ownership check)
    pub async fn update(
        db: &DatabaseConnection,
        id: i32,
        user_id: Uuid,
        input: &CardInput,
    ) -> AppResult<Card> {
        let model = CardEntity::find_by_id(id)
            .filter(Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("Card".to_string()))?;

        if model.collection_id != input.collection_id {
            CollectionRepository::find_visible(db, input.collection_id, user_id).await?;
        }

        let mut active: ActiveModel = model.into();
        active.name = Set(input.name.clone());
        active.description = Set(input.description.clone());
        active.price = Set(input.price);
        active.sold_price = Set(input.sold_price);
        active.status = Set(input.status);
        active.bought_date = Set(input.bought_date);
        active.sold_date = Set(input.sold_date);
        active.category = Set(input.category.clone());
        active.collection_id = Set(input.collection_id);
        active.image_url = Set(image_url(input));
        active.graded = Set(input.graded);
        active.grading_company = Set(input.grading_company);
        active.grading_value = Set(input.grading_value);
        active.updated_at = Set(time::OffsetDateTime::now_utc());

        let result = active.update(db).await?;
        Ok(result.into())
    }

    /// Delete card (with ownership check)
    pub async fn delete_by_user(db: &DatabaseConnection, id: i32, user_id: Uuid) -> AppResult<()> {
        let result = CardEntity::delete_many()
            .filter(Column::Id.eq(id))
            .filter(Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound("Card".to_string()));
        }

        Ok(())
    }

    /// Number of cards filed under a collection, across all users
    pub async fn count_in_collection(db: &DatabaseConnection, collection_id: i32) -> AppResult<u64> {
        let count = CardEntity::find()
            .filter(Column::CollectionId.eq(collection_id))
            .count(db)
            .await?;
        Ok(count)
    }

    fn scoped(user_id: Uuid, collection_id: Option<i32>) -> Select<CardEntity> {
        let query = CardEntity::find().filter(Column::UserId.eq(user_id));
        match collection_id {
            Some(id) if id != MAIN_COLLECTION_ID => query.filter(Column::CollectionId.eq(id)),
            _ => query,
        }
    }

    fn new_active_model(user_id: Uuid, input: &CardInput) -> ActiveModel {
        let now = time::OffsetDateTime::now_utc();
        ActiveModel {
            user_id: Set(user_id),
            collection_id: Set(input.collection_id),
            name: Set(input.name.clone()),
            description: Set(input.description.clone()),
            price: Set(input.price),
            sold_price: Set(input.sold_price),
            status: Set(input.status),
            bought_date: Set(input.bought_date),
            sold_date: Set(input.sold_date),
            category: Set(input.category.clone()),
            image_url: Set(image_url(input)),
            graded: Set(input.graded),
            grading_company: Set(input.grading_company),
            grading_value: Set(input.grading_value),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
    }
}

fn image_url(input: &CardInput) -> String {
    input
        .image_url
        .clone()
        .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string())
}

impl From<card::Model> for Card {
    fn from(m: card::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            collection_id: m.collection_id,
            name: m.name,
            description: m.description,
            price: m.price,
            sold_price: m.sold_price,
            status: m.status,
            bought_date: m.bought_date,
            sold_date: m.sold_date,
            category: m.category,
            image_url: m.image_url,
            graded: m.graded,
            grading_company: m.grading_company,
            grading_value: m.grading_value,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
