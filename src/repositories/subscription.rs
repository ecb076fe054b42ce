use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use time::Date;
use uuid::Uuid;

use crate::entity::subscription_type::{
    self, Column as TypeColumn, Entity as SubscriptionTypeEntity,
};
use crate::entity::user_subscription::{
    self, ActiveModel, Column, Entity as UserSubscriptionEntity,
};
use crate::error::{AppError, AppResult};
use crate::models::{
    PremiumFeature, SubscriptionStatus, SubscriptionTier, SubscriptionType, UserSubscription,
};

/// Subscription plans and the subscriptions users hold
pub struct SubscriptionRepository;

impl SubscriptionRepository {
    /// All plans, cheapest first
    pub async fn list_types(db: &DatabaseConnection) -> AppResult<Vec<SubscriptionType>> {
        let models = SubscriptionTypeEntity::find()
            .order_by_asc(TypeColumn::Price)
            .order_by_asc(TypeColumn::Id)
            .all(db)
            .await?;

        Ok(models.into_iter().map(|m| m.into()).collect())
    }

    /// The plan row for a tier
    pub async fn find_type(
        db: &DatabaseConnection,
        tier: SubscriptionTier,
    ) -> AppResult<SubscriptionType> {
        let model = SubscriptionTypeEntity::find()
            .filter(TypeColumn::Name.eq(tier.as_str()))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} plan", tier.as_str())))?;

        Ok(model.into())
    }

    /// The most recently created subscription that is active and not past
    /// its end date
    pub async fn current(
        db: &DatabaseConnection,
        user_id: Uuid,
        today: Date,
    ) -> AppResult<Option<UserSubscription>> {
        let found = UserSubscriptionEntity::find()
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Status.eq(SubscriptionStatus::Active))
            .filter(
                Condition::any()
                    .add(Column::EndDate.is_null())
                    .add(Column::EndDate.gte(today)),
            )
            .order_by_desc(Column::CreatedAt)
            .order_by_desc(Column::Id)
            .find_also_related(SubscriptionTypeEntity)
            .one(db)
            .await?;

        Ok(found.and_then(|(subscription, plan)| plan.map(|plan| (subscription, plan).into())))
    }

    /// Tier the user currently enjoys; Free without a current subscription
    pub async fn tier(
        db: &DatabaseConnection,
        user_id: Uuid,
        today: Date,
    ) -> AppResult<SubscriptionTier> {
        let tier = Self::current(db, user_id, today)
            .await?
            .map_or(SubscriptionTier::Free, |subscription| subscription.tier());
        Ok(tier)
    }

    /// Fail with `PremiumRequired` unless the user is on the Premium tier
    pub async fn require_premium(
        db: &DatabaseConnection,
        user_id: Uuid,
        feature: PremiumFeature,
        today: Date,
    ) -> AppResult<()> {
        match Self::tier(db, user_id, today).await? {
            SubscriptionTier::Premium => Ok(()),
            SubscriptionTier::Free => {
                tracing::debug!(%user_id, ?feature, "Premium feature refused");
                Err(AppError::PremiumRequired(feature.describe().to_string()))
            }
        }
    }

    /// Start a Premium subscription, cancelling whatever was active before
    pub async fn activate_premium(
        db: &DatabaseConnection,
        user_id: Uuid,
        today: Date,
    ) -> AppResult<UserSubscription> {
        let plan = Self::find_type(db, SubscriptionTier::Premium).await?;

        Self::cancel(db, user_id, today).await?;

        let model = ActiveModel {
            user_id: Set(user_id),
            subscription_type_id: Set(plan.id),
            status: Set(SubscriptionStatus::Active),
            start_date: Set(today),
            end_date: Set(None),
            created_at: Set(time::OffsetDateTime::now_utc()),
            ..Default::default()
        };

        let result = model.insert(db).await?;
        Ok(UserSubscription {
            id: result.id,
            user_id: result.user_id,
            subscription_type: plan,
            status: result.status,
            start_date: result.start_date,
            end_date: result.end_date,
            created_at: result.created_at,
        })
    }

    /// Cancel every active subscription of the user, ending them today.
    /// Returns how many were cancelled.
    pub async fn cancel(db: &DatabaseConnection, user_id: Uuid, today: Date) -> AppResult<u64> {
        let result = UserSubscriptionEntity::update_many()
            .set(ActiveModel {
                status: Set(SubscriptionStatus::Cancelled),
                end_date: Set(Some(today)),
                ..Default::default()
            })
            .filter(Column::UserId.eq(user_id))
            .filter(Column::Status.eq(SubscriptionStatus::Active))
            .exec(db)
            .await?;

        Ok(result.rows_affected)
    }
}

impl From<subscription_type::Model> for SubscriptionType {
    fn from(m: subscription_type::Model) -> Self {
        Self {
            id: m.id,
            tier: SubscriptionTier::from_name(&m.name),
            name: m.name,
            price: m.price,
            max_cards: m.max_cards,
        }
    }
}

impl From<(user_subscription::Model, subscription_type::Model)> for UserSubscription {
    fn from((m, plan): (user_subscription::Model, subscription_type::Model)) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            subscription_type: plan.into(),
            status: m.status,
            start_date: m.start_date,
            end_date: m.end_date,
            created_at: m.created_at,
        }
    }
}
