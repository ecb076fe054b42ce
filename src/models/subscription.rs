use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

pub use crate::entity::user_subscription::SubscriptionStatus;

/// Plan level a subscription type grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum SubscriptionTier {
    Free,
    Premium,
}

impl SubscriptionTier {
    /// Plan names are stored as free text; anything that is not Premium is Free
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("premium") {
            SubscriptionTier::Premium
        } else {
            SubscriptionTier::Free
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionTier::Free => "Free",
            SubscriptionTier::Premium => "Premium",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionType {
    pub id: i32,
    pub name: String,
    pub tier: SubscriptionTier,
    pub price: Decimal,
    pub max_cards: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSubscription {
    pub id: i32,
    pub user_id: Uuid,
    pub subscription_type: SubscriptionType,
    pub status: SubscriptionStatus,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub created_at: OffsetDateTime,
}

impl UserSubscription {
    pub fn tier(&self) -> SubscriptionTier {
        self.subscription_type.tier
    }
}

/// Features only available to Premium subscribers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PremiumFeature {
    CreateCollection,
    SpreadsheetImport,
}

impl PremiumFeature {
    pub fn describe(&self) -> &'static str {
        match self {
            PremiumFeature::CreateCollection => "Creating collections requires a Premium plan",
            PremiumFeature::SpreadsheetImport => "Spreadsheet import requires a Premium plan",
        }
    }
}
