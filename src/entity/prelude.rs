pub use super::card::Entity as Card;
pub use super::category::Entity as Category;
pub use super::collection::Entity as Collection;
pub use super::subscription_type::Entity as SubscriptionType;
pub use super::user::Entity as User;
pub use super::user_subscription::Entity as UserSubscription;
