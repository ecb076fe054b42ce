pub mod card;
pub mod category;
pub mod collection;
pub mod subscription_type;
pub mod user;
pub mod user_subscription;

pub mod prelude;

pub use prelude::*;
