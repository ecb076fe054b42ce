pub mod card;
pub mod category;
pub mod collection;
pub mod subscription;
pub mod user;

pub use card::*;
pub use category::*;
pub use collection::*;
pub use subscription::*;
pub use user::*;
