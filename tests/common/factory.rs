use rust_decimal::Decimal;
use time::Date;
use uuid::Uuid;

use card_tracker::models::{
    Card, CardInput, CardStatus, Collection, CreateCollection, CreateUser, User,
    MAIN_COLLECTION_ID,
};
use card_tracker::repositories::{CardRepository, CollectionRepository, SubscriptionRepository, UserRepository};
use card_tracker::services::AuthService;
use card_tracker::state::AppState;

/// Authentication info for tests
pub struct TestAuth {
    pub user_id: Uuid,
    pub email: String,
    pub token: String,
}

impl TestAuth {
    /// Get the Authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// A valid bought card in the Main Collection
pub fn card_input(name: &str, price: i64, bought_date: Date, category: &str) -> CardInput {
    CardInput {
        name: name.to_string(),
        description: None,
        price: Decimal::from(price),
        sold_price: None,
        status: CardStatus::Bought,
        bought_date,
        sold_date: None,
        category: Some(category.to_string()),
        collection_id: MAIN_COLLECTION_ID,
        image_url: None,
        graded: false,
        grading_company: None,
        grading_value: None,
    }
}

/// Factory for creating test data
pub struct Factory<'a> {
    state: &'a AppState,
}

impl<'a> Factory<'a> {
    pub fn new(state: &'a AppState) -> Self {
        Self { state }
    }

    /// Create a test user and return auth info
    pub async fn create_user(&self) -> TestAuth {
        let unique_id = Uuid::new_v4();
        let email = format!("test-{}@example.com", unique_id);
        let password = "TestPassword123!";

        let input = CreateUser {
            email: email.clone(),
            name: format!("Test User {}", unique_id),
        };

        let password_hash = AuthService::hash_password(password).unwrap();
        let user = UserRepository::create(&self.state.db, &input, &password_hash)
            .await
            .unwrap();

        let token = AuthService::generate_token(user.id, &email, &self.state.config).unwrap();

        TestAuth {
            user_id: user.id,
            email,
            token,
        }
    }

    /// Create a test user with specific email
    pub async fn create_user_with_email(&self, email: &str, password: &str) -> User {
        let input = CreateUser {
            email: email.to_string(),
            name: "Test User".to_string(),
        };

        let password_hash = AuthService::hash_password(password).unwrap();
        UserRepository::create(&self.state.db, &input, &password_hash)
            .await
            .unwrap()
    }

    /// Create a Premium test user
    pub async fn create_premium_user(&self) -> TestAuth {
        let auth = self.create_user().await;
        self.make_premium(auth.user_id).await;
        auth
    }

    /// Upgrade a user to Premium
    pub async fn make_premium(&self, user_id: Uuid) {
        let today = time::OffsetDateTime::now_utc().date();
        SubscriptionRepository::activate_premium(&self.state.db, user_id, today)
            .await
            .unwrap();
    }

    /// Create a card from raw input
    pub async fn create_card_from(&self, user_id: Uuid, input: CardInput) -> Card {
        let input = input.validate().unwrap();
        CardRepository::create(&self.state.db, user_id, &input)
            .await
            .unwrap()
    }

    /// Create a bought card in the Main Collection
    pub async fn create_card(&self, user_id: Uuid, price: i64, bought_date: Date, category: &str) -> Card {
        let name = format!("Test Card {}", Uuid::new_v4());
        self.create_card_from(user_id, card_input(&name, price, bought_date, category))
            .await
    }

    /// Create a sold card in the Main Collection
    pub async fn create_sold_card(
        &self,
        user_id: Uuid,
        price: i64,
        sold_price: i64,
        bought_date: Date,
        sold_date: Date,
        category: &str,
    ) -> Card {
        let name = format!("Test Card {}", Uuid::new_v4());
        let input = card_input(&name, price, bought_date, category)
            .into_sold(Decimal::from(sold_price), sold_date);
        self.create_card_from(user_id, input).await
    }

    /// Create a collection owned by the user (bypasses the Premium check)
    pub async fn create_collection(&self, user_id: Uuid) -> Collection {
        let input = CreateCollection {
            name: format!("Test Collection {}", Uuid::new_v4()),
            description: Some("Test collection description".to_string()),
        };

        CollectionRepository::create(&self.state.db, user_id, &input)
            .await
            .unwrap()
    }
}
