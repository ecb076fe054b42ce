use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set, SqlErr};
use uuid::Uuid;

use crate::entity::user::{self, ActiveModel, Column, Entity as UserEntity};
use crate::error::{AppError, AppResult};
use crate::models::{CreateUser, User};
use crate::repositories::Repository;

/// User repository for database operations
pub struct UserRepository;

#[async_trait]
impl Repository<User> for UserRepository {
    async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> AppResult<User> {
        let model = UserEntity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(model.into())
    }
}

impl UserRepository {
    /// Create a new user. Emails are stored normalized and are unique.
    pub async fn create(
        db: &DatabaseConnection,
        input: &CreateUser,
        password_hash: &str,
    ) -> AppResult<User> {
        let now = time::OffsetDateTime::now_utc();
        let model = ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(normalize_email(&input.email)),
            password_hash: Set(password_hash.to_string()),
            name: Set(input.name.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = model.insert(db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Email already exists".to_string())
            }
            _ => AppError::from(e),
        })?;

        Ok(result.into())
    }

    /// Find user by email, ignoring case and surrounding whitespace
    pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> AppResult<User> {
        let model = UserEntity::find()
            .filter(Column::Email.eq(normalize_email(email)))
            .one(db)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;

        Ok(model.into())
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl From<user::Model> for User {
    fn from(m: user::Model) -> Self {
        Self {
            id: m.id,
            email: m.email,
            password_hash: m.password_hash,
            name: m.name,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}
