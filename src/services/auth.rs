//! Password hashing and JWT session tokens

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Session token payload. `sub` is the user id every protected request is
/// scoped to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    fn new(user_id: Uuid, email: &str, issued_at: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            sub: user_id,
            email: email.to_string(),
            exp: (issued_at + ttl).unix_timestamp(),
            iat: issued_at.unix_timestamp(),
        }
    }
}

pub struct AuthService;

impl AuthService {
    pub fn hash_password(password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// `Ok(())` when `password` matches the stored hash, otherwise
    /// [`AppError::InvalidCredentials`]
    pub fn verify_password(password: &str, hash: &str) -> AppResult<()> {
        let stored = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("Stored password hash is malformed: {}", e)))?;

        Argon2::default()
            .verify_password(password.as_bytes(), &stored)
            .map_err(|_| AppError::InvalidCredentials)
    }

    /// Issue a session token valid for `jwt_expiration_hours`
    pub fn generate_token(user_id: Uuid, email: &str, config: &Config) -> AppResult<String> {
        Self::issue_token(user_id, email, OffsetDateTime::now_utc(), config)
    }

    fn issue_token(
        user_id: Uuid,
        email: &str,
        issued_at: OffsetDateTime,
        config: &Config,
    ) -> AppResult<String> {
        let claims = Claims::new(
            user_id,
            email,
            issued_at,
            Duration::hours(config.jwt_expiration_hours),
        );

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Decode a session token. Expired tokens are [`AppError::TokenExpired`],
    /// anything else that fails validation is [`AppError::InvalidToken`].
    pub fn verify_token(token: &str, config: &Config) -> AppResult<Claims> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn config(secret: &str) -> Config {
        Config {
            database_url: String::new(),
            jwt_secret: secret.to_string(),
            jwt_expiration_hours: 24,
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origin: "http://localhost:5173".to_string(),
            upload_dir: PathBuf::from("uploads"),
        }
    }

    #[test]
    fn test_password_round_trip() {
        let hash = AuthService::hash_password("correct horse").unwrap();

        assert_ne!(hash, "correct horse");
        assert!(AuthService::verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            AuthService::verify_password("battery staple", &hash),
            Err(AppError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = AuthService::hash_password("same").unwrap();
        let second = AuthService::hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_malformed_hash_is_internal() {
        assert!(matches!(
            AuthService::verify_password("anything", "not-a-phc-string"),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn test_token_carries_user() {
        let config = config("unit-test-secret-that-is-long-enough");
        let user_id = Uuid::new_v4();

        let token = AuthService::generate_token(user_id, "a@example.com", &config).unwrap();
        let claims = AuthService::verify_token(&token, &config).unwrap();

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.email, "a@example.com");
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[test]
    fn test_expired_token() {
        let config = config("unit-test-secret-that-is-long-enough");
        let issued_at = OffsetDateTime::now_utc() - Duration::days(2);

        let token =
            AuthService::issue_token(Uuid::new_v4(), "a@example.com", issued_at, &config).unwrap();

        assert!(matches!(
            AuthService::verify_token(&token, &config),
            Err(AppError::TokenExpired)
        ));
    }

    #[test]
    fn test_token_signed_with_other_secret() {
        let token = AuthService::generate_token(
            Uuid::new_v4(),
            "a@example.com",
            &config("first-secret-that-is-long-enough"),
        )
        .unwrap();

        assert!(matches!(
            AuthService::verify_token(&token, &config("second-secret-that-is-long-enough")),
            Err(AppError::InvalidToken)
        ));
    }
}
