use axum::{
    extract::{FromRequest, FromRequestParts, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{de::DeserializeOwned, Deserialize};
use time::{Date, OffsetDateTime};
use utoipa::IntoParams;

use crate::error::{AppError, AppResult};

/// `Json` body extractor whose rejections use the [`AppError`] body
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

/// `Query` extractor whose rejections use the [`AppError`] body
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct PaginationParams {
    #[param(default = 20, minimum = 1, maximum = 100)]
    pub limit: Option<i64>,
    #[param(default = 0, minimum = 0)]
    pub offset: Option<i64>,
}

impl PaginationParams {
    /// Clamped `(limit, offset)`
    pub fn resolve(&self) -> (u64, u64) {
        let limit = self.limit.unwrap_or(20).clamp(1, 100) as u64;
        let offset = self.offset.unwrap_or(0).max(0) as u64;
        (limit, offset)
    }
}

/// Reject blank or overlong required text
pub fn validate_required(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} is required", field)));
    }
    validate_length(value, field, max_len)
}

/// Reject overlong optional text
pub fn validate_optional(value: &Option<String>, field: &str, max_len: usize) -> AppResult<()> {
    match value {
        Some(value) => validate_length(value, field, max_len),
        None => Ok(()),
    }
}

fn validate_length(value: &str, field: &str, max_len: usize) -> AppResult<()> {
    if value.chars().count() > max_len {
        return Err(AppError::Validation(format!(
            "{} must be at most {} characters",
            field, max_len
        )));
    }
    Ok(())
}

/// Current calendar date (UTC)
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}
