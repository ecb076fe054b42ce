use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub use crate::entity::card::{CardStatus, GradingCompany};

/// Image shown for cards without an uploaded picture
pub const DEFAULT_IMAGE_URL: &str = "/default-card.jpg";

/// Bucket used by the statistics for cards without a category
pub const UNCATEGORIZED: &str = "Uncategorized";

const MAX_NAME_LEN: usize = 200;
const MAX_CATEGORY_LEN: usize = 100;
const MAX_DESCRIPTION_LEN: usize = 1000;

/// Amounts are stored as NUMERIC(12, 2)
const AMOUNT_SCALE: u32 = 2;
// 10_000_000_000 (scale 0); `Decimal::new` is not const, so build it from raw parts
const MAX_AMOUNT: Decimal = Decimal::from_parts(0x540B_E400, 0x2, 0, false, 0);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub id: i32,
    pub user_id: Uuid,
    pub collection_id: i32,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sold_price: Option<Decimal>,
    pub status: CardStatus,
    pub bought_date: Date,
    pub sold_date: Option<Date>,
    pub category: Option<String>,
    pub image_url: String,
    pub graded: bool,
    pub grading_company: Option<GradingCompany>,
    pub grading_value: Option<Decimal>,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Card {
    /// Category key used for grouping; blank or missing categories share one bucket
    pub fn category_key(&self) -> &str {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED)
    }

    /// Profit realized by a sale; a missing sold price counts as zero
    pub fn realized_profit(&self) -> Decimal {
        self.sold_price.unwrap_or_default() - self.price
    }

    /// Editable fields of this card, as they would be resubmitted
    pub fn to_input(&self) -> CardInput {
        CardInput {
            name: self.name.clone(),
            description: self.description.clone(),
            price: self.price,
            sold_price: self.sold_price,
            status: self.status,
            bought_date: self.bought_date,
            sold_date: self.sold_date,
            category: self.category.clone(),
            collection_id: self.collection_id,
            image_url: Some(self.image_url.clone()),
            graded: self.graded,
            grading_company: self.grading_company,
            grading_value: self.grading_value,
        }
    }
}

/// Card fields supplied on create, update, sale and import
#[derive(Debug, Clone)]
pub struct CardInput {
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub sold_price: Option<Decimal>,
    pub status: CardStatus,
    pub bought_date: Date,
    pub sold_date: Option<Date>,
    pub category: Option<String>,
    pub collection_id: i32,
    pub image_url: Option<String>,
    pub graded: bool,
    pub grading_company: Option<GradingCompany>,
    pub grading_value: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CardValidationError {
    #[error("Name is required")]
    MissingName,

    #[error("{0} must be at most {1} characters")]
    TooLong(&'static str, usize),

    #[error("Category is required")]
    MissingCategory,

    #[error("Price must be greater than zero")]
    NonPositivePrice,

    #[error("Sold price cannot be negative")]
    NegativeSoldPrice,

    #[error("{0} must be below 10,000,000,000 with at most 2 decimal places")]
    InvalidAmount(&'static str),

    #[error("Sold price is required for sold cards")]
    MissingSoldPrice,

    #[error("Only sold cards can have a sold price or sold date")]
    SaleDataOnBoughtCard,

    #[error("Sold date cannot be earlier than bought date")]
    SoldBeforeBought,

    #[error("Grading company and value are required for graded cards")]
    MissingGrade,

    #[error("{0} grade must be between 1 and 10 in steps of {1}")]
    InvalidGrade(&'static str, &'static str),
}

impl CardInput {
    /// Enforce the write-boundary invariants and normalize optional fields.
    ///
    /// Grading fields are cleared for ungraded cards and the image falls back
    /// to the placeholder.
    pub fn validate(mut self) -> Result<Self, CardValidationError> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(CardValidationError::MissingName);
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(CardValidationError::TooLong("Name", MAX_NAME_LEN));
        }

        let category = self
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or(CardValidationError::MissingCategory)?;
        if category.chars().count() > MAX_CATEGORY_LEN {
            return Err(CardValidationError::TooLong("Category", MAX_CATEGORY_LEN));
        }
        self.category = Some(category.to_string());

        self.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        if let Some(description) = &self.description {
            if description.chars().count() > MAX_DESCRIPTION_LEN {
                return Err(CardValidationError::TooLong(
                    "Description",
                    MAX_DESCRIPTION_LEN,
                ));
            }
        }

        if self.price <= Decimal::ZERO {
            return Err(CardValidationError::NonPositivePrice);
        }
        validate_amount("Price", self.price)?;
        if let Some(sold_price) = self.sold_price {
            validate_amount("Sold price", sold_price)?;
        }

        match self.status {
            CardStatus::Bought => {
                if self.sold_price.is_some() || self.sold_date.is_some() {
                    return Err(CardValidationError::SaleDataOnBoughtCard);
                }
            }
            CardStatus::Sold => match self.sold_price {
                None => return Err(CardValidationError::MissingSoldPrice),
                Some(sold_price) if sold_price < Decimal::ZERO => {
                    return Err(CardValidationError::NegativeSoldPrice)
                }
                Some(_) => {}
            },
        }

        if let Some(sold_date) = self.sold_date {
            if sold_date < self.bought_date {
                return Err(CardValidationError::SoldBeforeBought);
            }
        }

        if self.graded {
            let (company, value) = match (self.grading_company, self.grading_value) {
                (Some(company), Some(value)) => (company, value),
                _ => return Err(CardValidationError::MissingGrade),
            };
            validate_grade(company, value)?;
        } else {
            self.grading_company = None;
            self.grading_value = None;
        }

        self.image_url = Some(
            self.image_url
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| DEFAULT_IMAGE_URL.to_string()),
        );

        Ok(self)
    }

    /// The bought -> sold transition
    pub fn into_sold(mut self, sold_price: Decimal, sold_date: Date) -> Self {
        self.status = CardStatus::Sold;
        self.sold_price = Some(sold_price);
        self.sold_date = Some(sold_date);
        self
    }
}

fn validate_amount(field: &'static str, value: Decimal) -> Result<(), CardValidationError> {
    if value.abs() >= MAX_AMOUNT || value.normalize().scale() > AMOUNT_SCALE {
        return Err(CardValidationError::InvalidAmount(field));
    }
    Ok(())
}

/// PSA grades whole numbers, BGS half points; both from 1 to 10
fn validate_grade(company: GradingCompany, value: Decimal) -> Result<(), CardValidationError> {
    let in_range = value >= Decimal::ONE && value <= Decimal::TEN;
    match company {
        GradingCompany::Psa if in_range && value.fract().is_zero() => Ok(()),
        GradingCompany::Psa => Err(CardValidationError::InvalidGrade("PSA", "1")),
        GradingCompany::Bgs if in_range && (value * Decimal::TWO).fract().is_zero() => Ok(()),
        GradingCompany::Bgs => Err(CardValidationError::InvalidGrade("BGS", "0.5")),
    }
}
