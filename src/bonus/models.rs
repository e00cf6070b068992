use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::business_rules::{BonusType, PointsBalance};

/// Response DTO for a client's point balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    #[schema(example = 60)]
    pub points: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 30.0)]
    pub monetary_value: Decimal,
}

impl From<PointsBalance> for BalanceResponse {
    fn from(balance: PointsBalance) -> Self {
        Self {
            points: balance.points,
            monetary_value: balance.monetary_value.to_decimal(),
        }
    }
}

/// Entry types an administrator may assign by hand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssignableBonus {
    BookingPoints,
    Loyalty,
}

impl From<AssignableBonus> for BonusType {
    fn from(bonus: AssignableBonus) -> Self {
        match bonus {
            AssignableBonus::BookingPoints => BonusType::BookingPoints,
            AssignableBonus::Loyalty => BonusType::Loyalty,
        }
    }
}

/// Request DTO for a manual bonus assignment
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignBonusRequest {
    #[serde(rename = "type")]
    pub entry_type: AssignableBonus,
    #[validate(range(min = 1, max = 100000, message = "Points must be between 1 and 100000"))]
    pub points: i64,
    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
}
