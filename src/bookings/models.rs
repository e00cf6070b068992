use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::business_rules::{BookingStatus, LedgerEntry, PriceBreakdown, StatusAction};
use crate::validation::{validate_coupon_code, validate_unique_ids};

/// Domain model representing a booking in the database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub professional_id: Uuid,
    pub client_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    /// Price snapshot taken when the booking was created
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 45.0)]
    pub final_value: Decimal,
    pub coupon_code: Option<String>,
    pub points_used: i64,
    pub cancel_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Active booking of a professional as needed to mark slots busy
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct OverlappingBooking {
    pub id: Uuid,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: BookingStatus,
    pub client_name: String,
    pub service_names: Vec<String>,
}

/// Request DTO for a price preview
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_points_client"))]
pub struct PreviewPriceRequest {
    pub professional_id: Uuid,
    #[validate(
        length(min = 1, message = "At least one service is required"),
        custom = "validate_unique_ids"
    )]
    pub service_ids: Vec<Uuid>,
    #[serde(default)]
    pub use_bonus_points: bool,
    #[validate(custom = "validate_coupon_code")]
    pub coupon_code: Option<String>,
    /// Client whose points are redeemed; required with `useBonusPoints`
    pub client_id: Option<Uuid>,
}

fn validate_points_client(request: &PreviewPriceRequest) -> Result<(), ValidationError> {
    if request.use_bonus_points && request.client_id.is_none() {
        return Err(ValidationError::new("client_id_required_for_points"));
    }
    Ok(())
}

/// Response DTO for a price preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PricePreviewResponse {
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 80.0)]
    pub total_value: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 8.0)]
    pub coupon_discount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 10.0)]
    pub points_discount: Decimal,
    #[schema(example = 20)]
    pub points_used: i64,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64, example = 62.0)]
    pub final_value: Decimal,
}

impl From<PriceBreakdown> for PricePreviewResponse {
    fn from(breakdown: PriceBreakdown) -> Self {
        Self {
            total_value: breakdown.total_value.to_decimal(),
            coupon_discount: breakdown.coupon_discount.to_decimal(),
            points_discount: breakdown.points_discount.to_decimal(),
            points_used: breakdown.points_used,
            final_value: breakdown.final_value.to_decimal(),
        }
    }
}

/// Request DTO for the professional's status toggle
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: StatusAction,
    #[validate(length(max = 500, message = "Reason must be at most 500 characters"))]
    pub reason: Option<String>,
}

/// Response DTO for a completed booking
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompletionResponse {
    pub booking: Booking,
    /// Ledger entries appended by the completion
    pub entries: Vec<LedgerEntry>,
}

/// Result of the completion transaction
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOutcome {
    pub booking: Booking,
    pub entries: Vec<LedgerEntry>,
}
