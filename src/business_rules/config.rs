// Rules configuration
//
// Point rates, thresholds and calendar settings. Built once at startup and
// shared read-only; tests construct their own values.

use chrono::{FixedOffset, Offset, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::business_rules::error::{BRResult, BusinessRulesError};
use crate::business_rules::money::Cents;
use crate::config::{env_or, ConfigError};

/// Immutable configuration for every rule in the engine
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RulesConfig {
    /// Currency value of one bonus point
    #[serde(serialize_with = "serialize_cents")]
    #[schema(value_type = f64, example = 0.5)]
    pub value_per_point: Cents,

    /// Smallest balance that may be redeemed
    pub min_points_to_redeem: i64,

    /// Discounts never take a booking below this value
    #[serde(serialize_with = "serialize_cents")]
    #[schema(value_type = f64, example = 10.0)]
    pub min_booking_value_after_discount: Cents,

    /// Points earned per full 10 currency units of a completed booking
    pub points_per_10_reais: i64,

    /// Completed bookings needed for one loyalty bonus
    pub loyalty_bookings_required: u32,

    /// Size of the loyalty bonus
    pub loyalty_points: i64,

    /// Lifetime of a loyalty bonus
    pub bonus_expiration_months: u32,

    /// Length of one schedule slot
    pub slot_size_minutes: u32,

    /// Operating timezone of the business, as a fixed UTC offset
    #[serde(serialize_with = "serialize_offset")]
    #[schema(value_type = String, example = "-03:00")]
    pub business_offset: FixedOffset,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            value_per_point: Cents::new(50),
            min_points_to_redeem: 10,
            min_booking_value_after_discount: Cents::new(1000),
            points_per_10_reais: 1,
            loyalty_bookings_required: 5,
            loyalty_points: 50,
            bonus_expiration_months: 6,
            slot_size_minutes: 30,
            business_offset: FixedOffset::west_opt(3 * 3600).unwrap_or_else(|| Utc.fix()),
        }
    }
}

impl RulesConfig {
    /// Load rule settings from the environment, defaulting anything unset
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let value_per_point: Decimal = env_or("VALUE_PER_POINT", defaults.value_per_point.to_decimal())?;
        let min_value: Decimal = env_or(
            "MIN_BOOKING_VALUE_AFTER_DISCOUNT",
            defaults.min_booking_value_after_discount.to_decimal(),
        )?;
        let offset_minutes: i32 = env_or(
            "BUSINESS_UTC_OFFSET_MINUTES",
            defaults.business_offset.local_minus_utc() / 60,
        )?;

        let config = Self {
            value_per_point: Cents::from_decimal(value_per_point)
                .map_err(|e| ConfigError::Constraint(e.to_string()))?,
            min_points_to_redeem: env_or("MIN_POINTS_TO_REDEEM", defaults.min_points_to_redeem)?,
            min_booking_value_after_discount: Cents::from_decimal(min_value)
                .map_err(|e| ConfigError::Constraint(e.to_string()))?,
            points_per_10_reais: env_or("POINTS_PER_10_REAIS", defaults.points_per_10_reais)?,
            loyalty_bookings_required: env_or(
                "LOYALTY_BOOKINGS_REQUIRED",
                defaults.loyalty_bookings_required,
            )?,
            loyalty_points: env_or("LOYALTY_POINTS", defaults.loyalty_points)?,
            bonus_expiration_months: env_or(
                "BONUS_EXPIRATION_MONTHS",
                defaults.bonus_expiration_months,
            )?,
            slot_size_minutes: env_or("SLOT_SIZE_MINUTES", defaults.slot_size_minutes)?,
            business_offset: FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| {
                ConfigError::Invalid {
                    key: "BUSINESS_UTC_OFFSET_MINUTES",
                    value: offset_minutes.to_string(),
                }
            })?,
        };

        config
            .validate()
            .map_err(|e| ConfigError::Constraint(e.to_string()))?;
        Ok(config)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> BRResult<()> {
        if self.value_per_point <= Cents::ZERO {
            return Err(BusinessRulesError::InvalidConfiguration(
                "value per point must be positive".to_string(),
            ));
        }
        if self.min_booking_value_after_discount < Cents::ZERO {
            return Err(BusinessRulesError::InvalidConfiguration(
                "minimum booking value cannot be negative".to_string(),
            ));
        }
        if self.min_points_to_redeem < 0 || self.points_per_10_reais < 0 || self.loyalty_points < 0 {
            return Err(BusinessRulesError::InvalidConfiguration(
                "point settings cannot be negative".to_string(),
            ));
        }
        if self.loyalty_bookings_required == 0 {
            return Err(BusinessRulesError::InvalidConfiguration(
                "loyalty bookings required must be at least 1".to_string(),
            ));
        }
        if self.slot_size_minutes == 0 || self.slot_size_minutes > 24 * 60 {
            return Err(BusinessRulesError::InvalidConfiguration(format!(
                "slot size {} is outside 1..=1440 minutes",
                self.slot_size_minutes
            )));
        }
        if self.business_offset.local_minus_utc().abs() > 14 * 3600 {
            return Err(BusinessRulesError::InvalidConfiguration(format!(
                "business UTC offset {} is outside -14:00..=+14:00",
                self.business_offset
            )));
        }
        Ok(())
    }
}

fn serialize_cents<S: serde::Serializer>(value: &Cents, serializer: S) -> Result<S::Ok, S::Error> {
    rust_decimal::serde::float::serialize(&value.to_decimal(), serializer)
}

fn serialize_offset<S: serde::Serializer>(
    offset: &FixedOffset,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&offset.to_string())
}
