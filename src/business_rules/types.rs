// Domain type definitions for the booking rules engine
// Provides shared enums used across the calendar, pricing and loyalty rules

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Lifecycle status of a booking
///
/// PENDING → CONFIRMED | CANCELED, CONFIRMED → CANCELED | COMPLETED.
/// COMPLETED and CANCELED are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
}

impl BookingStatus {
    /// Statuses that hold a time slot
    pub const ACTIVE: [BookingStatus; 2] = [BookingStatus::Pending, BookingStatus::Confirmed];

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Canceled => "CANCELED",
            BookingStatus::Completed => "COMPLETED",
        }
    }

    /// Whether a booking in this status occupies its time slot
    pub fn blocks_slot(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, BookingStatus::Canceled | BookingStatus::Completed)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BookingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(BookingStatus::Pending),
            "CONFIRMED" => Ok(BookingStatus::Confirmed),
            "CANCELED" => Ok(BookingStatus::Canceled),
            "COMPLETED" => Ok(BookingStatus::Completed),
            _ => Err(format!("Invalid booking status: {}", s)),
        }
    }
}

/// Status requested by a professional when toggling a booking
///
/// Kept separate from `BookingStatus`: the toggle endpoint speaks its own
/// vocabulary and can only confirm or cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatusAction {
    Confirmado,
    Cancelado,
}

impl StatusAction {
    /// Booking status this action moves to
    pub fn target_status(&self) -> BookingStatus {
        match self {
            StatusAction::Confirmado => BookingStatus::Confirmed,
            StatusAction::Cancelado => BookingStatus::Canceled,
        }
    }
}

impl fmt::Display for StatusAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusAction::Confirmado => write!(f, "CONFIRMADO"),
            StatusAction::Cancelado => write!(f, "CANCELADO"),
        }
    }
}

/// Kind of bonus ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BonusType {
    /// Points earned from a completed booking's value; never expire
    BookingPoints,

    /// Loyalty bonus after a run of completed bookings; expires
    Loyalty,

    /// Points spent on a booking (negative delta)
    Redemption,
}

impl fmt::Display for BonusType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BonusType::BookingPoints => write!(f, "BOOKING_POINTS"),
            BonusType::Loyalty => write!(f, "LOYALTY"),
            BonusType::Redemption => write!(f, "REDEMPTION"),
        }
    }
}

/// Type of discount a coupon grants
///
/// Determines how the coupon's discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DiscountType {
    /// Discount is a percentage of the total (e.g., 10 = 10% off)
    Percentage,

    /// Discount is a fixed amount subtracted from the total (e.g., 5.00 off)
    FixedAmount,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::FixedAmount => write!(f, "fixed_amount"),
        }
    }
}

/// Serde helpers for "HH:MM" wall-clock times
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom)
    }

    /// Same format for optional fields
    pub mod option {
        use super::FORMAT;
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(time) => serializer.serialize_some(&time.format(FORMAT).to_string()),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|raw| NaiveTime::parse_from_str(&raw, FORMAT).map_err(de::Error::custom))
                .transpose()
        }
    }
}
