use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::business_rules::{
    types::hhmm, BRResult, BookingSummary, BreakWindow, BusinessHours, BusinessRulesError,
    Holiday, TimeSlot,
};
use crate::validation::validate_not_blank;

/// Business hours as stored, break columns nullable
#[derive(Debug, Clone, FromRow)]
pub struct BusinessHoursRow {
    pub professional_id: Uuid,
    pub day_of_week: i16,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub is_active: bool,
}

impl TryFrom<BusinessHoursRow> for BusinessHours {
    type Error = BusinessRulesError;

    fn try_from(row: BusinessHoursRow) -> BRResult<Self> {
        let day_of_week = u8::try_from(row.day_of_week).map_err(|_| {
            BusinessRulesError::InvalidBusinessHours(format!(
                "day of week {} is outside 0..=6",
                row.day_of_week
            ))
        })?;

        BusinessHours::new(
            row.professional_id,
            day_of_week,
            row.opens_at,
            row.closes_at,
            BreakWindow::from_bounds(row.break_start, row.break_end)?,
            row.is_active,
        )
    }
}

/// Response DTO for one weekday of business hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BusinessHoursResponse {
    #[schema(example = 1)]
    pub day_of_week: u8,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub opens_at: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "18:00")]
    pub closes_at: NaiveTime,
    #[serde(with = "hhmm::option", skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<String>, example = "12:00")]
    pub break_start: Option<NaiveTime>,
    #[serde(with = "hhmm::option", skip_serializing_if = "Option::is_none", default)]
    #[schema(value_type = Option<String>, example = "13:00")]
    pub break_end: Option<NaiveTime>,
    pub active: bool,
}

impl From<&BusinessHours> for BusinessHoursResponse {
    fn from(hours: &BusinessHours) -> Self {
        let (break_start, break_end) = hours.break_window.bounds();
        Self {
            day_of_week: hours.day_of_week,
            opens_at: hours.opens_at,
            closes_at: hours.closes_at,
            break_start,
            break_end,
            active: hours.active,
        }
    }
}

/// Request DTO for replacing one weekday of business hours
///
/// Time ordering is checked when the hours are built.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertBusinessHoursRequest {
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "09:00")]
    pub opens_at: NaiveTime,
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "18:00")]
    pub closes_at: NaiveTime,
    #[serde(with = "hhmm::option", default)]
    #[schema(value_type = Option<String>, example = "12:00")]
    pub break_start: Option<NaiveTime>,
    #[serde(with = "hhmm::option", default)]
    #[schema(value_type = Option<String>, example = "13:00")]
    pub break_end: Option<NaiveTime>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// Query parameters for the schedule endpoints
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ScheduleQuery {
    /// Business calendar date, `YYYY-MM-DD`
    pub date: Option<String>,
    /// Comma-separated service ids; slots must fit their combined duration
    pub service_ids: Option<String>,
}

/// One slot of a schedule response
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TimeSlotResponse {
    #[serde(with = "hhmm")]
    #[schema(value_type = String, example = "10:00")]
    pub time: NaiveTime,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingSummary>,
}

impl From<TimeSlot> for TimeSlotResponse {
    fn from(slot: TimeSlot) -> Self {
        Self {
            time: slot.time,
            available: slot.available,
            booking: slot.booking,
        }
    }
}

/// Response DTO for one day of a professional's schedule
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleResponse {
    pub date: NaiveDate,
    pub time_slots: Vec<TimeSlotResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_hours: Option<BusinessHoursResponse>,
    pub is_holiday: bool,
    pub is_closed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Response DTO for a holiday
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HolidayResponse {
    pub date: NaiveDate,
    #[schema(example = "Natal")]
    pub reason: String,
}

impl From<Holiday> for HolidayResponse {
    fn from(holiday: Holiday) -> Self {
        Self {
            date: holiday.date,
            reason: holiday.reason,
        }
    }
}

/// Request DTO for closing a professional's day
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateHolidayRequest {
    pub date: NaiveDate,
    #[validate(
        length(min = 1, max = 255, message = "Reason must be between 1 and 255 characters"),
        custom = "validate_not_blank"
    )]
    pub reason: String,
}
