// Business Calendar
//
// Resolves a professional's weekly hours and holiday overrides into the
// open/closed state of one calendar day, in the business timezone.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::business_rules::{
    config::RulesConfig,
    error::{BRResult, BusinessRulesError},
};

/// Lunch or other break inside a working day
///
/// A sum type so a break can never have only one bound set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BreakWindow {
    NoBreak,
    Break { start: NaiveTime, end: NaiveTime },
}

impl BreakWindow {
    /// Build from the nullable column pair stored in the database
    pub fn from_bounds(start: Option<NaiveTime>, end: Option<NaiveTime>) -> BRResult<Self> {
        match (start, end) {
            (None, None) => Ok(BreakWindow::NoBreak),
            (Some(start), Some(end)) => Ok(BreakWindow::Break { start, end }),
            _ => Err(BusinessRulesError::InvalidBusinessHours(
                "break start and break end must be set together".to_string(),
            )),
        }
    }

    /// Nullable column pair for persistence
    pub fn bounds(&self) -> (Option<NaiveTime>, Option<NaiveTime>) {
        match *self {
            BreakWindow::NoBreak => (None, None),
            BreakWindow::Break { start, end } => (Some(start), Some(end)),
        }
    }
}

/// Weekly opening hours of a professional for one weekday
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusinessHours {
    pub professional_id: Uuid,
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    pub opens_at: NaiveTime,
    pub closes_at: NaiveTime,
    pub break_window: BreakWindow,
    pub active: bool,
}

impl BusinessHours {
    /// Build business hours, enforcing
    /// `opens_at < closes_at` and `opens_at <= break_start < break_end <= closes_at`
    pub fn new(
        professional_id: Uuid,
        day_of_week: u8,
        opens_at: NaiveTime,
        closes_at: NaiveTime,
        break_window: BreakWindow,
        active: bool,
    ) -> BRResult<Self> {
        if day_of_week > 6 {
            return Err(BusinessRulesError::InvalidBusinessHours(format!(
                "day of week {} is outside 0..=6",
                day_of_week
            )));
        }
        if opens_at >= closes_at {
            return Err(BusinessRulesError::InvalidBusinessHours(format!(
                "opening time {} must be before closing time {}",
                opens_at.format("%H:%M"),
                closes_at.format("%H:%M")
            )));
        }
        if let BreakWindow::Break { start, end } = break_window {
            if !(opens_at <= start && start < end && end <= closes_at) {
                return Err(BusinessRulesError::InvalidBusinessHours(format!(
                    "break {}-{} must lie inside {}-{} and start before it ends",
                    start.format("%H:%M"),
                    end.format("%H:%M"),
                    opens_at.format("%H:%M"),
                    closes_at.format("%H:%M")
                )));
            }
        }

        Ok(Self {
            professional_id,
            day_of_week,
            opens_at,
            closes_at,
            break_window,
            active,
        })
    }
}

/// Date-specific closure of a professional
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holiday {
    pub professional_id: Uuid,
    pub date: NaiveDate,
    pub reason: String,
}

/// Why a day is closed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClosedReason {
    Holiday(String),
    NoBusinessHours,
}

impl ClosedReason {
    pub fn describe(&self) -> String {
        match self {
            ClosedReason::Holiday(reason) => reason.clone(),
            ClosedReason::NoBusinessHours => "No business hours defined".to_string(),
        }
    }
}

/// Resolved state of a single day
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaySchedule {
    Closed {
        reason: ClosedReason,
    },
    Open {
        opens_at: NaiveTime,
        closes_at: NaiveTime,
        break_window: BreakWindow,
    },
}

impl DaySchedule {
    pub fn is_closed(&self) -> bool {
        matches!(self, DaySchedule::Closed { .. })
    }

    pub fn is_holiday(&self) -> bool {
        matches!(
            self,
            DaySchedule::Closed {
                reason: ClosedReason::Holiday(_)
            }
        )
    }
}

/// Day-of-week index used by business hours (0 = Sunday)
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Business Calendar
///
/// Resolves days and converts between UTC instants and the business's local
/// wall clock. The timezone comes from configuration, never from the host.
pub struct BusinessCalendar {
    config: Arc<RulesConfig>,
}

impl BusinessCalendar {
    /// Create a new BusinessCalendar
    pub fn new(config: Arc<RulesConfig>) -> Self {
        Self { config }
    }

    fn offset(&self) -> FixedOffset {
        self.config.business_offset
    }

    /// Resolve a day from its holiday record and weekday hours
    ///
    /// A holiday always wins. Missing or inactive hours mean the day is
    /// closed, not that something went wrong.
    pub fn resolve_day(
        &self,
        date: NaiveDate,
        holiday: Option<&Holiday>,
        hours: Option<&BusinessHours>,
    ) -> DaySchedule {
        if let Some(holiday) = holiday.filter(|h| h.date == date) {
            return DaySchedule::Closed {
                reason: ClosedReason::Holiday(holiday.reason.clone()),
            };
        }

        match hours {
            Some(hours) if hours.active && hours.day_of_week == day_of_week(date) => {
                DaySchedule::Open {
                    opens_at: hours.opens_at,
                    closes_at: hours.closes_at,
                    break_window: hours.break_window,
                }
            }
            _ => DaySchedule::Closed {
                reason: ClosedReason::NoBusinessHours,
            },
        }
    }

    /// Wall-clock time of an instant in the business timezone
    pub fn to_local(&self, instant: DateTime<Utc>) -> NaiveDateTime {
        instant.with_timezone(&self.offset()).naive_local()
    }

    /// UTC instant of a business wall-clock time
    pub fn to_utc(&self, local: NaiveDateTime) -> DateTime<Utc> {
        let utc = local - Duration::seconds(i64::from(self.offset().local_minus_utc()));
        Utc.from_utc_datetime(&utc)
    }

    /// Current calendar date of the business
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        self.to_local(now).date()
    }

    /// UTC bounds `[start, end)` of a business calendar day
    pub fn day_bounds_utc(&self, date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let start = self.to_utc(date.and_time(NaiveTime::default()));
        (start, start + Duration::days(1))
    }
}
