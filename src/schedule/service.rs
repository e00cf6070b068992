use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::bookings::{BookingRepository, ServiceCatalog};
use crate::business_rules::{
    day_of_week, BookedInterval, BookingStatus, BreakWindow, BusinessHours, BusinessRulesEngine,
    DaySchedule, Holiday, ScheduleView, SlotOptions,
};
use crate::error::ApiError;
use crate::schedule::{
    BusinessHoursResponse, CalendarRepository, CreateHolidayRequest, HolidayResponse,
    ScheduleResponse, UpsertBusinessHoursRequest,
};

/// Service for schedules, business hours and holidays
#[derive(Clone)]
pub struct ScheduleService {
    calendar: Arc<dyn CalendarRepository>,
    bookings: Arc<dyn BookingRepository>,
    catalog: Arc<dyn ServiceCatalog>,
    engine: Arc<BusinessRulesEngine>,
}

impl ScheduleService {
    /// Create a new ScheduleService
    pub fn new(
        calendar: Arc<dyn CalendarRepository>,
        bookings: Arc<dyn BookingRepository>,
        catalog: Arc<dyn ServiceCatalog>,
        engine: Arc<BusinessRulesEngine>,
    ) -> Self {
        Self {
            calendar,
            bookings,
            catalog,
            engine,
        }
    }

    async fn ensure_professional(&self, professional_id: Uuid) -> Result<(), ApiError> {
        if self.catalog.professional_exists(professional_id).await? {
            Ok(())
        } else {
            Err(ApiError::not_found("Professional", professional_id))
        }
    }

    /// Slot availability of one business day
    ///
    /// # Behavior
    /// - Holidays and days without active hours come back closed with no slots
    /// - With `service_ids`, a slot is free only if the whole appointment fits
    /// - Slots of past days, and of today up to the current time, are unavailable
    /// - `ScheduleView::Owner` attaches a summary to busy slots
    pub async fn get_schedule(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
        service_ids: &[Uuid],
        view: ScheduleView,
    ) -> Result<ScheduleResponse, ApiError> {
        self.ensure_professional(professional_id).await?;

        let required_minutes = if service_ids.is_empty() {
            None
        } else {
            let offers = self
                .catalog
                .find_services_for_professional(professional_id, service_ids)
                .await?;
            let services = self
                .engine
                .resolve_services(professional_id, service_ids, &offers)?;
            let total: i32 = services.iter().map(|s| s.duration_minutes).sum();
            Some(u32::try_from(total).unwrap_or(0))
        };

        let holiday = self
            .calendar
            .find_holiday_for_date(professional_id, date)
            .await?;
        let hours = match holiday {
            Some(_) => None,
            None => {
                self.calendar
                    .find_active_hours_for_day(professional_id, day_of_week(date))
                    .await?
            }
        };

        let calendar = self.engine.calendar();
        let (from, to) = calendar.day_bounds_utc(date);
        let booked: Vec<BookedInterval> = self
            .bookings
            .find_overlapping_bookings(professional_id, from, to, &BookingStatus::ACTIVE)
            .await?
            .into_iter()
            .map(|b| BookedInterval {
                booking_id: b.id,
                start: calendar.to_local(b.start_at),
                duration_minutes: i64::from(b.duration_minutes),
                status: b.status,
                client_name: b.client_name,
                service_names: b.service_names,
            })
            .collect();

        let now = Utc::now();
        let options = SlotOptions {
            required_minutes,
            not_before: (date <= calendar.today(now)).then(|| calendar.to_local(now)),
            view,
        };

        let (day, slots) = self.engine.build_schedule(
            date,
            holiday.as_ref(),
            hours.as_ref(),
            &booked,
            &options,
        );

        let reason = match &day {
            DaySchedule::Closed { reason } => Some(reason.describe()),
            DaySchedule::Open { .. } => None,
        };

        Ok(ScheduleResponse {
            date,
            time_slots: slots.into_iter().map(Into::into).collect(),
            business_hours: hours
                .as_ref()
                .filter(|_| !day.is_closed())
                .map(BusinessHoursResponse::from),
            is_holiday: day.is_holiday(),
            is_closed: day.is_closed(),
            reason,
        })
    }

    /// All configured weekdays of a professional
    pub async fn list_business_hours(
        &self,
        professional_id: Uuid,
    ) -> Result<Vec<BusinessHoursResponse>, ApiError> {
        self.ensure_professional(professional_id).await?;

        let hours = self.calendar.list_business_hours(professional_id).await?;
        Ok(hours.iter().map(BusinessHoursResponse::from).collect())
    }

    /// Replace the hours of one weekday
    pub async fn set_business_hours(
        &self,
        professional_id: Uuid,
        day_of_week: u8,
        request: UpsertBusinessHoursRequest,
    ) -> Result<BusinessHoursResponse, ApiError> {
        self.ensure_professional(professional_id).await?;

        let hours = BusinessHours::new(
            professional_id,
            day_of_week,
            request.opens_at,
            request.closes_at,
            BreakWindow::from_bounds(request.break_start, request.break_end)?,
            request.active,
        )?;

        let stored = self.calendar.upsert_business_hours(&hours).await?;

        tracing::info!(
            "Business hours of professional {} for day {} set to {}-{}",
            professional_id,
            day_of_week,
            stored.opens_at.format("%H:%M"),
            stored.closes_at.format("%H:%M")
        );
        Ok(BusinessHoursResponse::from(&stored))
    }

    pub async fn list_holidays(&self, professional_id: Uuid) -> Result<Vec<HolidayResponse>, ApiError> {
        self.ensure_professional(professional_id).await?;

        let holidays = self.calendar.list_holidays(professional_id).await?;
        Ok(holidays.into_iter().map(Into::into).collect())
    }

    /// Close a whole day
    pub async fn create_holiday(
        &self,
        professional_id: Uuid,
        request: CreateHolidayRequest,
    ) -> Result<HolidayResponse, ApiError> {
        self.ensure_professional(professional_id).await?;

        let holiday = Holiday {
            professional_id,
            date: request.date,
            reason: request.reason.trim().to_string(),
        };

        let created = self
            .calendar
            .create_holiday(&holiday)
            .await?
            .ok_or_else(|| ApiError::Conflict {
                message: format!("{} is already a holiday", request.date),
            })?;

        tracing::info!("Professional {} closed on {}", professional_id, created.date);
        Ok(created.into())
    }

    pub async fn delete_holiday(&self, professional_id: Uuid, date: NaiveDate) -> Result<(), ApiError> {
        if self.calendar.delete_holiday(professional_id, date).await? {
            tracing::info!("Professional {} reopened on {}", professional_id, date);
            Ok(())
        } else {
            Err(ApiError::not_found("Holiday", date))
        }
    }
}
