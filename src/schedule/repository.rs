use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::PgPool;
use uuid::Uuid;

use crate::business_rules::{BusinessHours, Holiday};
use crate::error::ApiError;
use crate::schedule::BusinessHoursRow;

/// Weekly hours and holidays of professionals
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarRepository: Send + Sync {
    async fn find_active_hours_for_day(
        &self,
        professional_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<BusinessHours>, ApiError>;

    async fn list_business_hours(&self, professional_id: Uuid) -> Result<Vec<BusinessHours>, ApiError>;

    /// Insert or replace the hours of one weekday
    async fn upsert_business_hours(&self, hours: &BusinessHours) -> Result<BusinessHours, ApiError>;

    async fn find_holiday_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Holiday>, ApiError>;

    async fn list_holidays(&self, professional_id: Uuid) -> Result<Vec<Holiday>, ApiError>;

    /// Returns `None` when the date is already a holiday
    async fn create_holiday(&self, holiday: &Holiday) -> Result<Option<Holiday>, ApiError>;

    /// Returns whether a holiday was removed
    async fn delete_holiday(&self, professional_id: Uuid, date: NaiveDate) -> Result<bool, ApiError>;
}

/// PostgreSQL calendar repository
#[derive(Clone)]
pub struct PgCalendarRepository {
    pool: PgPool,
}

impl PgCalendarRepository {
    /// Create a new PgCalendarRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CalendarRepository for PgCalendarRepository {
    async fn find_active_hours_for_day(
        &self,
        professional_id: Uuid,
        day_of_week: u8,
    ) -> Result<Option<BusinessHours>, ApiError> {
        let row = sqlx::query_as::<_, BusinessHoursRow>(
            r#"
            SELECT professional_id, day_of_week, opens_at, closes_at,
                   break_start, break_end, is_active
            FROM business_hours
            WHERE professional_id = $1 AND day_of_week = $2 AND is_active
            "#,
        )
        .bind(professional_id)
        .bind(i16::from(day_of_week))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(BusinessHours::try_from).transpose()?)
    }

    async fn list_business_hours(&self, professional_id: Uuid) -> Result<Vec<BusinessHours>, ApiError> {
        let rows = sqlx::query_as::<_, BusinessHoursRow>(
            r#"
            SELECT professional_id, day_of_week, opens_at, closes_at,
                   break_start, break_end, is_active
            FROM business_hours
            WHERE professional_id = $1
            ORDER BY day_of_week
            "#,
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(BusinessHours::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    async fn upsert_business_hours(&self, hours: &BusinessHours) -> Result<BusinessHours, ApiError> {
        let (break_start, break_end) = hours.break_window.bounds();

        let row = sqlx::query_as::<_, BusinessHoursRow>(
            r#"
            INSERT INTO business_hours
                (professional_id, day_of_week, opens_at, closes_at, break_start, break_end, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (professional_id, day_of_week) DO UPDATE
            SET opens_at = EXCLUDED.opens_at,
                closes_at = EXCLUDED.closes_at,
                break_start = EXCLUDED.break_start,
                break_end = EXCLUDED.break_end,
                is_active = EXCLUDED.is_active,
                updated_at = NOW()
            RETURNING professional_id, day_of_week, opens_at, closes_at,
                      break_start, break_end, is_active
            "#,
        )
        .bind(hours.professional_id)
        .bind(i16::from(hours.day_of_week))
        .bind(hours.opens_at)
        .bind(hours.closes_at)
        .bind(break_start)
        .bind(break_end)
        .bind(hours.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(BusinessHours::try_from(row)?)
    }

    async fn find_holiday_for_date(
        &self,
        professional_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Holiday>, ApiError> {
        let holiday = sqlx::query_as::<_, Holiday>(
            "SELECT professional_id, date, reason FROM holidays WHERE professional_id = $1 AND date = $2",
        )
        .bind(professional_id)
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(holiday)
    }

    async fn list_holidays(&self, professional_id: Uuid) -> Result<Vec<Holiday>, ApiError> {
        let holidays = sqlx::query_as::<_, Holiday>(
            "SELECT professional_id, date, reason FROM holidays WHERE professional_id = $1 ORDER BY date",
        )
        .bind(professional_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(holidays)
    }

    async fn create_holiday(&self, holiday: &Holiday) -> Result<Option<Holiday>, ApiError> {
        let created = sqlx::query_as::<_, Holiday>(
            r#"
            INSERT INTO holidays (professional_id, date, reason)
            VALUES ($1, $2, $3)
            ON CONFLICT (professional_id, date) DO NOTHING
            RETURNING professional_id, date, reason
            "#,
        )
        .bind(holiday.professional_id)
        .bind(holiday.date)
        .bind(&holiday.reason)
        .fetch_optional(&self.pool)
        .await?;

        Ok(created)
    }

    async fn delete_holiday(&self, professional_id: Uuid, date: NaiveDate) -> Result<bool, ApiError> {
        let result = sqlx::query("DELETE FROM holidays WHERE professional_id = $1 AND date = $2")
            .bind(professional_id)
            .bind(date)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
