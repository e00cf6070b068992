use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::bonus::repository::{insert_ledger_entry, select_entries_for_user};
use crate::bookings::{Booking, CompletionOutcome, OverlappingBooking};
use crate::business_rules::{
    BookingStatus, BusinessRulesEngine, Cents, CompletedBooking, Coupon, ServiceOffer,
};
use crate::error::ApiError;

const BOOKING_COLUMNS: &str = r#"
    b.id, b.professional_id, b.client_id,
    ARRAY(
        SELECT bs.service_id FROM booking_services bs
        WHERE bs.booking_id = b.id
        ORDER BY bs.position
    ) AS service_ids,
    b.start_at, b.duration_minutes, b.status, b.final_value, b.coupon_code,
    b.points_used, b.cancel_reason, b.created_at, b.updated_at, b.completed_at
"#;

/// Professionals and the services they offer
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool, ApiError>;

    /// Offers of `professional_id` among `service_ids`; unlinked ids are
    /// simply absent from the result
    async fn find_services_for_professional(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<ServiceOffer>, ApiError>;
}

/// Coupon lookup
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CouponRepository: Send + Sync {
    /// Case-insensitive lookup; activity and validity are judged by the rules
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, ApiError>;
}

/// Bookings
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookingRepository: Send + Sync {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, ApiError>;

    /// Bookings of a professional in one of `statuses` intersecting `[from, to)`
    async fn find_overlapping_bookings(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> Result<Vec<OverlappingBooking>, ApiError>;

    /// Move a booking from `from` to `to`
    ///
    /// Returns `None` when the booking is no longer in `from`.
    async fn update_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Option<Booking>, ApiError>;

    /// Complete a CONFIRMED booking and append its ledger entries in one
    /// transaction
    ///
    /// Returns `None` when the booking is not CONFIRMED any more.
    async fn complete_booking(
        &self,
        booking_id: Uuid,
        completed_at: DateTime<Utc>,
        rules: &BusinessRulesEngine,
    ) -> Result<Option<CompletionOutcome>, ApiError>;
}

/// PostgreSQL service catalog
#[derive(Clone)]
pub struct PgServiceCatalog {
    pool: PgPool,
}

impl PgServiceCatalog {
    /// Create a new PgServiceCatalog
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceCatalog for PgServiceCatalog {
    async fn professional_exists(&self, professional_id: Uuid) -> Result<bool, ApiError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM professionals WHERE id = $1)")
                .bind(professional_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    async fn find_services_for_professional(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
    ) -> Result<Vec<ServiceOffer>, ApiError> {
        let offers = sqlx::query_as::<_, ServiceOffer>(
            r#"
            SELECT s.id AS service_id, s.name,
                   s.price AS base_price, s.duration_minutes AS base_duration_minutes,
                   ps.price AS override_price, ps.duration_minutes AS override_duration_minutes
            FROM professional_services ps
            JOIN services s ON s.id = ps.service_id
            WHERE ps.professional_id = $1 AND ps.service_id = ANY($2)
            "#,
        )
        .bind(professional_id)
        .bind(service_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(offers)
    }
}

/// PostgreSQL coupon lookup
#[derive(Clone)]
pub struct PgCouponRepository {
    pool: PgPool,
}

impl PgCouponRepository {
    /// Create a new PgCouponRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CouponRepository for PgCouponRepository {
    async fn find_coupon(&self, code: &str) -> Result<Option<Coupon>, ApiError> {
        let coupon = sqlx::query_as::<_, Coupon>(
            r#"
            SELECT code, discount_type, discount_value, min_order_value,
                   valid_from, valid_until, is_active
            FROM coupons
            WHERE UPPER(code) = UPPER($1)
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }
}

/// PostgreSQL booking repository
#[derive(Clone)]
pub struct PgBookingRepository {
    pool: PgPool,
}

impl PgBookingRepository {
    /// Create a new PgBookingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn select_booking(conn: &mut PgConnection, booking_id: Uuid) -> Result<Option<Booking>, sqlx::Error> {
    sqlx::query_as::<_, Booking>(&format!(
        "SELECT {} FROM bookings b WHERE b.id = $1",
        BOOKING_COLUMNS
    ))
    .bind(booking_id)
    .fetch_optional(conn)
    .await
}

#[async_trait]
impl BookingRepository for PgBookingRepository {
    async fn find_by_id(&self, booking_id: Uuid) -> Result<Option<Booking>, ApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(select_booking(&mut *conn, booking_id).await?)
    }

    async fn find_overlapping_bookings(
        &self,
        professional_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        statuses: &[BookingStatus],
    ) -> Result<Vec<OverlappingBooking>, ApiError> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();

        let bookings = sqlx::query_as::<_, OverlappingBooking>(
            r#"
            SELECT b.id, b.start_at, b.duration_minutes, b.status,
                   u.name AS client_name,
                   ARRAY(
                       SELECT s.name FROM booking_services bs
                       JOIN services s ON s.id = bs.service_id
                       WHERE bs.booking_id = b.id
                       ORDER BY bs.position
                   ) AS service_names
            FROM bookings b
            JOIN users u ON u.id = b.client_id
            WHERE b.professional_id = $1
              AND b.status = ANY($2::text[])
              AND b.start_at < $4
              AND b.start_at + make_interval(mins => b.duration_minutes) > $3
            ORDER BY b.start_at
            "#,
        )
        .bind(professional_id)
        .bind(statuses)
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    async fn update_status(
        &self,
        booking_id: Uuid,
        from: BookingStatus,
        to: BookingStatus,
        reason: Option<String>,
    ) -> Result<Option<Booking>, ApiError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE bookings
            SET status = $3,
                cancel_reason = COALESCE($4, cancel_reason),
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(booking_id)
        .bind(from)
        .bind(to)
        .bind(reason)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let booking = select_booking(&mut *tx, booking_id).await?;
        tx.commit().await?;

        Ok(booking)
    }

    async fn complete_booking(
        &self,
        booking_id: Uuid,
        completed_at: DateTime<Utc>,
        rules: &BusinessRulesEngine,
    ) -> Result<Option<CompletionOutcome>, ApiError> {
        let mut tx = self.pool.begin().await?;

        // Completions of one client are serialized so the loyalty count is exact
        let client_id: Option<Uuid> =
            sqlx::query_scalar("SELECT client_id FROM bookings WHERE id = $1 FOR UPDATE")
                .bind(booking_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some(client_id) = client_id else {
            return Ok(None);
        };
        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        let completed: Option<(Decimal, i64)> = sqlx::query_as(
            r#"
            UPDATE bookings
            SET status = 'COMPLETED', completed_at = $2, updated_at = $2
            WHERE id = $1 AND status = 'CONFIRMED'
            RETURNING final_value, points_used
            "#,
        )
        .bind(booking_id)
        .bind(completed_at)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((final_value, points_used)) = completed else {
            return Ok(None);
        };

        let history = select_entries_for_user(&mut *tx, client_id).await?;
        let since = rules.loyalty().last_earned_loyalty_at(&history);

        let qualifying: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM bookings
            WHERE client_id = $1
              AND status = 'COMPLETED'
              AND ($2::timestamptz IS NULL OR completed_at > $2)
            "#,
        )
        .bind(client_id)
        .bind(since)
        .fetch_one(&mut *tx)
        .await?;

        let completion = CompletedBooking {
            booking_id,
            client_id,
            final_value: Cents::from_decimal(final_value)?,
            points_used,
            completed_at,
        };
        let new_entries =
            rules.completion_entries(&completion, u32::try_from(qualifying).unwrap_or(u32::MAX));

        let mut entries = Vec::with_capacity(new_entries.len());
        for entry in &new_entries {
            entries.push(insert_ledger_entry(&mut *tx, entry).await?);
        }

        let booking = select_booking(&mut *tx, booking_id)
            .await?
            .ok_or_else(|| ApiError::InternalError(format!("booking {} vanished during completion", booking_id)))?;

        tx.commit().await?;

        Ok(Some(CompletionOutcome { booking, entries }))
    }
}
