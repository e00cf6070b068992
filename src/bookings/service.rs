use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

use crate::bonus::BonusLedgerRepository;
use crate::bookings::{
    Booking, BookingRepository, CompletionResponse, CouponRepository, PreviewPriceRequest,
    PricePreviewResponse, ServiceCatalog, StatusMachine, UpdateStatusRequest,
};
use crate::business_rules::{BookingStatus, BusinessRulesEngine, CouponRequest, PreviewInput};
use crate::error::ApiError;

/// Service for booking business logic
#[derive(Clone)]
pub struct BookingService {
    bookings: Arc<dyn BookingRepository>,
    catalog: Arc<dyn ServiceCatalog>,
    coupons: Arc<dyn CouponRepository>,
    ledger: Arc<dyn BonusLedgerRepository>,
    engine: Arc<BusinessRulesEngine>,
}

impl BookingService {
    /// Create a new BookingService
    pub fn new(
        bookings: Arc<dyn BookingRepository>,
        catalog: Arc<dyn ServiceCatalog>,
        coupons: Arc<dyn CouponRepository>,
        ledger: Arc<dyn BonusLedgerRepository>,
        engine: Arc<BusinessRulesEngine>,
    ) -> Self {
        Self {
            bookings,
            catalog,
            coupons,
            ledger,
            engine,
        }
    }

    /// Price a prospective booking
    ///
    /// # Validation
    /// - The professional must exist
    /// - Every service must be linked to the professional
    /// - A coupon code must name an active coupon inside its window
    /// - Redeeming points requires at least the configured minimum balance
    pub async fn preview_price(
        &self,
        request: PreviewPriceRequest,
    ) -> Result<PricePreviewResponse, ApiError> {
        if !self.catalog.professional_exists(request.professional_id).await? {
            return Err(ApiError::not_found("Professional", request.professional_id));
        }

        let offers = self
            .catalog
            .find_services_for_professional(request.professional_id, &request.service_ids)
            .await?;

        let coupon = match request.coupon_code.as_deref() {
            Some(code) => self.coupons.find_coupon(code).await?,
            None => None,
        };

        let points_balance = match (request.use_bonus_points, request.client_id) {
            (true, Some(client_id)) => {
                let entries = self.ledger.entries_for_user(client_id).await?;
                Some(self.engine.balance(&entries, Utc::now()).points)
            }
            _ => None,
        };

        let input = PreviewInput {
            professional_id: request.professional_id,
            service_ids: &request.service_ids,
            offers: &offers,
            coupon: request.coupon_code.as_deref().map(|code| CouponRequest {
                code,
                coupon: coupon.as_ref(),
            }),
            points_balance,
            now: Utc::now(),
        };

        let breakdown = self.engine.preview_price(&input)?;
        Ok(breakdown.into())
    }

    /// Get a booking by ID
    pub async fn get_booking(&self, booking_id: Uuid) -> Result<Booking, ApiError> {
        self.bookings
            .find_by_id(booking_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", booking_id))
    }

    /// Confirm or cancel a booking
    ///
    /// The cancel reason is only recorded when canceling.
    pub async fn update_status(
        &self,
        booking_id: Uuid,
        request: UpdateStatusRequest,
    ) -> Result<Booking, ApiError> {
        let booking = self.get_booking(booking_id).await?;
        let target = request.status.target_status();

        StatusMachine::transition(booking.status, target)
            .map_err(|message| ApiError::Conflict { message })?;

        let reason = match target {
            BookingStatus::Canceled => request.reason,
            _ => None,
        };

        let updated = self
            .bookings
            .update_status(booking_id, booking.status, target, reason)
            .await?
            .ok_or_else(|| ApiError::Conflict {
                message: format!("Booking {} changed status concurrently", booking_id),
            })?;

        tracing::info!(
            "Booking {} moved from {} to {}",
            booking_id,
            booking.status,
            updated.status
        );
        Ok(updated)
    }

    /// Complete a CONFIRMED booking and credit the client's ledger
    pub async fn complete_booking(&self, booking_id: Uuid) -> Result<CompletionResponse, ApiError> {
        let booking = self.get_booking(booking_id).await?;

        StatusMachine::transition(booking.status, BookingStatus::Completed)
            .map_err(|message| ApiError::Conflict { message })?;

        let outcome = self
            .bookings
            .complete_booking(booking_id, Utc::now(), &self.engine)
            .await?
            .ok_or_else(|| ApiError::Conflict {
                message: format!("Booking {} is no longer CONFIRMED", booking_id),
            })?;

        Ok(CompletionResponse {
            booking: outcome.booking,
            entries: outcome.entries,
        })
    }
}
