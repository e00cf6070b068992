// Booking Rules Module
//
// Rules engine for the salon booking backend. It covers four capabilities:
// - Business calendar: weekly hours plus holiday overrides for one day
// - Slot generation: fixed-size slots marked busy or free against bookings
// - Pricing: service totals, coupons and bonus point redemption
// - Loyalty: point accrual, loyalty bonuses and derived balances
//
// Every rule is a pure function over data the caller fetched. Rule constants
// come from an immutable `RulesConfig`.

pub mod calendar;
pub mod config;
pub mod error;
pub mod handlers;
pub mod loyalty;
pub mod metrics;
pub mod money;
pub mod pricing;
pub mod slots;
pub mod types;

// Re-export commonly used types for convenience
pub use calendar::{
    day_of_week, BreakWindow, BusinessCalendar, BusinessHours, ClosedReason, DaySchedule, Holiday,
};
pub use config::RulesConfig;
pub use error::{BRResult, BusinessRulesError};
pub use loyalty::{CompletedBooking, LedgerEntry, LoyaltyEngine, NewLedgerEntry, PointsBalance};
pub use metrics::{MetricsSummary, PerformanceMetrics, RuleOperation};
pub use money::Cents;
pub use pricing::{
    Coupon, CouponRequest, PreviewInput, PriceBreakdown, PricedService, PricingEngine,
    ServiceOffer,
};
pub use slots::{
    BookedInterval, BookingSummary, ScheduleView, SlotGenerator, SlotOptions, TimeSlot,
};
pub use types::{BonusType, BookingStatus, DiscountType, StatusAction};

use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Booking Rules Engine
///
/// Orchestrates the calendar, slot, pricing and loyalty rules over one shared
/// configuration and records evaluation metrics.
pub struct BusinessRulesEngine {
    config: Arc<RulesConfig>,
    calendar: BusinessCalendar,
    slot_generator: SlotGenerator,
    pricing_engine: PricingEngine,
    loyalty_engine: LoyaltyEngine,
    metrics: PerformanceMetrics,
}

impl BusinessRulesEngine {
    /// Create a new BusinessRulesEngine
    pub fn new(config: RulesConfig) -> Self {
        let config = Arc::new(config);

        Self {
            calendar: BusinessCalendar::new(config.clone()),
            slot_generator: SlotGenerator::new(config.clone()),
            pricing_engine: PricingEngine::new(config.clone()),
            loyalty_engine: LoyaltyEngine::new(config.clone()),
            metrics: PerformanceMetrics::new(),
            config,
        }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn loyalty(&self) -> &LoyaltyEngine {
        &self.loyalty_engine
    }

    /// Get performance metrics
    pub fn metrics(&self) -> &PerformanceMetrics {
        &self.metrics
    }

    /// Resolve one day and generate its slots
    pub fn build_schedule(
        &self,
        date: NaiveDate,
        holiday: Option<&Holiday>,
        hours: Option<&BusinessHours>,
        bookings: &[BookedInterval],
        options: &SlotOptions,
    ) -> (DaySchedule, Vec<TimeSlot>) {
        let _timer = self.metrics.start(RuleOperation::Schedule);

        let day = self.calendar.resolve_day(date, holiday, hours);
        let slots = self.slot_generator.generate(date, &day, bookings, options);

        tracing::debug!(
            "Resolved {} for {}: {} slots, {} available",
            if day.is_closed() { "closed day" } else { "open day" },
            date,
            slots.len(),
            slots.iter().filter(|s| s.available).count()
        );

        (day, slots)
    }

    /// Resolve requested services without pricing the booking
    pub fn resolve_services(
        &self,
        professional_id: Uuid,
        service_ids: &[Uuid],
        offers: &[ServiceOffer],
    ) -> BRResult<Vec<PricedService>> {
        self.pricing_engine
            .resolve_services(professional_id, service_ids, offers)
            .map_err(|e| {
                self.metrics.record_rejection(RuleOperation::Schedule);
                e
            })
    }

    /// Price a booking preview
    pub fn preview_price(&self, input: &PreviewInput<'_>) -> BRResult<PriceBreakdown> {
        let _timer = self.metrics.start(RuleOperation::Pricing);

        match self.pricing_engine.preview(input) {
            Ok(breakdown) => {
                tracing::debug!(
                    "Priced preview for professional {}: total {}, final {}, {} points used",
                    input.professional_id,
                    breakdown.total_value,
                    breakdown.final_value,
                    breakdown.points_used
                );
                Ok(breakdown)
            }
            Err(e) => {
                self.metrics.record_rejection(RuleOperation::Pricing);
                tracing::debug!("Preview rejected: {}", e);
                Err(e)
            }
        }
    }

    /// Derived balance of a ledger
    pub fn balance(&self, entries: &[LedgerEntry], now: DateTime<Utc>) -> PointsBalance {
        self.loyalty_engine.balance(entries, now)
    }

    /// Ledger entries for a completed booking
    pub fn completion_entries(
        &self,
        booking: &CompletedBooking,
        qualifying_completions: u32,
    ) -> Vec<NewLedgerEntry> {
        let _timer = self.metrics.start(RuleOperation::Loyalty);

        let entries = self
            .loyalty_engine
            .completion_entries(booking, qualifying_completions);

        tracing::info!(
            "Booking {} completed: {} ledger entries for client {}",
            booking.booking_id,
            entries.len(),
            booking.client_id
        );

        entries
    }
}

impl Default for BusinessRulesEngine {
    fn default() -> Self {
        Self::new(RulesConfig::default())
    }
}
