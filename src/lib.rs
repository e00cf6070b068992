pub mod bonus;
pub mod bookings;
pub mod business_rules;
pub mod config;
pub mod db;
pub mod error;
pub mod schedule;
pub mod validation;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::{
    routing::{delete, get, patch, post, put},
    Router,
};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use bonus::{BonusService, PgBonusLedgerRepository};
use bookings::{BookingService, PgBookingRepository, PgCouponRepository, PgServiceCatalog};
use business_rules::BusinessRulesEngine;
use schedule::{PgCalendarRepository, ScheduleService};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        bookings::preview_price_handler,
        bookings::get_booking_handler,
        bookings::update_status_handler,
        bookings::complete_booking_handler,
        schedule::get_schedule_handler,
        schedule::get_agenda_handler,
        schedule::list_business_hours_handler,
        schedule::set_business_hours_handler,
        schedule::list_holidays_handler,
        schedule::create_holiday_handler,
        schedule::delete_holiday_handler,
        bonus::get_balance_handler,
        bonus::list_entries_handler,
        bonus::assign_bonus_handler,
        business_rules::handlers::get_metrics_handler,
        business_rules::handlers::get_config_handler,
    ),
    components(
        schemas(
            bookings::Booking,
            bookings::PreviewPriceRequest,
            bookings::PricePreviewResponse,
            bookings::UpdateStatusRequest,
            bookings::CompletionResponse,
            schedule::ScheduleResponse,
            schedule::TimeSlotResponse,
            schedule::BusinessHoursResponse,
            schedule::UpsertBusinessHoursRequest,
            schedule::HolidayResponse,
            schedule::CreateHolidayRequest,
            bonus::BalanceResponse,
            bonus::AssignBonusRequest,
            bonus::AssignableBonus,
            business_rules::BookingStatus,
            business_rules::StatusAction,
            business_rules::BonusType,
            business_rules::BookingSummary,
            business_rules::LedgerEntry,
            business_rules::MetricsSummary,
            business_rules::metrics::OperationStats,
            business_rules::RulesConfig,
            error::ErrorResponse,
        )
    ),
    tags(
        (name = "bookings", description = "Booking pricing and lifecycle"),
        (name = "schedule", description = "Availability, business hours and holidays"),
        (name = "bonus", description = "Bonus point ledger"),
        (name = "rules", description = "Rules engine introspection")
    ),
    info(
        title = "Salon Booking API",
        version = "1.0.0",
        description = "Availability, pricing and loyalty rules for salon bookings"
    )
)]
pub struct ApiDoc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub bookings: BookingService,
    pub schedule: ScheduleService,
    pub bonus: BonusService,
    pub engine: Arc<BusinessRulesEngine>,
}

impl AppState {
    /// Wire the PostgreSQL repositories to the services
    pub fn from_pool(pool: PgPool, engine: Arc<BusinessRulesEngine>) -> Self {
        let booking_repo = Arc::new(PgBookingRepository::new(pool.clone()));
        let catalog = Arc::new(PgServiceCatalog::new(pool.clone()));
        let coupons = Arc::new(PgCouponRepository::new(pool.clone()));
        let ledger = Arc::new(PgBonusLedgerRepository::new(pool.clone()));
        let calendar = Arc::new(PgCalendarRepository::new(pool));

        Self {
            bookings: BookingService::new(
                booking_repo.clone(),
                catalog.clone(),
                coupons,
                ledger.clone(),
                engine.clone(),
            ),
            schedule: ScheduleService::new(calendar, booking_repo, catalog, engine.clone()),
            bonus: BonusService::new(ledger, engine.clone()),
            engine,
        }
    }
}

/// Creates and configures the application router
/// Maps all API endpoints to their handlers and adds tracing and CORS middleware
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api = Router::new()
        .route("/bookings/preview", post(bookings::preview_price_handler))
        .route("/bookings/:booking_id", get(bookings::get_booking_handler))
        .route(
            "/bookings/:booking_id/status",
            patch(bookings::update_status_handler),
        )
        .route(
            "/bookings/:booking_id/complete",
            post(bookings::complete_booking_handler),
        )
        .route(
            "/professionals/:professional_id/schedule",
            get(schedule::get_schedule_handler),
        )
        .route(
            "/professionals/:professional_id/agenda",
            get(schedule::get_agenda_handler),
        )
        .route(
            "/professionals/:professional_id/business-hours",
            get(schedule::list_business_hours_handler),
        )
        .route(
            "/professionals/:professional_id/business-hours/:day_of_week",
            put(schedule::set_business_hours_handler),
        )
        .route(
            "/professionals/:professional_id/holidays",
            get(schedule::list_holidays_handler).post(schedule::create_holiday_handler),
        )
        .route(
            "/professionals/:professional_id/holidays/:date",
            delete(schedule::delete_holiday_handler),
        )
        .route("/bonus/:user_id/balance", get(bonus::get_balance_handler))
        .route(
            "/bonus/:user_id/entries",
            get(bonus::list_entries_handler).post(bonus::assign_bonus_handler),
        )
        .route(
            "/rules/metrics",
            get(business_rules::handlers::get_metrics_handler),
        )
        .route(
            "/rules/config",
            get(business_rules::handlers::get_config_handler),
        );

    Router::new()
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .nest("/api", api)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
