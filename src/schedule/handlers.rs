// HTTP handlers for schedule, business hours and holiday endpoints

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::business_rules::ScheduleView;
use crate::error::{ApiError, ErrorResponse};
use crate::schedule::{
    BusinessHoursResponse, CreateHolidayRequest, HolidayResponse, ScheduleQuery, ScheduleResponse,
    UpsertBusinessHoursRequest,
};
use crate::validation::{
    field_error, parse_id_list, parse_iso_date, validate_day_of_week, PathParams, ValidatedJson,
};
use crate::AppState;

async fn schedule_for(
    state: &AppState,
    professional_id: Uuid,
    query: ScheduleQuery,
    view: ScheduleView,
) -> Result<ScheduleResponse, ApiError> {
    let date = parse_iso_date("date", query.date.as_deref())?;
    let service_ids = parse_id_list("serviceIds", query.service_ids.as_deref())?;

    tracing::debug!(
        "Building {:?} schedule of professional {} for {}",
        view,
        professional_id,
        date
    );

    state
        .schedule
        .get_schedule(professional_id, date, &service_ids, view)
        .await
}

/// Handler for GET /api/professionals/{professional_id}/schedule
/// Public slot availability for one day
#[utoipa::path(
    get,
    path = "/api/professionals/{professional_id}/schedule",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID"),
        ScheduleQuery
    ),
    responses(
        (status = 200, description = "Slots of the day", body = ScheduleResponse),
        (status = 400, description = "Invalid date or service list", body = ErrorResponse),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn get_schedule_handler(
    State(state): State<AppState>,
    PathParams(professional_id): PathParams<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let schedule = schedule_for(&state, professional_id, query, ScheduleView::Public).await?;
    Ok(Json(schedule))
}

/// Handler for GET /api/professionals/{professional_id}/agenda
/// Owner view: busy slots carry the booking summary
#[utoipa::path(
    get,
    path = "/api/professionals/{professional_id}/agenda",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID"),
        ScheduleQuery
    ),
    responses(
        (status = 200, description = "Slots of the day with booking details", body = ScheduleResponse),
        (status = 400, description = "Invalid date or service list", body = ErrorResponse),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn get_agenda_handler(
    State(state): State<AppState>,
    PathParams(professional_id): PathParams<Uuid>,
    Query(query): Query<ScheduleQuery>,
) -> Result<Json<ScheduleResponse>, ApiError> {
    let schedule = schedule_for(&state, professional_id, query, ScheduleView::Owner).await?;
    Ok(Json(schedule))
}

/// Handler for GET /api/professionals/{professional_id}/business-hours
#[utoipa::path(
    get,
    path = "/api/professionals/{professional_id}/business-hours",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID")
    ),
    responses(
        (status = 200, description = "Configured weekdays", body = Vec<BusinessHoursResponse>),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn list_business_hours_handler(
    State(state): State<AppState>,
    PathParams(professional_id): PathParams<Uuid>,
) -> Result<Json<Vec<BusinessHoursResponse>>, ApiError> {
    let hours = state.schedule.list_business_hours(professional_id).await?;
    Ok(Json(hours))
}

/// Handler for PUT /api/professionals/{professional_id}/business-hours/{day_of_week}
/// Replaces one weekday; 0 is Sunday
#[utoipa::path(
    put,
    path = "/api/professionals/{professional_id}/business-hours/{day_of_week}",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID"),
        ("day_of_week" = u8, Path, description = "0 = Sunday .. 6 = Saturday")
    ),
    request_body = UpsertBusinessHoursRequest,
    responses(
        (status = 200, description = "Business hours stored", body = BusinessHoursResponse),
        (status = 400, description = "Invalid hours", body = ErrorResponse),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn set_business_hours_handler(
    State(state): State<AppState>,
    PathParams((professional_id, day_of_week)): PathParams<(Uuid, u8)>,
    ValidatedJson(request): ValidatedJson<UpsertBusinessHoursRequest>,
) -> Result<Json<BusinessHoursResponse>, ApiError> {
    validate_day_of_week(day_of_week)
        .map_err(|_| field_error("dayOfWeek", "day_of_week_out_of_range"))?;

    let hours = state
        .schedule
        .set_business_hours(professional_id, day_of_week, request)
        .await?;
    Ok(Json(hours))
}

/// Handler for GET /api/professionals/{professional_id}/holidays
#[utoipa::path(
    get,
    path = "/api/professionals/{professional_id}/holidays",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID")
    ),
    responses(
        (status = 200, description = "Holidays by date", body = Vec<HolidayResponse>),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn list_holidays_handler(
    State(state): State<AppState>,
    PathParams(professional_id): PathParams<Uuid>,
) -> Result<Json<Vec<HolidayResponse>>, ApiError> {
    let holidays = state.schedule.list_holidays(professional_id).await?;
    Ok(Json(holidays))
}

/// Handler for POST /api/professionals/{professional_id}/holidays
#[utoipa::path(
    post,
    path = "/api/professionals/{professional_id}/holidays",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID")
    ),
    request_body = CreateHolidayRequest,
    responses(
        (status = 201, description = "Holiday created", body = HolidayResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 409, description = "Date is already a holiday", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn create_holiday_handler(
    State(state): State<AppState>,
    PathParams(professional_id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<CreateHolidayRequest>,
) -> Result<(StatusCode, Json<HolidayResponse>), ApiError> {
    let holiday = state.schedule.create_holiday(professional_id, request).await?;
    Ok((StatusCode::CREATED, Json(holiday)))
}

/// Handler for DELETE /api/professionals/{professional_id}/holidays/{date}
#[utoipa::path(
    delete,
    path = "/api/professionals/{professional_id}/holidays/{date}",
    params(
        ("professional_id" = Uuid, Path, description = "Professional ID"),
        ("date" = String, Path, description = "Holiday date, YYYY-MM-DD")
    ),
    responses(
        (status = 204, description = "Holiday removed"),
        (status = 404, description = "Holiday not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "schedule"
)]
pub async fn delete_holiday_handler(
    State(state): State<AppState>,
    PathParams((professional_id, date)): PathParams<(Uuid, NaiveDate)>,
) -> Result<StatusCode, ApiError> {
    state.schedule.delete_holiday(professional_id, date).await?;
    Ok(StatusCode::NO_CONTENT)
}
