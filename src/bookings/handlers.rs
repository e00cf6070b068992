// HTTP handlers for booking endpoints

use axum::{
    extract::State,
    Json,
};
use uuid::Uuid;

use crate::bookings::{
    Booking, CompletionResponse, PreviewPriceRequest, PricePreviewResponse, UpdateStatusRequest,
};
use crate::error::{ApiError, ErrorResponse};
use crate::validation::{PathParams, ValidatedJson};
use crate::AppState;

/// Handler for POST /api/bookings/preview
/// Prices a prospective booking without persisting anything
#[utoipa::path(
    post,
    path = "/api/bookings/preview",
    request_body = PreviewPriceRequest,
    responses(
        (status = 200, description = "Price breakdown", body = PricePreviewResponse),
        (status = 400, description = "Invalid request or booking rule violation", body = ErrorResponse),
        (status = 404, description = "Professional not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn preview_price_handler(
    State(state): State<AppState>,
    ValidatedJson(request): ValidatedJson<PreviewPriceRequest>,
) -> Result<Json<PricePreviewResponse>, ApiError> {
    tracing::debug!(
        "Previewing price for professional {} with {} services",
        request.professional_id,
        request.service_ids.len()
    );

    let response = state.bookings.preview_price(request).await?;
    Ok(Json(response))
}

/// Handler for GET /api/bookings/{booking_id}
#[utoipa::path(
    get,
    path = "/api/bookings/{booking_id}",
    params(
        ("booking_id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking found", body = Booking),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn get_booking_handler(
    State(state): State<AppState>,
    PathParams(booking_id): PathParams<Uuid>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.bookings.get_booking(booking_id).await?;
    Ok(Json(booking))
}

/// Handler for PATCH /api/bookings/{booking_id}/status
/// Confirms or cancels a booking on behalf of the professional
#[utoipa::path(
    patch,
    path = "/api/bookings/{booking_id}/status",
    params(
        ("booking_id" = Uuid, Path, description = "Booking ID")
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = Booking),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Illegal status transition", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn update_status_handler(
    State(state): State<AppState>,
    PathParams(booking_id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<UpdateStatusRequest>,
) -> Result<Json<Booking>, ApiError> {
    let booking = state.bookings.update_status(booking_id, request).await?;
    Ok(Json(booking))
}

/// Handler for POST /api/bookings/{booking_id}/complete
/// Completes a confirmed booking and credits the client's points
#[utoipa::path(
    post,
    path = "/api/bookings/{booking_id}/complete",
    params(
        ("booking_id" = Uuid, Path, description = "Booking ID")
    ),
    responses(
        (status = 200, description = "Booking completed", body = CompletionResponse),
        (status = 404, description = "Booking not found", body = ErrorResponse),
        (status = 409, description = "Booking is not confirmed", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bookings"
)]
pub async fn complete_booking_handler(
    State(state): State<AppState>,
    PathParams(booking_id): PathParams<Uuid>,
) -> Result<Json<CompletionResponse>, ApiError> {
    let response = state.bookings.complete_booking(booking_id).await?;
    Ok(Json(response))
}
