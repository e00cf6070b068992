// HTTP handlers for bonus ledger endpoints

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::bonus::{AssignBonusRequest, BalanceResponse};
use crate::business_rules::LedgerEntry;
use crate::error::{ApiError, ErrorResponse};
use crate::validation::{PathParams, ValidatedJson};
use crate::AppState;

/// Handler for GET /api/bonus/{user_id}/balance
#[utoipa::path(
    get,
    path = "/api/bonus/{user_id}/balance",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Active point balance", body = BalanceResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bonus"
)]
pub async fn get_balance_handler(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    let balance = state.bonus.balance(user_id).await?;
    Ok(Json(balance))
}

/// Handler for GET /api/bonus/{user_id}/entries
/// Lists the whole ledger, expired entries included
#[utoipa::path(
    get,
    path = "/api/bonus/{user_id}/entries",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Ledger entries, oldest first", body = Vec<LedgerEntry>),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bonus"
)]
pub async fn list_entries_handler(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<Uuid>,
) -> Result<Json<Vec<LedgerEntry>>, ApiError> {
    let entries = state.bonus.history(user_id).await?;
    Ok(Json(entries))
}

/// Handler for POST /api/bonus/{user_id}/entries
/// Assigns points by hand (admin)
#[utoipa::path(
    post,
    path = "/api/bonus/{user_id}/entries",
    params(
        ("user_id" = Uuid, Path, description = "User ID")
    ),
    request_body = AssignBonusRequest,
    responses(
        (status = 201, description = "Entry appended", body = LedgerEntry),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "bonus"
)]
pub async fn assign_bonus_handler(
    State(state): State<AppState>,
    PathParams(user_id): PathParams<Uuid>,
    ValidatedJson(request): ValidatedJson<AssignBonusRequest>,
) -> Result<(StatusCode, Json<LedgerEntry>), ApiError> {
    let entry = state.bonus.assign(user_id, request).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}
