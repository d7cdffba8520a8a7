use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sawari_booking::{BookingConfirmation, BookingSummary, HoldManager};
use sawari_core::BookingHold;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/holds", post(create_hold))
        .route("/api/holds/{hold_id}/passenger", post(add_passenger))
        .route("/api/holds/{hold_id}/confirm", post(confirm_hold))
        .route("/api/hold/{hold_id}", get(get_hold))
}

#[derive(Debug, Deserialize)]
struct CreateHoldRequest {
    cab_id: String,
    pickup: String,
    drop: String,
    departure_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
struct AddPassengerRequest {
    name: String,
    phone: String,
    email: Option<String>,
    special_request: Option<String>,
}

/// Booking summary plus the deadline the caller must act by.
#[derive(Debug, Serialize)]
struct HoldResponse {
    #[serde(flatten)]
    summary: BookingSummary,
    expires_at: DateTime<Utc>,
}

impl HoldResponse {
    fn from_hold(hold: &BookingHold) -> Self {
        Self {
            summary: HoldManager::summary(hold),
            expires_at: hold.expires_at,
        }
    }
}

async fn create_hold(
    State(state): State<AppState>,
    Json(req): Json<CreateHoldRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let hold = state
        .holds
        .create_hold(&req.cab_id, &req.pickup, &req.drop, req.departure_date)?;
    Ok(Json(HoldResponse::from_hold(&hold)))
}

async fn add_passenger(
    State(state): State<AppState>,
    Path(hold_id): Path<String>,
    Json(req): Json<AddPassengerRequest>,
) -> Result<Json<HoldResponse>, AppError> {
    let hold = state.holds.attach_passenger(
        &hold_id,
        &req.name,
        &req.phone,
        req.email.as_deref(),
        req.special_request.as_deref(),
    )?;
    Ok(Json(HoldResponse::from_hold(&hold)))
}

async fn confirm_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<String>,
) -> Result<Json<BookingConfirmation>, AppError> {
    let confirmation = state.holds.confirm(&hold_id)?;
    Ok(Json(confirmation))
}

/// Read a hold. The expiry check runs first so an overdue hold reads back
/// as expired even before the sweep reaches it.
async fn get_hold(
    State(state): State<AppState>,
    Path(hold_id): Path<String>,
) -> Result<Json<HoldResponse>, AppError> {
    state.holds.is_expired(&hold_id)?;
    let hold = state.holds.get_hold(&hold_id)?;
    Ok(Json(HoldResponse::from_hold(&hold)))
}
