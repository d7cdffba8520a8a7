use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use sawari_core::{CardDetails, PaymentSession};

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/payment/initiate", post(initiate_payment))
        .route("/api/payment/pay", post(pay))
        .route("/api/payment/status/{session_id}", get(payment_status))
}

#[derive(Debug, Deserialize)]
struct InitiatePaymentRequest {
    hold_id: String,
    amount: i64,
}

#[derive(Debug, Deserialize)]
struct PayRequest {
    session_id: String,
    card_details: CardDetails,
}

async fn initiate_payment(
    State(state): State<AppState>,
    Json(req): Json<InitiatePaymentRequest>,
) -> Result<Json<PaymentSession>, AppError> {
    let session = state.payments.create_session(&req.hold_id, req.amount)?;
    Ok(Json(session))
}

async fn pay(
    State(state): State<AppState>,
    Json(req): Json<PayRequest>,
) -> Result<Json<PaymentSession>, AppError> {
    let session = state
        .payments
        .submit_payment(&req.session_id, &req.card_details)?;
    Ok(Json(session))
}

async fn payment_status(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<PaymentSession>, AppError> {
    let session = state.payments.get_session(&session_id)?;
    Ok(Json(session))
}
