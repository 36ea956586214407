use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use bigdecimal::BigDecimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::AppState;
use crate::error::AppError;
use crate::services::lifecycle::CreateOrderInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderPayload {
    pub event_id: String,
    pub amount: BigDecimal,
    pub email: String,
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayload {
    pub txn_id: String,
}

pub async fn create_order(
    State(state): State<AppState>,
    Json(payload): Json<CreateOrderPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = state
        .lifecycle
        .create_order(CreateOrderInput {
            event_id: payload.event_id,
            amount: payload.amount,
            buyer_email: payload.email,
            buyer_user_id: payload.user_id,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.lifecycle.get_order(id).await?;
    Ok(Json(order))
}

/// Issue the UPI deep link for an order. Also records that the link was
/// handed out, moving a pending order to `awaiting_confirmation`.
pub async fn payment_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let (link, order) = state.lifecycle.issue_payment_link(id).await?;
    Ok(Json(json!({ "link": link, "order": order })))
}

/// The buyer submits the transaction reference from their payment app.
/// Replays are idempotent; a fulfillment failure comes back as a 500 with
/// `retriable: true` and the same call can be re-issued.
pub async fn confirm_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, AppError> {
    let order = state.lifecycle.confirm_payment(id, &payload.txn_id).await?;
    Ok(Json(json!({ "ok": true, "order": order })))
}
