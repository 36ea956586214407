//! Pass-through to the externally-managed event catalog. The core does
//! not own event records; it only needs id, title and price.

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};

use crate::AppState;
use crate::catalog::NewEvent;
use crate::error::AppError;

pub async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let events = state.catalog.list_events().await?;
    Ok(Json(events))
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEvent>,
) -> Result<impl IntoResponse, AppError> {
    let created = state.catalog.create_event(&payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}
