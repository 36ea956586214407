use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::AppState;
use crate::error::AppError;
use crate::ledger::Ledger;

pub async fn list_bookings_for_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let bookings = state
        .lifecycle
        .ledger()
        .list_bookings_for_user(&user_id)
        .await?;

    Ok(Json(bookings))
}
