//! Booking domain entity.
//! Immutable proof-of-attendance record; created once an order is
//! fulfilled, or directly with a transaction reference in the degraded
//! client-write flow.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub order_id: Option<Uuid>,
    pub user_id: String,
    pub event_id: String,
    pub txn_reference: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn new(
        user_id: String,
        event_id: String,
        txn_reference: String,
        order_id: Option<Uuid>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            order_id,
            user_id,
            event_id,
            txn_reference,
            created_at: Utc::now(),
        }
    }
}
