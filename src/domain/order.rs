//! Order domain entity.
//! A single purchase intent for one event by one buyer, plus the status
//! machine driven by the lifecycle service.

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order lifecycle states. Stored as snake_case TEXT, same vocabulary on
/// the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    AwaitingConfirmation,
    Paid,
    Fulfilled,
    Failed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::AwaitingConfirmation => "awaiting_confirmation",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::Failed => "failed",
        }
    }

    /// States from which `mark_paid` may claim the order.
    pub fn can_accept_payment(&self) -> bool {
        matches!(self, OrderStatus::Pending | OrderStatus::AwaitingConfirmation)
    }

    /// States in which payment has already been recorded; a replayed
    /// confirmation is an idempotent no-op, not an error.
    pub fn payment_recorded(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid | OrderStatus::Fulfilled | OrderStatus::Failed
        )
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "awaiting_confirmation" => Ok(OrderStatus::AwaitingConfirmation),
            "paid" => Ok(OrderStatus::Paid),
            "fulfilled" => Ok(OrderStatus::Fulfilled),
            "failed" => Ok(OrderStatus::Failed),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// Domain entity representing an order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub event_id: String,
    pub buyer_email: String,
    pub buyer_user_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub status: OrderStatus,
    pub txn_reference: Option<String>,
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for creating an order. Built by the lifecycle service,
/// consumed by the ledger.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub event_id: String,
    pub buyer_email: String,
    pub buyer_user_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
}

impl Order {
    pub fn new(input: NewOrder) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            event_id: input.event_id,
            buyer_email: input.buyer_email,
            buyer_user_id: input.buyer_user_id,
            amount: input.amount,
            currency: input.currency,
            status: OrderStatus::Pending,
            txn_reference: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_order() -> Order {
        Order::new(NewOrder {
            event_id: "EV-1".to_string(),
            buyer_email: "a@b.com".to_string(),
            buyer_user_id: None,
            amount: BigDecimal::from(250),
            currency: "INR".to_string(),
        })
    }

    #[test]
    fn new_orders_start_pending_without_reference() {
        let order = new_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.txn_reference.is_none());
        assert!(order.failure_reason.is_none());
    }

    #[test]
    fn status_round_trips_through_storage_form() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::AwaitingConfirmation,
            OrderStatus::Paid,
            OrderStatus::Fulfilled,
            OrderStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<OrderStatus>(), Ok(status));
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn payment_accepted_only_before_paid() {
        assert!(OrderStatus::Pending.can_accept_payment());
        assert!(OrderStatus::AwaitingConfirmation.can_accept_payment());
        assert!(!OrderStatus::Paid.can_accept_payment());
        assert!(!OrderStatus::Fulfilled.can_accept_payment());
        assert!(!OrderStatus::Failed.can_accept_payment());
    }

    #[test]
    fn serializes_camel_case_with_snake_case_status() {
        let order = new_order();
        let value = serde_json::to_value(&order).unwrap();
        assert_eq!(value["eventId"], "EV-1");
        assert_eq!(value["status"], "pending");
        assert!(value["txnReference"].is_null());
    }
}
