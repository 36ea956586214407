//! Booking ledger: the authoritative store of Order and Booking records.
//!
//! Every state transition is a single conditional update so that
//! concurrent callers observe exactly one winner per order. Only the
//! lifecycle service mutates orders through this trait.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{Booking, NewOrder, Order, OrderStatus};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLedger;
pub use postgres::PgLedger;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("order {0} not found")]
    NotFound(Uuid),

    #[error("order {id}: cannot move from {from} to {attempted}")]
    InvalidTransition {
        id: Uuid,
        from: OrderStatus,
        attempted: OrderStatus,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for LedgerError {
    fn from(err: sqlx::Error) -> Self {
        LedgerError::Storage(err.to_string())
    }
}

impl From<crate::validation::ValidationError> for LedgerError {
    fn from(err: crate::validation::ValidationError) -> Self {
        LedgerError::Validation(err.to_string())
    }
}

/// Outcome of `mark_paid`. Losing a race, or replaying a confirmation
/// against an order whose payment is already recorded, is not an error.
#[derive(Debug)]
pub enum MarkPaid {
    /// This caller performed the transition into `paid`.
    Won(Order),
    /// Payment was already recorded (`paid`, `fulfilled` or `failed`);
    /// the current row is returned untouched.
    AlreadyProcessed(Order),
}

#[async_trait]
pub trait Ledger: Send + Sync {
    /// Persist a new order in `pending`. Fails with `Validation` on
    /// non-positive amount or empty event id / email.
    async fn create_order(&self, input: NewOrder) -> Result<Order, LedgerError>;

    async fn get_order(&self, id: Uuid) -> Result<Order, LedgerError>;

    /// `pending -> awaiting_confirmation`, entered when a payment link is
    /// issued. A no-op returning the current row from any later state.
    async fn mark_awaiting(&self, id: Uuid) -> Result<Order, LedgerError>;

    /// `pending|awaiting_confirmation -> paid`, recording the buyer's
    /// transaction reference. Atomic check-then-set: exactly one
    /// concurrent caller wins.
    async fn mark_paid(&self, id: Uuid, txn_reference: &str) -> Result<MarkPaid, LedgerError>;

    /// `paid -> fulfilled`. `InvalidTransition` from any other state.
    async fn mark_fulfilled(&self, id: Uuid) -> Result<Order, LedgerError>;

    /// `paid -> failed`, recording the failure reason.
    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Order, LedgerError>;

    /// `failed -> paid`, clearing the failure reason so fulfillment can be
    /// re-attempted. Returns `None` when the order is not currently
    /// `failed` (a concurrent retrier already claimed it).
    async fn reopen_failed(&self, id: Uuid) -> Result<Option<Order>, LedgerError>;

    /// Insert a booking row. No user+event deduplication: duplicates are
    /// permitted by design.
    async fn create_booking(
        &self,
        user_id: &str,
        event_id: &str,
        txn_reference: &str,
        order_id: Option<Uuid>,
    ) -> Result<Booking, LedgerError>;

    /// Bookings for one user, most recent first.
    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, LedgerError>;

    /// Storage connectivity probe for the health endpoint.
    async fn ping(&self) -> Result<(), LedgerError>;
}

pub(crate) fn validate_new_order(input: &NewOrder) -> Result<(), LedgerError> {
    crate::validation::validate_required("event_id", &input.event_id)?;
    crate::validation::validate_max_len(
        "event_id",
        &input.event_id,
        crate::validation::EVENT_ID_MAX_LEN,
    )?;
    crate::validation::validate_email(&input.buyer_email)?;
    crate::validation::validate_positive_amount(&input.amount)?;
    Ok(())
}

pub(crate) fn validate_txn_reference(txn_reference: &str) -> Result<(), LedgerError> {
    crate::validation::validate_required("txn_reference", txn_reference)?;
    crate::validation::validate_max_len(
        "txn_reference",
        txn_reference,
        crate::validation::TXN_REFERENCE_MAX_LEN,
    )?;
    Ok(())
}

pub(crate) fn validate_booking_input(
    user_id: &str,
    event_id: &str,
    txn_reference: &str,
) -> Result<(), LedgerError> {
    crate::validation::validate_required("user_id", user_id)?;
    crate::validation::validate_max_len("user_id", user_id, crate::validation::USER_ID_MAX_LEN)?;
    crate::validation::validate_required("event_id", event_id)?;
    validate_txn_reference(txn_reference)?;
    Ok(())
}
