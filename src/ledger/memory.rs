//! In-memory implementation of the booking ledger.
//!
//! Same transition contract as the Postgres adapter, with the
//! check-then-set performed under one mutex so concurrent `mark_paid`
//! callers still observe exactly one winner. Used by the test suites and
//! usable as a standalone dev backend.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use crate::domain::{Booking, NewOrder, Order, OrderStatus};
use crate::ledger::{Ledger, LedgerError, MarkPaid};

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    bookings: Vec<Booking>,
}

#[derive(Default)]
pub struct MemoryLedger {
    inner: Mutex<Inner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, LedgerError> {
        self.inner
            .lock()
            .map_err(|_| LedgerError::Storage("ledger mutex poisoned".to_string()))
    }
}

#[async_trait]
impl Ledger for MemoryLedger {
    async fn create_order(&self, input: NewOrder) -> Result<Order, LedgerError> {
        crate::ledger::validate_new_order(&input)?;

        let order = Order::new(input);
        let mut inner = self.lock()?;
        inner.orders.insert(order.id, order.clone());
        Ok(order)
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, LedgerError> {
        let inner = self.lock()?;
        inner.orders.get(&id).cloned().ok_or(LedgerError::NotFound(id))
    }

    async fn mark_awaiting(&self, id: Uuid) -> Result<Order, LedgerError> {
        let mut inner = self.lock()?;
        let order = inner.orders.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::AwaitingConfirmation;
            order.updated_at = Utc::now();
        }
        Ok(order.clone())
    }

    async fn mark_paid(&self, id: Uuid, txn_reference: &str) -> Result<MarkPaid, LedgerError> {
        crate::ledger::validate_txn_reference(txn_reference)?;

        let mut inner = self.lock()?;
        let order = inner.orders.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if order.status.can_accept_payment() {
            order.status = OrderStatus::Paid;
            order.txn_reference = Some(txn_reference.to_string());
            order.updated_at = Utc::now();
            Ok(MarkPaid::Won(order.clone()))
        } else if order.status.payment_recorded() {
            Ok(MarkPaid::AlreadyProcessed(order.clone()))
        } else {
            Err(LedgerError::InvalidTransition {
                id,
                from: order.status,
                attempted: OrderStatus::Paid,
            })
        }
    }

    async fn mark_fulfilled(&self, id: Uuid) -> Result<Order, LedgerError> {
        let mut inner = self.lock()?;
        let order = inner.orders.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if order.status != OrderStatus::Paid {
            return Err(LedgerError::InvalidTransition {
                id,
                from: order.status,
                attempted: OrderStatus::Fulfilled,
            });
        }

        order.status = OrderStatus::Fulfilled;
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Order, LedgerError> {
        let mut inner = self.lock()?;
        let order = inner.orders.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if order.status != OrderStatus::Paid {
            return Err(LedgerError::InvalidTransition {
                id,
                from: order.status,
                attempted: OrderStatus::Failed,
            });
        }

        order.status = OrderStatus::Failed;
        order.failure_reason = Some(reason.to_string());
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn reopen_failed(&self, id: Uuid) -> Result<Option<Order>, LedgerError> {
        let mut inner = self.lock()?;
        let order = inner.orders.get_mut(&id).ok_or(LedgerError::NotFound(id))?;

        if order.status != OrderStatus::Failed {
            return Ok(None);
        }

        order.status = OrderStatus::Paid;
        order.failure_reason = None;
        order.updated_at = Utc::now();
        Ok(Some(order.clone()))
    }

    async fn create_booking(
        &self,
        user_id: &str,
        event_id: &str,
        txn_reference: &str,
        order_id: Option<Uuid>,
    ) -> Result<Booking, LedgerError> {
        crate::ledger::validate_booking_input(user_id, event_id, txn_reference)?;

        let booking = Booking::new(
            user_id.to_string(),
            event_id.to_string(),
            txn_reference.to_string(),
            order_id,
        );

        let mut inner = self.lock()?;
        inner.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, LedgerError> {
        let inner = self.lock()?;
        let mut bookings: Vec<Booking> = inner
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        Ok(())
    }
}
