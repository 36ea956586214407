//! Order lifecycle service.
//!
//! The single owner of order state transitions:
//!
//! ```text
//! pending --(submit txn ref)--> paid --(render+send ok)--> fulfilled
//!                                     \--(render or send fails)--> failed
//! ```
//!
//! Confirmation is idempotent: replaying a confirmation against an order
//! whose payment is already recorded returns the current state instead of
//! re-running fulfillment, and a failed order is re-fulfilled by exactly
//! one retrier.

use bigdecimal::BigDecimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::{NewOrder, Order, OrderStatus};
use crate::error::AppError;
use crate::ledger::{Ledger, MarkPaid};
use crate::services::notifier::NotificationDispatcher;
use crate::services::payment_link::{self, PaymentConfig};
use crate::services::ticket::TicketRenderer;
use crate::validation::sanitize_string;

#[derive(Debug, Clone)]
pub struct CreateOrderInput {
    pub event_id: String,
    pub amount: BigDecimal,
    pub buyer_email: String,
    pub buyer_user_id: Option<String>,
}

#[derive(Clone)]
pub struct OrderLifecycleService {
    ledger: Arc<dyn Ledger>,
    renderer: TicketRenderer,
    dispatcher: NotificationDispatcher,
    payment: PaymentConfig,
}

impl OrderLifecycleService {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        renderer: TicketRenderer,
        dispatcher: NotificationDispatcher,
        payment: PaymentConfig,
    ) -> Self {
        Self {
            ledger,
            renderer,
            dispatcher,
            payment,
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    /// Create a new order in `pending`. The generated id doubles as the
    /// payment reference in the deep link.
    pub async fn create_order(&self, input: CreateOrderInput) -> Result<Order, AppError> {
        let order = self
            .ledger
            .create_order(NewOrder {
                event_id: sanitize_string(&input.event_id),
                buyer_email: sanitize_string(&input.buyer_email),
                buyer_user_id: input
                    .buyer_user_id
                    .map(|u| sanitize_string(&u))
                    .filter(|u| !u.is_empty()),
                amount: input.amount.with_scale(2),
                currency: self.payment.currency.clone(),
            })
            .await?;

        tracing::info!(order_id = %order.id, event_id = %order.event_id, "order created");
        Ok(order)
    }

    pub async fn get_order(&self, id: Uuid) -> Result<Order, AppError> {
        Ok(self.ledger.get_order(id).await?)
    }

    /// Build the payment deep link for an order and record that it was
    /// issued (`pending -> awaiting_confirmation`, idempotent).
    pub async fn issue_payment_link(&self, id: Uuid) -> Result<(String, Order), AppError> {
        let order = self.ledger.mark_awaiting(id).await?;
        let link = payment_link::build_link(&order, &self.payment);
        Ok((link, order))
    }

    /// Accept the buyer's transaction reference and drive fulfillment.
    ///
    /// Safe to call repeatedly and concurrently for the same order: the
    /// ledger picks exactly one payment winner, replays return the current
    /// state, and a recorded failure is retried by exactly one caller.
    /// Note that a reference duplicating another order's is accepted;
    /// references are not globally unique.
    pub async fn confirm_payment(&self, id: Uuid, txn_reference: &str) -> Result<Order, AppError> {
        let txn_reference = sanitize_string(txn_reference);

        match self.ledger.mark_paid(id, &txn_reference).await? {
            MarkPaid::Won(order) => {
                tracing::info!(order_id = %id, "payment recorded");
                self.fulfill(order).await
            }
            MarkPaid::AlreadyProcessed(order) => match order.status {
                OrderStatus::Failed => match self.ledger.reopen_failed(id).await? {
                    Some(reopened) => {
                        tracing::info!(order_id = %id, "retrying fulfillment of failed order");
                        self.fulfill(reopened).await
                    }
                    // a concurrent retrier claimed the order first
                    None => Ok(self.ledger.get_order(id).await?),
                },
                _ => {
                    tracing::info!(
                        order_id = %id,
                        status = %order.status,
                        "confirmation replayed, fulfillment not re-run"
                    );
                    Ok(order)
                }
            },
        }
    }

    /// Render the ticket, dispatch it, record the booking, then flip the
    /// order to `fulfilled`. Runs on an already-`paid` snapshot, outside
    /// any ledger lock.
    async fn fulfill(&self, order: Order) -> Result<Order, AppError> {
        let artifact = match self.renderer.render(&order).await {
            Ok(artifact) => artifact,
            Err(err) => return self.record_failure(order.id, "ticket render", &err.to_string()).await,
        };

        if let Err(err) = self
            .dispatcher
            .send(&artifact, &order.buyer_email, &order)
            .await
        {
            return self
                .record_failure(order.id, "ticket delivery", &err.to_string())
                .await;
        }

        if let (Some(user_id), Some(txn_reference)) = (&order.buyer_user_id, &order.txn_reference) {
            if let Err(err) = self
                .ledger
                .create_booking(user_id, &order.event_id, txn_reference, Some(order.id))
                .await
            {
                return self
                    .record_failure(order.id, "booking write", &err.to_string())
                    .await;
            }
        }

        let fulfilled = self.ledger.mark_fulfilled(order.id).await?;
        tracing::info!(order_id = %fulfilled.id, "order fulfilled");
        Ok(fulfilled)
    }

    /// Record a fulfillment failure and surface a retriable error. The
    /// caller is told the payment was recorded so it can re-submit the
    /// same confirmation.
    async fn record_failure(
        &self,
        id: Uuid,
        stage: &str,
        reason: &str,
    ) -> Result<Order, AppError> {
        let reason = format!("{stage} failed: {reason}");
        tracing::error!(order_id = %id, %reason, "fulfillment failed, order left retriable");

        self.ledger.mark_failed(id, &reason).await?;
        Err(AppError::Fulfillment(format!(
            "payment recorded, but the ticket could not be delivered ({reason}); re-submit the confirmation to retry"
        )))
    }
}
