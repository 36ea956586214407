//! Postgres implementation of the booking ledger.
//!
//! Transitions are single conditional UPDATEs (`WHERE status IN (...)
//! RETURNING *`), so the at-most-one-winner guarantee comes from row-level
//! atomicity rather than application-side locking.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Booking, NewOrder, Order, OrderStatus};
use crate::ledger::{Ledger, LedgerError, MarkPaid};

#[derive(Clone)]
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_order(&self, id: Uuid) -> Result<Order, LedgerError> {
        let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(OrderRow::into_domain)
            .transpose()?
            .ok_or(LedgerError::NotFound(id))
    }
}

#[async_trait]
impl Ledger for PgLedger {
    async fn create_order(&self, input: NewOrder) -> Result<Order, LedgerError> {
        crate::ledger::validate_new_order(&input)?;

        let order = Order::new(input);
        let row = sqlx::query_as::<_, OrderRow>(
            r#"
            INSERT INTO orders (
                id, event_id, buyer_email, buyer_user_id, amount, currency,
                status, txn_reference, failure_reason, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(order.id)
        .bind(&order.event_id)
        .bind(&order.buyer_email)
        .bind(&order.buyer_user_id)
        .bind(&order.amount)
        .bind(&order.currency)
        .bind(order.status.as_str())
        .bind(&order.txn_reference)
        .bind(&order.failure_reason)
        .bind(order.created_at)
        .bind(order.updated_at)
        .fetch_one(&self.pool)
        .await?;

        row.into_domain()
    }

    async fn get_order(&self, id: Uuid) -> Result<Order, LedgerError> {
        self.fetch_order(id).await
    }

    async fn mark_awaiting(&self, id: Uuid) -> Result<Order, LedgerError> {
        let updated = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = 'awaiting_confirmation', updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => row.into_domain(),
            None => self.fetch_order(id).await,
        }
    }

    async fn mark_paid(&self, id: Uuid, txn_reference: &str) -> Result<MarkPaid, LedgerError> {
        crate::ledger::validate_txn_reference(txn_reference)?;

        let updated = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = 'paid', txn_reference = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('pending', 'awaiting_confirmation')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(txn_reference)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(MarkPaid::Won(row.into_domain()?));
        }

        let current = self.fetch_order(id).await?;
        if current.status.payment_recorded() {
            Ok(MarkPaid::AlreadyProcessed(current))
        } else {
            Err(LedgerError::InvalidTransition {
                id,
                from: current.status,
                attempted: OrderStatus::Paid,
            })
        }
    }

    async fn mark_fulfilled(&self, id: Uuid) -> Result<Order, LedgerError> {
        let updated = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = 'fulfilled', updated_at = NOW()
            WHERE id = $1 AND status = 'paid'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => row.into_domain(),
            None => {
                let current = self.fetch_order(id).await?;
                Err(LedgerError::InvalidTransition {
                    id,
                    from: current.status,
                    attempted: OrderStatus::Fulfilled,
                })
            }
        }
    }

    async fn mark_failed(&self, id: Uuid, reason: &str) -> Result<Order, LedgerError> {
        let updated = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = 'failed', failure_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'paid'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(row) => row.into_domain(),
            None => {
                let current = self.fetch_order(id).await?;
                Err(LedgerError::InvalidTransition {
                    id,
                    from: current.status,
                    attempted: OrderStatus::Failed,
                })
            }
        }
    }

    async fn reopen_failed(&self, id: Uuid) -> Result<Option<Order>, LedgerError> {
        let updated = sqlx::query_as::<_, OrderRow>(
            r#"
            UPDATE orders
            SET status = 'paid', failure_reason = NULL, updated_at = NOW()
            WHERE id = $1 AND status = 'failed'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        updated.map(OrderRow::into_domain).transpose()
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

        let row = sqlx::query_as::<_, BookingRow>(
            r#"
            INSERT INTO bookings (id, order_id, user_id, event_id, txn_reference, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(booking.id)
        .bind(booking.order_id)
        .bind(&booking.user_id)
        .bind(&booking.event_id)
        .bind(&booking.txn_reference)
        .bind(booking.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_domain())
    }

    async fn list_bookings_for_user(&self, user_id: &str) -> Result<Vec<Booking>, LedgerError> {
        let rows = sqlx::query_as::<_, BookingRow>(
            "SELECT * FROM bookings WHERE user_id = $1 ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(BookingRow::into_domain).collect())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    event_id: String,
    buyer_email: String,
    buyer_user_id: Option<String>,
    amount: bigdecimal::BigDecimal,
    currency: String,
    status: String,
    txn_reference: Option<String>,
    failure_reason: Option<String>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl OrderRow {
    fn into_domain(self) -> Result<Order, LedgerError> {
        let status = self
            .status
            .parse::<OrderStatus>()
            .map_err(LedgerError::Storage)?;

        Ok(Order {
            id: self.id,
            event_id: self.event_id,
            buyer_email: self.buyer_email,
            buyer_user_id: self.buyer_user_id,
            amount: self.amount,
            currency: self.currency,
            status,
            txn_reference: self.txn_reference,
            failure_reason: self.failure_reason,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    order_id: Option<Uuid>,
    user_id: String,
    event_id: String,
    txn_reference: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl BookingRow {
    fn into_domain(self) -> Booking {
        Booking {
            id: self.id,
            order_id: self.order_id,
            user_id: self.user_id,
            event_id: self.event_id,
            txn_reference: self.txn_reference,
            created_at: self.created_at,
        }
    }
}
