//! Ticket renderer.
//!
//! Produces the printable ticket document for a paid order. The artifact
//! is keyed by order id and overwritten on re-render, so rendering is
//! idempotent and a retry always works from the same path.

use bigdecimal::BigDecimal;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use uuid::Uuid;

use crate::domain::Order;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("artifact write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A rendered ticket on disk, addressable by order id.
#[derive(Debug, Clone)]
pub struct TicketArtifact {
    pub order_id: Uuid,
    pub path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct TicketRenderer {
    artifact_dir: PathBuf,
}

impl TicketRenderer {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
        }
    }

    /// Stable artifact location for an order.
    pub fn artifact_path(&self, order_id: Uuid) -> PathBuf {
        self.artifact_dir.join(format!("ticket-{order_id}.html"))
    }

    /// Render the ticket document for `order`.
    ///
    /// Never fails on a missing transaction reference (rendered as `N/A`);
    /// fails only on a missing required field or on output I/O errors.
    pub async fn render(&self, order: &Order) -> Result<TicketArtifact, RenderError> {
        if order.event_id.trim().is_empty() {
            return Err(RenderError::MissingField("event_id"));
        }

        fs::create_dir_all(&self.artifact_dir).await?;

        let path = self.artifact_path(order.id);
        fs::write(&path, ticket_html(order)).await?;

        tracing::debug!(order_id = %order.id, path = %path.display(), "ticket rendered");
        Ok(TicketArtifact {
            order_id: order.id,
            path,
        })
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }
}

/// Currency-formatted amount, always two decimals. INR is printed with
/// the rupee sign; other currencies fall back to `CODE amount`.
pub fn format_amount(currency: &str, amount: &BigDecimal) -> String {
    let amount = amount.with_scale(2);
    if currency == "INR" {
        format!("\u{20b9}{amount}")
    } else {
        format!("{currency} {amount}")
    }
}

fn ticket_html(order: &Order) -> String {
    let txn = order.txn_reference.as_deref().unwrap_or("N/A");
    let amount = format_amount(&order.currency, &order.amount);

    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>Event Ticket</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h1 style="text-align: center;">Event Ticket</h1>
        <p>Order: {order_id}</p>
        <p>Event: {event_id}</p>
        <p>Amount: {amount}</p>
        <p>Txn: {txn}</p>
        <p style="color: #666; font-size: 14px;">Show this ticket at entry.</p>
    </div>
</body>
</html>
"#,
        order_id = order.id,
        event_id = order.event_id,
    )
}
