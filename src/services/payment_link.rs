//! Payment deep-link builder.
//!
//! Pure function of the order and the configured payee; the client opens
//! the resulting `upi://pay` intent and later submits the transaction
//! reference back through the confirm endpoint. Fire-and-forget: there is
//! no callback channel.

use crate::domain::Order;
use serde::Deserialize;

/// Payee identity and currency used for new orders. Externalized
/// configuration; never hardcoded at call sites.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    /// Virtual payment address money is collected on, e.g. `events@okbank`.
    pub payee_vpa: String,
    /// Display name shown in the payer's UPI app. Free text.
    pub payee_name: String,
    /// ISO currency code stamped on new orders, e.g. `INR`.
    pub currency: String,
}

/// Build the UPI payment deep link for an order.
///
/// Deterministic: the same order yields a byte-identical URI. Free-text
/// fields (`pn`, `tn`) are percent-encoded; the order id doubles as the
/// payment reference (`tr`). Does not inspect order status.
pub fn build_link(order: &Order, config: &PaymentConfig) -> String {
    let amount = order.amount.with_scale(2);
    let note = format!("Ticket {}", order.id);

    format!(
        "upi://pay?pa={}&pn={}&tr={}&am={}&cu={}&tn={}",
        config.payee_vpa,
        urlencoding::encode(&config.payee_name),
        order.id,
        amount,
        order.currency,
        urlencoding::encode(&note),
    )
}
