//! Domain entities for the booking fulfillment core.
//! Framework-agnostic; storage and transport adapters map into these types.

pub mod booking;
pub mod order;

pub use booking::Booking;
pub use order::{NewOrder, Order, OrderStatus};
