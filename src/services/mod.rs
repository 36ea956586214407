pub mod lifecycle;
pub mod notifier;
pub mod payment_link;
pub mod ticket;

pub use lifecycle::{CreateOrderInput, OrderLifecycleService};
pub use notifier::{DeliveryError, MailTransport, NotificationDispatcher, SmtpMailer, TicketEmail};
pub use payment_link::{build_link, PaymentConfig};
pub use ticket::{RenderError, TicketArtifact, TicketRenderer};
