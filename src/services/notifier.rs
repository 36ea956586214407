//! Notification dispatcher.
//!
//! Delivers a rendered ticket artifact to the buyer over an outbound mail
//! channel. The transport is a trait so tests can record deliveries; the
//! production adapter speaks SMTP via lettre. Delivery is bounded by a
//! timeout and the local artifact copy is discarded only after the
//! transport has confirmed acceptance.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::fs;

use crate::config::SmtpConfig;
use crate::domain::Order;
use crate::services::ticket::TicketArtifact;

#[derive(Error, Debug)]
pub enum DeliveryError {
    #[error("mail transport failed: {0}")]
    Transport(String),

    #[error("delivery timed out after {0}s")]
    Timeout(u64),

    #[error("artifact unreadable: {0}")]
    Io(#[from] std::io::Error),
}

/// Outbound ticket mail, transport-agnostic.
#[derive(Debug, Clone)]
pub struct TicketEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment: Vec<u8>,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, email: TicketEmail) -> Result<(), DeliveryError>;
}

/// SMTP transport adapter.
#[derive(Clone)]
pub struct SmtpMailer {
    server: String,
    port: u16,
    credentials: Credentials,
    from_email: String,
    from_name: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Self {
        Self {
            server: config.host.clone(),
            port: config.port,
            credentials: Credentials::new(config.username.clone(), config.password.clone()),
            from_email: config.from_email.clone(),
            from_name: config.from_name.clone(),
        }
    }

    fn build_transport(&self) -> Result<SmtpTransport, DeliveryError> {
        Ok(SmtpTransport::relay(&self.server)
            .map_err(|e| DeliveryError::Transport(format!("SMTP relay error: {e}")))?
            .port(self.port)
            .credentials(self.credentials.clone())
            .build())
    }

    fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn deliver(&self, email: TicketEmail) -> Result<(), DeliveryError> {
        let message = Message::builder()
            .from(
                self.from_header()
                    .parse()
                    .map_err(|e| DeliveryError::Transport(format!("Invalid from address: {e}")))?,
            )
            .to(email
                .to
                .parse()
                .map_err(|e| DeliveryError::Transport(format!("Invalid to address: {e}")))?)
            .subject(email.subject.clone())
            .multipart(
                MultiPart::mixed()
                    .singlepart(SinglePart::plain(email.body.clone()))
                    .singlepart(
                        Attachment::new(email.attachment_name.clone())
                            .body(email.attachment.clone(), ContentType::TEXT_HTML),
                    ),
            )
            .map_err(|e| DeliveryError::Transport(format!("Failed to build email: {e}")))?;

        let mailer = self.build_transport()?;

        tokio::task::spawn_blocking(move || {
            mailer
                .send(&message)
                .map(|_| ())
                .map_err(|e| DeliveryError::Transport(format!("Failed to send email: {e}")))
        })
        .await
        .map_err(|e| DeliveryError::Transport(format!("Email task failed: {e}")))?
    }
}

/// Sends ticket artifacts and owns their post-delivery cleanup.
#[derive(Clone)]
pub struct NotificationDispatcher {
    transport: Arc<dyn MailTransport>,
    timeout: Duration,
}

impl NotificationDispatcher {
    pub fn new(transport: Arc<dyn MailTransport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Deliver `artifact` to `recipient`.
    ///
    /// The artifact bytes are attached unchanged, so a retried send always
    /// carries the same document. A call that outlives the configured
    /// timeout fails with `DeliveryError::Timeout` rather than hanging.
    /// The local copy is removed only after the transport accepts the
    /// message; on failure it stays in place for the retry.
    pub async fn send(
        &self,
        artifact: &TicketArtifact,
        recipient: &str,
        order: &Order,
    ) -> Result<(), DeliveryError> {
        let attachment = fs::read(&artifact.path).await?;

        let email = TicketEmail {
            to: recipient.to_string(),
            subject: format!("Your ticket \u{2014} {}", order.id),
            body: "Attached is your ticket. Show this at entry.".to_string(),
            attachment_name: format!("ticket-{}.html", artifact.order_id),
            attachment,
        };

        match tokio::time::timeout(self.timeout, self.transport.deliver(email)).await {
            Ok(Ok(())) => {
                if let Err(err) = fs::remove_file(&artifact.path).await {
                    tracing::warn!(
                        order_id = %artifact.order_id,
                        error = %err,
                        "delivered ticket but could not remove local artifact"
                    );
                }
                tracing::info!(order_id = %artifact.order_id, to = %recipient, "ticket delivered");
                Ok(())
            }
            Ok(Err(err)) => Err(err),
            Err(_) => Err(DeliveryError::Timeout(self.timeout.as_secs())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{NewOrder, Order};
    use crate::services::ticket::TicketRenderer;
    use bigdecimal::BigDecimal;
    use std::sync::Mutex;

    struct RecordingTransport {
        sent: Mutex<Vec<TicketEmail>>,
    }

    #[async_trait]
    impl MailTransport for RecordingTransport {
        async fn deliver(&self, email: TicketEmail) -> Result<(), DeliveryError> {
            self.sent.lock().unwrap().push(email);
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl MailTransport for FailingTransport {
        async fn deliver(&self, _email: TicketEmail) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("relay unreachable".to_string()))
        }
    }

    struct HangingTransport;

    #[async_trait]
    impl MailTransport for HangingTransport {
        async fn deliver(&self, _email: TicketEmail) -> Result<(), DeliveryError> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn order() -> Order {
        let mut order = Order::new(NewOrder {
            event_id: "EV-1".to_string(),
            buyer_email: "a@b.com".to_string(),
            buyer_user_id: None,
            amount: BigDecimal::from(250),
            currency: "INR".to_string(),
        });
        order.txn_reference = Some("TXN123".to_string());
        order
    }

    #[tokio::test]
    async fn removes_artifact_only_after_accepted_send() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TicketRenderer::new(dir.path());
        let order = order();
        let artifact = renderer.render(&order).await.unwrap();

        let transport = Arc::new(RecordingTransport {
            sent: Mutex::new(Vec::new()),
        });
        let dispatcher =
            NotificationDispatcher::new(transport.clone(), Duration::from_secs(5));

        dispatcher
            .send(&artifact, &order.buyer_email, &order)
            .await
            .unwrap();

        let sent = transport.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert!(sent[0].subject.contains(&order.id.to_string()));
        assert!(!artifact.path.exists());
    }

    #[tokio::test]
    async fn keeps_artifact_when_transport_fails() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TicketRenderer::new(dir.path());
        let order = order();
        let artifact = renderer.render(&order).await.unwrap();

        let dispatcher =
            NotificationDispatcher::new(Arc::new(FailingTransport), Duration::from_secs(5));

        let err = dispatcher
            .send(&artifact, &order.buyer_email, &order)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
        assert!(artifact.path.exists());
    }

    #[tokio::test]
    async fn hung_transport_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = TicketRenderer::new(dir.path());
        let order = order();
        let artifact = renderer.render(&order).await.unwrap();

        let dispatcher =
            NotificationDispatcher::new(Arc::new(HangingTransport), Duration::from_secs(1));

        let err = dispatcher
            .send(&artifact, &order.buyer_email, &order)
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Timeout(1)));
        assert!(artifact.path.exists());
    }
}
