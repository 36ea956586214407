#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use gatepass_core::catalog::CatalogClient;
use gatepass_core::ledger::MemoryLedger;
use gatepass_core::services::lifecycle::OrderLifecycleService;
use gatepass_core::services::notifier::{
    DeliveryError, MailTransport, NotificationDispatcher, TicketEmail,
};
use gatepass_core::services::payment_link::PaymentConfig;
use gatepass_core::services::ticket::TicketRenderer;
use gatepass_core::{AppState, create_app};

/// Mail transport double: records accepted deliveries, optionally
/// simulating a relay outage.
pub struct RecordingMailer {
    sent: Mutex<Vec<TicketEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<TicketEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl MailTransport for RecordingMailer {
    async fn deliver(&self, email: TicketEmail) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Transport("simulated relay outage".to_string()));
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub struct TestStack {
    pub service: Arc<OrderLifecycleService>,
    pub ledger: Arc<MemoryLedger>,
    pub mailer: Arc<RecordingMailer>,
    pub renderer: TicketRenderer,
    artifacts: tempfile::TempDir,
}

pub fn payment_config() -> PaymentConfig {
    PaymentConfig {
        payee_vpa: "events@okbank".to_string(),
        payee_name: "Gatepass Events".to_string(),
        currency: "INR".to_string(),
    }
}

/// Full in-memory stack: memory ledger, tempdir artifacts, recording
/// transport.
pub fn stack() -> TestStack {
    let artifacts = tempfile::tempdir().expect("tempdir");
    let ledger = Arc::new(MemoryLedger::new());
    let mailer = Arc::new(RecordingMailer::new());
    let renderer = TicketRenderer::new(artifacts.path());

    let transport: Arc<dyn MailTransport> = mailer.clone();
    let dispatcher = NotificationDispatcher::new(transport, Duration::from_secs(5));

    let service = Arc::new(OrderLifecycleService::new(
        ledger.clone(),
        renderer.clone(),
        dispatcher,
        payment_config(),
    ));

    TestStack {
        service,
        ledger,
        mailer,
        renderer,
        artifacts,
    }
}

/// Router over the in-memory stack. The catalog URL points at a closed
/// port so pass-through failures are observable without a live catalog.
pub fn app(stack: &TestStack) -> axum::Router {
    create_app(AppState {
        lifecycle: stack.service.clone(),
        catalog: CatalogClient::new("http://127.0.0.1:9".to_string()),
    })
}
