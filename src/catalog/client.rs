use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Event not found: {0}")]
    EventNotFound(String),
    #[error("Invalid response from catalog: {0}")]
    InvalidResponse(String),
    #[error("Circuit breaker open: {0}")]
    CircuitOpen(String),
}

/// Event fields the booking core consumes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub date: Option<String>,
    pub venue: Option<String>,
}

/// Payload forwarded verbatim to the catalog on event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEvent {
    pub title: String,
    pub price: f64,
    pub date: Option<String>,
    pub venue: Option<String>,
}

/// HTTP client for the event catalog service.
#[derive(Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl CatalogClient {
    /// Creates a new CatalogClient with the specified base URL
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        CatalogClient {
            client,
            base_url,
            circuit_breaker,
        }
    }

    /// Returns the current state of the circuit breaker
    pub fn circuit_state(&self) -> String {
        if self.circuit_breaker.is_call_permitted() {
            "closed".to_string()
        } else {
            "open".to_string()
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn list_events(&self) -> Result<Vec<EventSummary>, CatalogError> {
        let url = format!("{}/api/events", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).send().await?;
                let events = response.json::<Vec<EventSummary>>().await?;
                Ok(events)
            })
            .await;

        map_circuit_result(result)
    }

    pub async fn get_event(&self, id: &str) -> Result<EventSummary, CatalogError> {
        let url = format!("{}/api/events/{}", self.base_url.trim_end_matches('/'), id);
        let client = self.client.clone();
        let event_id = id.to_string();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.get(&url).send().await?;

                if response.status() == 404 {
                    return Err(CatalogError::EventNotFound(event_id));
                }

                let event = response.json::<EventSummary>().await?;
                Ok(event)
            })
            .await;

        map_circuit_result(result)
    }

    pub async fn create_event(&self, event: &NewEvent) -> Result<EventSummary, CatalogError> {
        let url = format!("{}/api/events", self.base_url.trim_end_matches('/'));
        let client = self.client.clone();
        let payload = event.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.post(&url).json(&payload).send().await?;

                if !response.status().is_success() {
                    return Err(CatalogError::InvalidResponse(format!(
                        "catalog returned status {}",
                        response.status()
                    )));
                }

                let created = response.json::<EventSummary>().await?;
                Ok(created)
            })
            .await;

        map_circuit_result(result)
    }
}

fn map_circuit_result<T>(result: Result<T, FailsafeError<CatalogError>>) -> Result<T, CatalogError> {
    match result {
        Ok(value) => Ok(value),
        Err(FailsafeError::Rejected) => Err(CatalogError::CircuitOpen(
            "event catalog circuit breaker is open".to_string(),
        )),
        Err(FailsafeError::Inner(e)) => Err(e),
    }
}
