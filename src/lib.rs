pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod ledger;
pub mod services;
pub mod startup;
pub mod validation;

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::catalog::CatalogClient;
use crate::services::lifecycle::OrderLifecycleService;

#[derive(Clone)]
pub struct AppState {
    pub lifecycle: Arc<OrderLifecycleService>,
    pub catalog: CatalogClient,
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/orders", post(handlers::orders::create_order))
        .route("/api/orders/:id", get(handlers::orders::get_order))
        .route(
            "/api/orders/:id/payment-link",
            get(handlers::orders::payment_link),
        )
        .route("/api/orders/:id/confirm", post(handlers::orders::confirm_order))
        .route(
            "/api/users/:user_id/bookings",
            get(handlers::bookings::list_bookings_for_user),
        )
        .route(
            "/api/events",
            get(handlers::events::list_events).post(handlers::events::create_event),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
