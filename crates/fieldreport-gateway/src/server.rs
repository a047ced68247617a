use crate::router::EventRouter;
use crate::webhook::webhook_handler;
use axum::{
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Shared application state.
pub struct GatewayState {
    pub router: Arc<EventRouter>,
}

/// The webhook server.
pub struct GatewayServer;

impl GatewayServer {
    /// Build the axum app: `POST /webhook` and `GET /health`.
    pub fn build(router: Arc<EventRouter>) -> Router {
        let state = Arc::new(GatewayState { router });

        Router::new()
            .route("/webhook", post(webhook_handler))
            .route("/health", get(health_handler))
            .with_state(state)
    }
}

async fn health_handler() -> impl IntoResponse {
    serde_json::json!({"status": "ok", "service": "fieldreport"}).to_string()
}
