use crate::server::GatewayState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use fieldreport_channels::{parse_update, Update};
use std::sync::Arc;
use tracing::{debug, warn};

/// Axum handler for Telegram webhook deliveries.
///
/// Route: `POST /webhook`
///
/// The update is handed to the router on a background task and the request
/// is answered immediately: Telegram redelivers anything not acknowledged
/// within its timeout, and media relays can take longer than that.
pub async fn webhook_handler(State(state): State<Arc<GatewayState>>, body: String) -> impl IntoResponse {
    let update: Update = match serde_json::from_str(&body) {
        Ok(update) => update,
        Err(e) => {
            warn!(error = %e, "Malformed webhook payload");
            return (
                StatusCode::BAD_REQUEST,
                serde_json::json!({"error": "invalid update"}).to_string(),
            );
        }
    };

    let status = match parse_update(&update) {
        Some(parsed) => {
            state.router.dispatch(parsed);
            "accepted"
        }
        None => {
            debug!(update_id = update.update_id, "Webhook update without an action");
            "ignored"
        }
    };

    (
        StatusCode::OK,
        serde_json::json!({"status": status, "update_id": update.update_id}).to_string(),
    )
}
