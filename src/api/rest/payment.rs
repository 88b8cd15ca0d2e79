use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;

use crate::error::AppError;
use crate::payment::{handle_event, verify_signature, WebhookOutcome, SIGNATURE_HEADER};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/payment/webhook", post(payment_webhook))
}

/// Answers 200 for every verified delivery so the gateway stops retrying;
/// only a bad signature is rejected.
async fn payment_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();

    if let Err(err) = verify_signature(&body, signature, &state.webhook_secret) {
        state
            .metrics
            .webhook_events_total
            .with_label_values(&["rejected"])
            .inc();
        tracing::warn!(error = %err, "payment webhook rejected");
        return Err(err);
    }

    let outcome = match handle_event(&state.coordinator, &body) {
        WebhookOutcome::Confirmed { .. } => "confirmed",
        WebhookOutcome::Ignored(_) => "ignored",
        WebhookOutcome::Failed(_) => "failed",
    };
    state
        .metrics
        .webhook_events_total
        .with_label_values(&[outcome])
        .inc();

    Ok(StatusCode::OK)
}
