//! Payment gateway webhook handling (Paystack-style events).

use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha512;
use tracing::{error, info, warn};

use crate::engine::coordinator::{DispatchCoordinator, OrderOrigin};
use crate::error::AppError;
use crate::models::order::NewOrder;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

const CHARGE_SUCCESS: &str = "charge.success";

/// Checks `signature` (hex HMAC-SHA512 of the raw body) in constant time.
pub fn verify_signature(payload: &[u8], signature: &str, secret: &str) -> Result<(), AppError> {
    if secret.is_empty() {
        warn!("payment webhook secret not configured; rejecting webhook");
        return Err(AppError::SignatureInvalid);
    }

    let expected = hex::decode(signature.trim()).map_err(|_| AppError::SignatureInvalid)?;
    let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes())
        .map_err(|err| AppError::Internal(format!("hmac key error: {err}")))?;
    mac.update(payload);
    mac.verify_slice(&expected)
        .map_err(|_| AppError::SignatureInvalid)
}

#[derive(Debug, Deserialize)]
pub struct WebhookEvent {
    pub event: String,
    #[serde(default)]
    pub data: ChargeData,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChargeData {
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub metadata: Option<ChargeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeMetadata {
    #[serde(default)]
    pub order_data: Option<Value>,
    #[serde(default)]
    pub order_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WebhookOutcome {
    Confirmed { order_id: String },
    Ignored(String),
    Failed(String),
}

/// Applies a verified webhook event. Never returns an error: the gateway must
/// always receive a success answer once the signature checks out.
pub fn handle_event(coordinator: &DispatchCoordinator, body: &[u8]) -> WebhookOutcome {
    let event: WebhookEvent = match serde_json::from_slice(body) {
        Ok(event) => event,
        Err(err) => {
            warn!(error = %err, "unparseable payment webhook payload");
            return WebhookOutcome::Ignored(format!("unparseable payload: {err}"));
        }
    };

    info!(event = %event.event, reference = ?event.data.reference, "payment webhook received");

    if event.event != CHARGE_SUCCESS {
        return WebhookOutcome::Ignored(format!("unhandled event {}", event.event));
    }

    let Some(metadata) = event.data.metadata else {
        return WebhookOutcome::Ignored("charge without order metadata".to_string());
    };

    let order_id = match (metadata.order_data, metadata.order_id) {
        (Some(raw), fallback_id) => match serde_json::from_value::<NewOrder>(raw) {
            Ok(new_order) => {
                let order_id = new_order.order_id.clone();
                if let Err(err) = coordinator.create_order(new_order, OrderOrigin::PaymentWebhook) {
                    error!(order_id = %order_id, error = %err, "failed to create order from webhook");
                    return WebhookOutcome::Failed(err.to_string());
                }
                order_id
            }
            Err(err) => match fallback_id {
                Some(order_id) => {
                    warn!(order_id = %order_id, error = %err, "invalid orderData; confirming by orderId");
                    order_id
                }
                None => {
                    error!(error = %err, "invalid orderData in webhook metadata");
                    return WebhookOutcome::Failed(format!("invalid orderData: {err}"));
                }
            },
        },
        (None, Some(order_id)) => order_id,
        (None, None) => {
            return WebhookOutcome::Ignored("charge without order reference".to_string());
        }
    };

    match coordinator.confirm_payment(&order_id) {
        Ok(order) => {
            info!(order_id = %order_id, status = order.status.as_str(), "payment webhook applied");
            WebhookOutcome::Confirmed { order_id }
        }
        Err(err) => {
            error!(order_id = %order_id, error = %err, "payment confirmation failed");
            WebhookOutcome::Failed(err.to_string())
        }
    }
}
