//! Push notification boundary.
//!
//! Delivery itself (web-push, email) lives outside this service; the
//! coordinator only builds payloads and hands them to a
//! [`NotificationDispatcher`] from the background worker.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::models::order::{Order, OrderStatus};
use crate::store::SubscriptionStore;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PushData {
    pub order_id: String,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PushPayload {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub data: PushData,
}

impl PushPayload {
    pub fn status_change(order: &Order, status: OrderStatus, icon: &str, tracking_url: &str) -> Self {
        Self {
            title: "Order update".to_string(),
            body: format!("Your order #{} {}", order.order_id, status.describe()),
            icon: icon.to_string(),
            data: PushData {
                order_id: order.order_id.clone(),
                url: format!("{}/{}", tracking_url.trim_end_matches('/'), order.order_id),
            },
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("recipient {0} has no push subscription")]
    NoSubscription(String),

    #[error("push delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn notify(&self, recipient: &str, payload: &PushPayload) -> Result<(), NotifyError>;
}

/// Default dispatcher: resolves the recipient's push endpoint and records
/// the payload in the log instead of calling the push service.
pub struct LogDispatcher {
    subscriptions: Arc<SubscriptionStore>,
}

impl LogDispatcher {
    pub fn new(subscriptions: Arc<SubscriptionStore>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl NotificationDispatcher for LogDispatcher {
    async fn notify(&self, recipient: &str, payload: &PushPayload) -> Result<(), NotifyError> {
        let subscription = self
            .subscriptions
            .get(recipient)
            .ok_or_else(|| NotifyError::NoSubscription(recipient.to_string()))?;

        tracing::info!(
            recipient,
            endpoint = %subscription.subscription.endpoint,
            order_id = %payload.data.order_id,
            body = %payload.body,
            "push notification dispatched"
        );
        Ok(())
    }
}
