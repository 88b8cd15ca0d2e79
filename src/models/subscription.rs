use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}

/// Browser push endpoint as handed out by the Push API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebPushEndpoint {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

impl WebPushEndpoint {
    pub fn validate(&self) -> Result<(), String> {
        if !self.endpoint.starts_with("https://") {
            return Err(format!("push endpoint must be https: {}", self.endpoint));
        }
        if self.keys.p256dh.trim().is_empty() || self.keys.auth.trim().is_empty() {
            return Err("push subscription keys are required".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSubscription {
    pub email: String,
    pub subscription: WebPushEndpoint,
    pub updated_at: DateTime<Utc>,
}
