use chrono::Utc;
use dashmap::DashMap;

use crate::models::subscription::{PushSubscription, WebPushEndpoint};

/// One push endpoint per customer email; a later subscribe replaces it.
#[derive(Default)]
pub struct SubscriptionStore {
    subscriptions: DashMap<String, PushSubscription>,
}

impl SubscriptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub fn upsert(&self, email: &str, subscription: WebPushEndpoint) -> PushSubscription {
        let email = email.trim().to_lowercase();
        let record = PushSubscription {
            email: email.clone(),
            subscription,
            updated_at: Utc::now(),
        };
        self.subscriptions.insert(email, record.clone());
        record
    }

    pub fn get(&self, email: &str) -> Option<PushSubscription> {
        self.subscriptions
            .get(&email.trim().to_lowercase())
            .map(|subscription| subscription.clone())
    }
}
