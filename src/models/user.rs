use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::order::Order;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub last_seen: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Admin view of a customer: totals from their orders, contact details from
/// the stored profile.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub email: String,
    pub order_count: usize,
    pub total_spent: f64,
    pub last_order: DateTime<Utc>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

impl CustomerSummary {
    pub fn first(order: &Order) -> Self {
        Self {
            email: order.user.email.clone(),
            order_count: 1,
            total_spent: order.total,
            last_order: order.created_at,
            phone: None,
            address: None,
        }
    }

    pub fn record(&mut self, order: &Order) {
        self.order_count += 1;
        self.total_spent += order.total;
        self.last_order = self.last_order.max(order.created_at);
    }

    pub fn with_profile(mut self, profile: Option<UserProfile>) -> Self {
        if let Some(profile) = profile {
            self.phone = profile.phone;
            self.address = profile.address;
        }
        self
    }
}
