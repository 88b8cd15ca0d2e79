use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    #[serde(alias = "Pending Payment")]
    PendingPayment,
    Pending,
    #[serde(alias = "Ready for Delivery")]
    ReadyForDelivery,
    #[serde(alias = "Out for Delivery")]
    OutForDelivery,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// Customer-facing wording used in push notifications.
    pub fn describe(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "is awaiting payment",
            OrderStatus::Pending => "has been received by the kitchen",
            OrderStatus::ReadyForDelivery => "is ready and waiting for a rider",
            OrderStatus::OutForDelivery => "is out for delivery",
            OrderStatus::Delivered => "has been delivered. Enjoy your meal!",
            OrderStatus::Cancelled => "has been cancelled",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::PendingPayment => "PendingPayment",
            OrderStatus::Pending => "Pending",
            OrderStatus::ReadyForDelivery => "ReadyForDelivery",
            OrderStatus::OutForDelivery => "OutForDelivery",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSnapshot {
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ping {
    pub at: DateTime<Utc>,
    pub acknowledged: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acknowledged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub order_id: String,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub user: CustomerSnapshot,
    pub assigned_rider: Option<Uuid>,
    pub pings: Vec<Ping>,
    pub total: f64,
    pub delivery_fee: f64,
    pub promo_code: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn last_ping(&self) -> Option<&Ping> {
        self.pings.last()
    }
}

/// Order payload as submitted by the storefront or replayed from payment metadata.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub order_id: String,
    pub items: Vec<OrderItem>,
    pub user: CustomerSnapshot,
    #[serde(default)]
    pub total: f64,
    #[serde(default)]
    pub delivery_fee: f64,
    #[serde(default)]
    pub promo_code: Option<String>,
    /// Accepted for compatibility and always overridden on creation.
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

impl NewOrder {
    pub fn validate(&self) -> Result<(), String> {
        if self.order_id.trim().is_empty() {
            return Err("orderId cannot be empty".to_string());
        }
        if self.items.is_empty() {
            return Err("order must contain at least one item".to_string());
        }
        if let Some(item) = self.items.iter().find(|item| item.quantity == 0) {
            return Err(format!("item {} has zero quantity", item.product_id));
        }
        let email = self.user.email.trim();
        match email.split_once('@') {
            Some((local, domain)) if !local.is_empty() && domain.contains('.') => {}
            _ => return Err(format!("invalid email address: {email}")),
        }
        if self.total < 0.0 || self.delivery_fee < 0.0 {
            return Err("amounts cannot be negative".to_string());
        }
        Ok(())
    }

    pub fn into_order(self, now: DateTime<Utc>) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_id: self.order_id.trim().to_string(),
            status: OrderStatus::PendingPayment,
            items: self.items,
            user: CustomerSnapshot {
                email: self.user.email.trim().to_lowercase(),
                phone: self.user.phone,
                address: self.user.address,
            },
            assigned_rider: None,
            pings: Vec::new(),
            total: self.total,
            delivery_fee: self.delivery_fee,
            promo_code: self.promo_code.map(|code| code.trim().to_uppercase()),
            delivered_at: None,
            delivered_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}
