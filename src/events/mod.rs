//! Real-time publish/subscribe channel.
//!
//! Every event is published on a [`Topic`]. Subscribers always receive
//! `global` events and receive scoped events only for rooms they joined.

use std::fmt;
use std::sync::Arc;

use dashmap::DashSet;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::order::Order;
use crate::models::promo::PromoCode;
use crate::models::rating::Rating;
use crate::models::rider::Rider;
use crate::models::settings::Settings;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Topic {
    Global,
    Order(String),
    User(String),
}

impl Topic {
    pub fn order(order_id: &str) -> Self {
        Topic::Order(order_id.to_string())
    }

    pub fn user(email: &str) -> Self {
        Topic::User(email.trim().to_lowercase())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Global => f.write_str("global"),
            Topic::Order(order_id) => write!(f, "order:{order_id}"),
            Topic::User(email) => write!(f, "user:{email}"),
        }
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.to_string()
    }
}

impl TryFrom<String> for Topic {
    type Error = String;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        if raw == "global" {
            return Ok(Topic::Global);
        }
        match raw.split_once(':') {
            Some(("order", order_id)) if !order_id.is_empty() => Ok(Topic::order(order_id)),
            Some(("user", email)) if !email.is_empty() => Ok(Topic::user(email)),
            _ => Err(format!("unknown room {raw:?}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum Event {
    NewOrder(Order),
    OrderUpdated(Order),
    RiderCreated(Rider),
    RiderUpdated(Rider),
    #[serde(rename_all = "camelCase")]
    AdminOrderPinged {
        order_id: String,
        user_email: String,
    },
    OrderPingAcknowledged(Order),
    PromoUpdated(PromoCode),
    SettingsUpdated(Settings),
    RatingCreated(Rating),
    UserProfileUpdated(Value),
    CartUpdated(Value),
    CartCleared(Value),
    LocationUpdated(Value),
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::NewOrder(_) => "newOrder",
            Event::OrderUpdated(_) => "orderUpdated",
            Event::RiderCreated(_) => "riderCreated",
            Event::RiderUpdated(_) => "riderUpdated",
            Event::AdminOrderPinged { .. } => "adminOrderPinged",
            Event::OrderPingAcknowledged(_) => "orderPingAcknowledged",
            Event::PromoUpdated(_) => "promoUpdated",
            Event::SettingsUpdated(_) => "settingsUpdated",
            Event::RatingCreated(_) => "ratingCreated",
            Event::UserProfileUpdated(_) => "userProfileUpdated",
            Event::CartUpdated(_) => "cartUpdated",
            Event::CartCleared(_) => "cartCleared",
            Event::LocationUpdated(_) => "locationUpdated",
        }
    }
}

/// Client-originated events that the server relays to other members of a room.
#[derive(Debug, Clone)]
pub enum RelayEvent {
    UserProfileUpdated(Value),
    CartUpdated(Value),
    CartCleared(Value),
    LocationUpdated(Value),
}

impl RelayEvent {
    pub fn parse(event: &str, data: Value) -> Option<Self> {
        match event {
            "userProfileUpdated" => Some(RelayEvent::UserProfileUpdated(data)),
            "cartUpdated" => Some(RelayEvent::CartUpdated(data)),
            "cartCleared" => Some(RelayEvent::CartCleared(data)),
            "locationUpdated" => Some(RelayEvent::LocationUpdated(data)),
            _ => None,
        }
    }

    /// Profile and cart events belong to a user room; locations may also
    /// target the room of the order being delivered.
    pub fn allowed_in(&self, topic: &Topic) -> bool {
        match (self, topic) {
            (_, Topic::User(_)) => true,
            (RelayEvent::LocationUpdated(_), Topic::Order(_)) => true,
            _ => false,
        }
    }
}

impl From<RelayEvent> for Event {
    fn from(relay: RelayEvent) -> Self {
        match relay {
            RelayEvent::UserProfileUpdated(data) => Event::UserProfileUpdated(data),
            RelayEvent::CartUpdated(data) => Event::CartUpdated(data),
            RelayEvent::CartCleared(data) => Event::CartCleared(data),
            RelayEvent::LocationUpdated(data) => Event::LocationUpdated(data),
        }
    }
}

/// Messages accepted from WebSocket clients.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientMessage {
    Join {
        room: Topic,
    },
    Leave {
        room: Topic,
    },
    Emit {
        room: Topic,
        event: String,
        #[serde(default)]
        data: Value,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub room: Topic,
    #[serde(flatten)]
    pub event: Event,
    #[serde(skip)]
    pub origin: Option<Uuid>,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<Envelope>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _unused_rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes without waiting for delivery. Returns the number of receivers.
    pub fn publish(&self, room: Topic, event: Event) -> usize {
        self.send(Envelope {
            room,
            event,
            origin: None,
        })
    }

    pub fn publish_global(&self, event: Event) -> usize {
        self.publish(Topic::Global, event)
    }

    /// Publishes a client relay; the originating subscriber does not get it back.
    pub fn relay(&self, origin: &Subscriber, room: Topic, event: RelayEvent) -> usize {
        self.send(Envelope {
            room,
            event: event.into(),
            origin: Some(origin.id),
        })
    }

    fn send(&self, envelope: Envelope) -> usize {
        let name = envelope.event.name();
        let room = envelope.room.to_string();
        match self.tx.send(envelope) {
            Ok(receivers) => {
                tracing::debug!(event = name, room = %room, receivers, "event published");
                receivers
            }
            Err(_) => {
                tracing::trace!(event = name, room = %room, "event dropped: no subscribers");
                0
            }
        }
    }

    pub fn subscribe(&self) -> (Subscriber, broadcast::Receiver<Envelope>) {
        (Subscriber::new(), self.tx.subscribe())
    }

    pub fn receiver(&self) -> broadcast::Receiver<Envelope> {
        self.tx.subscribe()
    }
}

/// Room membership of a single connection.
#[derive(Clone)]
pub struct Subscriber {
    id: Uuid,
    rooms: Arc<DashSet<Topic>>,
}

impl Subscriber {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            rooms: Arc::new(DashSet::new()),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn join(&self, room: Topic) {
        if room != Topic::Global {
            self.rooms.insert(room);
        }
    }

    pub fn leave(&self, room: &Topic) {
        self.rooms.remove(room);
    }

    pub fn accepts(&self, envelope: &Envelope) -> bool {
        if envelope.origin == Some(self.id) {
            return false;
        }
        envelope.room == Topic::Global || self.rooms.contains(&envelope.room)
    }
}
