use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::SinkExt;
use futures::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

use crate::events::{ClientMessage, EventBus, RelayEvent, Subscriber};
use crate::state::AppState;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let (subscriber, rx) = state.events.subscribe();
    let connection_id = subscriber.id();

    info!(connection_id = %connection_id, "websocket client connected");

    let outbound = subscriber.clone();
    let send_task = tokio::spawn(async move {
        let mut events = BroadcastStream::new(rx);
        while let Some(result) = events.next().await {
            let envelope = match result {
                Ok(envelope) => envelope,
                Err(err) => {
                    warn!(error = %err, "websocket subscriber lagged; events skipped");
                    continue;
                }
            };

            if !outbound.accepts(&envelope) {
                continue;
            }

            let json = match serde_json::to_string(&envelope) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize event for ws");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let bus = state.events.clone();
    let recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => handle_client_message(&bus, &subscriber, &text),
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = send_task => {},
        _ = recv_task => {},
    }

    info!(connection_id = %connection_id, "websocket client disconnected");
}

fn handle_client_message(bus: &EventBus, subscriber: &Subscriber, text: &str) {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(err) => {
            debug!(error = %err, "ignoring malformed client message");
            return;
        }
    };

    match message {
        ClientMessage::Join { room } => {
            debug!(connection_id = %subscriber.id(), room = %room, "joined room");
            subscriber.join(room);
        }
        ClientMessage::Leave { room } => subscriber.leave(&room),
        ClientMessage::Emit { room, event, data } => {
            let Some(relay) = RelayEvent::parse(&event, data) else {
                debug!(event = %event, "ignoring unknown client event");
                return;
            };
            if !relay.allowed_in(&room) {
                warn!(event = %event, room = %room, "client event not allowed in room");
                return;
            }
            bus.relay(subscriber, room, relay);
        }
    }
}
