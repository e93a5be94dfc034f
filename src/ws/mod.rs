use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RouterHealthy,
    RouterUnhealthy,
}

/// Health transition pushed to every connected client
#[derive(Debug, Clone, Serialize)]
pub struct RouterHealthEvent<'a> {
    #[serde(rename = "type")]
    pub event_type: EventType,
    pub name: &'a str,
    pub timestamp: DateTime<Utc>,
}

/// Fan-out of health events to WebSocket clients
pub struct Hub {
    tx: broadcast::Sender<String>,
}

impl Hub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(256);
        Self { tx }
    }

    /// Broadcast a router health transition; a no-op with no clients
    pub fn broadcast_router_health(&self, name: &str, healthy: bool) {
        let clients = self.tx.receiver_count();
        if clients == 0 {
            return;
        }

        let event = RouterHealthEvent {
            event_type: if healthy {
                EventType::RouterHealthy
            } else {
                EventType::RouterUnhealthy
            },
            name,
            timestamp: Utc::now(),
        };
        let data = match serde_json::to_string(&event) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!("Error serializing WebSocket event: {}", e);
                return;
            }
        };

        if self.tx.send(data).is_ok() {
            tracing::debug!("Broadcasting {:?} for {} to {} clients", event.event_type, name, clients);
        }
    }
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

/// WebSocket handler for axum
pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<Hub>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<Hub>) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = hub.tx.subscribe();
    tracing::info!("WebSocket client connected. Total clients: {}", hub.tx.receiver_count());

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(msg) => {
                    if sender.send(Message::Text(msg)).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("WebSocket client lagged, skipped {} events", n);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            // Inbound frames are ignored; reading only detects disconnects
            frame = receiver.next() => match frame {
                Some(Ok(_)) => {}
                _ => break,
            },
        }
    }

    drop(rx);
    tracing::info!("WebSocket client disconnected. Total clients: {}", hub.tx.receiver_count());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_subscribers() {
        let hub = Hub::new();
        let mut rx = hub.tx.subscribe();

        hub.broadcast_router_health("edge1", false);

        let msg: serde_json::Value = serde_json::from_str(&rx.recv().await.unwrap()).unwrap();
        assert_eq!(msg["type"], "router_unhealthy");
        assert_eq!(msg["name"], "edge1");
        assert!(msg["timestamp"].is_string());
    }

    #[test]
    fn test_broadcast_without_clients_is_noop() {
        let hub = Hub::new();
        hub.broadcast_router_health("edge1", true);

        let mut rx = hub.tx.subscribe();
        assert!(rx.try_recv().is_err());
    }
}
