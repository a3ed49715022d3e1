//! `GET /ws`: pushes `new-purchase` events to the back office as they happen.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};

use super::ApiState;
use crate::broadcast::PurchaseEvent;

pub async fn subscribe(ws: WebSocketUpgrade, State(state): State<Arc<ApiState>>) -> Response {
    let events = state.broadcaster.subscribe();
    ws.on_upgrade(move |socket| forward(socket, events))
}

async fn forward(socket: WebSocket, mut events: tokio::sync::broadcast::Receiver<PurchaseEvent>) {
    info!("WebSocket subscriber connected");
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            warn!("Failed to encode purchase event: {e}");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "WebSocket subscriber lagging, events dropped");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(other)) => debug!("Ignoring client message: {other:?}"),
            },
        }
    }

    info!("WebSocket subscriber disconnected");
}
