// WebSocket fleet stream: current snapshot on connect, then every fleet event

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::coordinator::FleetEvent;
use crate::models::FleetSnapshot;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements ws_fleet connection count on drop (connect = +1, drop = -1).
struct WsFleetGuard(Arc<AtomicUsize>);

impl Drop for WsFleetGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, std::sync::atomic::Ordering::Relaxed);
    }
}

pub(super) async fn ws_fleet(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let coordinator = state.coordinator.clone();
    let conn_count = state.ws_fleet_connections.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading the published snapshot so no event slips between them.
        let mut rx = coordinator.subscribe();
        let current = coordinator.published().await;
        if let Err(e) = stream_fleet(socket, &mut rx, conn_count, current).await {
            tracing::info!("Fleet stream error: {}", e);
        }
    })
}

async fn send_json(socket: &mut WebSocket, json: String) -> bool {
    let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Text(json.into()))).await;
    matches!(r, Ok(Ok(())))
}

async fn stream_fleet(
    mut socket: WebSocket,
    rx: &mut broadcast::Receiver<FleetEvent>,
    conn_count: Arc<AtomicUsize>,
    current: Option<Arc<FleetSnapshot>>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let _guard = WsFleetGuard(conn_count);
    tracing::info!("Client connected to fleet stream");

    if let Some(snapshot) = current {
        let welcome = FleetEvent::Snapshot(snapshot.as_ref().clone());
        if !send_json(&mut socket, serde_json::to_string(&welcome)?).await {
            return Ok(());
        }
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(event) => {
                        if !send_json(&mut socket, serde_json::to_string(&event)?).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/fleet client lagged, skipped {} events", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                let r = timeout(WS_SEND_TIMEOUT, socket.send(Message::Ping(Bytes::new()))).await;
                if !matches!(r, Ok(Ok(()))) {
                    break;
                }
            }
        }
    }
    Ok(())
}
