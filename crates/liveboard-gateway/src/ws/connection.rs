use axum::{
    extract::{ws::Message, ws::WebSocket, State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use liveboard_core::{config::MAX_PAYLOAD_BYTES, types::ConnId, LiveboardError};
use liveboard_protocol::frames::ResFrame;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::app::AppState;
use crate::ws::{handlers, message};

/// Frames above this are refused by the WS codec itself. Anything between
/// `MAX_PAYLOAD_BYTES` and this gets a `PAYLOAD_TOO_LARGE` response first.
const TRANSPORT_FRAME_CAP: usize = 4 * MAX_PAYLOAD_BYTES;

/// Axum handler: upgrades HTTP to WebSocket at GET /ws.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.max_message_size(TRANSPORT_FRAME_CAP)
        .on_upgrade(|socket| run_connection(socket, state))
}

/// Per-connection event loop: lives for the entire WS session.
///
/// The socket sink is written only from this loop. Broadcasts and responses
/// both arrive on the bounded outbound queue the hub and handlers share.
async fn run_connection(socket: WebSocket, state: Arc<AppState>) {
    let conn_id = ConnId::new();
    info!(conn_id = %conn_id, "new WS connection");

    let (mut sink, mut stream) = socket.split();
    let (out_tx, mut out_rx) = mpsc::channel::<String>(state.config.session.outbound_buffer);

    if let Err(e) = state.hub.register(conn_id.clone(), out_tx.clone()).await {
        warn!(conn_id = %conn_id, error = %e, "could not subscribe connection");
        let _ = sink.send(Message::Close(None)).await;
        return;
    }

    let heartbeat = Duration::from_secs(state.config.session.heartbeat_secs);
    let idle_timeout = Duration::from_secs(state.config.session.idle_timeout_secs);
    let mut tick = tokio::time::interval_at(Instant::now() + heartbeat, heartbeat);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut last_seen = Instant::now();

    loop {
        tokio::select! {
            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        last_seen = Instant::now();
                        if text.len() > MAX_PAYLOAD_BYTES {
                            warn!(conn_id = %conn_id, size = text.len(), "payload too large");
                            let err = LiveboardError::PayloadTooLarge {
                                size: text.len(),
                                max: MAX_PAYLOAD_BYTES,
                            };
                            let res: ResFrame = handlers::error_res("", &err);
                            if let Ok(json) = serde_json::to_string(&res) {
                                let _ = sink.send(Message::Text(json.into())).await;
                            }
                            break;
                        }
                        message::handle(conn_id.as_str(), &text, &out_tx, &state).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        last_seen = Instant::now();
                        if sink.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) | Some(Ok(Message::Binary(_))) => {
                        last_seen = Instant::now();
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        debug!(conn_id = %conn_id, error = %e, "WS read error");
                        break;
                    }
                }
            }

            outbound = out_rx.recv() => {
                // out_tx is held by this loop, so the queue never closes here.
                let Some(payload) = outbound else { break };
                if sink.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }

            _ = tick.tick() => {
                if last_seen.elapsed() > idle_timeout {
                    warn!(conn_id = %conn_id, idle_secs = last_seen.elapsed().as_secs(), "client unresponsive, closing");
                    break;
                }
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }
        }
    }

    state.hub.unregister(conn_id.clone()).await;
    let _ = sink.close().await;
    info!(conn_id = %conn_id, "WS connection closed");
}
