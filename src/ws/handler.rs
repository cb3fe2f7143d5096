//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::app::AppState;
use crate::game::{PlayerInput, SessionEvent};
use crate::util::rate_limit::ConnectionRateLimiter;
use crate::util::time::unix_millis;
use crate::ws::protocol::{ClientMsg, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let player_id = Uuid::new_v4();
    info!(player_id = %player_id, "New WebSocket connection");

    let (ws_sink, ws_stream) = socket.split();

    // Per-connection outbound channel; the session registers the sender on
    // join and drops it to close the socket
    let (out_tx, out_rx) = mpsc::unbounded_channel::<ServerMsg>();

    let writer_handle = tokio::spawn(write_outbound(ws_sink, out_rx, player_id));

    read_inbound(ws_stream, player_id, out_tx, &state).await;

    // Signal disconnect to the session task
    let _ = state
        .session
        .events_tx
        .send(SessionEvent::Disconnected { player_id })
        .await;

    writer_handle.abort();

    info!(player_id = %player_id, "WebSocket connection closed");
}

/// Writer task: session messages -> WebSocket. Ends (closing the socket)
/// when the session drops the connection's sender.
async fn write_outbound(
    mut sink: SplitSink<WebSocket, Message>,
    mut out_rx: mpsc::UnboundedReceiver<ServerMsg>,
    player_id: Uuid,
) {
    while let Some(msg) = out_rx.recv().await {
        match serde_json::to_string(&msg) {
            Ok(json) => {
                if let Err(e) = sink.send(Message::Text(json)).await {
                    debug!(player_id = %player_id, error = %e, "WebSocket send failed");
                    return;
                }
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "Failed to serialize message");
            }
        }
    }

    // Session closed the connection; say goodbye properly
    let _ = sink.send(Message::Close(None)).await;
}

/// Reader loop: WebSocket -> session task
async fn read_inbound(
    mut ws_stream: SplitStream<WebSocket>,
    player_id: Uuid,
    out_tx: mpsc::UnboundedSender<ServerMsg>,
    state: &AppState,
) {
    let rate_limiter = ConnectionRateLimiter::new();
    // The outbound sender is handed to the session on join; a connection
    // holds it only until then
    let mut pending_tx = Some(out_tx);

    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                if !rate_limiter.check_input() {
                    warn!(player_id = %player_id, "Rate limited input message");
                    continue;
                }

                let client_msg = match serde_json::from_str::<ClientMsg>(&text) {
                    Ok(msg) => msg,
                    Err(e) => {
                        warn!(player_id = %player_id, error = %e, "Failed to parse client message");
                        continue;
                    }
                };

                let event = match client_msg {
                    ClientMsg::Join { name } => match pending_tx.take() {
                        Some(tx) => SessionEvent::Joined {
                            player_id,
                            name,
                            tx,
                        },
                        None => {
                            warn!(player_id = %player_id, "Duplicate join ignored");
                            continue;
                        }
                    },
                    msg => {
                        if pending_tx.is_some() {
                            warn!(player_id = %player_id, "Message before join ignored");
                            continue;
                        }
                        SessionEvent::Message(PlayerInput {
                            player_id,
                            msg,
                            received_at: unix_millis(),
                        })
                    }
                };

                if state.session.events_tx.send(event).await.is_err() {
                    debug!(player_id = %player_id, "Session channel closed");
                    break;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!(player_id = %player_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                debug!(player_id = %player_id, "Received ping/pong");
            }
            Ok(Message::Close(_)) => {
                info!(player_id = %player_id, "Client initiated close");
                break;
            }
            Err(e) => {
                error!(player_id = %player_id, error = %e, "WebSocket error");
                break;
            }
        }
    }
}
