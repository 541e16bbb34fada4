//! WebSocket connection handlers.
//!
//! One task pair per connection: a receive loop draining inbound frames and a
//! pusher loop draining the connection's outbound queue. Authentication runs
//! before the connection is ever registered; a client with no valid
//! credential is closed with a policy code and never sees a data frame.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, header},
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::domain::{AuthError, ChannelScope, IdentityClaim, MessageContent};
use crate::infrastructure::dto::websocket as codec;
use crate::ui::state::AppState;

/// Close code sent when no credential is presented.
pub const CLOSE_AUTH_REQUIRED: u16 = 4001;
/// Close code sent when a credential is presented but fails verification.
pub const CLOSE_INVALID_TOKEN: u16 = 4002;
/// Close code for internal registration failures.
const CLOSE_INTERNAL_ERROR: u16 = 1011;

/// Upper bound on inbound frame size, enforced before the codec runs.
const MAX_FRAME_LEN: usize = 64 * 1024;

/// Cookie carrying the session token.
const TOKEN_COOKIE: &str = "token";
/// Header alternative for clients that cannot send cookies.
const TOKEN_HEADER: &str = "x-authorization";

/// Query parameters for the WebSocket endpoint. Both must be present to join
/// a channel; otherwise the connection lands in the global room.
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub garden: Option<String>,
    pub channel: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    // Verify the credential from the handshake context before the message
    // loop can start. The outcome travels into the upgraded socket so the
    // failure can be reported with a proper close code.
    let credential = extract_credential(&headers);
    let auth = state.verifier.verify(credential.as_deref());

    let scope = match (query.garden, query.channel) {
        (Some(garden), Some(channel)) => match ChannelScope::new(garden, channel) {
            Ok(scope) => Some(scope),
            Err(e) => {
                tracing::warn!("Ignoring invalid channel scope: {}", e);
                None
            }
        },
        (None, None) => None,
        _ => {
            tracing::warn!("Partial channel scope in query; joining the global room");
            None
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, state, auth, scope))
}

/// Extract the raw credential from the `x-authorization` header or the
/// session cookie.
fn extract_credential(headers: &HeaderMap) -> Option<String> {
    if let Some(value) = headers.get(TOKEN_HEADER) {
        return value.to_str().ok().map(str::to_string);
    }
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == TOKEN_COOKIE)
        .map(|(_, value)| value.to_string())
}

/// Spawn a task that drains the connection's outbound queue into the socket.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, Message>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    mut socket: WebSocket,
    state: Arc<AppState>,
    auth: Result<IdentityClaim, AuthError>,
    scope: Option<ChannelScope>,
) {
    // Authentication gate: close with a distinct code per failure reason and
    // never register the connection.
    let claim = match auth {
        Ok(claim) => claim,
        Err(reason) => {
            let code = match reason {
                AuthError::Missing => CLOSE_AUTH_REQUIRED,
                _ => CLOSE_INVALID_TOKEN,
            };
            tracing::warn!("Rejecting connection ({}): {}", code, reason);
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code,
                    reason: reason.to_string().into(),
                })))
                .await;
            return;
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let connection_id = match state
        .connect_client_usecase
        .execute(claim.clone(), scope.clone(), tx)
        .await
    {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to register connection for '{}': {}", claim.username, e);
            let _ = socket
                .send(Message::Close(Some(CloseFrame {
                    code: CLOSE_INTERNAL_ERROR,
                    reason: "registration failed".into(),
                })))
                .await;
            return;
        }
    };

    tracing::info!(
        "Client '{}' connected as connection {}{}",
        claim.username,
        connection_id,
        scope
            .as_ref()
            .map(|s| format!(" in {s}"))
            .unwrap_or_default()
    );

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let state_clone = state.clone();
    let claim_clone = claim.clone();
    let scope_clone = scope.clone();

    // Receive loop: one inbound frame at a time, so messages from this
    // connection are processed and broadcast in arrival order.
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on connection {}: {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    if text.len() > MAX_FRAME_LEN {
                        tracing::warn!(
                            "Dropping oversized frame ({} bytes) from '{}'",
                            text.len(),
                            claim_clone.username
                        );
                        continue;
                    }

                    // A malformed frame is dropped, not punished; chat is a
                    // best-effort stream and the connection stays open.
                    let frame = match codec::decode(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed frame from '{}': {}",
                                claim_clone.username,
                                e
                            );
                            continue;
                        }
                    };

                    let content = match MessageContent::new(frame.message) {
                        Ok(content) => content,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping frame from '{}': {}",
                                claim_clone.username,
                                e
                            );
                            continue;
                        }
                    };

                    match state_clone
                        .send_message_usecase
                        .execute(connection_id, &claim_clone, content, scope_clone.as_ref())
                        .await
                    {
                        Ok(report) => {
                            if !report.is_fully_delivered() {
                                tracing::warn!(
                                    "Broadcast from '{}' reached {} recipients, {} failed",
                                    claim_clone.username,
                                    report.delivered_count(),
                                    report.failed.len()
                                );
                            }
                        }
                        Err(e) => {
                            tracing::warn!("Failed to send message: {}", e);
                        }
                    }
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping");
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Client '{}' requested close", claim_clone.username);
                    break;
                }
                _ => {}
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Teardown: the entry must never outlive its transport.
    state.disconnect_client_usecase.execute(connection_id).await;
    tracing::info!(
        "Connection {} ('{}') closed and deregistered",
        connection_id,
        claim.username
    );
}
