//! End-to-end tests for the chat service.
//!
//! Each test starts a real server on port 0 and drives it with
//! tokio-tungstenite clients carrying signed tokens, so the full path from
//! handshake authentication to broadcast delivery is exercised over the wire.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use tendril_server::auth::{TokenVerifier, issue_token};
use tendril_server::domain::MessageRepository;
use tendril_server::infrastructure::registry::ConnectionRegistry;
use tendril_server::infrastructure::repository::InMemoryMessageRepository;
use tendril_server::ui::{Server, state::AppState};
use tendril_server::usecase::{
    ConnectClientUseCase, DisconnectClientUseCase, GetHistoryUseCase, SendMessageUseCase,
};

const SECRET: &str = "e2e-test-secret";

type Ws = WebSocketStream<MaybeTlsStream<TcpStream>>;

// ============================================================================
// Test infrastructure
// ============================================================================

/// Start a server on port 0 and return its address plus a handle on the
/// message store for direct assertions.
async fn start_server(echo_to_sender: bool) -> (String, Arc<InMemoryMessageRepository>) {
    let repository = Arc::new(InMemoryMessageRepository::new());
    let registry = Arc::new(ConnectionRegistry::new());

    let state = Arc::new(AppState {
        verifier: TokenVerifier::new(SECRET),
        connect_client_usecase: Arc::new(ConnectClientUseCase::new(registry.clone())),
        disconnect_client_usecase: Arc::new(DisconnectClientUseCase::new(registry.clone())),
        send_message_usecase: Arc::new(SendMessageUseCase::new(
            repository.clone(),
            registry.clone(),
            echo_to_sender,
        )),
        get_history_usecase: Arc::new(GetHistoryUseCase::new(repository.clone())),
    });

    let app = Server::new(state).router();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("127.0.0.1:{}", addr.port()), repository)
}

fn token_for(username: &str) -> String {
    issue_token(SECRET, &format!("u-{username}"), username, None, 3600).unwrap()
}

/// Open a WebSocket connection, optionally carrying a token header and a
/// query string (e.g. `"?garden=g1&channel=general"`).
async fn connect(addr: &str, token: Option<&str>, query: &str) -> Ws {
    let url = format!("ws://{addr}/ws{query}");
    let mut request = url.into_client_request().unwrap();
    if let Some(token) = token {
        request
            .headers_mut()
            .insert("x-authorization", HeaderValue::from_str(token).unwrap());
    }
    let (ws, _) = connect_async(request).await.unwrap();
    ws
}

async fn connect_as(addr: &str, username: &str) -> Ws {
    connect(addr, Some(&token_for(username)), "").await
}

async fn send_text(ws: &mut Ws, content: &str) {
    let frame = serde_json::json!({ "message": content }).to_string();
    ws.send(Message::Text(frame.into())).await.unwrap();
}

/// Receive the next text frame as JSON.
async fn recv_json(ws: &mut Ws) -> Value {
    let msg = timeout(Duration::from_secs(3), ws.next())
        .await
        .expect("Timeout waiting for message")
        .expect("Stream ended")
        .expect("WebSocket error");

    match msg {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("Expected Text message, got {:?}", other),
    }
}

/// Try to receive a text frame with a short timeout. Returns None if nothing
/// arrives.
async fn try_recv(ws: &mut Ws) -> Option<Value> {
    match timeout(Duration::from_millis(200), ws.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => serde_json::from_str(text.as_str()).ok(),
        _ => None,
    }
}

/// Receive the next frame and assert it is a Close with the given code.
async fn expect_close(ws: &mut Ws, code: u16) {
    let msg = timeout(Duration::from_secs(3), ws.next())
        .await
        .expect("Timeout waiting for close")
        .expect("Stream ended without a close frame")
        .expect("WebSocket error");

    match msg {
        Message::Close(Some(frame)) => assert_eq!(u16::from(frame.code), code),
        other => panic!("Expected Close({}), got {:?}", code, other),
    }
}

// ============================================================================
// Tests: handshake authentication
// ============================================================================

#[tokio::test]
async fn test_connection_without_credential_is_closed_with_4001() {
    let (addr, _) = start_server(true).await;

    let mut ws = connect(&addr, None, "").await;

    expect_close(&mut ws, 4001).await;
}

#[tokio::test]
async fn test_connection_with_invalid_token_is_closed_with_4002() {
    let (addr, _) = start_server(true).await;

    let forged = issue_token("wrong-secret", "u-1", "mallory", None, 3600).unwrap();
    let mut ws = connect(&addr, Some(&forged), "").await;

    expect_close(&mut ws, 4002).await;
}

#[tokio::test]
async fn test_connection_with_expired_token_is_closed_with_4002() {
    let (addr, _) = start_server(true).await;

    let expired = issue_token(SECRET, "u-1", "alice", None, -3600).unwrap();
    let mut ws = connect(&addr, Some(&expired), "").await;

    expect_close(&mut ws, 4002).await;
}

#[tokio::test]
async fn test_token_from_cookie_is_accepted() {
    let (addr, _) = start_server(true).await;

    let url = format!("ws://{addr}/ws");
    let mut request = url.into_client_request().unwrap();
    let cookie = format!("theme=dark; token={}", token_for("alice"));
    request
        .headers_mut()
        .insert("cookie", HeaderValue::from_str(&cookie).unwrap());
    let (mut ws, _) = connect_async(request).await.unwrap();

    // An authenticated connection receives its own broadcasts
    send_text(&mut ws, "hello from cookie auth").await;
    let msg = recv_json(&mut ws).await;
    assert_eq!(msg["payload"]["content"], "hello from cookie auth");

    ws.close(None).await.ok();
}

// ============================================================================
// Tests: message flow
// ============================================================================

#[tokio::test]
async fn test_message_is_broadcast_to_all_connections() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    send_text(&mut alice, "hi").await;

    for ws in [&mut alice, &mut bob] {
        let msg = recv_json(ws).await;
        assert_eq!(msg["type"], "text");
        assert_eq!(msg["payload"]["content"], "hi");
        assert_eq!(msg["payload"]["author"]["username"], "alice");
        assert_eq!(msg["payload"]["author"]["id"], "u-alice");
        // RFC 3339 UTC timestamp
        let ts = msg["payload"]["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'), "timestamp should be UTC: {}", ts);
    }

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

#[tokio::test]
async fn test_author_identity_comes_from_token_not_payload() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    // A spoofed author field in the frame must be ignored
    let frame = serde_json::json!({
        "message": "trust me",
        "author": { "_id": "u-admin", "username": "admin" }
    })
    .to_string();
    alice.send(Message::Text(frame.into())).await.unwrap();

    let msg = recv_json(&mut bob).await;
    assert_eq!(msg["payload"]["content"], "trust me");
    assert_eq!(msg["payload"]["author"]["username"], "alice");

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

#[tokio::test]
async fn test_malformed_frame_is_dropped_and_connection_stays_open() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    // Not JSON, then JSON without the message field, then whitespace content
    alice
        .send(Message::Text("not json at all".into()))
        .await
        .unwrap();
    alice
        .send(Message::Text(r#"{"other":"field"}"#.into()))
        .await
        .unwrap();
    send_text(&mut alice, "   ").await;

    assert!(try_recv(&mut bob).await.is_none(), "bad frames must not be delivered");

    // The connection is still live after the bad frames
    send_text(&mut alice, "still here").await;
    let msg = recv_json(&mut bob).await;
    assert_eq!(msg["payload"]["content"], "still here");

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

#[tokio::test]
async fn test_messages_from_one_sender_arrive_in_order() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    for i in 0..5 {
        send_text(&mut alice, &format!("msg-{i}")).await;
    }

    for i in 0..5 {
        let msg = recv_json(&mut bob).await;
        assert_eq!(msg["payload"]["content"], format!("msg-{i}"));
    }

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

#[tokio::test]
async fn test_no_echo_mode_excludes_sender() {
    let (addr, _) = start_server(false).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    send_text(&mut alice, "one way").await;

    let msg = recv_json(&mut bob).await;
    assert_eq!(msg["payload"]["content"], "one way");
    assert!(try_recv(&mut alice).await.is_none(), "sender must not be echoed");

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

#[tokio::test]
async fn test_disconnected_client_no_longer_receives() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    let mut bob = connect_as(&addr, "bob").await;

    bob.close(None).await.unwrap();
    // Let the server process the close and deregister
    tokio::time::sleep(Duration::from_millis(100)).await;

    send_text(&mut alice, "anyone there?").await;
    let msg = recv_json(&mut alice).await;
    assert_eq!(msg["payload"]["content"], "anyone there?");

    alice.close(None).await.ok();
}

// ============================================================================
// Tests: channel scoping
// ============================================================================

#[tokio::test]
async fn test_scoped_message_only_reaches_same_channel() {
    let (addr, _) = start_server(true).await;

    let scope = "?garden=g1&channel=general";
    let mut alice = connect(&addr, Some(&token_for("alice")), scope).await;
    let mut bob = connect(&addr, Some(&token_for("bob")), scope).await;
    let mut carol = connect(&addr, Some(&token_for("carol")), "?garden=g1&channel=tomatoes").await;
    let mut dave = connect_as(&addr, "dave").await;

    send_text(&mut alice, "general chatter").await;

    let msg = recv_json(&mut bob).await;
    assert_eq!(msg["payload"]["content"], "general chatter");
    assert!(try_recv(&mut carol).await.is_none(), "other channel must not receive");
    assert!(try_recv(&mut dave).await.is_none(), "global room must not receive");

    for ws in [&mut alice, &mut bob, &mut carol, &mut dave] {
        ws.close(None).await.ok();
    }
}

#[tokio::test]
async fn test_partial_scope_query_falls_back_to_global_room() {
    let (addr, _) = start_server(true).await;

    // Only `garden` given; the connection should land in the global room
    let mut alice = connect(&addr, Some(&token_for("alice")), "?garden=g1").await;
    let mut bob = connect_as(&addr, "bob").await;

    send_text(&mut alice, "global after all").await;
    let msg = recv_json(&mut bob).await;
    assert_eq!(msg["payload"]["content"], "global after all");

    alice.close(None).await.ok();
    bob.close(None).await.ok();
}

// ============================================================================
// Tests: persistence and HTTP API
// ============================================================================

#[tokio::test]
async fn test_messages_are_persisted_before_delivery() {
    let (addr, repository) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    send_text(&mut alice, "for the record").await;
    let _ = recv_json(&mut alice).await;

    let stored = repository.list(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].content.as_str(), "for the record");
    assert_eq!(stored[0].sender_username, "alice");

    alice.close(None).await.ok();
}

#[tokio::test]
async fn test_history_endpoint_returns_stored_messages() {
    let (addr, _) = start_server(true).await;

    let mut alice = connect_as(&addr, "alice").await;
    send_text(&mut alice, "first").await;
    let _ = recv_json(&mut alice).await;
    send_text(&mut alice, "second").await;
    let _ = recv_json(&mut alice).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/messages"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let messages = body.as_array().unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0]["content"], "first");
    assert_eq!(messages[1]["content"], "second");
    assert_eq!(messages[0]["senderUsername"], "alice");
    assert_eq!(messages[0]["senderId"], "u-alice");

    alice.close(None).await.ok();
}

#[tokio::test]
async fn test_history_endpoint_rejects_partial_scope() {
    let (addr, _) = start_server(true).await;

    let response = reqwest::get(format!("http://{addr}/api/messages?garden=g1"))
        .await
        .unwrap();

    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_check() {
    let (addr, _) = start_server(true).await;

    let body: Value = reqwest::get(format!("http://{addr}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["status"], "ok");
}
