//! Integration tests for the relay: a real server on an ephemeral port driven by
//! WebSocket clients and HTTP requests.

use std::{net::SocketAddr, time::Duration};

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::{net::TcpListener, sync::oneshot};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite::Message};
use tsudoi_server::{
    config::{PresenceSettings, RelayConfig},
    ui::Server,
};

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Helper struct to manage the in-process server lifecycle
struct TestServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    async fn start() -> Self {
        Self::start_with(RelayConfig::default()).await
    }

    async fn start_with(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let server = Server::from_config(&config);
        tokio::spawn(async move {
            server
                .serve(listener, async move {
                    let _ = shutdown_rx.await;
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown: Some(shutdown_tx),
        }
    }

    fn ws_url(&self) -> String {
        format!("ws://{}/ws", self.addr)
    }

    fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Helper struct wrapping one WebSocket client
struct TestClient {
    ws: WsStream,
}

impl TestClient {
    /// Connect and consume the greeting
    async fn connect(server: &TestServer) -> Self {
        let (ws, _) = tokio_tungstenite::connect_async(server.ws_url())
            .await
            .expect("Failed to connect to WebSocket");
        let mut client = Self { ws };
        let greeting = client.recv().await;
        assert_eq!(greeting["type"], "server");
        assert_eq!(greeting["content"], "connection established");
        client
    }

    /// Connect, register and consume the registration reply
    async fn register(server: &TestServer, name: &str) -> Self {
        let mut client = Self::connect(server).await;
        client
            .send(json!({"type": "register", "sender": name}))
            .await;
        let reply = client.recv().await;
        assert_eq!(reply["type"], "register_success", "unexpected reply: {reply}");
        client
    }

    async fn send(&mut self, envelope: Value) {
        self.ws
            .send(Message::Text(envelope.to_string().into()))
            .await
            .unwrap();
    }

    async fn recv(&mut self) -> Value {
        self.try_recv(Duration::from_secs(2))
            .await
            .expect("Expected a message within timeout")
    }

    /// Next text frame as JSON, or `None` on timeout or close
    async fn try_recv(&mut self, timeout: Duration) -> Option<Value> {
        loop {
            match tokio::time::timeout(timeout, self.ws.next()).await {
                Ok(Some(Ok(Message::Text(text)))) => {
                    return Some(serde_json::from_str(text.as_str()).unwrap());
                }
                Ok(Some(Ok(Message::Ping(_) | Message::Pong(_)))) => continue,
                _ => return None,
            }
        }
    }

    async fn expect_silence(&mut self) {
        let next = self.try_recv(Duration::from_millis(200)).await;
        assert!(next.is_none(), "Expected no message, got: {next:?}");
    }
}

#[tokio::test]
async fn test_register_and_duplicate_name() {
    // テスト項目: 登録に成功し、同じ名前での登録は error になる
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::connect(&server).await;

    // when (操作):
    alice
        .send(json!({"type": "register", "sender": "alice"}))
        .await;
    let first = alice.recv().await;
    let mut impostor = TestClient::connect(&server).await;
    impostor
        .send(json!({"type": "register", "sender": "alice"}))
        .await;
    let second = impostor.recv().await;

    // then (期待する結果):
    assert_eq!(first["type"], "register_success");
    assert_eq!(first["sender"], "server");
    assert_eq!(first["content"], json!(["alice"]));
    assert_eq!(second["type"], "error");
    assert_eq!(second["content"], "user name 'alice' is already taken");
}

#[tokio::test]
async fn test_broadcast_reaches_all_including_sender() {
    // テスト項目: broadcast が送信者を含む全員に届く
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::register(&server, "alice").await;
    let mut bob = TestClient::register(&server, "bob").await;

    // when (操作):
    alice
        .send(json!({"type": "broadcast", "sender": "alice", "content": "hello"}))
        .await;

    // then (期待する結果):
    for client in [&mut alice, &mut bob] {
        let message = client.recv().await;
        assert_eq!(message["type"], "broadcast");
        assert_eq!(message["sender"], "alice");
        assert_eq!(message["content"], "hello");
        assert!(message["timestamp"].is_string());
    }
}

#[tokio::test]
async fn test_private_to_missing_user() {
    // テスト項目: 存在しない相手への private は送信者に error が返り、他の人には何も届かない
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::register(&server, "alice").await;
    let mut bob = TestClient::register(&server, "bob").await;

    // when (操作):
    bob.send(json!({"type": "private", "sender": "bob", "target": "carol", "content": "psst"}))
        .await;

    // then (期待する結果):
    let reply = bob.recv().await;
    assert_eq!(reply["type"], "error");
    assert_eq!(reply["content"], "user 'carol' not found");
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_invalid_status_and_malformed_json() {
    // テスト項目: 不正なステータス値や JSON には error が返り、接続は維持される
    // given (前提条件):
    let server = TestServer::start().await;
    let mut alice = TestClient::register(&server, "alice").await;

    // when (操作):
    alice
        .send(json!({"type": "change_status", "sender": "alice", "content": "FOO"}))
        .await;
    let status_reply = alice.recv().await;
    alice
        .ws
        .send(Message::Text("{not json".to_string().into()))
        .await
        .unwrap();
    let malformed_reply = alice.recv().await;
    alice
        .send(json!({"type": "list_users", "sender": "alice"}))
        .await;
    let listing = alice.recv().await;

    // then (期待する結果):
    assert_eq!(status_reply["type"], "error");
    assert_eq!(malformed_reply["type"], "error");
    assert_eq!(listing["type"], "list_users_response");
    assert_eq!(listing["content"], json!(["alice"]));
}

#[tokio::test]
async fn test_abrupt_close_announces_departure() {
    // テスト項目: 突然切断されたユーザーのセッションが削除され、残りの全員に通知される
    // given (前提条件):
    let server = TestServer::start().await;
    let alice = TestClient::register(&server, "alice").await;
    let mut bob = TestClient::register(&server, "bob").await;

    // when (操作):
    drop(alice);

    // then (期待する結果):
    let notice = bob.recv().await;
    assert_eq!(notice["type"], "user_disconnected");
    assert_eq!(notice["content"], "alice");
    bob.send(json!({"type": "list_users"})).await;
    assert_eq!(bob.recv().await["content"], json!(["bob"]));
}

#[tokio::test]
async fn test_idle_user_is_announced_inactive() {
    // テスト項目: 無言のユーザーが INACTIVE になり、全員に status_update が一度だけ届く
    // given (前提条件):
    let config = RelayConfig {
        presence: PresenceSettings {
            idle_threshold: Duration::from_secs(1),
            poll_interval: Duration::from_millis(200),
        },
        ..RelayConfig::default()
    };
    let server = TestServer::start_with(config).await;
    let mut alice = TestClient::register(&server, "alice").await;

    // when (操作):
    let update = alice.try_recv(Duration::from_secs(3)).await;

    // then (期待する結果):
    let update = update.expect("Expected a status_update");
    assert_eq!(update["type"], "status_update");
    assert_eq!(
        update["content"],
        json!({"user": "alice", "status": "INACTIVE"})
    );
    alice.expect_silence().await;
}

#[tokio::test]
async fn test_health_check() {
    // テスト項目: /api/health が ok を返す
    // given (前提条件):
    let server = TestServer::start().await;

    // when (操作):
    let response = reqwest::get(server.http_url("/api/health")).await.unwrap();

    // then (期待する結果):
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"status": "ok"}));
}

#[tokio::test]
async fn test_users_endpoint_lists_sessions() {
    // テスト項目: /api/users が登録済みユーザーを名前順に返す
    // given (前提条件):
    let server = TestServer::start().await;
    let _carol = TestClient::register(&server, "carol").await;
    let mut alice = TestClient::register(&server, "alice").await;
    alice
        .send(json!({"type": "change_status", "content": "BUSY"}))
        .await;
    alice.recv().await;

    // when (操作):
    let users: Value = reqwest::get(server.http_url("/api/users"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // then (期待する結果):
    let users = users.as_array().unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(users[0]["name"], "alice");
    assert_eq!(users[0]["status"], "BUSY");
    assert_eq!(users[0]["remote_address"], "127.0.0.1");
    assert_eq!(users[1]["name"], "carol");
    assert_eq!(users[1]["status"], "ACTIVE");
}
