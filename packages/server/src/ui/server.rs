//! Server execution logic.

use std::{collections::HashMap, future::Future, net::SocketAddr, sync::Arc};

use axum::{Router, routing::get};
use tokio::{net::TcpListener, sync::Mutex, sync::mpsc};
use tower_http::trace::TraceLayer;
use tsudoi_shared::time::{Clock, SystemClock};

use crate::{
    config::RelayConfig,
    domain::{MessagePusher, PresenceEvent, SessionRegistry},
    infrastructure::{message_pusher::WebSocketMessagePusher, registry::InMemorySessionRegistry},
    usecase::{FanOut, PresenceAnnouncer, ProtocolDispatcher},
};

use super::{
    handler::{health_check, list_users, websocket_handler},
    signal::shutdown_signal,
    state::AppState,
};

pub type ServerError = Box<dyn std::error::Error + Send + Sync>;

/// Presence-aware chat relay server
///
/// This struct wires the relay components together and provides methods to run the server.
///
/// # Example
///
/// ```ignore
/// let server = Server::from_config(&RelayConfig::default());
/// server.run("127.0.0.1:8080".to_string()).await?;
/// ```
pub struct Server {
    /// ProtocolDispatcher（受信フレームの処理）
    dispatcher: Arc<ProtocolDispatcher>,
    /// SessionRegistry（セッションの唯一の情報源）
    registry: Arc<dyn SessionRegistry>,
    /// MessagePusher（メッセージ通知の抽象化）
    message_pusher: Arc<dyn MessagePusher>,
    /// PresenceAnnouncer（アイドル遷移の通知）
    announcer: PresenceAnnouncer,
    /// watchdog からのアイドル遷移イベント
    presence_events: mpsc::UnboundedReceiver<PresenceEvent>,
    /// 受信フレームの最大バイト数
    max_frame_bytes: usize,
}

impl Server {
    /// Create a new Server instance
    ///
    /// # Arguments
    ///
    /// * `dispatcher` - Handles inbound frames
    /// * `registry` - Session registry shared with the dispatcher
    /// * `message_pusher` - Per-connection outbound channels
    /// * `announcer` - Fans out idle transitions
    /// * `presence_events` - Receiver of the registry's idle transitions
    /// * `max_frame_bytes` - Inbound frame size limit
    pub fn new(
        dispatcher: Arc<ProtocolDispatcher>,
        registry: Arc<dyn SessionRegistry>,
        message_pusher: Arc<dyn MessagePusher>,
        announcer: PresenceAnnouncer,
        presence_events: mpsc::UnboundedReceiver<PresenceEvent>,
        max_frame_bytes: usize,
    ) -> Self {
        Self {
            dispatcher,
            registry,
            message_pusher,
            announcer,
            presence_events,
            max_frame_bytes,
        }
    }

    /// Build a server from configuration using the system clock
    pub fn from_config(config: &RelayConfig) -> Self {
        Self::from_config_with_clock(config, Arc::new(SystemClock))
    }

    /// Build a server from configuration
    ///
    /// Dependencies are created in order:
    /// 1. SessionRegistry
    /// 2. MessagePusher
    /// 3. FanOut
    /// 4. ProtocolDispatcher and PresenceAnnouncer
    pub fn from_config_with_clock(config: &RelayConfig, clock: Arc<dyn Clock>) -> Self {
        // 1. Create SessionRegistry (in-memory)
        let (registry, presence_events) =
            InMemorySessionRegistry::new(config.max_sessions, config.presence);
        let registry: Arc<dyn SessionRegistry> = Arc::new(registry);

        // 2. Create MessagePusher (WebSocket implementation)
        let message_pusher_connections = Arc::new(Mutex::new(HashMap::new()));
        let message_pusher: Arc<dyn MessagePusher> = Arc::new(WebSocketMessagePusher::new(
            message_pusher_connections,
            config.max_frame_bytes,
        ));

        // 3. Create FanOut
        let fan_out = Arc::new(FanOut::new(registry.clone(), message_pusher.clone()));

        // 4. Create ProtocolDispatcher and PresenceAnnouncer
        let dispatcher = Arc::new(ProtocolDispatcher::new(
            registry.clone(),
            fan_out.clone(),
            clock.clone(),
        ));
        let announcer = PresenceAnnouncer::new(registry.clone(), fan_out, clock);

        Self::new(
            dispatcher,
            registry,
            message_pusher,
            announcer,
            presence_events,
            config.max_frame_bytes,
        )
    }

    /// Run the relay server until Ctrl+C or SIGTERM
    ///
    /// # Arguments
    ///
    /// * `bind_addr` - The `host:port` address to bind to (e.g., "127.0.0.1:8080")
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address or
    /// if there's an error during server execution.
    pub async fn run(self, bind_addr: String) -> Result<(), ServerError> {
        // Bind the server to the host and port
        let listener = TcpListener::bind(&bind_addr).await?;

        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` completes
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let announcer_task = self.announcer.spawn(self.presence_events);

        let app_state = Arc::new(AppState {
            dispatcher: self.dispatcher,
            registry: self.registry,
            message_pusher: self.message_pusher,
            max_frame_bytes: self.max_frame_bytes,
        });
        let app = router(app_state);

        tracing::info!(
            "Tsudoi relay server listening on {}",
            listener.local_addr()?
        );

        let result = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await;

        announcer_task.abort();
        result?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}

fn router(app_state: Arc<AppState>) -> Router {
    Router::new()
        // WebSocket エンドポイント
        .route("/ws", get(websocket_handler))
        // HTTP エンドポイント
        .route("/api/health", get(health_check))
        .route("/api/users", get(list_users))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}
