//! WebSocket connection handlers.

use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::{
        ConnectInfo, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{domain::ConnectionId, ui::state::AppState, usecase::Connection};

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
) -> impl IntoResponse {
    let remote_address = addr.ip().to_string();
    tracing::debug!("WebSocket upgrade requested from {}", addr);

    ws.max_message_size(state.max_frame_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state, remote_address))
}

/// Spawns a task that receives frames from the rx channel and pushes them to the WebSocket sender.
///
/// The loop ends once every sender of `rx` is dropped (the connection was unregistered
/// from the MessagePusher) or the socket fails. A close frame is sent on the way out.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sender.send(Message::Text(frame.into())).await.is_err() {
                return;
            }
        }
        let _ = sender.close().await;
    })
}

/// Abort a task and wait until it has stopped.
///
/// `abort` alone does not wait for a poll already running on another worker, which
/// could still register a session after the connection has been torn down.
async fn stop_task(task: &mut JoinHandle<()>) {
    task.abort();
    let _ = task.await;
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, remote_address: String) {
    let connection_id = ConnectionId::generate();
    tracing::info!("Connection '{}' opened from {}", connection_id, remote_address);

    // Create a channel for this connection to receive frames
    let (tx, rx) = mpsc::unbounded_channel();
    state
        .message_pusher
        .register_connection(connection_id, tx)
        .await;

    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender);

    let mut connection = Connection::new(connection_id, remote_address);
    state.dispatcher.greet(&connection).await;

    // Spawn a task to receive frames from this connection
    let dispatcher = state.dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection.id(), e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    dispatcher.dispatch(&mut connection, text.as_str()).await;
                    if connection.is_closed() {
                        break;
                    }
                }
                Message::Binary(_) => {
                    dispatcher.reject_binary(&connection).await;
                }
                Message::Close(_) => {
                    tracing::debug!("Connection '{}' sent close frame", connection.id());
                    break;
                }
                Message::Ping(_) | Message::Pong(_) => {}
            }
        }
    });

    // Wait for either task to finish
    let send_finished = tokio::select! {
        _ = &mut send_task => {
            stop_task(&mut recv_task).await;
            true
        },
        _ = &mut recv_task => false,
    };

    // セッションを削除（disconnect メッセージで削除済みなら何もしない）
    state.dispatcher.connection_closed(connection_id).await;
    state
        .message_pusher
        .unregister_connection(&connection_id)
        .await;

    // 送信チャンネルが閉じられたので、残りのフレームを送り切ってから終了する
    if !send_finished {
        let _ = send_task.await;
    }

    tracing::info!("Connection '{}' closed", connection_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use tokio::sync::oneshot;

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stop_task_waits_for_running_poll() {
        // テスト項目: 実行中のタスクを停止すると、実行中の処理が終わるまで待機する
        // given (前提条件):
        let (started_tx, started_rx) = oneshot::channel();
        let finished = Arc::new(AtomicBool::new(false));
        let finished_in_task = finished.clone();
        let mut task = tokio::spawn(async move {
            let _ = started_tx.send(());
            // 別のワーカーで poll 中の処理（abort では中断されない）
            std::thread::sleep(Duration::from_millis(100));
            finished_in_task.store(true, Ordering::SeqCst);
            std::future::pending::<()>().await;
        });
        started_rx.await.unwrap();

        // when (操作):
        stop_task(&mut task).await;

        // then (期待する結果):
        assert!(finished.load(Ordering::SeqCst));
        assert!(task.is_finished());
    }
}
