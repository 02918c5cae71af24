//! InMemory SessionRegistry 実装
//!
//! ドメイン層が定義する SessionRegistry trait の具体的な実装。
//! 全ての状態を 1 つの `Mutex` の内側に置き、登録・削除・参照を直列化します。
//! 名前 → セッション、接続 → 名前の 2 つの HashMap で検索します。

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::{
    sync::{Mutex, mpsc},
    time::Instant,
};

use crate::{
    config::PresenceSettings,
    domain::{
        ConnectionId, PresenceEvent, RegistryError, Session, SessionRegistry, UserName,
        UserStatus,
    },
};

use super::watchdog::Watchdog;

/// Registry state guarded by the single critical section
#[derive(Default)]
pub(super) struct RegistryState {
    pub(super) sessions: HashMap<String, SessionEntry>,
    names_by_connection: HashMap<ConnectionId, String>,
}

pub(super) struct SessionEntry {
    pub(super) session: Session,
    watchdog: Watchdog,
}

impl Drop for RegistryState {
    fn drop(&mut self) {
        for entry in self.sessions.values() {
            entry.watchdog.stop();
        }
    }
}

/// インメモリ SessionRegistry 実装
///
/// 登録時にセッションごとの presence watchdog を起動し、削除時に同じロックの内側で停止します。
/// watchdog が検出したアイドル遷移は `PresenceEvent` としてチャンネルに送られます。
pub struct InMemorySessionRegistry {
    state: Arc<Mutex<RegistryState>>,
    capacity: usize,
    presence: PresenceSettings,
    events: mpsc::UnboundedSender<PresenceEvent>,
}

impl InMemorySessionRegistry {
    /// 新しい InMemorySessionRegistry を作成
    ///
    /// 戻り値の receiver から watchdog のアイドル遷移イベントを受け取ります。
    pub fn new(
        capacity: usize,
        presence: PresenceSettings,
    ) -> (Self, mpsc::UnboundedReceiver<PresenceEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let registry = Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            capacity,
            presence,
            events,
        };
        (registry, receiver)
    }
}

#[async_trait]
impl SessionRegistry for InMemorySessionRegistry {
    async fn register(
        &self,
        name: UserName,
        connection: ConnectionId,
        remote_address: String,
    ) -> Result<Session, RegistryError> {
        let mut state = self.state.lock().await;

        if state.sessions.contains_key(name.as_str()) {
            return Err(RegistryError::DuplicateName(name.into_string()));
        }
        if let Some(bound) = state.names_by_connection.get(&connection) {
            return Err(RegistryError::ConnectionAlreadyBound(bound.clone()));
        }
        if state.sessions.len() >= self.capacity {
            return Err(RegistryError::CapacityExceeded(self.capacity));
        }

        let session = Session::new(name.clone(), connection, remote_address, Instant::now());
        let watchdog = Watchdog::spawn(
            Arc::downgrade(&self.state),
            name.clone(),
            connection,
            self.presence,
            self.events.clone(),
        );
        state
            .names_by_connection
            .insert(connection, name.as_str().to_string());
        state.sessions.insert(
            name.into_string(),
            SessionEntry {
                session: session.clone(),
                watchdog,
            },
        );

        tracing::info!(
            "Session '{}' registered from {} ({} online)",
            session.name,
            session.remote_address,
            state.sessions.len()
        );
        Ok(session)
    }

    async fn remove(&self, connection: &ConnectionId) -> Option<Session> {
        let mut state = self.state.lock().await;
        let name = state.names_by_connection.remove(connection)?;
        let entry = state.sessions.remove(&name)?;
        entry.watchdog.stop();

        tracing::info!(
            "Session '{}' removed ({} online)",
            name,
            state.sessions.len()
        );
        Some(entry.session)
    }

    async fn find(&self, name: &str) -> Option<Session> {
        let state = self.state.lock().await;
        state.sessions.get(name).map(|entry| entry.session.clone())
    }

    async fn find_by_connection(&self, connection: &ConnectionId) -> Option<Session> {
        let state = self.state.lock().await;
        let name = state.names_by_connection.get(connection)?;
        state.sessions.get(name).map(|entry| entry.session.clone())
    }

    async fn touch(&self, connection: &ConnectionId) {
        let mut state = self.state.lock().await;
        let Some(name) = state.names_by_connection.get(connection).cloned() else {
            return;
        };
        if let Some(entry) = state.sessions.get_mut(&name) {
            entry.session.touch(Instant::now());
        }
    }

    async fn set_status(&self, name: &str, status: UserStatus) -> bool {
        let mut state = self.state.lock().await;
        match state.sessions.get_mut(name) {
            Some(entry) => {
                entry.session.status = status;
                true
            }
            None => false,
        }
    }

    async fn snapshot_names(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.sessions.keys().cloned().collect();
        names.sort();
        names
    }

    async fn snapshot_sessions(&self) -> Vec<Session> {
        let state = self.state.lock().await;
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .map(|entry| entry.session.clone())
            .collect();
        sessions.sort_by(|a, b| a.name.cmp(&b.name));
        sessions
    }

    async fn all_handles(&self) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        state.names_by_connection.keys().copied().collect()
    }

    async fn count(&self) -> usize {
        let state = self.state.lock().await;
        state.sessions.len()
    }
}
