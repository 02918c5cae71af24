//! Session registry trait.
//!
//! The registry is the single source of truth for "who is online". The use case layer
//! depends on this trait only; the infrastructure layer provides the implementation.

use async_trait::async_trait;

use super::{ConnectionId, RegistryError, Session, UserName, UserStatus};

/// Concurrency-safe store of registered sessions.
///
/// Every operation is serialized against every other one: readers observe a state
/// consistent with some ordering of the mutations, and returned collections are
/// copies that do not change after the call.
#[async_trait]
pub trait SessionRegistry: Send + Sync {
    /// Register a new session and start its presence watchdog.
    ///
    /// Fails without mutating state if the name is taken, the connection is already
    /// bound, or the registry is at capacity.
    async fn register(
        &self,
        name: UserName,
        connection: ConnectionId,
        remote_address: String,
    ) -> Result<Session, RegistryError>;

    /// Remove the session bound to `connection` and stop its watchdog.
    ///
    /// Returns `None` if no session is bound (repeated close events are harmless).
    async fn remove(&self, connection: &ConnectionId) -> Option<Session>;

    async fn find(&self, name: &str) -> Option<Session>;

    async fn find_by_connection(&self, connection: &ConnectionId) -> Option<Session>;

    /// Update last activity of the session bound to `connection`; no-op if none
    async fn touch(&self, connection: &ConnectionId);

    /// Update the status of `name`. Returns `false` if no such session exists.
    async fn set_status(&self, name: &str, status: UserStatus) -> bool;

    /// Registered names, sorted ascending
    async fn snapshot_names(&self) -> Vec<String>;

    /// Registered sessions, sorted by name
    async fn snapshot_sessions(&self) -> Vec<Session>;

    /// Connections of all registered sessions
    async fn all_handles(&self) -> Vec<ConnectionId>;

    async fn count(&self) -> usize;
}
