//! Domain entities.

use std::time::Duration;

use tokio::time::Instant;

use super::value_object::{ConnectionId, UserName, UserStatus};

/// Server-side record of one registered, connected user.
///
/// The session only references its connection by id; the connection itself is owned
/// by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub name: UserName,
    pub status: UserStatus,
    /// Peer address captured at registration time
    pub remote_address: String,
    /// Last time a valid message was received from this session
    pub last_activity: Instant,
    pub connection: ConnectionId,
}

impl Session {
    /// Create a freshly registered session (status ACTIVE, last activity = `now`)
    pub fn new(
        name: UserName,
        connection: ConnectionId,
        remote_address: String,
        now: Instant,
    ) -> Self {
        Self {
            name,
            status: UserStatus::Active,
            remote_address,
            last_activity: now,
            connection,
        }
    }

    pub fn touch(&mut self, now: Instant) {
        self.last_activity = now;
    }

    pub fn idle_for(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_activity)
    }

    /// Flip the status to INACTIVE if the session has been idle for at least
    /// `threshold` and is not already INACTIVE.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn mark_inactive_if_idle(&mut self, now: Instant, threshold: Duration) -> bool {
        if self.status == UserStatus::Inactive || self.idle_for(now) < threshold {
            return false;
        }
        self.status = UserStatus::Inactive;
        true
    }
}

/// Status changes detected by the presence watchdogs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    /// The session bound to `connection` was idle past the threshold and is now INACTIVE
    WentIdle {
        name: UserName,
        connection: ConnectionId,
    },
}
