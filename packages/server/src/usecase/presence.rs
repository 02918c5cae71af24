//! UseCase: presence announcement
//!
//! Turns idle transitions detected by the registry watchdogs into `status_update`
//! fan-outs. Each `PresenceEvent` produces exactly one fan-out.

use std::sync::Arc;

use tokio::{sync::mpsc, task::JoinHandle};
use tsudoi_shared::time::Clock;

use crate::{
    domain::{PresenceEvent, SessionRegistry, UserStatus},
    infrastructure::dto::Envelope,
};

use super::fan_out::FanOut;

pub struct PresenceAnnouncer {
    registry: Arc<dyn SessionRegistry>,
    fan_out: Arc<FanOut>,
    clock: Arc<dyn Clock>,
}

impl PresenceAnnouncer {
    pub fn new(
        registry: Arc<dyn SessionRegistry>,
        fan_out: Arc<FanOut>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            fan_out,
            clock,
        }
    }

    /// Run until every sender of `events` is dropped.
    pub fn spawn(self, events: mpsc::UnboundedReceiver<PresenceEvent>) -> JoinHandle<()> {
        tokio::spawn(self.run(events))
    }

    pub async fn run(self, mut events: mpsc::UnboundedReceiver<PresenceEvent>) {
        while let Some(event) = events.recv().await {
            self.announce(event).await;
        }
        tracing::debug!("Presence announcer stopped");
    }

    /// Returns `true` if a `status_update` was fanned out.
    pub async fn announce(&self, event: PresenceEvent) -> bool {
        match event {
            PresenceEvent::WentIdle { name, connection } => {
                // The session may have disconnected or changed its status between
                // detection and announcement.
                let Some(session) = self.registry.find_by_connection(&connection).await else {
                    tracing::debug!("Skipping idle announcement for departed user '{}'", name);
                    return false;
                };
                if session.name != name {
                    tracing::debug!("Skipping idle announcement for departed user '{}'", name);
                    return false;
                }
                if session.status != UserStatus::Inactive {
                    tracing::debug!(
                        "Skipping idle announcement for '{}': status is now {}",
                        name,
                        session.status
                    );
                    return false;
                }

                let envelope = Envelope::status_update(
                    name.into_string(),
                    UserStatus::Inactive,
                    self.clock.timestamp(),
                );
                match self.fan_out.deliver_to_all(&envelope).await {
                    Ok(_) => true,
                    Err(e) => {
                        tracing::warn!("Failed to announce idle status: {}", e);
                        false
                    }
                }
            }
        }
    }
}
