//! Presence watchdog: one background task per registered session.
//!
//! The watchdog only touches its session while holding the registry lock, and the
//! registry cancels it while holding that same lock when the session is removed.
//! Re-checking the token after acquiring the lock therefore guarantees the watchdog
//! never observes a removed session, nor a later session registered under the same name.

use std::sync::Weak;

use tokio::{
    sync::{Mutex, mpsc},
    task::JoinHandle,
    time::{self, Instant, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::PresenceSettings,
    domain::{ConnectionId, PresenceEvent, UserName},
};

use super::inmemory::RegistryState;

pub(super) struct Watchdog {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Watchdog {
    pub(super) fn spawn(
        state: Weak<Mutex<RegistryState>>,
        name: UserName,
        connection: ConnectionId,
        settings: PresenceSettings,
        events: mpsc::UnboundedSender<PresenceEvent>,
    ) -> Self {
        let token = CancellationToken::new();
        let task = tokio::spawn(watch(
            state,
            name,
            connection,
            settings,
            events,
            token.clone(),
        ));
        Self { token, task }
    }

    /// Must be called with the registry lock held.
    pub(super) fn stop(&self) {
        self.token.cancel();
        self.task.abort();
    }
}

async fn watch(
    state: Weak<Mutex<RegistryState>>,
    name: UserName,
    connection: ConnectionId,
    settings: PresenceSettings,
    events: mpsc::UnboundedSender<PresenceEvent>,
    token: CancellationToken,
) {
    let mut ticker = time::interval_at(
        Instant::now() + settings.poll_interval,
        settings.poll_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let Some(shared) = state.upgrade() else {
            break;
        };
        let mut guard = shared.lock().await;
        if token.is_cancelled() {
            break;
        }
        let Some(entry) = guard.sessions.get_mut(name.as_str()) else {
            break;
        };
        if entry.session.connection != connection {
            break;
        }

        if entry
            .session
            .mark_inactive_if_idle(Instant::now(), settings.idle_threshold)
        {
            tracing::info!(
                "User '{}' idle for over {:?}, marked INACTIVE",
                name,
                settings.idle_threshold
            );
            let event = PresenceEvent::WentIdle {
                name: name.clone(),
                connection,
            };
            if events.send(event).is_err() {
                tracing::warn!("Presence event for '{}' dropped: no announcer running", name);
            }
        }
    }

    tracing::debug!("Presence watchdog for '{}' stopped", name);
}
