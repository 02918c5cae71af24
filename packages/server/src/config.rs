//! Relay configuration.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MAX_SESSIONS: usize = 100;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 300;
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;
pub const DEFAULT_MAX_FRAME_BYTES: usize = 4096;

/// Smallest accepted frame budget
pub const MIN_FRAME_BYTES: usize = 1024;

/// Presence watchdog timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceSettings {
    /// Idle time after which a session is flipped to INACTIVE
    pub idle_threshold: Duration,
    /// How often each watchdog checks its session
    pub poll_interval: Duration,
}

impl Default for PresenceSettings {
    fn default() -> Self {
        Self {
            idle_threshold: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    /// Maximum number of concurrently registered sessions
    pub max_sessions: usize,
    pub presence: PresenceSettings,
    /// Frame size budget, applied to both inbound and outbound frames
    pub max_frame_bytes: usize,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            presence: PresenceSettings::default(),
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl RelayConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_sessions == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        if self.presence.idle_threshold.is_zero() {
            return Err(ConfigError::ZeroIdleThreshold);
        }
        if self.presence.poll_interval.is_zero() {
            return Err(ConfigError::ZeroPollInterval);
        }
        if self.presence.poll_interval > self.presence.idle_threshold {
            return Err(ConfigError::PollIntervalExceedsThreshold {
                poll_interval: self.presence.poll_interval,
                idle_threshold: self.presence.idle_threshold,
            });
        }
        if self.max_frame_bytes < MIN_FRAME_BYTES {
            return Err(ConfigError::FrameBudgetTooSmall {
                min: MIN_FRAME_BYTES,
                actual: self.max_frame_bytes,
            });
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("max sessions must be greater than zero")]
    ZeroCapacity,

    #[error("idle timeout must be greater than zero")]
    ZeroIdleThreshold,

    #[error("poll interval must be greater than zero")]
    ZeroPollInterval,

    #[error("poll interval ({poll_interval:?}) must not exceed idle timeout ({idle_threshold:?})")]
    PollIntervalExceedsThreshold {
        poll_interval: Duration,
        idle_threshold: Duration,
    },

    #[error("max frame bytes must be at least {min} (got {actual})")]
    FrameBudgetTooSmall { min: usize, actual: usize },
}
