//! Configuration for the tracking channel and its reconnection policy.

use std::time::Duration;

/// Default tracking server endpoint (`host:port`).
pub const DEFAULT_ENDPOINT: &str = "127.0.0.1:5050";

/// Default number of reconnect attempts before giving up.
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Default delay before the first reconnect attempt.
pub const DEFAULT_RECONNECT_DELAY_MS: u64 = 2_000;

/// Default ceiling for the reconnect delay.
pub const DEFAULT_RECONNECT_DELAY_MAX_MS: u64 = 10_000;

/// Default timeout for opening a channel.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 20_000;

/// Default capacity of the tracking event broadcast.
pub const DEFAULT_EVENT_CAPACITY: usize = 64;

/// Exponential backoff policy for reconnecting a lost channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Reconnect attempts allowed before the session is marked failed.
    pub max_attempts: u32,

    /// Delay before attempt 1.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt `attempt` (1-indexed).
    ///
    /// `initial_delay * 2^(attempt-1)`, capped at `max_delay`. Attempt 0 is
    /// treated as attempt 1.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial_delay
            .saturating_mul(2u32.saturating_pow(exponent))
            .min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            initial_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RECONNECT_DELAY_MAX_MS),
        }
    }
}

/// Configuration for a [`ConnectionManager`](super::ConnectionManager).
#[derive(Debug, Clone)]
pub struct TrackingConfig {
    /// Tracking server endpoint (`host:port`).
    pub endpoint: String,

    /// Bearer credential from local session storage, if signed in.
    pub credential: Option<String>,

    /// Timeout for each channel open.
    pub connect_timeout: Duration,

    /// Reconnection policy.
    pub reconnect: ReconnectPolicy,

    /// Capacity of the event broadcast; slow subscribers lag past this.
    pub event_capacity: usize,
}

impl TrackingConfig {
    /// Parameters handed to the connector for every channel instance.
    pub fn channel_params(&self) -> ChannelParams {
        ChannelParams {
            endpoint: self.endpoint.clone(),
            credential: self.credential.clone(),
            connect_timeout: self.connect_timeout,
        }
    }
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            credential: None,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            reconnect: ReconnectPolicy::default(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }
}

/// Construction parameters for one channel instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelParams {
    pub endpoint: String,
    pub credential: Option<String>,
    pub connect_timeout: Duration,
}
