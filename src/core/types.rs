use std::fmt;
use std::time::Duration;

use thiserror::Error;

use super::endpoint::EndpointConfig;

/// Convenience result alias for channel operations.
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Canonical error surface for the status channel.
///
/// None of these are fatal to the host application: inside the channel they are logged and
/// folded into the reconnect path. Callers only see them from endpoint parsing and from handle
/// operations once the actor is gone or a wait times out.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Transport error ({context}): {error}")]
    TransportError {
        context: &'static str,
        error: String,
    },

    #[error("Actor error: {0}")]
    ActorError(String),

    #[error("Timeout: {context}")]
    Timeout { context: String },
}

/// Transport-independent buffer sizing parameters used for websocket configuration.
#[derive(Clone, Copy, Debug)]
pub struct WebSocketBufferConfig {
    pub write_buffer_bytes: usize,
    pub max_write_buffer_bytes: usize,
    pub max_message_bytes: usize,
    pub max_frame_bytes: usize,
}

impl Default for WebSocketBufferConfig {
    fn default() -> Self {
        // Status envelopes are tiny; these only bound a misbehaving server.
        Self {
            write_buffer_bytes: 16 << 10,
            max_write_buffer_bytes: 64 << 10,
            max_message_bytes: 1 << 20,
            max_frame_bytes: 1 << 20,
        }
    }
}

/// Full configuration for one status channel.
#[derive(Clone, Debug)]
pub struct ChannelConfig {
    pub endpoint: EndpointConfig,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub jitter: bool,
    pub heartbeat_interval: Duration,
    pub buffers: WebSocketBufferConfig,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            jitter: false,
            heartbeat_interval: Duration::from_secs(30),
            buffers: WebSocketBufferConfig::default(),
        }
    }
}

impl ChannelConfig {
    pub fn new(endpoint: EndpointConfig) -> Self {
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max;
        self
    }

    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    pub fn with_buffers(mut self, buffers: WebSocketBufferConfig) -> Self {
        self.buffers = buffers;
        self
    }
}

/// Connection state machine. Exactly one is active at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Reconnecting,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => f.write_str("disconnected"),
            Self::Connecting => f.write_str("connecting"),
            Self::Open => f.write_str("open"),
            Self::Reconnecting => f.write_str("reconnecting"),
        }
    }
}

/// Observable view of the channel published after every transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelSnapshot {
    pub state: ChannelState,
    /// Transport is open (not necessarily acknowledged by a `connected` envelope yet).
    pub connected: bool,
    /// Server-assigned id from the most recent `connected` envelope on the live transport.
    pub connection_id: Option<u64>,
    pub reconnecting: bool,
    pub attempt: u32,
    /// Delay the backoff policy will hand out for the next scheduled reconnect.
    pub next_delay: Duration,
}

/// Basic connection statistics snapshot.
#[derive(Clone, Debug)]
pub struct ChannelStats {
    pub uptime: Duration,
    pub messages: u64,
    pub errors: u64,
    pub reconnects: u64,
    pub last_message_age: Duration,
    pub recent_errors: usize,
    pub heartbeats_sent: u64,
    pub pongs_received: u64,
    pub p50_pong_rtt_us: u64,
    pub p99_pong_rtt_us: u64,
    /// Most recent recorded error as `context: message`.
    pub last_error: Option<String>,
}

/// Why a transport went away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseCause {
    /// The server sent a close frame.
    Remote { code: Option<u16>, reason: String },
    /// The read side failed.
    ReadFailure { error: String },
    /// The stream ended without a close frame.
    StreamEnded,
}

impl CloseCause {
    pub fn code(&self) -> Option<u16> {
        match self {
            Self::Remote { code, .. } => *code,
            Self::ReadFailure { .. } | Self::StreamEnded => None,
        }
    }
}

/// Abstract reconnect strategy trait.
pub trait ReconnectStrategy: Send + Sync + 'static {
    /// Delay to wait before the upcoming attempt; advances the internal state.
    fn next_delay(&mut self) -> Duration;
    /// Delay the next call to [`ReconnectStrategy::next_delay`] would return (before jitter).
    fn current_delay(&self) -> Duration;
    fn reset(&mut self);
    fn should_retry(&self) -> bool;
}
