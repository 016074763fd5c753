use std::time::{Duration, Instant};

use super::frame::WsFrame;

/// Application-level keepalive envelope written while the channel is open.
pub const PING_ENVELOPE: &str = r#"{"type":"ping"}"#;

/// Keepalive contract for the heartbeat monitor.
///
/// Strategies only produce frames and observe acknowledgements. They never decide that a peer
/// is dead: loss of liveness is surfaced by the transport's own close/error path.
pub trait HeartbeatStrategy: Send + Sync + 'static {
    fn create_ping(&mut self) -> Option<WsFrame>;
    /// Record a `pong` acknowledgement, returning the round trip when a ping is outstanding.
    fn on_pong(&mut self) -> Option<Duration>;
    fn reset(&mut self);
    fn interval(&self) -> Duration;
}

/// Sends `{"type":"ping"}` text frames at a fixed interval.
#[derive(Debug, Clone)]
pub struct JsonHeartbeat {
    interval: Duration,
    last_ping: Option<Instant>,
}

impl JsonHeartbeat {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_ping: None,
        }
    }
}

impl Default for JsonHeartbeat {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl HeartbeatStrategy for JsonHeartbeat {
    fn create_ping(&mut self) -> Option<WsFrame> {
        self.last_ping = Some(Instant::now());
        Some(WsFrame::text_static(PING_ENVELOPE))
    }

    fn on_pong(&mut self) -> Option<Duration> {
        self.last_ping
            .take()
            .map(|sent| Instant::now().saturating_duration_since(sent))
    }

    fn reset(&mut self) {
        self.last_ping = None;
    }

    fn interval(&self) -> Duration {
        self.interval
    }
}
