use std::panic::{AssertUnwindSafe, catch_unwind};

use tokio::sync::mpsc;
use tracing::error;

use super::router::SourceStatusData;
use super::types::ChannelError;

/// Callbacks the surrounding application receives from the status channel.
///
/// Every method is optional. Callbacks run synchronously on the channel actor's turn, so they
/// should hand work off rather than block.
pub trait StatusSubscriber: Send + 'static {
    fn on_status_change(&mut self, _source_id: i64, _is_online: bool, _data: &SourceStatusData) {}

    /// The server acknowledged the channel with a `connected` envelope.
    fn on_connected(&mut self, _connection_id: u64) {}

    /// A transport that had been open went away.
    fn on_disconnected(&mut self) {}

    /// Transport-level error. Informational only; state changes follow the close event.
    fn on_error(&mut self, _error: &ChannelError) {}
}

impl StatusSubscriber for () {}

type StatusChangeFn = Box<dyn FnMut(i64, bool, &SourceStatusData) + Send>;
type ConnectedFn = Box<dyn FnMut(u64) + Send>;
type DisconnectedFn = Box<dyn FnMut() + Send>;
type ErrorFn = Box<dyn FnMut(&ChannelError) + Send>;

/// Closure-slot subscriber: fill in only the callbacks you care about.
#[derive(Default)]
pub struct StatusCallbacks {
    status_change: Option<StatusChangeFn>,
    connected: Option<ConnectedFn>,
    disconnected: Option<DisconnectedFn>,
    error: Option<ErrorFn>,
}

impl StatusCallbacks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_status_change(
        mut self,
        f: impl FnMut(i64, bool, &SourceStatusData) + Send + 'static,
    ) -> Self {
        self.status_change = Some(Box::new(f));
        self
    }

    pub fn on_connected(mut self, f: impl FnMut(u64) + Send + 'static) -> Self {
        self.connected = Some(Box::new(f));
        self
    }

    pub fn on_disconnected(mut self, f: impl FnMut() + Send + 'static) -> Self {
        self.disconnected = Some(Box::new(f));
        self
    }

    pub fn on_error(mut self, f: impl FnMut(&ChannelError) + Send + 'static) -> Self {
        self.error = Some(Box::new(f));
        self
    }
}

impl std::fmt::Debug for StatusCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatusCallbacks")
            .field("status_change", &self.status_change.is_some())
            .field("connected", &self.connected.is_some())
            .field("disconnected", &self.disconnected.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

impl StatusSubscriber for StatusCallbacks {
    fn on_status_change(&mut self, source_id: i64, is_online: bool, data: &SourceStatusData) {
        if let Some(cb) = self.status_change.as_mut() {
            cb(source_id, is_online, data);
        }
    }

    fn on_connected(&mut self, connection_id: u64) {
        if let Some(cb) = self.connected.as_mut() {
            cb(connection_id);
        }
    }

    fn on_disconnected(&mut self) {
        if let Some(cb) = self.disconnected.as_mut() {
            cb();
        }
    }

    fn on_error(&mut self, error: &ChannelError) {
        if let Some(cb) = self.error.as_mut() {
            cb(error);
        }
    }
}

/// Subscriber notifications as plain values, for consumers that prefer a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    StatusChanged {
        source_id: i64,
        is_online: bool,
        data: SourceStatusData,
    },
    Connected {
        connection_id: u64,
    },
    Disconnected,
    Error(String),
}

/// Forwards every notification into an unbounded channel.
#[derive(Debug, Clone)]
pub struct EventForwarder {
    tx: mpsc::UnboundedSender<ChannelEvent>,
}

impl EventForwarder {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ChannelEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn forward(&self, event: ChannelEvent) {
        // A dropped receiver just means nobody is listening anymore.
        let _ = self.tx.send(event);
    }
}

impl StatusSubscriber for EventForwarder {
    fn on_status_change(&mut self, source_id: i64, is_online: bool, data: &SourceStatusData) {
        self.forward(ChannelEvent::StatusChanged {
            source_id,
            is_online,
            data: data.clone(),
        });
    }

    fn on_connected(&mut self, connection_id: u64) {
        self.forward(ChannelEvent::Connected { connection_id });
    }

    fn on_disconnected(&mut self) {
        self.forward(ChannelEvent::Disconnected);
    }

    fn on_error(&mut self, error: &ChannelError) {
        self.forward(ChannelEvent::Error(error.to_string()));
    }
}

/// Run a subscriber callback, logging instead of unwinding through the channel.
pub(crate) fn guarded(callback: &'static str, f: impl FnOnce()) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(f)) {
        let message = panic
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| panic.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(callback, panic = %message, "status subscriber callback panicked");
    }
}
