//! Reusable test utilities for exercising the status channel without a real socket.
//!
//! [`MockTransport`] hands every connect attempt to a [`MockServer`], which yields one
//! [`MockConnection`] per accepted socket. Tests use the connection to read what the channel
//! wrote, push server envelopes, and close or drop the socket.

use std::pin::Pin;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::Sink;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::core::{ChannelError, WebSocketBufferConfig, WsFrame, into_ws_frame};
use crate::transport::{WsTransport, WsTransportConnectFuture};

type InboundItem = Result<WsFrame, String>;

/// A transport that uses in-memory channels so tests can emulate server behavior.
#[derive(Clone)]
pub struct MockTransport {
    accepted_tx: mpsc::UnboundedSender<MockConnection>,
    attempts: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    stall_writes: Arc<AtomicBool>,
    attempt_log: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl MockTransport {
    /// Build a transport + server control pair.
    pub fn channel_pair() -> (Self, MockServer) {
        let (accepted_tx, accepted_rx) = mpsc::unbounded_channel();
        let attempts = Arc::new(AtomicUsize::new(0));
        let refuse = Arc::new(AtomicBool::new(false));
        let stall_writes = Arc::new(AtomicBool::new(false));
        let attempt_log = Arc::new(Mutex::new(Vec::new()));
        (
            Self {
                accepted_tx,
                attempts: attempts.clone(),
                refuse: refuse.clone(),
                stall_writes: stall_writes.clone(),
                attempt_log: attempt_log.clone(),
            },
            MockServer {
                accepted_rx,
                attempts,
                refuse,
                stall_writes,
                attempt_log,
            },
        )
    }
}

impl WsTransport for MockTransport {
    type Reader = MockReader;
    type Writer = MockWriter;

    fn connect(
        &self,
        url: String,
        _buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut log) = self.attempt_log.lock() {
            log.push((Instant::now(), url));
        }
        let refuse = self.refuse.load(Ordering::SeqCst);
        let stalled = self.stall_writes.clone();
        let accepted_tx = self.accepted_tx.clone();

        Box::pin(async move {
            if refuse {
                return Err(ChannelError::ConnectionFailed(
                    "mock server refused connection".to_string(),
                ));
            }
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
            accepted_tx
                .send(MockConnection {
                    id: attempt,
                    outbound_rx,
                    inbound_tx: Some(inbound_tx),
                })
                .map_err(|_| ChannelError::ConnectionFailed("mock server is gone".to_string()))?;
            Ok((
                MockReader { rx: inbound_rx },
                MockWriter {
                    sent_tx: outbound_tx,
                    stalled,
                },
            ))
        })
    }
}

/// Error surface for operations on [`MockConnection`].
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum MockServerError {
    /// The inbound socket side was intentionally dropped.
    SocketDropped,
    /// The channel side is no longer reading this socket.
    ChannelClosed,
}

impl std::fmt::Display for MockServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MockServerError::SocketDropped => f.write_str("mock socket already dropped"),
            MockServerError::ChannelClosed => f.write_str("mock channel reader is closed"),
        }
    }
}

impl std::error::Error for MockServerError {}

/// Server-side test handle paired with [`MockTransport`].
pub struct MockServer {
    accepted_rx: mpsc::UnboundedReceiver<MockConnection>,
    attempts: Arc<AtomicUsize>,
    refuse: Arc<AtomicBool>,
    stall_writes: Arc<AtomicBool>,
    attempt_log: Arc<Mutex<Vec<(Instant, String)>>>,
}

impl MockServer {
    /// Wait for the channel to open its next socket.
    pub async fn next_connection(&mut self) -> Option<MockConnection> {
        self.accepted_rx.recv().await
    }

    pub async fn next_connection_timeout(&mut self, timeout: Duration) -> Option<MockConnection> {
        tokio::time::timeout(timeout, self.accepted_rx.recv())
            .await
            .unwrap_or_default()
    }

    /// Connect attempts seen so far, refused ones included.
    pub fn connect_attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Make subsequent connect attempts fail (or succeed again).
    pub fn refuse_connections(&self, refuse: bool) {
        self.refuse.store(refuse, Ordering::SeqCst);
    }

    /// While set, every socket's sink reports not-ready and writes never complete, like a
    /// peer that stopped reading without closing.
    pub fn stall_writes(&self, stall: bool) {
        self.stall_writes.store(stall, Ordering::SeqCst);
    }

    /// When each connect attempt started, on the tokio clock.
    pub fn attempt_times(&self) -> Vec<Instant> {
        self.attempt_log
            .lock()
            .map(|log| log.iter().map(|(at, _)| *at).collect())
            .unwrap_or_default()
    }

    pub fn last_url(&self) -> Option<String> {
        self.attempt_log.lock().ok()?.last().map(|(_, url)| url.clone())
    }
}

/// One accepted socket.
pub struct MockConnection {
    id: usize,
    outbound_rx: mpsc::UnboundedReceiver<WsFrame>,
    inbound_tx: Option<mpsc::UnboundedSender<InboundItem>>,
}

impl MockConnection {
    /// 1-based connect attempt that produced this socket.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Receive a frame written by the channel. `None` once the channel dropped its writer.
    pub async fn recv_outbound(&mut self) -> Option<WsFrame> {
        self.outbound_rx.recv().await
    }

    /// Receive a frame with a timeout.
    pub async fn recv_outbound_timeout(&mut self, timeout: Duration) -> Option<WsFrame> {
        tokio::time::timeout(timeout, self.outbound_rx.recv())
            .await
            .unwrap_or_default()
    }

    /// Frame already written by the channel, without waiting.
    pub fn try_recv_outbound(&mut self) -> Option<WsFrame> {
        self.outbound_rx.try_recv().ok()
    }

    /// Push an inbound frame to the channel.
    pub fn send_inbound(&self, frame: WsFrame) -> Result<(), MockServerError> {
        self.push(Ok(frame))
    }

    /// Push a UTF-8 payload as websocket text.
    pub fn send_text(&self, text: impl AsRef<str>) -> Result<(), MockServerError> {
        self.send_inbound(into_ws_frame(text.as_ref().as_bytes().to_vec()))
    }

    /// Server-initiated close with the given code.
    pub fn send_close(&self, code: u16, reason: &'static str) -> Result<(), MockServerError> {
        self.send_inbound(WsFrame::close(code, reason))
    }

    /// Make the channel's next read fail.
    pub fn fail_read(&self, error: impl Into<String>) -> Result<(), MockServerError> {
        self.push(Err(error.into()))
    }

    /// Simulate a socket drop without a close frame.
    pub fn drop_socket(&mut self) {
        self.inbound_tx = None;
    }

    fn push(&self, item: InboundItem) -> Result<(), MockServerError> {
        let Some(tx) = self.inbound_tx.as_ref() else {
            return Err(MockServerError::SocketDropped);
        };
        tx.send(item).map_err(|_| MockServerError::ChannelClosed)
    }
}

/// Reader side for [`MockTransport`].
pub struct MockReader {
    rx: mpsc::UnboundedReceiver<InboundItem>,
}

impl futures_util::Stream for MockReader {
    type Item = Result<WsFrame, ChannelError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match Pin::new(&mut self.rx).poll_recv(cx) {
            Poll::Ready(Some(Ok(frame))) => Poll::Ready(Some(Ok(frame))),
            Poll::Ready(Some(Err(error))) => Poll::Ready(Some(Err(ChannelError::TransportError {
                context: "mock_transport_read",
                error,
            }))),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Writer side for [`MockTransport`].
pub struct MockWriter {
    sent_tx: mpsc::UnboundedSender<WsFrame>,
    stalled: Arc<AtomicBool>,
}

impl Sink<WsFrame> for MockWriter {
    type Error = ChannelError;

    fn poll_ready(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        if self.stalled.load(Ordering::SeqCst) {
            return Poll::Pending;
        }
        Poll::Ready(Ok(()))
    }

    fn start_send(self: Pin<&mut Self>, item: WsFrame) -> Result<(), Self::Error> {
        self.get_mut()
            .sent_tx
            .send(item)
            .map_err(|_| ChannelError::TransportError {
                context: "mock_transport_write",
                error: "mock outbound channel closed".to_string(),
            })
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_close(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }
}

/// Text payload of a frame written by the channel, if it is a data frame.
pub fn frame_text(frame: &WsFrame) -> Option<&str> {
    std::str::from_utf8(frame.data_bytes()?).ok()
}
