use std::future::Future;
use std::pin::Pin;

use futures_util::{Sink, Stream};

use crate::core::{ChannelError, WebSocketBufferConfig, WsFrame};

pub mod tungstenite;

/// Boxed future returned by [`WsTransport::connect`].
pub type WsTransportConnectFuture<R, W> =
    Pin<Box<dyn Future<Output = Result<(R, W), ChannelError>> + Send>>;

/// Transport boundary for websocket IO.
///
/// The channel actor owns state and policies; the transport only opens a socket and hands back
/// a frame stream and a frame sink. Every `connect` must produce a fresh, independent pair:
/// handles are never reused across reconnects.
pub trait WsTransport: Clone + Send + Sync + 'static {
    type Reader: Stream<Item = Result<WsFrame, ChannelError>> + Send + Unpin + 'static;
    type Writer: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static;

    fn connect(
        &self,
        url: String,
        buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer>;
}
