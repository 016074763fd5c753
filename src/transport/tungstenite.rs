use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures_util::{Sink, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    Connector, MaybeTlsStream, WebSocketStream,
    connect_async_tls_with_config as tungstenite_connect,
    tungstenite::{
        Message as TungsteniteMessage, Utf8Bytes,
        protocol::{CloseFrame as TungCloseFrame, WebSocketConfig},
    },
};

use super::{WsTransport, WsTransportConnectFuture};
use crate::core::{ChannelError, WebSocketBufferConfig, WsCloseFrame, WsFrame};
use crate::tls::install_rustls_crypto_provider;

fn map_ws_error(context: &'static str, err: impl ToString) -> ChannelError {
    ChannelError::TransportError {
        context,
        error: err.to_string(),
    }
}

fn close_to_core(frame: Option<TungCloseFrame>) -> Option<WsCloseFrame> {
    frame.map(|f| WsCloseFrame {
        code: u16::from(f.code),
        reason: Bytes::copy_from_slice(f.reason.as_bytes()),
    })
}

fn utf8_or_empty(bytes: Bytes) -> Utf8Bytes {
    match String::from_utf8(bytes.to_vec()) {
        Ok(text) => Utf8Bytes::from(text),
        Err(_) => Utf8Bytes::from_static(""),
    }
}

fn core_to_close(frame: WsCloseFrame) -> TungCloseFrame {
    TungCloseFrame {
        code: frame.code.into(),
        reason: utf8_or_empty(frame.reason),
    }
}

fn msg_to_frame(msg: TungsteniteMessage) -> WsFrame {
    match msg {
        TungsteniteMessage::Text(text) => WsFrame::Text(Bytes::copy_from_slice(text.as_bytes())),
        TungsteniteMessage::Binary(bytes) => WsFrame::Binary(bytes),
        TungsteniteMessage::Ping(bytes) => WsFrame::Ping(bytes),
        TungsteniteMessage::Pong(bytes) => WsFrame::Pong(bytes),
        TungsteniteMessage::Close(frame) => WsFrame::Close(close_to_core(frame)),
        TungsteniteMessage::Frame(_) => WsFrame::Binary(Bytes::new()),
    }
}

fn frame_to_msg(frame: WsFrame) -> TungsteniteMessage {
    match frame {
        WsFrame::Text(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => TungsteniteMessage::Text(Utf8Bytes::from(text)),
            Err(_) => TungsteniteMessage::Binary(bytes),
        },
        WsFrame::Binary(bytes) => TungsteniteMessage::Binary(bytes),
        WsFrame::Ping(bytes) => TungsteniteMessage::Ping(bytes),
        WsFrame::Pong(bytes) => TungsteniteMessage::Pong(bytes),
        WsFrame::Close(frame) => TungsteniteMessage::Close(frame.map(core_to_close)),
    }
}

fn socket_config(buffers: WebSocketBufferConfig) -> WebSocketConfig {
    WebSocketConfig::default()
        .max_message_size(Some(buffers.max_message_bytes))
        .max_frame_size(Some(buffers.max_frame_bytes))
        .write_buffer_size(buffers.write_buffer_bytes)
        .max_write_buffer_size(buffers.max_write_buffer_bytes)
}

/// tokio-tungstenite transport. `wss://` URLs use rustls with webpki roots unless a custom
/// connector is supplied.
#[derive(Clone, Default)]
pub struct TungsteniteTransport {
    connector: Option<Connector>,
}

impl TungsteniteTransport {
    pub fn with_connector(connector: Connector) -> Self {
        Self {
            connector: Some(connector),
        }
    }

    pub fn rustls(config: Arc<rustls::ClientConfig>) -> Self {
        Self::with_connector(Connector::Rustls(config))
    }
}

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type InboundResult = Result<TungsteniteMessage, tokio_tungstenite::tungstenite::Error>;

fn inbound_to_frame(item: InboundResult) -> Result<WsFrame, ChannelError> {
    item.map(msg_to_frame).map_err(|err| map_ws_error("read", err))
}

/// Read half: the split socket stream with every item converted to a [`WsFrame`].
pub type TungsteniteReader = futures_util::stream::Map<
    futures_util::stream::SplitStream<Socket>,
    fn(InboundResult) -> Result<WsFrame, ChannelError>,
>;

/// Write half. Frames are converted on `start_send`; every sink error is tagged `write`.
pub struct TungsteniteWriter {
    inner: futures_util::stream::SplitSink<Socket, TungsteniteMessage>,
}

impl Sink<WsFrame> for TungsteniteWriter {
    type Error = ChannelError;

    fn poll_ready(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_ready(cx)
            .map_err(|e| map_ws_error("write", e))
    }

    fn start_send(mut self: Pin<&mut Self>, item: WsFrame) -> Result<(), Self::Error> {
        Pin::new(&mut self.inner)
            .start_send(frame_to_msg(item))
            .map_err(|e| map_ws_error("write", e))
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_flush(cx)
            .map_err(|e| map_ws_error("write", e))
    }

    fn poll_close(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Pin::new(&mut self.inner)
            .poll_close(cx)
            .map_err(|e| map_ws_error("write", e))
    }
}

impl WsTransport for TungsteniteTransport {
    type Reader = TungsteniteReader;
    type Writer = TungsteniteWriter;

    fn connect(
        &self,
        url: String,
        buffers: WebSocketBufferConfig,
    ) -> WsTransportConnectFuture<Self::Reader, Self::Writer> {
        let connector = self.connector.clone();
        Box::pin(async move {
            install_rustls_crypto_provider();

            let (stream, _response) =
                tungstenite_connect(url.as_str(), Some(socket_config(buffers)), true, connector)
                    .await
                    .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;

            let (write, read) = stream.split();
            let convert: fn(InboundResult) -> Result<WsFrame, ChannelError> = inbound_to_frame;
            Ok((read.map(convert), TungsteniteWriter { inner: write }))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_round_trip_through_tungstenite_messages() {
        let msg = frame_to_msg(WsFrame::text_static(r#"{"type":"ping"}"#));
        assert!(matches!(&msg, TungsteniteMessage::Text(t) if t.as_str() == r#"{"type":"ping"}"#));
        assert_eq!(
            msg_to_frame(msg),
            WsFrame::text_static(r#"{"type":"ping"}"#)
        );
    }

    #[test]
    fn close_frames_keep_code_and_reason() {
        match frame_to_msg(WsFrame::manual_close()) {
            TungsteniteMessage::Close(Some(frame)) => {
                assert_eq!(u16::from(frame.code), 1000);
                assert_eq!(frame.reason.as_str(), "Manual disconnect");
            }
            other => panic!("expected close, got {other:?}"),
        }
    }

    #[test]
    fn invalid_utf8_text_degrades_to_binary() {
        let msg = frame_to_msg(WsFrame::Text(Bytes::from_static(&[0xff, 0x00])));
        assert!(matches!(msg, TungsteniteMessage::Binary(_)));
    }
}
