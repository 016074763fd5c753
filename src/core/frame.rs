use bytes::Bytes;

/// Close code used for caller-initiated disconnects.
pub const NORMAL_CLOSURE: u16 = 1000;

/// Close reason sent alongside [`NORMAL_CLOSURE`] on a manual disconnect.
pub const MANUAL_CLOSE_REASON: &str = "Manual disconnect";

/// Transport-neutral websocket frame type.
///
/// Transports convert their native frame representation into/from `WsFrame`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WsFrame {
    Text(Bytes),
    Binary(Bytes),
    Ping(Bytes),
    Pong(Bytes),
    Close(Option<WsCloseFrame>),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WsCloseFrame {
    pub code: u16,
    pub reason: Bytes,
}

impl WsCloseFrame {
    pub fn reason_lossy(&self) -> String {
        String::from_utf8_lossy(self.reason.as_ref()).into_owned()
    }
}

impl WsFrame {
    #[inline]
    pub fn text_static(s: &'static str) -> Self {
        Self::Text(Bytes::from_static(s.as_bytes()))
    }

    #[inline]
    pub fn close(code: u16, reason: impl Into<Bytes>) -> Self {
        Self::Close(Some(WsCloseFrame {
            code,
            reason: reason.into(),
        }))
    }

    /// Normal-closure frame sent by `disconnect()`.
    #[inline]
    pub fn manual_close() -> Self {
        Self::close(NORMAL_CLOSURE, Bytes::from_static(MANUAL_CLOSE_REASON.as_bytes()))
    }

    /// Payload of a data frame; control frames carry no envelope.
    #[inline]
    pub fn data_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Text(bytes) | Self::Binary(bytes) => Some(bytes.as_ref()),
            Self::Ping(_) | Self::Pong(_) | Self::Close(_) => None,
        }
    }
}

/// Convert owned bytes into a `WsFrame`, preferring text when bytes are valid UTF-8.
#[inline]
pub fn into_ws_frame<B>(bytes: B) -> WsFrame
where
    B: Into<Bytes>,
{
    let payload = bytes.into();
    if std::str::from_utf8(payload.as_ref()).is_ok() {
        WsFrame::Text(payload)
    } else {
        WsFrame::Binary(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_close_uses_normal_closure() {
        match WsFrame::manual_close() {
            WsFrame::Close(Some(frame)) => {
                assert_eq!(frame.code, 1000);
                assert_eq!(frame.reason_lossy(), "Manual disconnect");
            }
            other => panic!("expected close frame, got {other:?}"),
        }
    }

    #[test]
    fn only_data_frames_expose_envelope_bytes() {
        assert_eq!(
            into_ws_frame("{}".to_string()).data_bytes(),
            Some(b"{}".as_ref())
        );
        assert!(matches!(
            into_ws_frame(vec![0xff, 0xfe]),
            WsFrame::Binary(_)
        ));
        assert!(WsFrame::Ping(Bytes::new()).data_bytes().is_none());
        assert!(WsFrame::Close(None).data_bytes().is_none());
    }
}
