//! Inbound envelope routing.
//!
//! Every inbound data frame is a `{"type": ..., "data": {...}}` envelope. Routing is a closed
//! match over the known tags; anything that fails to parse or lacks the fields its tag needs is
//! dropped here and never reaches a subscriber.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::subscriber::{StatusSubscriber, guarded};

pub const TYPE_CONNECTED: &str = "connected";
pub const TYPE_SOURCE_STATUS_CHANGED: &str = "source_status_changed";
pub const TYPE_PONG: &str = "pong";

/// Payload of a `source_status_changed` envelope. Every field is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStatusData {
    pub source_id: Option<i64>,
    pub is_online: Option<bool>,
    pub timestamp: Option<String>,
    /// Current attempt when the change came from a status check.
    pub attempt: Option<u32>,
    pub max_attempts: Option<u32>,
    /// The server is still probing the source.
    pub checking: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStatusChange {
    pub source_id: i64,
    pub is_online: bool,
    pub data: SourceStatusData,
}

/// Closed set of inbound messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Connected { connection_id: u64 },
    SourceStatusChanged(SourceStatusChange),
    Pong,
    Unrecognized { kind: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Not JSON, or the envelope/data did not have the expected shape.
    Malformed(String),
    /// A field required by the envelope's type is absent.
    MissingField {
        kind: &'static str,
        field: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    Dispatch(InboundMessage),
    Dropped(DropReason),
}

#[derive(Deserialize)]
struct EnvelopeHeader {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct Envelope<D> {
    data: Option<D>,
}

#[derive(Deserialize)]
struct ConnectedData {
    connection_id: Option<u64>,
}

fn decode_data<'a, D>(raw: &'a [u8]) -> Result<Option<D>, DropReason>
where
    D: Deserialize<'a>,
{
    sonic_rs::from_slice::<Envelope<D>>(raw)
        .map(|envelope| envelope.data)
        .map_err(|err| DropReason::Malformed(err.to_string()))
}

/// Parse a raw envelope into a routing decision without side effects.
pub fn route(raw: &[u8]) -> RouteOutcome {
    let header = match sonic_rs::from_slice::<EnvelopeHeader>(raw) {
        Ok(header) => header,
        Err(err) => return RouteOutcome::Dropped(DropReason::Malformed(err.to_string())),
    };

    let message = match header.kind.as_str() {
        TYPE_CONNECTED => match decode_data::<ConnectedData>(raw) {
            // Server ids start at 1; zero counts as absent.
            Ok(Some(ConnectedData {
                connection_id: Some(connection_id),
            })) if connection_id != 0 => InboundMessage::Connected { connection_id },
            Ok(_) => {
                return RouteOutcome::Dropped(DropReason::MissingField {
                    kind: TYPE_CONNECTED,
                    field: "connection_id",
                });
            }
            Err(reason) => return RouteOutcome::Dropped(reason),
        },
        TYPE_SOURCE_STATUS_CHANGED => {
            let data = match decode_data::<SourceStatusData>(raw) {
                Ok(data) => data.unwrap_or_default(),
                Err(reason) => return RouteOutcome::Dropped(reason),
            };
            let Some(source_id) = data.source_id else {
                return RouteOutcome::Dropped(DropReason::MissingField {
                    kind: TYPE_SOURCE_STATUS_CHANGED,
                    field: "source_id",
                });
            };
            let Some(is_online) = data.is_online else {
                return RouteOutcome::Dropped(DropReason::MissingField {
                    kind: TYPE_SOURCE_STATUS_CHANGED,
                    field: "is_online",
                });
            };
            InboundMessage::SourceStatusChanged(SourceStatusChange {
                source_id,
                is_online,
                data,
            })
        }
        TYPE_PONG => InboundMessage::Pong,
        _ => InboundMessage::Unrecognized { kind: header.kind },
    };

    RouteOutcome::Dispatch(message)
}

/// Invoke the subscriber callback a routed message maps to.
///
/// Callback panics are caught and logged so one bad subscriber cannot take the channel down.
pub fn deliver<S>(outcome: &RouteOutcome, subscriber: &mut S)
where
    S: StatusSubscriber + ?Sized,
{
    match outcome {
        RouteOutcome::Dispatch(InboundMessage::Connected { connection_id }) => {
            debug!(connection_id, "status channel acknowledged");
            guarded("on_connected", || subscriber.on_connected(*connection_id));
        }
        RouteOutcome::Dispatch(InboundMessage::SourceStatusChanged(change)) => {
            debug!(
                source_id = change.source_id,
                is_online = change.is_online,
                attempt = change.data.attempt,
                checking = change.data.checking,
                "source status changed"
            );
            guarded("on_status_change", || {
                subscriber.on_status_change(change.source_id, change.is_online, &change.data)
            });
        }
        RouteOutcome::Dispatch(InboundMessage::Pong) => {
            trace!("heartbeat acknowledged");
        }
        RouteOutcome::Dispatch(InboundMessage::Unrecognized { kind }) => {
            warn!(kind = %kind, "ignoring unrecognized status message type");
        }
        RouteOutcome::Dropped(DropReason::Malformed(error)) => {
            warn!(error = %error, "dropping malformed status message");
        }
        RouteOutcome::Dropped(DropReason::MissingField { kind, field }) => {
            warn!(kind, field, "dropping status message with missing field");
        }
    }
}

/// Route a raw envelope and notify the subscriber. Never fails.
pub fn dispatch<S>(raw: &[u8], subscriber: &mut S) -> RouteOutcome
where
    S: StatusSubscriber + ?Sized,
{
    let outcome = route(raw);
    deliver(&outcome, subscriber);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ChannelError;

    #[derive(Default)]
    struct Recorder {
        statuses: Vec<(i64, bool, SourceStatusData)>,
        connected: Vec<u64>,
        other: usize,
    }

    impl StatusSubscriber for Recorder {
        fn on_status_change(&mut self, source_id: i64, is_online: bool, data: &SourceStatusData) {
            self.statuses.push((source_id, is_online, data.clone()));
        }

        fn on_connected(&mut self, connection_id: u64) {
            self.connected.push(connection_id);
        }

        fn on_disconnected(&mut self) {
            self.other += 1;
        }

        fn on_error(&mut self, _error: &ChannelError) {
            self.other += 1;
        }
    }

    impl Recorder {
        fn silent(&self) -> bool {
            self.statuses.is_empty() && self.connected.is_empty() && self.other == 0
        }
    }

    #[test]
    fn status_change_with_required_fields_is_dispatched() {
        let mut recorder = Recorder::default();
        let outcome = dispatch(
            br#"{"type":"source_status_changed","data":{"source_id":7,"is_online":false}}"#,
            &mut recorder,
        );
        assert!(matches!(
            outcome,
            RouteOutcome::Dispatch(InboundMessage::SourceStatusChanged(_))
        ));
        assert_eq!(recorder.statuses.len(), 1);
        let (source_id, is_online, data) = &recorder.statuses[0];
        assert_eq!(*source_id, 7);
        assert!(!is_online);
        assert_eq!(data.source_id, Some(7));
        assert_eq!(data.is_online, Some(false));
    }

    #[test]
    fn status_change_missing_is_online_is_dropped() {
        let mut recorder = Recorder::default();
        let outcome = dispatch(
            br#"{"type":"source_status_changed","data":{"source_id":7}}"#,
            &mut recorder,
        );
        assert_eq!(
            outcome,
            RouteOutcome::Dropped(DropReason::MissingField {
                kind: TYPE_SOURCE_STATUS_CHANGED,
                field: "is_online",
            })
        );
        assert!(recorder.silent());

        let outcome = dispatch(
            br#"{"type":"source_status_changed","data":{"is_online":true}}"#,
            &mut recorder,
        );
        assert!(matches!(
            outcome,
            RouteOutcome::Dropped(DropReason::MissingField {
                field: "source_id",
                ..
            })
        ));

        let outcome = dispatch(br#"{"type":"source_status_changed"}"#, &mut recorder);
        assert!(matches!(outcome, RouteOutcome::Dropped(_)));
        assert!(recorder.silent());
    }

    #[test]
    fn check_progress_fields_are_passed_through() {
        let mut recorder = Recorder::default();
        dispatch(
            br#"{"type":"source_status_changed","data":{"source_id":3,"is_online":false,
                "timestamp":"2025-02-06T12:00:00Z","attempt":2,"max_attempts":5,"checking":true}}"#,
            &mut recorder,
        );
        let (_, _, data) = &recorder.statuses[0];
        assert_eq!(data.timestamp.as_deref(), Some("2025-02-06T12:00:00Z"));
        assert_eq!(data.attempt, Some(2));
        assert_eq!(data.max_attempts, Some(5));
        assert_eq!(data.checking, Some(true));
    }

    #[test]
    fn garbage_is_dropped_without_callbacks() {
        let mut recorder = Recorder::default();
        for raw in [
            b"not json".as_ref(),
            b"".as_ref(),
            br#"{"data":{}}"#.as_ref(),
            br#"{"type":42}"#.as_ref(),
            br#"{"type":"source_status_changed","data":{"source_id":"x","is_online":true}}"#
                .as_ref(),
        ] {
            assert!(matches!(
                dispatch(raw, &mut recorder),
                RouteOutcome::Dropped(DropReason::Malformed(_))
            ));
        }
        assert!(recorder.silent());
    }

    #[test]
    fn connected_requires_connection_id() {
        let mut recorder = Recorder::default();
        let outcome = dispatch(
            br#"{"type":"connected","data":{"connection_id":12,"timestamp":"2025-02-06T12:00:00Z"}}"#,
            &mut recorder,
        );
        assert_eq!(
            outcome,
            RouteOutcome::Dispatch(InboundMessage::Connected { connection_id: 12 })
        );
        assert_eq!(recorder.connected, vec![12]);

        let outcome = dispatch(br#"{"type":"connected","data":{}}"#, &mut recorder);
        assert!(matches!(outcome, RouteOutcome::Dropped(_)));

        let outcome = dispatch(
            br#"{"type":"connected","data":{"connection_id":0}}"#,
            &mut recorder,
        );
        assert_eq!(
            outcome,
            RouteOutcome::Dropped(DropReason::MissingField {
                kind: TYPE_CONNECTED,
                field: "connection_id",
            })
        );
        assert_eq!(recorder.connected, vec![12]);
    }

    #[test]
    fn pong_and_unknown_types_invoke_nothing() {
        let mut recorder = Recorder::default();
        assert_eq!(
            dispatch(br#"{"type":"pong"}"#, &mut recorder),
            RouteOutcome::Dispatch(InboundMessage::Pong)
        );
        assert_eq!(
            dispatch(
                br#"{"type":"recording_started","data":[1,2,3]}"#,
                &mut recorder
            ),
            RouteOutcome::Dispatch(InboundMessage::Unrecognized {
                kind: "recording_started".to_string()
            })
        );
        assert!(recorder.silent());
    }

    #[test]
    fn panicking_callback_is_contained() {
        struct Exploding;
        impl StatusSubscriber for Exploding {
            fn on_status_change(&mut self, _: i64, _: bool, _: &SourceStatusData) {
                panic!("subscriber bug");
            }
        }

        let outcome = dispatch(
            br#"{"type":"source_status_changed","data":{"source_id":1,"is_online":true}}"#,
            &mut Exploding,
        );
        assert!(matches!(outcome, RouteOutcome::Dispatch(_)));
    }
}
