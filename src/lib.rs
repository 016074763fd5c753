//! Kameo-based client for the live source-status websocket channel.
//!
//! [`StatusChannel`] keeps one websocket open to the status endpoint, answers silence with a
//! JSON keepalive, reconnects with capped exponential backoff after unexpected closes, and
//! routes inbound envelopes to a [`StatusSubscriber`].

pub mod core;
pub mod testing;
pub mod tls;
pub mod transport;
pub mod ws;

pub use crate::core::{
    ChannelConfig, ChannelError, ChannelEvent, ChannelResult, ChannelSnapshot, ChannelState,
    ChannelStats, EndpointConfig, EventForwarder, SourceStatusData, StatusCallbacks,
    StatusSubscriber,
};
pub use transport::tungstenite::TungsteniteTransport;
pub use ws::StatusChannel;
