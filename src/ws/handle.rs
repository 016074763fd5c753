use std::time::Duration;

use kameo::error::SendError;
use kameo::prelude::{Actor, ActorRef};
use tokio::sync::watch;
use tracing::debug;

use super::actor::{GetChannelStats, StatusChannelActor, StatusChannelArgs, StatusChannelCommand};
use crate::core::{
    ChannelConfig, ChannelError, ChannelResult, ChannelSnapshot, ChannelState, ChannelStats,
    ExponentialBackoffReconnect, HeartbeatStrategy, JsonHeartbeat, ReconnectStrategy,
    StatusSubscriber,
};
use crate::transport::WsTransport;
use crate::transport::tungstenite::TungsteniteTransport;

fn map_send_error<M>(err: SendError<M, ChannelError>) -> ChannelError {
    match err {
        SendError::HandlerError(err) => err,
        _ => ChannelError::ActorError("status channel actor is not running".to_string()),
    }
}

/// Owner-facing handle for a status channel.
///
/// Cloning shares the same channel. The channel runs until [`StatusChannel::shutdown`] is
/// called or the last handle is dropped; either way it goes through the same teardown as
/// `disconnect`, so no keepalive or reconnect outlives the owner.
pub struct StatusChannel<S, R = ExponentialBackoffReconnect, H = JsonHeartbeat, T = TungsteniteTransport>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    actor: ActorRef<StatusChannelActor<S, R, H, T>>,
    snapshot: watch::Receiver<ChannelSnapshot>,
}

impl<S, R, H, T> Clone for StatusChannel<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    fn clone(&self) -> Self {
        Self {
            actor: self.actor.clone(),
            snapshot: self.snapshot.clone(),
        }
    }
}

impl<S> StatusChannel<S>
where
    S: StatusSubscriber,
{
    /// Spawn a channel over tokio-tungstenite. Nothing connects until [`Self::connect`].
    pub fn spawn(config: ChannelConfig, subscriber: S) -> Self {
        Self::spawn_with_transport(config, TungsteniteTransport::default(), subscriber)
    }
}

impl<S, T> StatusChannel<S, ExponentialBackoffReconnect, JsonHeartbeat, T>
where
    S: StatusSubscriber,
    T: WsTransport,
{
    pub fn spawn_with_transport(config: ChannelConfig, transport: T, subscriber: S) -> Self {
        let (args, snapshot) = StatusChannelArgs::from_config(&config, transport, subscriber);
        StatusChannel::from_args(args, snapshot)
    }
}

impl<S, R, H, T> StatusChannel<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    /// Spawn from fully specified args, for custom reconnect or heartbeat strategies.
    pub fn from_args(
        args: StatusChannelArgs<S, R, H, T>,
        snapshot: watch::Receiver<ChannelSnapshot>,
    ) -> Self {
        let actor = StatusChannelActor::spawn(args);
        Self { actor, snapshot }
    }

    /// Underlying actor. A clone of it keeps the channel alive like a handle does.
    pub fn actor_ref(&self) -> &ActorRef<StatusChannelActor<S, R, H, T>> {
        &self.actor
    }

    /// Open the channel. No-op while already connecting or open.
    pub async fn connect(&self) -> ChannelResult<ChannelSnapshot> {
        self.command(StatusChannelCommand::Connect).await
    }

    /// Close the channel and cancel any pending reconnect. No reconnect follows.
    pub async fn disconnect(&self) -> ChannelResult<ChannelSnapshot> {
        self.command(StatusChannelCommand::Disconnect).await
    }

    /// Tear down and connect again right away, starting from the initial backoff delay.
    pub async fn reconnect(&self) -> ChannelResult<ChannelSnapshot> {
        self.command(StatusChannelCommand::Reconnect).await
    }

    async fn command(&self, command: StatusChannelCommand) -> ChannelResult<ChannelSnapshot> {
        self.actor.ask(command).await.map_err(map_send_error)
    }

    pub fn snapshot(&self) -> ChannelSnapshot {
        *self.snapshot.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<ChannelSnapshot> {
        self.snapshot.clone()
    }

    pub fn state(&self) -> ChannelState {
        self.snapshot.borrow().state
    }

    pub fn is_connected(&self) -> bool {
        self.snapshot.borrow().connected
    }

    pub fn is_reconnecting(&self) -> bool {
        self.snapshot.borrow().reconnecting
    }

    /// Identifier from the most recent `connected` envelope, cleared when the transport closes.
    pub fn connection_id(&self) -> Option<u64> {
        self.snapshot.borrow().connection_id
    }

    pub async fn stats(&self) -> ChannelResult<ChannelStats> {
        self.actor.ask(GetChannelStats).await.map_err(map_send_error)
    }

    /// Wait until a published snapshot satisfies `predicate`.
    pub async fn wait_for(
        &self,
        timeout: Duration,
        mut predicate: impl FnMut(&ChannelSnapshot) -> bool,
    ) -> ChannelResult<ChannelSnapshot> {
        let mut rx = self.snapshot.clone();
        let outcome = tokio::time::timeout(timeout, rx.wait_for(|snap| predicate(snap)))
            .await
            .map(|res| res.map(|snapshot| *snapshot));
        match outcome {
            Ok(Ok(snapshot)) => Ok(snapshot),
            Ok(Err(_)) => Err(ChannelError::ActorError(
                "status channel actor is not running".to_string(),
            )),
            Err(_) => Err(ChannelError::Timeout {
                context: format!("waiting for channel state (last: {})", rx.borrow().state),
            }),
        }
    }

    /// Stop the channel actor. Runs the manual-disconnect teardown on the way out.
    pub async fn shutdown(self) -> ChannelResult<()> {
        debug!("shutting down status channel");
        let _ = self.actor.stop_gracefully().await;
        self.actor.wait_for_shutdown().await;
        Ok(())
    }
}
