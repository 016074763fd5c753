//! Status channel connection manager.
//!
//! The actor's mailbox is the single dispatch point for everything that can change channel
//! state: caller commands, transport frames/errors/closes from the reader task, heartbeat ticks
//! and reconnect timer fires. Each transport instance gets an epoch and each reconnect timer a
//! generation; anything arriving with a stale value is dropped, so a discarded transport or a
//! cancelled timer can never act on the channel again.

use futures_util::{SinkExt, StreamExt};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use super::writer::{ChannelWriterActor, CloseTransport, WriteHeartbeat, retire_writer};
use crate::core::router::{self, InboundMessage, RouteOutcome};
use crate::core::subscriber::guarded;
use crate::core::{
    ChannelError, ChannelHealth, ChannelResult, ChannelSnapshot, ChannelState, ChannelStats,
    CloseCause, EndpointConfig, ExponentialBackoffReconnect, HeartbeatStrategy, JsonHeartbeat,
    MANUAL_CLOSE_REASON, NORMAL_CLOSURE, ReconnectStrategy, StatusSubscriber,
    WebSocketBufferConfig, WsFrame,
};
use crate::transport::WsTransport;
use crate::transport::tungstenite::TungsteniteTransport;
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage, WeakActorRef};

/// Arguments passed when constructing a status channel actor.
pub struct StatusChannelArgs<S, R = ExponentialBackoffReconnect, H = JsonHeartbeat, T = TungsteniteTransport>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    pub endpoint: EndpointConfig,
    pub transport: T,
    pub reconnect_strategy: R,
    pub heartbeat: H,
    pub subscriber: S,
    pub buffers: WebSocketBufferConfig,
    /// Receives a fresh [`ChannelSnapshot`] after every transition.
    pub snapshot_tx: watch::Sender<ChannelSnapshot>,
}

impl<S, T> StatusChannelArgs<S, ExponentialBackoffReconnect, JsonHeartbeat, T>
where
    S: StatusSubscriber,
    T: WsTransport,
{
    /// Build args from a [`crate::core::ChannelConfig`], returning the snapshot receiver.
    pub fn from_config(
        config: &crate::core::ChannelConfig,
        transport: T,
        subscriber: S,
    ) -> (Self, watch::Receiver<ChannelSnapshot>) {
        let reconnect_strategy =
            ExponentialBackoffReconnect::new(config.initial_delay, config.max_delay)
                .with_jitter(config.jitter);
        let initial = ChannelSnapshot {
            next_delay: reconnect_strategy.current_delay(),
            ..ChannelSnapshot::default()
        };
        let (snapshot_tx, snapshot_rx) = watch::channel(initial);
        (
            Self {
                endpoint: config.endpoint.clone(),
                transport,
                reconnect_strategy,
                heartbeat: JsonHeartbeat::new(config.heartbeat_interval),
                subscriber,
                buffers: config.buffers,
                snapshot_tx,
            },
            snapshot_rx,
        )
    }
}

struct PendingReconnect {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Connection manager for the live-source status channel.
pub struct StatusChannelActor<S, R = ExponentialBackoffReconnect, H = JsonHeartbeat, T = TungsteniteTransport>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    endpoint: EndpointConfig,
    transport: T,
    buffers: WebSocketBufferConfig,
    reconnect: R,
    heartbeat: H,
    subscriber: S,
    health: ChannelHealth,
    actor_ref: WeakActorRef<Self>,
    snapshot_tx: watch::Sender<ChannelSnapshot>,
    state: ChannelState,
    manual_close: bool,
    attempt: u32,
    connection_id: Option<u64>,
    epoch: u64,
    timer_generation: u64,
    reconnect_timer: Option<PendingReconnect>,
    heartbeat_task: Option<JoinHandle<()>>,
    io_shutdown: Option<watch::Sender<bool>>,
    writer_ref: Option<ActorRef<ChannelWriterActor<T::Writer>>>,
}

impl<S, R, H, T> Actor for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Args = StatusChannelArgs<S, R, H, T>;
    type Error = ChannelError;

    fn name() -> &'static str {
        "StatusChannelActor"
    }

    async fn on_start(args: Self::Args, ctx: ActorRef<Self>) -> ChannelResult<Self> {
        let StatusChannelArgs {
            endpoint,
            transport,
            reconnect_strategy,
            heartbeat,
            subscriber,
            buffers,
            snapshot_tx,
        } = args;

        let actor = Self {
            endpoint,
            transport,
            buffers,
            reconnect: reconnect_strategy,
            heartbeat,
            subscriber,
            health: ChannelHealth::new(),
            actor_ref: ctx.downgrade(),
            snapshot_tx,
            state: ChannelState::Disconnected,
            manual_close: false,
            attempt: 0,
            connection_id: None,
            epoch: 0,
            timer_generation: 0,
            reconnect_timer: None,
            heartbeat_task: None,
            io_shutdown: None,
            writer_ref: None,
        };
        actor.publish();
        Ok(actor)
    }

    async fn on_stop(
        &mut self,
        _ctx: WeakActorRef<Self>,
        _reason: kameo::error::ActorStopReason,
    ) -> ChannelResult<()> {
        if self.manual_teardown() {
            self.notify_disconnected();
        }
        self.publish();
        Ok(())
    }

    fn on_panic(
        &mut self,
        _actor_ref: kameo::actor::WeakActorRef<Self>,
        err: kameo::prelude::PanicError,
    ) -> impl std::future::Future<
        Output = Result<std::ops::ControlFlow<kameo::prelude::ActorStopReason>, Self::Error>,
    > + Send {
        async move {
            tracing::error!(error = ?err, "StatusChannelActor panicked");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

/// Operations exposed to the surrounding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChannelCommand {
    /// Open the channel unless it is already connecting or open.
    Connect,
    /// Close the channel and suppress every further reconnect.
    Disconnect,
    /// Tear down and connect again immediately, with a fresh backoff.
    Reconnect,
}

impl<S, R, H, T> KameoMessage<StatusChannelCommand> for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Reply = ChannelResult<ChannelSnapshot>;

    async fn handle(
        &mut self,
        command: StatusChannelCommand,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        match command {
            StatusChannelCommand::Connect => self.begin_connect("connect"),
            StatusChannelCommand::Disconnect => {
                let was_open = self.manual_teardown();
                info!(connection = %self.connection_label(), "status channel disconnected by caller");
                self.publish();
                if was_open {
                    self.notify_disconnected();
                }
            }
            StatusChannelCommand::Reconnect => {
                let was_open = self.manual_teardown();
                info!(connection = %self.connection_label(), "status channel manual reconnect");
                if was_open {
                    self.notify_disconnected();
                }
                self.begin_connect("manual_reconnect");
            }
        }
        Ok(self.snapshot())
    }
}

/// Events fed back into the actor by its own tasks.
#[derive(Debug)]
pub(crate) enum ChannelEventInternal {
    Inbound { epoch: u64, frame: WsFrame },
    ReadError { epoch: u64, error: String },
    Closed { epoch: u64, cause: CloseCause },
    ConnectionFailed { epoch: u64, error: ChannelError },
    HeartbeatTick { epoch: u64 },
    ReconnectDue { generation: u64 },
}

impl<S, R, H, T> KameoMessage<ChannelEventInternal> for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Reply = ();

    async fn handle(
        &mut self,
        event: ChannelEventInternal,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        match event {
            ChannelEventInternal::Inbound { epoch, frame } => {
                if self.is_live(epoch) {
                    self.process_inbound(frame);
                }
            }
            ChannelEventInternal::ReadError { epoch, error } => {
                if self.is_live(epoch) {
                    self.health.record_error("read", &error);
                    warn!(connection = %self.connection_label(), epoch, error = %error, "status channel transport error");
                    self.notify_error(&ChannelError::TransportError {
                        context: "read",
                        error,
                    });
                }
            }
            ChannelEventInternal::Closed { epoch, cause } => {
                if self.is_live(epoch) {
                    self.handle_transport_closed(cause);
                } else {
                    debug!(epoch, current = self.epoch, "ignoring close from discarded transport");
                }
            }
            ChannelEventInternal::ConnectionFailed { epoch, error } => {
                self.handle_connection_failed(epoch, error, true);
            }
            ChannelEventInternal::HeartbeatTick { epoch } => {
                if self.is_live(epoch) {
                    self.emit_heartbeat();
                }
            }
            ChannelEventInternal::ReconnectDue { generation } => {
                self.handle_reconnect_due(generation);
            }
        }
    }
}

/// Deliver an event from one of the channel's own tasks.
///
/// Tasks only hold a weak reference, so dropping every owner handle stops the actor. Returns
/// `false` once the channel is gone.
async fn tell_channel<S, R, H, T>(
    actor_ref: &WeakActorRef<StatusChannelActor<S, R, H, T>>,
    event: ChannelEventInternal,
) -> bool
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    match actor_ref.upgrade() {
        Some(actor_ref) => actor_ref.tell(event).send().await.is_ok(),
        None => false,
    }
}

pub(crate) struct ConnectionEstablished<TR: WsTransport> {
    pub(crate) epoch: u64,
    pub(crate) reader: TR::Reader,
    pub(crate) writer: TR::Writer,
}

impl<S, R, H, T> KameoMessage<ConnectionEstablished<T>> for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Reply = ();

    async fn handle(
        &mut self,
        msg: ConnectionEstablished<T>,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.on_connection_established(msg.epoch, msg.reader, msg.writer);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GetChannelStats;

impl<S, R, H, T> KameoMessage<GetChannelStats> for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Reply = ChannelResult<ChannelStats>;

    async fn handle(
        &mut self,
        _message: GetChannelStats,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        Ok(self.health.get_stats())
    }
}

impl<S, R, H, T> StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    fn connection_label(&self) -> &str {
        self.endpoint.host()
    }

    /// Event belongs to the transport currently held by an open channel.
    fn is_live(&self, epoch: u64) -> bool {
        epoch == self.epoch && self.state == ChannelState::Open
    }

    fn snapshot(&self) -> ChannelSnapshot {
        ChannelSnapshot {
            state: self.state,
            connected: self.state == ChannelState::Open,
            connection_id: self.connection_id,
            reconnecting: self.state == ChannelState::Reconnecting
                || (self.state == ChannelState::Connecting && self.attempt > 0),
            attempt: self.attempt,
            next_delay: self.reconnect.current_delay(),
        }
    }

    fn publish(&self) {
        self.snapshot_tx.send_replace(self.snapshot());
    }

    fn notify_disconnected(&mut self) {
        let subscriber = &mut self.subscriber;
        guarded("on_disconnected", || subscriber.on_disconnected());
    }

    fn notify_error(&mut self, error: &ChannelError) {
        let subscriber = &mut self.subscriber;
        guarded("on_error", || subscriber.on_error(error));
    }

    fn begin_connect(&mut self, trigger: &'static str) {
        match self.state {
            ChannelState::Connecting | ChannelState::Open => {
                debug!(
                    connection = %self.connection_label(),
                    state = %self.state,
                    trigger,
                    "status channel already connected or connecting"
                );
                return;
            }
            ChannelState::Reconnecting => self.cancel_reconnect_timer(),
            ChannelState::Disconnected => {}
        }

        self.manual_close = false;
        self.epoch = self.epoch.wrapping_add(1);
        let epoch = self.epoch;
        self.state = ChannelState::Connecting;
        self.publish();

        let url = match self.endpoint.url() {
            Ok(url) => url,
            Err(err) => {
                self.handle_connection_failed(epoch, err, false);
                return;
            }
        };

        info!(
            connection = %self.connection_label(),
            url = %url,
            epoch,
            attempt = self.attempt,
            trigger,
            "connecting status channel"
        );

        let self_ref = self.actor_ref.clone();
        let buffers = self.buffers;
        let transport = self.transport.clone();

        tokio::spawn(async move {
            match transport.connect(url, buffers).await {
                Ok((reader, mut writer)) => {
                    let Some(actor_ref) = self_ref.upgrade() else {
                        debug!(epoch, "status channel dropped while connecting");
                        let _ = writer.close().await;
                        return;
                    };
                    let _ = actor_ref
                        .tell(ConnectionEstablished::<T> {
                            epoch,
                            reader,
                            writer,
                        })
                        .send()
                        .await;
                }
                Err(error) => {
                    tell_channel(&self_ref, ChannelEventInternal::ConnectionFailed { epoch, error })
                        .await;
                }
            };
        });
    }

    /// A connect attempt that never reached Open.
    ///
    /// `handshake_failed` marks attempts where a socket was tried and went away; subscribers
    /// hear `on_disconnected` after `on_error` for those. An unusable endpoint only reports
    /// the error.
    fn handle_connection_failed(&mut self, epoch: u64, error: ChannelError, handshake_failed: bool) {
        if epoch != self.epoch || self.state != ChannelState::Connecting {
            debug!(epoch, current = self.epoch, error = %error, "ignoring failure of superseded connect");
            return;
        }
        let reason = error.to_string();
        self.health.record_error("connect", &reason);
        self.notify_error(&error);
        if handshake_failed {
            self.notify_disconnected();
        }
        self.schedule_reconnect("connection_failed", &reason);
    }

    fn on_connection_established(&mut self, epoch: u64, reader: T::Reader, writer: T::Writer) {
        if epoch != self.epoch || self.state != ChannelState::Connecting {
            debug!(epoch, current = self.epoch, "discarding transport opened after it was superseded");
            drop(reader);
            let mut writer = writer;
            tokio::spawn(async move {
                let _ = writer.close().await;
            });
            return;
        }

        info!(
            connection = %self.connection_label(),
            epoch,
            after_attempts = self.attempt,
            "status channel open"
        );
        self.state = ChannelState::Open;
        self.attempt = 0;
        self.reconnect.reset();
        self.heartbeat.reset();
        self.health.reset();
        self.connection_id = None;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.io_shutdown = Some(shutdown_tx);
        self.writer_ref = Some(ChannelWriterActor::spawn(ChannelWriterActor::new(
            writer, epoch,
        )));
        self.spawn_reader(epoch, reader, shutdown_rx.clone());
        self.start_heartbeat(epoch, shutdown_rx);
        self.publish();
    }

    fn spawn_reader(&self, epoch: u64, reader: T::Reader, mut shutdown: watch::Receiver<bool>) {
        let actor_ref = self.actor_ref.clone();
        let label = self.connection_label().to_string();
        let mut read = reader;

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow_and_update() { break; }
                    }
                    message = read.next() => {
                        match message {
                            Some(Ok(WsFrame::Close(frame))) => {
                                info!(connection = %label, epoch, close = ?frame, "received close frame");
                                let cause = CloseCause::Remote {
                                    code: frame.as_ref().map(|f| f.code),
                                    reason: frame.as_ref().map(|f| f.reason_lossy()).unwrap_or_default(),
                                };
                                tell_channel(&actor_ref, ChannelEventInternal::Closed { epoch, cause })
                                    .await;
                                break;
                            }
                            Some(Ok(frame)) => {
                                if !tell_channel(&actor_ref, ChannelEventInternal::Inbound { epoch, frame })
                                    .await
                                {
                                    break;
                                }
                            }
                            Some(Err(err)) => {
                                let error = err.to_string();
                                tell_channel(
                                    &actor_ref,
                                    ChannelEventInternal::ReadError { epoch, error: error.clone() },
                                )
                                .await;
                                tell_channel(
                                    &actor_ref,
                                    ChannelEventInternal::Closed {
                                        epoch,
                                        cause: CloseCause::ReadFailure { error },
                                    },
                                )
                                .await;
                                break;
                            }
                            None => {
                                tell_channel(
                                    &actor_ref,
                                    ChannelEventInternal::Closed {
                                        epoch,
                                        cause: CloseCause::StreamEnded,
                                    },
                                )
                                .await;
                                break;
                            }
                        }
                    }
                }
            }
        });
    }

    fn start_heartbeat(&mut self, epoch: u64, mut shutdown: watch::Receiver<bool>) {
        self.stop_heartbeat();

        let interval = self.heartbeat.interval();
        if interval.is_zero() {
            info!(connection = %self.connection_label(), "heartbeat disabled");
            return;
        }
        let actor_ref = self.actor_ref.clone();

        self.heartbeat_task = Some(tokio::spawn(async move {
            // First keepalive goes out one full interval after open.
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    res = shutdown.changed() => {
                        if res.is_err() || *shutdown.borrow_and_update() { break; }
                    }
                    _ = ticker.tick() => {
                        if !tell_channel(&actor_ref, ChannelEventInternal::HeartbeatTick { epoch }).await {
                            break;
                        }
                    }
                }
            }
        }));
    }

    fn stop_heartbeat(&mut self) {
        if let Some(handle) = self.heartbeat_task.take() {
            handle.abort();
        }
        self.heartbeat.reset();
    }

    fn emit_heartbeat(&mut self) {
        let Some(writer) = self.writer_ref.as_ref() else {
            return;
        };
        let Some(frame) = self.heartbeat.create_ping() else {
            return;
        };
        self.health.record_heartbeat();
        // Never wait on the writer: a stalled socket must not stall the manager.
        if let Err(err) = writer.tell(WriteHeartbeat { frame }).try_send() {
            warn!(
                connection = %self.connection_label(),
                epoch = self.epoch,
                error = %err,
                "heartbeat not handed to writer"
            );
        }
    }

    fn process_inbound(&mut self, frame: WsFrame) {
        self.health.record_message();
        let Some(raw) = frame.data_bytes() else {
            return;
        };

        let outcome = router::route(raw);
        match &outcome {
            RouteOutcome::Dispatch(InboundMessage::Connected { connection_id }) => {
                self.connection_id = Some(*connection_id);
                self.publish();
            }
            RouteOutcome::Dispatch(InboundMessage::Pong) => {
                let rtt = self.heartbeat.on_pong();
                self.health.record_pong(rtt);
            }
            RouteOutcome::Dropped(_) => {
                self.health.record_error("route", "dropped inbound envelope");
            }
            RouteOutcome::Dispatch(
                InboundMessage::SourceStatusChanged(_) | InboundMessage::Unrecognized { .. },
            ) => {}
        }
        router::deliver(&outcome, &mut self.subscriber);
    }

    fn handle_transport_closed(&mut self, cause: CloseCause) {
        info!(
            connection = %self.connection_label(),
            epoch = self.epoch,
            code = cause.code(),
            cause = ?cause,
            "status channel closed"
        );
        self.teardown_transport(None);
        self.connection_id = None;
        self.notify_disconnected();

        let reason = match &cause {
            CloseCause::Remote { code, reason } => format!("code={code:?} reason={reason}"),
            CloseCause::ReadFailure { error } => format!("read error: {error}"),
            CloseCause::StreamEnded => "stream ended".to_string(),
        };
        self.schedule_reconnect("closed", &reason);
    }

    fn schedule_reconnect(&mut self, event: &'static str, reason: &str) {
        if self.manual_close {
            debug!(connection = %self.connection_label(), event, "manual close set, not reconnecting");
            self.state = ChannelState::Disconnected;
            self.publish();
            return;
        }

        if self.reconnect_timer.is_some() {
            debug!(connection = %self.connection_label(), event, "reconnect already scheduled");
            return;
        }

        if !self.reconnect.should_retry() {
            debug!(
                connection = %self.connection_label(),
                event,
                reason = %reason,
                note = "retry_suppressed",
                "status channel reconnect plan"
            );
            self.state = ChannelState::Disconnected;
            self.publish();
            return;
        }

        let delay = self.reconnect.next_delay();
        self.attempt = self.attempt.saturating_add(1);
        self.health.increment_reconnect();
        self.state = ChannelState::Reconnecting;
        self.timer_generation = self.timer_generation.wrapping_add(1);
        let generation = self.timer_generation;

        warn!(
            connection = %self.connection_label(),
            event,
            reason = %reason,
            attempt = self.attempt,
            delay_ms = delay.as_millis().min(u64::MAX as u128) as u64,
            "status channel reconnect scheduled"
        );

        let actor_ref = self.actor_ref.clone();
        let handle = tokio::spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            tell_channel(&actor_ref, ChannelEventInternal::ReconnectDue { generation }).await;
        });
        self.reconnect_timer = Some(PendingReconnect { generation, handle });
        self.publish();
    }

    fn cancel_reconnect_timer(&mut self) {
        if let Some(timer) = self.reconnect_timer.take() {
            timer.handle.abort();
            debug!(generation = timer.generation, "reconnect timer cancelled");
        }
    }

    fn handle_reconnect_due(&mut self, generation: u64) {
        match self.reconnect_timer.as_ref() {
            Some(timer) if timer.generation == generation => {}
            _ => {
                debug!(generation, "ignoring cancelled reconnect timer");
                return;
            }
        }
        self.reconnect_timer = None;
        if self.state != ChannelState::Reconnecting {
            return;
        }
        // Leave Reconnecting first so begin_connect does not treat the fired timer as pending.
        self.state = ChannelState::Disconnected;
        self.begin_connect("reconnect_timer");
    }

    /// Discard the current transport: heartbeat stops, reader is told to exit, writer is
    /// retired in the background after an optional close frame, and the epoch moves on.
    fn teardown_transport(&mut self, close: Option<CloseTransport>) {
        self.stop_heartbeat();
        if let Some(shutdown) = self.io_shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(writer_ref) = self.writer_ref.take() {
            retire_writer(writer_ref, close, self.epoch);
        }
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Caller-initiated teardown shared by `disconnect`, `reconnect` and actor stop.
    ///
    /// Returns whether a transport was open.
    fn manual_teardown(&mut self) -> bool {
        self.manual_close = true;
        self.cancel_reconnect_timer();
        let was_open = self.state == ChannelState::Open;
        self.teardown_transport(Some(CloseTransport {
            code: NORMAL_CLOSURE,
            reason: MANUAL_CLOSE_REASON,
        }));
        self.attempt = 0;
        self.reconnect.reset();
        self.connection_id = None;
        self.state = ChannelState::Disconnected;
        was_open
    }
}

#[cfg(test)]
#[derive(Debug)]
pub(crate) struct ForceScheduleReconnect;

#[cfg(test)]
impl<S, R, H, T> KameoMessage<ForceScheduleReconnect> for StatusChannelActor<S, R, H, T>
where
    S: StatusSubscriber,
    R: ReconnectStrategy,
    H: HeartbeatStrategy,
    T: WsTransport,
{
    type Reply = ChannelResult<ChannelSnapshot>;

    async fn handle(
        &mut self,
        _message: ForceScheduleReconnect,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        self.schedule_reconnect("test", "forced");
        Ok(self.snapshot())
    }
}
