use std::time::Duration;

use futures_util::{Sink, SinkExt};
use kameo::prelude::{Actor, ActorRef, Context, Message as KameoMessage};
use tracing::{debug, warn};

use crate::core::{ChannelError, WsFrame};

/// Writer actor that owns the transport sink and serializes writes.
///
/// One writer exists per transport instance and is discarded with it.
pub struct ChannelWriterActor<W>
where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    writer: W,
    epoch: u64,
    closed: bool,
}

impl<W> ChannelWriterActor<W>
where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    pub fn new(writer: W, epoch: u64) -> Self {
        Self {
            writer,
            epoch,
            closed: false,
        }
    }
}

impl<W> Actor for ChannelWriterActor<W>
where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    type Args = Self;
    type Error = ChannelError;

    async fn on_start(args: Self::Args, _ctx: ActorRef<Self>) -> Result<Self, Self::Error> {
        Ok(args)
    }

    fn on_panic(
        &mut self,
        _actor_ref: kameo::actor::WeakActorRef<Self>,
        err: kameo::prelude::PanicError,
    ) -> impl std::future::Future<
        Output = Result<std::ops::ControlFlow<kameo::prelude::ActorStopReason>, Self::Error>,
    > + Send {
        let epoch = self.epoch;
        async move {
            tracing::error!(epoch, error = ?err, "ChannelWriterActor panicked");
            Ok(std::ops::ControlFlow::Break(
                kameo::prelude::ActorStopReason::Panicked(err),
            ))
        }
    }
}

/// Keepalive write. Failures are logged and swallowed: the transport may already be closing,
/// and the reader side reports the loss through the close path.
#[derive(Clone, Debug)]
pub struct WriteHeartbeat {
    pub frame: WsFrame,
}

impl<W> KameoMessage<WriteHeartbeat> for ChannelWriterActor<W>
where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    type Reply = ();

    async fn handle(
        &mut self,
        msg: WriteHeartbeat,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.closed {
            debug!(target: "status-ws-writer", epoch = self.epoch, "heartbeat after close ignored");
            return;
        }
        debug!(target: "status-ws-writer", epoch = self.epoch, "sending heartbeat");
        if let Err(err) = self.writer.send(msg.frame).await {
            warn!(
                target: "status-ws-writer",
                epoch = self.epoch,
                error = %err,
                "failed to send heartbeat"
            );
        }
    }
}

/// Send a close frame and shut the sink.
#[derive(Clone, Copy, Debug)]
pub struct CloseTransport {
    pub code: u16,
    pub reason: &'static str,
}

impl<W> KameoMessage<CloseTransport> for ChannelWriterActor<W>
where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    type Reply = ();

    async fn handle(
        &mut self,
        msg: CloseTransport,
        _ctx: &mut Context<Self, Self::Reply>,
    ) -> Self::Reply {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!(
            target: "status-ws-writer",
            epoch = self.epoch,
            code = msg.code,
            reason = msg.reason,
            "closing transport"
        );
        if let Err(err) = self.writer.send(WsFrame::close(msg.code, msg.reason)).await {
            debug!(target: "status-ws-writer", epoch = self.epoch, error = %err, "close frame not sent");
        }
        if let Err(err) = self.writer.close().await {
            debug!(target: "status-ws-writer", epoch = self.epoch, error = %err, "sink close failed");
        }
    }
}

/// How long a retired writer gets to flush its close frame before it is killed.
pub const WRITER_CLOSE_GRACE: Duration = Duration::from_secs(5);

/// Close and stop a writer in the background.
///
/// The caller never waits on the writer's mailbox. A writer stuck behind a stalled sink is
/// killed after [`WRITER_CLOSE_GRACE`], which drops the sink.
pub(crate) fn retire_writer<W>(
    writer: ActorRef<ChannelWriterActor<W>>,
    close: Option<CloseTransport>,
    epoch: u64,
) where
    W: Sink<WsFrame, Error = ChannelError> + Send + Unpin + 'static,
{
    tokio::spawn(async move {
        let graceful = async {
            if let Some(close) = close {
                let _ = writer.tell(close).send().await;
            }
            let _ = writer.stop_gracefully().await;
            writer.wait_for_shutdown().await;
        };
        if tokio::time::timeout(WRITER_CLOSE_GRACE, graceful).await.is_err() {
            warn!(target: "status-ws-writer", epoch, "writer stalled while closing, killing it");
            writer.kill();
        }
    });
}
