pub mod actor;
pub mod handle;
pub mod writer;

pub use actor::{GetChannelStats, StatusChannelActor, StatusChannelArgs, StatusChannelCommand};
pub use handle::StatusChannel;
pub use writer::{ChannelWriterActor, CloseTransport, WRITER_CLOSE_GRACE, WriteHeartbeat};
