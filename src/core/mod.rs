pub mod endpoint;
pub mod frame;
pub mod health;
pub mod ping;
pub mod reconnect;
pub mod router;
pub mod subscriber;
pub mod types;

pub use endpoint::*;
pub use frame::*;
pub use health::*;
pub use ping::*;
pub use reconnect::*;
pub use router::{
    DropReason, InboundMessage, RouteOutcome, SourceStatusChange, SourceStatusData,
};
pub use subscriber::*;
pub use types::*;
