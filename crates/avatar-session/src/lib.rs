pub mod action;
pub mod connection;
pub mod correlator;
pub mod dispatcher;
pub mod face;
pub mod health;
pub mod projections;
pub mod protocol;
pub mod runtime;
pub mod session;
pub mod timers;

pub use connection::{ChannelId, ConnectionPhase, ReconnectDelays};
pub use face::Face;
pub use protocol::OutboundMessage;
pub use runtime::{AvatarClient, ClientHandle, ClientOptions};
pub use session::{
    Diagnostics, Effect, Scene, Session, SessionError, SessionEvent, SessionTimings, Snapshot,
};
pub use timers::{TimerHandle, TimerRegistry};
