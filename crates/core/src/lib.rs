pub mod client;
pub mod clock;
pub mod config;
pub mod input;
pub mod net;
pub mod presentation;
pub mod snapshot;

pub use client::{RenderPhase, SyncClient, SyncStats};
pub use clock::{ClockOffset, LocalClock};
pub use config::{ClientConfig, ConfigError};
pub use input::{CommandTracker, PendingCommand};
pub use net::{
    Actor, ActorId, ActorKind, ActorState, ClientCommand, CommandKind, ControlEvent, Message,
    Outbound, ProtocolError, ServerMessage, Session, SessionState, Transport, TransportError,
};
pub use presentation::{ActorRegistry, ConnectionStatus, StatusIndicator};
pub use snapshot::{InterpolationConfig, InterpolationDelay, Snapshot, SnapshotBuffer};
