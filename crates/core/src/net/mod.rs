mod backoff;
mod protocol;
mod rtt;
mod session;
mod transport;

pub use backoff::{BACKOFF_FACTOR, Backoff, MAX_WAIT_MS, MIN_WAIT_MS};
pub use protocol::{
    Actor, ActorId, ActorKind, ActorState, ClientCommand, CommandKind, Greeting, Message, Opcode,
    Outbound, ProtocolError, ServerMessage, WorldUpdate, decode, normalize,
};
pub use rtt::RttEstimator;
pub use session::{ReconnectTask, Session, SessionState};
pub use transport::{ControlEvent, Socket, Transport, TransportError};
