//! Message transports between a client session and the presentation server.

pub mod memory;
pub mod ws;

use std::future::Future;

use crate::error::TransportError;
use crate::protocol::{ClientMessage, TransportEvent};

pub use memory::{MemoryHub, MemoryTransport};
pub use ws::{WsConnector, WsTransport};

/// One live connection.
///
/// `recv` must be cancel safe: the runtime races it against timers and local
/// commands and drops it whenever another branch wins.
pub trait Transport {
    fn send(&mut self, message: ClientMessage) -> impl Future<Output = Result<(), TransportError>>;

    /// Next inbound event. Once `Disconnected` has been returned the
    /// connection is dead and a new one must be made.
    fn recv(&mut self) -> impl Future<Output = TransportEvent>;

    fn close(&mut self) -> impl Future<Output = ()> {
        async {}
    }
}

/// Factory for fresh connections, used for the initial connect and for every
/// reconnect attempt.
pub trait Connector {
    type Transport: Transport;

    fn connect(&mut self) -> impl Future<Output = Result<Self::Transport, TransportError>>;
}
