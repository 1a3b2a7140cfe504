//! Wire representation of every frame the monitor exchanges.
//!
//! Outbound structs serialize with `serde_json` in declaration order, which is
//! the order the inspection tool expects. Inbound structs are decoded leniently:
//! a frame that fails to decode as one record type is simply "not that record".

mod inbound;
mod outbound;

pub use inbound::{MonitorCommand, MonitorCommandFrame, SessionIdentity, SessionRecord};
pub use outbound::{ActionObject, EmitObject, Handshake, Login, MonitorEvent, ReduxAction};

/// Keepalive ping sent by the transport as a bare text frame.
pub const PING_FRAME: &str = "#1";

/// Reply to [`PING_FRAME`].
pub const PONG_FRAME: &str = "#2";
