//! JDWP-style debugger engine
//!
//! A packet-oriented state machine over a byte-stream transport:
//! handshake echo, length-prefixed big-endian framing, command
//! handlers, and composite event posting. Transport failures are fatal
//! to the one connection, never to the process; detach reverts every
//! breakpoint and resumes everything the session suspended.
//!
//! Two transports share the packet layer: a TCP listen socket, and a
//! host-bridge control socket that passes an established descriptor
//! over ancillary data. Both use the wake-pipe convention so shutdown
//! always unblocks a pending wait.

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(unix)]
pub mod agent;
pub mod protocol;
#[cfg(unix)]
pub mod session;
#[cfg(unix)]
pub mod transport;

#[cfg(unix)]
pub use agent::DebugAgent;
pub use protocol::{JdwpPacket, PacketReader, PacketWriter, ProtocolError, HANDSHAKE};
#[cfg(unix)]
pub use session::JdwpSession;
