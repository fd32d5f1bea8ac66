//! Wire framing
//!
//! After the handshake, every message is a length-prefixed packet:
//!
//! ```text
//! length:4  id:4  flags:1  commandSet:1  command:1  payload...
//! ```
//!
//! Replies carry `flags = 0x80` and a 2-byte error code in place of
//! the command pair. All integers are big-endian regardless of host
//! byte order. Anything malformed is fatal to the connection.

use thiserror::Error;

/// The 14-byte connection magic, echoed back verbatim exactly once.
pub const HANDSHAKE: &[u8; 14] = b"JDWP-Handshake";

/// Reply flag bit.
pub const FLAG_REPLY: u8 = 0x80;

/// Packet header length (including the length word itself).
pub const HEADER_LEN: usize = 11;

/// Reply error code: success.
pub const ERR_NONE: u16 = 0;
/// Reply error code: the command is not implemented.
pub const ERR_NOT_IMPLEMENTED: u16 = 99;
/// Reply error code: the referenced thread is not suspended.
pub const ERR_THREAD_NOT_SUSPENDED: u16 = 13;
/// Reply error code: no such thread.
pub const ERR_INVALID_THREAD: u16 = 10;

/// Connection-fatal protocol failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Transport I/O failed or reached end of stream.
    #[error("transport error: {0}")]
    Io(#[from] std::io::Error),

    /// The first 14 bytes were not the magic.
    #[error("bad handshake")]
    BadHandshake,

    /// The length word is impossible (shorter than a header or
    /// beyond the sanity cap).
    #[error("bad packet length {0}")]
    BadLength(u32),

    /// The payload ended before a field was complete.
    #[error("truncated packet payload")]
    Truncated,

    /// The session was asked to shut down.
    #[error("shutdown requested")]
    Shutdown,
}

/// One decoded command packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JdwpPacket {
    /// Client-chosen id, echoed in the reply.
    pub id: u32,
    /// Flag byte (0 for commands).
    pub flags: u8,
    /// Command-set number.
    pub command_set: u8,
    /// Command number within the set.
    pub command: u8,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl JdwpPacket {
    /// Decode a packet from `bytes`, the full frame including the
    /// length word.
    pub fn decode(bytes: &[u8]) -> Result<JdwpPacket, ProtocolError> {
        if bytes.len() < HEADER_LEN {
            return Err(ProtocolError::Truncated);
        }
        let length = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        if length as usize != bytes.len() {
            return Err(ProtocolError::BadLength(length));
        }
        Ok(JdwpPacket {
            id: u32::from_be_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
            flags: bytes[8],
            command_set: bytes[9],
            command: bytes[10],
            payload: bytes[HEADER_LEN..].to_vec(),
        })
    }

    /// Encode a command packet (used by events and tests).
    pub fn encode_command(id: u32, command_set: u8, command: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&((HEADER_LEN + payload.len()) as u32).to_be_bytes());
        out.extend_from_slice(&id.to_be_bytes());
        out.push(0);
        out.push(command_set);
        out.push(command);
        out.extend_from_slice(payload);
        out
    }

    /// Encode a reply to packet `id` with an error code and payload.
    pub fn encode_reply(id: u32, error: u16, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&((HEADER_LEN + payload.len()) as u32).to_be_bytes());
        out.extend_from_slice(&id.to_be_bytes());
        out.push(FLAG_REPLY);
        out.extend_from_slice(&error.to_be_bytes());
        out.extend_from_slice(payload);
        out
    }
}

/// Big-endian payload reader.
#[derive(Debug)]
pub struct PacketReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    /// Reader over a payload.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.pos + n > self.bytes.len() {
            return Err(ProtocolError::Truncated);
        }
        let slice = &self.bytes[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read one byte.
    pub fn u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.take(1)?[0])
    }

    /// Read a big-endian u16.
    pub fn u16(&mut self) -> Result<u16, ProtocolError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32.
    pub fn u32(&mut self) -> Result<u32, ProtocolError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a big-endian u64.
    pub fn u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Read a length-prefixed UTF-8 string.
    pub fn string(&mut self) -> Result<String, ProtocolError> {
        let len = self.u32()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::Truncated)
    }

    /// Bytes left unread.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }
}

/// Big-endian payload writer.
#[derive(Debug, Default)]
pub struct PacketWriter {
    bytes: Vec<u8>,
}

impl PacketWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one byte.
    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.bytes.push(v);
        self
    }

    /// Append a big-endian u16.
    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian u32.
    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a big-endian u64.
    pub fn u64(&mut self, v: u64) -> &mut Self {
        self.bytes.extend_from_slice(&v.to_be_bytes());
        self
    }

    /// Append a length-prefixed UTF-8 string.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.u32(s.len() as u32);
        self.bytes.extend_from_slice(s.as_bytes());
        self
    }

    /// The accumulated payload.
    pub fn finish(self) -> Vec<u8> {
        self.bytes
    }
}
