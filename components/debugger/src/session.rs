//! One debugger session
//!
//! Created on transport accept, destroyed on disconnect. The session
//! blocks until the handshake magic arrives byte-for-byte and echoes
//! it back before any packet parsing, then serves length-prefixed
//! command packets until the peer disposes, the stream ends, a frame
//! is malformed (fatal to the connection), or shutdown is requested.
//!
//! Breakpoint events originate on interpreter threads via the
//! installed hooks and are written through an independent writer
//! handle; everything the session suspended or armed is undone at
//! teardown.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use core_types::{MethodId, ThreadId};
use interpreter::{DebugHooks, Interpreter};
use parking_lot::Mutex;
use runtime_core::{RuntimeContext, ThreadStatus, VmThread};

use crate::protocol::{
    JdwpPacket, PacketReader, PacketWriter, ProtocolError, ERR_INVALID_THREAD, ERR_NONE,
    ERR_NOT_IMPLEMENTED, ERR_THREAD_NOT_SUSPENDED, HANDSHAKE, HEADER_LEN,
};
use crate::transport::{wait_readable, Connection, WaitOutcome, WakePipe};

const MAX_PACKET: u32 = 1 << 20;

const EVENT_KIND_BREAKPOINT: u8 = 2;
const SUSPEND_POLICY_EVENT_THREAD: u8 = 1;
const SUSPEND_POLICY_ALL: u8 = 2;
const MODKIND_LOCATION_ONLY: u8 = 7;
const TYPE_TAG_CLASS: u8 = 1;

/// One armed breakpoint request.
#[derive(Debug, Clone)]
struct BreakpointRequest {
    request_id: u32,
    method: MethodId,
    pc: u32,
    suspend_policy: u8,
}

/// State shared between the session thread and interpreter threads.
#[derive(Default)]
pub struct SessionShared {
    writer: Mutex<Option<Box<dyn Write + Send>>>,
    next_request_id: AtomicU32,
    breakpoints: Mutex<Vec<BreakpointRequest>>,
    suspended: Mutex<Vec<ThreadId>>,
}

impl SessionShared {
    fn post_event(&self, packet: Vec<u8>) {
        let mut writer = self.writer.lock();
        if let Some(w) = writer.as_mut() {
            if let Err(e) = w.write_all(&packet).and_then(|()| w.flush()) {
                log::warn!("dropping debugger event: {e}");
            }
        }
    }

    fn record_suspension(&self, id: ThreadId) {
        self.suspended.lock().push(id);
    }
}

/// Interpreter-side hooks posting breakpoint events to the session.
pub struct SessionHooks {
    shared: Arc<SessionShared>,
    next_event_id: AtomicU32,
}

impl DebugHooks for SessionHooks {
    fn on_breakpoint(
        &self,
        ctx: &RuntimeContext,
        thread: &VmThread,
        method: MethodId,
        pc: u32,
    ) {
        let Some(request) = self
            .shared
            .breakpoints
            .lock()
            .iter()
            .find(|b| b.method == method && b.pc == pc)
            .cloned()
        else {
            return;
        };

        match request.suspend_policy {
            SUSPEND_POLICY_EVENT_THREAD => {
                ctx.threads.suspend_thread(thread.id());
                self.shared.record_suspension(thread.id());
            }
            SUSPEND_POLICY_ALL => {
                for control in ctx.threads.controls() {
                    ctx.threads.suspend_thread(control.id);
                    self.shared.record_suspension(control.id);
                }
            }
            _ => {}
        }

        let class = ctx.method(method).class;
        let mut w = PacketWriter::new();
        w.u8(request.suspend_policy).u32(1).u8(EVENT_KIND_BREAKPOINT);
        w.u32(request.request_id);
        w.u64(thread.id().0 as u64);
        w.u8(TYPE_TAG_CLASS).u64(class.0 as u64).u64(method.0 as u64);
        w.u64(pc as u64);
        let id = self.next_event_id.fetch_add(1, Ordering::Relaxed);
        let packet = JdwpPacket::encode_command(0x8000_0000 | id, 64, 100, &w.finish());
        log::debug!("posting breakpoint event at {method:?}:{pc}");
        self.shared.post_event(packet);
    }

    fn on_thread_death(&self, _ctx: &RuntimeContext, thread: ThreadId) {
        log::debug!("thread {thread:?} died with an uncaught exception");
    }
}

enum Disposition {
    Continue,
    Dispose,
}

/// A connected debugger session.
pub struct JdwpSession {
    ctx: Arc<RuntimeContext>,
    interp: Arc<Interpreter>,
    shared: Arc<SessionShared>,
    conn: Box<dyn Connection>,
    wake: Arc<WakePipe>,
}

impl JdwpSession {
    /// Wrap an accepted connection and install the event hooks.
    pub fn new(
        ctx: Arc<RuntimeContext>,
        interp: Arc<Interpreter>,
        conn: Box<dyn Connection>,
        wake: Arc<WakePipe>,
    ) -> Result<Self, ProtocolError> {
        let shared = Arc::new(SessionShared::default());
        *shared.writer.lock() = Some(conn.writer()?);
        interp.set_hooks(Arc::new(SessionHooks {
            shared: shared.clone(),
            next_event_id: AtomicU32::new(1),
        }));
        Ok(Self {
            ctx,
            interp,
            shared,
            conn,
            wake,
        })
    }

    /// Serve the connection until disconnect, dispose or shutdown.
    /// Teardown runs regardless of how the session ends.
    pub fn run(&mut self) -> Result<(), ProtocolError> {
        let result = self.serve();
        self.teardown();
        result
    }

    fn serve(&mut self) -> Result<(), ProtocolError> {
        self.handshake()?;
        loop {
            let frame = self.read_frame()?;
            let packet = JdwpPacket::decode(&frame)?;
            log::trace!(
                "command {}:{} id={}",
                packet.command_set,
                packet.command,
                packet.id
            );
            if let Disposition::Dispose = self.handle(&packet)? {
                return Ok(());
            }
        }
    }

    /// The once-per-connection special case: the magic must arrive
    /// byte-for-byte and is echoed back verbatim before any framing.
    fn handshake(&mut self) -> Result<(), ProtocolError> {
        let mut magic = [0u8; HANDSHAKE.len()];
        self.read_exact_wake(&mut magic)?;
        if &magic != HANDSHAKE {
            log::warn!("rejecting connection with bad handshake");
            return Err(ProtocolError::BadHandshake);
        }
        self.conn.write_all(HANDSHAKE)?;
        self.conn.flush()?;
        log::debug!("handshake complete");
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let mut len_bytes = [0u8; 4];
        self.read_exact_wake(&mut len_bytes)?;
        let length = u32::from_be_bytes(len_bytes);
        if length < HEADER_LEN as u32 || length > MAX_PACKET {
            return Err(ProtocolError::BadLength(length));
        }
        let mut frame = vec![0u8; length as usize];
        frame[..4].copy_from_slice(&len_bytes);
        self.read_exact_wake(&mut frame[4..])?;
        Ok(frame)
    }

    /// `read_exact` multiplexed with the wake pipe.
    fn read_exact_wake(&mut self, buf: &mut [u8]) -> Result<(), ProtocolError> {
        let mut filled = 0;
        while filled < buf.len() {
            match wait_readable(self.conn.raw_fd(), &self.wake)? {
                WaitOutcome::Woken => return Err(ProtocolError::Shutdown),
                WaitOutcome::Ready => {}
            }
            let n = self.conn.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(ProtocolError::Io(std::io::Error::new(
                    std::io::ErrorKind::UnexpectedEof,
                    "peer closed",
                )));
            }
            filled += n;
        }
        Ok(())
    }

    fn reply(&mut self, id: u32, error: u16, payload: &[u8]) -> Result<(), ProtocolError> {
        let bytes = JdwpPacket::encode_reply(id, error, payload);
        self.conn.write_all(&bytes)?;
        self.conn.flush()?;
        Ok(())
    }

    fn handle(&mut self, packet: &JdwpPacket) -> Result<Disposition, ProtocolError> {
        match (packet.command_set, packet.command) {
            (1, 1) => {
                let mut w = PacketWriter::new();
                w.string("Forge VM debug interface");
                w.u32(1).u32(6);
                w.string(env!("CARGO_PKG_VERSION"));
                w.string("ForgeVM");
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            // All object-shaped ids travel as 8 bytes
            (1, 7) => {
                let mut w = PacketWriter::new();
                for _ in 0..5 {
                    w.u32(8);
                }
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            (1, 4) => {
                let controls = self.ctx.threads.controls();
                let mut w = PacketWriter::new();
                w.u32(controls.len() as u32);
                for c in &controls {
                    w.u64(c.id.0 as u64);
                }
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            (1, 8) => {
                for control in self.ctx.threads.controls() {
                    self.ctx.threads.suspend_thread(control.id);
                    self.shared.record_suspension(control.id);
                }
                self.reply(packet.id, ERR_NONE, &[])?;
            }
            (1, 9) => {
                self.resume_all_recorded();
                self.reply(packet.id, ERR_NONE, &[])?;
            }
            (1, 6) => {
                self.reply(packet.id, ERR_NONE, &[])?;
                return Ok(Disposition::Dispose);
            }
            (11, command) => {
                let disposition = self.handle_thread_command(packet, command)?;
                return Ok(disposition);
            }
            (15, 1) => return self.handle_event_set(packet),
            (15, 2) => {
                let mut r = PacketReader::new(&packet.payload);
                let _kind = r.u8()?;
                let request_id = r.u32()?;
                let mut breakpoints = self.shared.breakpoints.lock();
                if let Some(pos) =
                    breakpoints.iter().position(|b| b.request_id == request_id)
                {
                    let b = breakpoints.remove(pos);
                    self.interp.instrumentation().disarm(b.method, b.pc);
                }
                drop(breakpoints);
                self.reply(packet.id, ERR_NONE, &[])?;
            }
            (16, 1) => return self.handle_frame_values(packet),
            (set, command) => {
                log::debug!("unimplemented command {set}:{command}");
                self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
            }
        }
        Ok(Disposition::Continue)
    }

    fn handle_thread_command(
        &mut self,
        packet: &JdwpPacket,
        command: u8,
    ) -> Result<Disposition, ProtocolError> {
        let mut r = PacketReader::new(&packet.payload);
        let tid = ThreadId(r.u64()? as u32);
        let Some(control) = self.ctx.threads.by_id(tid) else {
            self.reply(packet.id, ERR_INVALID_THREAD, &[])?;
            return Ok(Disposition::Continue);
        };
        match command {
            1 => {
                let mut w = PacketWriter::new();
                w.string(&control.name.lock().clone());
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            2 => {
                self.ctx.threads.suspend_thread(tid);
                self.shared.record_suspension(tid);
                self.reply(packet.id, ERR_NONE, &[])?;
            }
            3 => {
                self.ctx.threads.resume_thread(tid);
                let mut suspended = self.shared.suspended.lock();
                if let Some(pos) = suspended.iter().position(|&s| s == tid) {
                    suspended.remove(pos);
                }
                drop(suspended);
                self.reply(packet.id, ERR_NONE, &[])?;
            }
            4 => {
                let status = match control.status() {
                    ThreadStatus::Monitor => 3u32,
                    _ => 1u32,
                };
                let suspended = u32::from(control.status() == ThreadStatus::Suspended);
                let mut w = PacketWriter::new();
                w.u32(status).u32(suspended);
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            6 | 7 => {
                // Frame inspection is only valid on a confirmed-
                // suspended thread publishing a snapshot
                let Some(snapshot) = (control.status() == ThreadStatus::Suspended)
                    .then(|| control.snapshot())
                    .flatten()
                else {
                    self.reply(packet.id, ERR_THREAD_NOT_SUSPENDED, &[])?;
                    return Ok(Disposition::Continue);
                };
                let mut w = PacketWriter::new();
                if command == 7 {
                    w.u32(snapshot.frames.len() as u32);
                } else {
                    w.u32(snapshot.frames.len() as u32);
                    for (i, frame) in snapshot.frames.iter().enumerate() {
                        let class = self.ctx.method(frame.method).class;
                        w.u64(i as u64);
                        w.u8(TYPE_TAG_CLASS)
                            .u64(class.0 as u64)
                            .u64(frame.method.0 as u64)
                            .u64(frame.pc as u64);
                    }
                }
                self.reply(packet.id, ERR_NONE, &w.finish())?;
            }
            other => {
                log::debug!("unimplemented thread command {other}");
                self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
            }
        }
        Ok(Disposition::Continue)
    }

    fn handle_event_set(&mut self, packet: &JdwpPacket) -> Result<Disposition, ProtocolError> {
        let mut r = PacketReader::new(&packet.payload);
        let kind = r.u8()?;
        let suspend_policy = r.u8()?;
        let modifier_count = r.u32()?;

        if kind != EVENT_KIND_BREAKPOINT {
            log::debug!("unsupported event kind {kind}");
            self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
            return Ok(Disposition::Continue);
        }

        let mut location = None;
        for _ in 0..modifier_count {
            let mod_kind = r.u8()?;
            if mod_kind != MODKIND_LOCATION_ONLY {
                self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
                return Ok(Disposition::Continue);
            }
            let _type_tag = r.u8()?;
            let _class_id = r.u64()?;
            let method = MethodId(r.u64()? as u32);
            let pc = r.u64()? as u32;
            location = Some((method, pc));
        }
        let Some((method_id, pc)) = location else {
            self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
            return Ok(Disposition::Continue);
        };

        let method = self.ctx.method(method_id);
        if !self.interp.instrumentation().arm(&method, pc) {
            self.reply(packet.id, ERR_NOT_IMPLEMENTED, &[])?;
            return Ok(Disposition::Continue);
        }
        let request_id = self.shared.next_request_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.shared.breakpoints.lock().push(BreakpointRequest {
            request_id,
            method: method_id,
            pc,
            suspend_policy: suspend_policy.min(SUSPEND_POLICY_ALL),
        });
        let mut w = PacketWriter::new();
        w.u32(request_id);
        self.reply(packet.id, ERR_NONE, &w.finish())?;
        Ok(Disposition::Continue)
    }

    fn handle_frame_values(&mut self, packet: &JdwpPacket) -> Result<Disposition, ProtocolError> {
        let mut r = PacketReader::new(&packet.payload);
        let tid = ThreadId(r.u64()? as u32);
        let frame_index = r.u64()? as usize;
        let slot_count = r.u32()?;

        let Some(control) = self.ctx.threads.by_id(tid) else {
            self.reply(packet.id, ERR_INVALID_THREAD, &[])?;
            return Ok(Disposition::Continue);
        };
        let Some(snapshot) = (control.status() == ThreadStatus::Suspended)
            .then(|| control.snapshot())
            .flatten()
        else {
            self.reply(packet.id, ERR_THREAD_NOT_SUSPENDED, &[])?;
            return Ok(Disposition::Continue);
        };
        let Some(frame) = snapshot.frames.get(frame_index) else {
            self.reply(packet.id, ERR_INVALID_THREAD, &[])?;
            return Ok(Disposition::Continue);
        };

        let mut w = PacketWriter::new();
        w.u32(slot_count);
        for _ in 0..slot_count {
            let slot = r.u32()? as usize;
            let tag = r.u8()?;
            w.u8(tag);
            match tag {
                b'J' | b'D' => {
                    let low = *frame.registers.get(slot).unwrap_or(&0) as u64;
                    let high = *frame.registers.get(slot + 1).unwrap_or(&0) as u64;
                    w.u64(low | (high << 32));
                }
                b'L' => {
                    w.u64(*frame.registers.get(slot).unwrap_or(&0) as u64);
                }
                _ => {
                    w.u32(*frame.registers.get(slot).unwrap_or(&0));
                }
            }
        }
        self.reply(packet.id, ERR_NONE, &w.finish())?;
        Ok(Disposition::Continue)
    }

    fn resume_all_recorded(&mut self) {
        let mut suspended = self.shared.suspended.lock();
        for tid in suspended.drain(..) {
            self.ctx.threads.resume_thread(tid);
        }
    }

    /// Detach cleanup: revert every breakpoint, resume everything this
    /// session suspended, stop posting events.
    fn teardown(&mut self) {
        self.shared.writer.lock().take();
        self.shared.breakpoints.lock().clear();
        self.interp.clear_hooks();
        self.resume_all_recorded();
        log::info!("debugger session closed");
    }
}
