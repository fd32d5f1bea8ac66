//! The debugger agent thread
//!
//! Owns the transport, accepts one session at a time, and serves it
//! until disconnect. Protocol failures close the session and the agent
//! goes back to accepting; only a shutdown request (via the wake pipe)
//! ends the agent. The VM keeps running undisturbed either way.

use std::sync::Arc;
use std::thread::JoinHandle;

use core_types::JdwpTransportKind;
use interpreter::Interpreter;
use runtime_core::RuntimeContext;

use crate::protocol::ProtocolError;
use crate::session::JdwpSession;
use crate::transport::{Connection, ControlTransport, SocketTransport, WakePipe};

/// Handle to the running agent.
pub struct DebugAgent {
    wake: Arc<WakePipe>,
    thread: Option<JoinHandle<()>>,
    port: Option<u16>,
}

impl DebugAgent {
    /// Start the agent on its own thread.
    ///
    /// For the socket transport, `endpoint` is a port number (0 picks
    /// an ephemeral port, reported by [`DebugAgent::port`]); for the
    /// control transport it is the bridge socket path.
    pub fn spawn(
        ctx: Arc<RuntimeContext>,
        interp: Arc<Interpreter>,
        kind: JdwpTransportKind,
        endpoint: &str,
    ) -> std::io::Result<DebugAgent> {
        let wake = Arc::new(WakePipe::new()?);
        let wake_for_thread = wake.clone();

        let (port, accept): (Option<u16>, AcceptFn) = match kind {
            JdwpTransportKind::Socket => {
                let port_num: u16 = endpoint.parse().map_err(|_| {
                    std::io::Error::new(
                        std::io::ErrorKind::InvalidInput,
                        "socket transport endpoint must be a port",
                    )
                })?;
                let transport = SocketTransport::bind(port_num)?;
                let bound = transport.port()?;
                (
                    Some(bound),
                    Box::new(move |wake: &WakePipe| {
                        transport
                            .accept(wake)
                            .map(|c| c.map(|s| Box::new(s) as Box<dyn Connection>))
                    }),
                )
            }
            JdwpTransportKind::Control => {
                let transport = ControlTransport::connect(endpoint)?;
                (
                    None,
                    Box::new(move |wake: &WakePipe| {
                        transport
                            .accept(wake)
                            .map(|c| c.map(|s| Box::new(s) as Box<dyn Connection>))
                    }),
                )
            }
        };

        let thread = std::thread::Builder::new()
            .name("jdwp-agent".to_string())
            .spawn(move || agent_loop(ctx, interp, wake_for_thread, accept))?;

        Ok(DebugAgent {
            wake,
            thread: Some(thread),
            port,
        })
    }

    /// The bound TCP port, for the socket transport.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    /// Ask the agent to stop and wait for it. Always unblocks a
    /// pending accept or read, even with no peer traffic.
    pub fn shutdown(mut self) {
        self.wake.wake();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

type AcceptFn =
    Box<dyn FnMut(&WakePipe) -> Result<Option<Box<dyn Connection>>, ProtocolError> + Send>;

fn agent_loop(
    ctx: Arc<RuntimeContext>,
    interp: Arc<Interpreter>,
    wake: Arc<WakePipe>,
    mut accept: AcceptFn,
) {
    loop {
        let conn = match accept(&wake) {
            Ok(Some(conn)) => conn,
            // Woken: shutdown requested
            Ok(None) => return,
            Err(e) => {
                log::warn!("debugger accept failed: {e}");
                return;
            }
        };
        let session = JdwpSession::new(ctx.clone(), interp.clone(), conn, wake.clone());
        match session {
            Ok(mut session) => match session.run() {
                Ok(()) | Err(ProtocolError::Io(_)) => {}
                Err(ProtocolError::Shutdown) => return,
                Err(e) => log::warn!("debugger session ended: {e}"),
            },
            Err(e) => log::warn!("debugger session setup failed: {e}"),
        }
    }
}
