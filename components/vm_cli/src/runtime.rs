//! Runtime assembly for the launcher

use std::sync::Arc;

use core_types::{DispatchKind, JValue, RuntimeOptions};
#[cfg(unix)]
use debugger::DebugAgent;
use interpreter::Interpreter;
use runtime_core::RuntimeContext;

use crate::demos;
use crate::error::{CliError, CliResult};
use crate::Cli;

/// A fully wired VM: context, interpreter, demo unit, and (optionally)
/// a listening debugger agent.
pub struct Runtime {
    ctx: Arc<RuntimeContext>,
    interp: Arc<Interpreter>,
    #[cfg(unix)]
    agent: Option<DebugAgent>,
}

impl Runtime {
    /// Build a runtime from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> CliResult<Runtime> {
        let mut options = match &cli.options {
            Some(path) => {
                let text = std::fs::read_to_string(path)?;
                serde_json::from_str::<RuntimeOptions>(&text)
                    .map_err(|e| CliError::Options(e.to_string()))?
            }
            None => RuntimeOptions::default(),
        };
        if let Some(dispatch) = &cli.dispatch {
            options.dispatch = match dispatch.as_str() {
                "portable" => DispatchKind::Portable,
                "threaded" => DispatchKind::Threaded,
                other => return Err(CliError::Options(format!("unknown dispatch '{other}'"))),
            };
        }
        if let Some(port) = cli.jdwp_port {
            options.jdwp_port = Some(port);
        }
        Self::new(options)
    }

    /// Build a runtime from explicit options.
    pub fn new(options: RuntimeOptions) -> CliResult<Runtime> {
        let jdwp_port = options.jdwp_port;
        let ctx = Arc::new(RuntimeContext::new(options)?);
        let interp = Interpreter::new(&ctx.options);
        interp.install(&ctx);

        demos::register_natives(&ctx);
        let unit = ctx.load_unit(demos::build_demo_unit());
        resolver::link_unit(&ctx, unit)?;

        #[cfg(unix)]
        let agent = match jdwp_port {
            Some(port) => Some(DebugAgent::spawn(
                ctx.clone(),
                interp.clone(),
                ctx.options.jdwp_transport,
                &port.to_string(),
            )?),
            None => None,
        };
        #[cfg(not(unix))]
        if jdwp_port.is_some() {
            log::warn!("debugger transport is not available on this platform");
        }

        Ok(Runtime {
            ctx,
            interp,
            #[cfg(unix)]
            agent,
        })
    }

    /// The runtime context (used by integration tests).
    pub fn context(&self) -> &Arc<RuntimeContext> {
        &self.ctx
    }

    /// Run a demo method by name with one int argument.
    pub fn run_demo(&self, name: &str, arg: i32) -> CliResult<JValue> {
        if !matches!(name, "sum" | "fact" | "throw") {
            return Err(CliError::UnknownDemo(name.to_string()));
        }
        let class = self
            .ctx
            .find_class("demo/Main")
            .expect("demo unit is linked");
        let method = self
            .ctx
            .find_method_in(class, name, "II")
            .expect("demo method exists");

        let mut thread = self.ctx.threads.attach("main");
        let result = self
            .interp
            .invoke_method(&self.ctx, &mut thread, method.id, &[JValue::Int(arg)]);
        let out = result.map_err(|_| {
            let pending = thread.take_pending().expect("raise without pending");
            CliError::Uncaught(runtime_core::exception::describe(&self.ctx, pending))
        });
        self.ctx.threads.detach(&thread);
        out
    }

    /// Stop the debugger agent (if any) and drop the runtime.
    pub fn shutdown(self) {
        #[cfg(unix)]
        if let Some(agent) = self.agent {
            agent.shutdown();
        }
    }
}
