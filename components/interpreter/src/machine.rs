//! The public interpreter facade
//!
//! `Interpreter` bundles the configuration shared by every activation:
//! dispatch strategy, native-call strategy, the breakpoint table and
//! the debugger hooks. One instance serves the whole process; each
//! `invoke_method` call builds a fresh activation on the calling
//! thread.

use std::sync::Arc;

use class_model::flags;
use core_types::{DispatchKind, ExecResult, JValue, MethodId, ObjRef, RuntimeOptions, UnitId};
use native_bridge::{CallStrategy, HintedCall};
use parking_lot::RwLock;
use runtime_core::exception::{throw, throw_stack_overflow};
use runtime_core::{Invoker, RuntimeContext, ThreadStatus, VmThread};

use crate::exec::Machine;
use crate::instrumentation::{DebugHooks, InstrumentationTable, NullHooks};

/// Process-wide interpreter configuration and entry points.
pub struct Interpreter {
    dispatch: DispatchKind,
    strategy: Box<dyn CallStrategy>,
    instrumentation: InstrumentationTable,
    hooks: RwLock<Arc<dyn DebugHooks>>,
}

impl std::fmt::Debug for Interpreter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpreter")
            .field("dispatch", &self.dispatch)
            .field("breakpoints", &self.instrumentation.count())
            .finish()
    }
}

impl Interpreter {
    /// New interpreter configured from the runtime options.
    pub fn new(options: &RuntimeOptions) -> Arc<Self> {
        Arc::new(Self {
            dispatch: options.dispatch,
            strategy: Box::new(HintedCall::default()),
            instrumentation: InstrumentationTable::new(),
            hooks: RwLock::new(Arc::new(NullHooks)),
        })
    }

    /// Install this interpreter as the context's invoke engine.
    pub fn install(self: &Arc<Self>, ctx: &RuntimeContext) {
        ctx.set_invoker(self.clone());
    }

    /// The breakpoint table (shared with the debugger).
    pub fn instrumentation(&self) -> &InstrumentationTable {
        &self.instrumentation
    }

    /// Attach debugger hooks. Replaces any previous hooks.
    pub fn set_hooks(&self, hooks: Arc<dyn DebugHooks>) {
        *self.hooks.write() = hooks;
    }

    /// Detach debugger hooks and revert every armed breakpoint.
    pub fn clear_hooks(&self) {
        *self.hooks.write() = Arc::new(NullHooks);
        self.instrumentation.clear();
    }

    /// Invoke a method with typed arguments on the calling thread.
    ///
    /// Acquires the thread's shared mutator hold for the duration if it
    /// does not already have one (nested activations share the hold).
    /// An uncaught exception surfaces as `Err` with the object left
    /// pending on the thread.
    pub fn invoke_method(
        &self,
        ctx: &RuntimeContext,
        thread: &mut VmThread,
        method_id: MethodId,
        args: &[JValue],
    ) -> ExecResult<JValue> {
        let method = ctx.method(method_id);

        // Pack typed arguments into raw register words
        let mut words: Vec<u32> = Vec::new();
        for a in args {
            match a.slot_width() {
                2 => {
                    words.push(a.low_word());
                    words.push(a.high_word());
                }
                _ => words.push(a.low_word()),
            }
        }

        if method.is_static() {
            resolver::ensure_initialized(ctx, thread, method.class)?;
        }
        if method.is_native() {
            return native_bridge::invoke_native(ctx, thread, &method, &words, &*self.strategy);
        }
        let Some(body) = method.body.clone() else {
            return Err(throw(
                ctx,
                thread,
                ctx.well_known().linkage,
                &format!("invoking bodiless method {}", method.name),
            ));
        };
        debug_assert_eq!(words.len(), body.ins_size as usize);

        let acquired = !thread.holds_mutator;
        if acquired {
            ctx.threads.mutator.lock_shared();
            thread.holds_mutator = true;
            thread.control.set_status(ThreadStatus::Running);
        }

        let hooks = self.hooks.read().clone();
        let mut machine = Machine::new(
            ctx,
            thread,
            &*self.strategy,
            &self.instrumentation,
            &*hooks,
            self.dispatch,
        );
        let unit = method.unit.unwrap_or(UnitId(0));
        let result = if !machine.stack.push(method.clone(), body, unit) {
            Err(throw_stack_overflow(ctx, machine.thread))
        } else {
            machine.stack.store_ins(&words);
            let sync_setup = if method.access_flags & flags::ACC_SYNCHRONIZED != 0 {
                let lock_obj = if method.is_static() {
                    resolver::class_object(ctx, machine.thread, method.class)
                } else {
                    Ok(ObjRef::from_raw(words[0]))
                };
                lock_obj.and_then(|obj| {
                    machine.enter_monitor(obj)?;
                    machine.stack.current_mut().locked = Some(obj);
                    Ok(())
                })
            } else {
                Ok(())
            };
            sync_setup.and_then(|()| machine.run())
        };
        drop(machine);

        if acquired {
            thread.holds_mutator = false;
            ctx.threads.mutator.unlock_shared();
            thread.control.set_status(ThreadStatus::Native);
            if result.is_err() {
                // The outermost invocation ended with an uncaught
                // exception: this thread is done for
                if let Some(pending) = thread.pending_exception {
                    log::warn!(
                        "thread {:?} exiting on uncaught {}",
                        thread.id(),
                        runtime_core::exception::describe(ctx, pending)
                    );
                }
                hooks.on_thread_death(ctx, thread.id());
            }
        }
        result
    }
}

impl Invoker for Interpreter {
    fn invoke_static(
        &self,
        ctx: &RuntimeContext,
        thread: &mut VmThread,
        method: MethodId,
        args: &[JValue],
    ) -> ExecResult<JValue> {
        self.invoke_method(ctx, thread, method, args)
    }
}
