//! Class initialization driver
//!
//! First instantiation, static access or static call of a class runs
//! its `<clinit>` exactly once, superclasses first. The state machine
//! lives on the class ([`class_model::InitState`]); this driver decides
//! what each toucher does and runs the initializer through the
//! installed invoker. An initializer that throws poisons the class:
//! the original exception is reported for the running thread and every
//! later toucher gets an initializer error.

use class_model::InitAction;
use core_types::{ClassId, ExecResult, ExceptionRaised};
use runtime_core::exception::{describe, throw};
use runtime_core::{RuntimeContext, VmThread};

/// Bring `class` to the initialized state, running `<clinit>` if this
/// thread wins the race. Reentrant calls from the initializer itself
/// proceed immediately.
pub fn ensure_initialized(
    ctx: &RuntimeContext,
    thread: &mut VmThread,
    class: ClassId,
) -> ExecResult<()> {
    let def = ctx.class(class);
    match def.init.begin(thread.id()) {
        InitAction::Ready | InitAction::Reentrant => Ok(()),
        InitAction::Failed => Err(throw(
            ctx,
            thread,
            ctx.well_known().initializer_error,
            &format!("previous initializer of {} failed", def.name),
        )),
        InitAction::Run => {
            // Superclasses settle before this class's own initializer
            if let Some(sup) = def.superclass {
                if let Err(raised) = ensure_initialized(ctx, thread, sup) {
                    def.init.complete(false);
                    return Err(raised);
                }
            }
            let result = match def.clinit {
                Some(clinit) => {
                    log::debug!("running <clinit> of {}", def.name);
                    ctx.invoker()
                        .invoke_static(ctx, thread, clinit, &[])
                        .map(|_| ())
                }
                None => Ok(()),
            };
            match result {
                Ok(()) => {
                    def.init.complete(true);
                    Ok(())
                }
                Err(ExceptionRaised) => {
                    def.init.complete(false);
                    // Replace the raw exception with the initializer
                    // wrapper, preserving its description
                    let original = thread
                        .take_pending()
                        .map(|obj| describe(ctx, obj))
                        .unwrap_or_else(|| "<missing exception>".to_string());
                    Err(throw(
                        ctx,
                        thread,
                        ctx.well_known().initializer_error,
                        &format!("{} <clinit> threw {original}", def.name),
                    ))
                }
            }
        }
    }
}
