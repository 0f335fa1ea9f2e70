//! The fixed-order pipeline engine.

use rouse_core::WakeError;

use crate::slots::ResolvedHooks;
use crate::state::{ExecutionState, ParserData};

/// Runs the parser phase for one command at registration time.
pub fn run_parser(hooks: &ResolvedHooks, data: &mut ParserData) -> Result<(), WakeError> {
    tracing::debug!(command = %data.name, hooks = hooks.parser.len(), "running parser slot");
    for hook in &hooks.parser {
        hook(data)?;
    }
    Ok(())
}

/// Runs the nine invocation phases, strictly in order, against the single
/// shared state. A failing hook aborts the invocation; the error surfaces
/// unmodified.
pub fn run_invocation(hooks: &ResolvedHooks, state: &mut ExecutionState) -> Result<(), WakeError> {
    for (slot, fns) in hooks.invocation_slots() {
        tracing::debug!(
            command = %state.name,
            slot = slot.name(),
            hooks = fns.len(),
            "running hook slot"
        );
        for hook in fns {
            hook(state)?;
        }
    }
    Ok(())
}
