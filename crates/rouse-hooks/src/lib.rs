//! Hook trees, the sentinel resolver, and the ten-slot pipeline engine.

pub mod command;
pub mod defaults;
pub mod pipeline;
pub mod slots;
pub mod state;
pub mod tree;

pub use command::{CommandObject, CommandSpec, Runnable};
pub use defaults::{
    ConfigHookOptions, DefaultHooks, config_hook_default, init_hook_default, parser_hook_default,
    run_hook_default,
};
pub use pipeline::{run_invocation, run_parser};
pub use slots::{
    HookSlot, Hooks, InvokeHookFn, ParserHookFn, ResolvedHooks, invoke_hook, parser_hook,
    resolve_all,
};
pub use state::{ExecutionState, ParserData};
pub use tree::HookTree;
