//! rouse: a declarative command/configuration manager.
//!
//! Commands declare the typed configuration objects they need; at
//! invocation time the effective value of each config resolves through the
//! declaration hierarchy (command-line override > persisted file > code
//! default), and the chosen command is instantiated and run through a
//! fixed ten-slot hook pipeline.
//!
//! ```no_run
//! use rouse::{CommandDecl, FieldKind, ParamSpec, Registry, StructSchema, Value};
//!
//! let schema = StructSchema::new("Greet")
//!     .field("name", FieldKind::Str, Value::Str("world".into()));
//! let mut registry = Registry::new("app");
//! registry
//!     .register(CommandDecl::function(
//!         "greet",
//!         vec![ParamSpec::structured("cfg", schema)],
//!         |args| {
//!             let name = args.get("cfg").unwrap().get_path(&["name"]).unwrap();
//!             println!("hello, {name}");
//!             Ok(Value::Null)
//!         },
//!     ))
//!     .unwrap();
//! registry.wake_from_env().unwrap();
//! ```

pub mod registry;
mod wake;

pub use registry::{CommandDecl, Registry};

pub use rouse_core::{
    FieldKind, FieldSchema, Schema, StructSchema, Value, WakeError, parse_literal,
};

pub use rouse_config::{
    CallArgs, ConfigEntry, ConfigSet, FileFormat, InlineParam, Override, OverridePolicy,
    ParamDecl, ParamKind, ParamSet, ParamSpec, PersistenceManager, SignatureOptions, Variant,
    WriteBack,
};

pub use rouse_hooks::{
    CommandObject, CommandSpec, ConfigHookOptions, DefaultHooks, ExecutionState, HookSlot,
    HookTree, Hooks, InvokeHookFn, ParserData, ParserHookFn, ResolvedHooks, Runnable,
    config_hook_default, init_hook_default, invoke_hook, parser_hook, parser_hook_default,
    run_hook_default,
};
